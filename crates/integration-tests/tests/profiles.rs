use axum::http::StatusCode;
use integration_tests::{body_text, location, set_cookie_value, TestApp};

#[tokio::test]
async fn a_profile_shows_the_member_and_their_posts() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    app.publish(&alice, "her-first-post").await;

    let response = app.get("/user/alice", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("alice"));
    assert!(html.contains("Member since"));
    assert!(html.contains(">her-first-post<"));
    assert!(html.contains("0 followers"));
    assert!(html.contains("0 following"));

    // Anonymous visitors get no follow button.
    assert!(!html.contains(">Follow<"));
}

#[tokio::test]
async fn unknown_profiles_are_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/user/nobody", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn followers_can_follow_and_unfollow() {
    let app = TestApp::new().await;
    let _alice = app.signed_up("alice@example.com", "alice").await;
    let bob = app.signed_up("bob@example.com", "bob").await;

    let response = app.get("/follow/alice", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user/alice");

    let flash = set_cookie_value(&response, "quill_flash").unwrap();
    let cookie = format!("{bob}; {flash}");
    let html = body_text(app.get("/user/alice", Some(&cookie)).await).await;
    assert!(html.contains("You are now following alice."));
    assert!(html.contains("1 followers"));
    assert!(html.contains(">Unfollow<"));

    // Following twice is called out, not repeated.
    let response = app.get("/follow/alice", Some(&bob)).await;
    let flash = set_cookie_value(&response, "quill_flash").unwrap();
    let cookie = format!("{bob}; {flash}");
    let html = body_text(app.get("/user/alice", Some(&cookie)).await).await;
    assert!(html.contains("You are already following this user."));
    assert!(html.contains("1 followers"));

    // And bob's own profile counts the other direction.
    let html = body_text(app.get("/user/bob", None).await).await;
    assert!(html.contains("1 following"));

    let response = app.get("/unfollow/alice", Some(&bob)).await;
    assert_eq!(location(&response), "/user/alice");
    let flash = set_cookie_value(&response, "quill_flash").unwrap();
    let cookie = format!("{bob}; {flash}");
    let html = body_text(app.get("/user/alice", Some(&cookie)).await).await;
    assert!(html.contains("You are no longer following alice."));
    assert!(html.contains("0 followers"));
    assert!(html.contains(">Follow<"));

    let response = app.get("/unfollow/alice", Some(&bob)).await;
    let flash = set_cookie_value(&response, "quill_flash").unwrap();
    let cookie = format!("{bob}; {flash}");
    let html = body_text(app.get("/user/alice", Some(&cookie)).await).await;
    assert!(html.contains("You are not following this user."));
}

#[tokio::test]
async fn following_a_ghost_returns_to_the_feed() {
    let app = TestApp::new().await;
    let bob = app.signed_up("bob@example.com", "bob").await;

    let response = app.get("/follow/ghost", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let flash = set_cookie_value(&response, "quill_flash").unwrap();
    let cookie = format!("{bob}; {flash}");
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Invalid user."));
}

#[tokio::test]
async fn nobody_gets_a_follow_button_on_their_own_profile() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;

    let html = body_text(app.get("/user/alice", Some(&alice)).await).await;
    assert!(!html.contains(">Follow<"));
    assert!(!html.contains(">Unfollow<"));
}

#[tokio::test]
async fn following_needs_a_login() {
    let app = TestApp::new().await;
    app.signed_up("alice@example.com", "alice").await;

    let response = app.get("/follow/alice", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=/follow/alice");
}

#[tokio::test]
async fn profile_posts_page_like_the_feed() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    let bob = app.signed_up("bob@example.com", "bob").await;
    for n in 1..=6 {
        app.publish(&alice, &format!("alice-{n}")).await;
    }
    app.publish(&bob, "bobs-post").await;

    let html = body_text(app.get("/user/alice", None).await).await;
    assert!(html.contains(">alice-6<"));
    assert!(!html.contains(">alice-1<"));
    assert!(!html.contains(">bobs-post<"));
    assert!(html.contains("/user/alice?page=2"));

    let html = body_text(app.get("/user/alice?page=2", None).await).await;
    assert!(html.contains(">alice-1<"));
}
