use axum::http::StatusCode;
use integration_tests::{body_text, location, set_cookie_value, TestApp};

#[tokio::test]
async fn the_feed_lists_posts_newest_first() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    app.publish(&alice, "older-post").await;
    app.publish(&alice, "newer-post").await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let newer = html.find("newer-post").unwrap();
    let older = html.find("older-post").unwrap();
    assert!(newer < older);

    // Anonymous visitors get no publish form and no feed tabs.
    assert!(!html.contains("<form"));
    assert!(!html.contains(">Followed<"));
}

#[tokio::test]
async fn publishing_requires_a_signed_in_writer() {
    let app = TestApp::new().await;

    // An anonymous post falls through to the plain feed.
    let response = app.post_form("/", "body=sneaky", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(app.get("/", None).await).await;
    assert!(!html.contains("sneaky"));
    assert!(!html.contains("/post/"));
}

#[tokio::test]
async fn an_empty_body_rerenders_the_form_with_the_error() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;

    let response = app.post_form("/", "body=", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("The post body cannot be empty."));

    let response = app.post_form("/", "body=+++", Some(&alice)).await;
    let html = body_text(response).await;
    assert!(html.contains("The post body cannot be empty."));
}

#[tokio::test]
async fn the_followed_tab_narrows_the_feed_to_followed_authors() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    let bob = app.signed_up("bob@example.com", "bob").await;
    let carol = app.signed_up("carol@example.com", "carol").await;
    app.publish(&bob, "from-bob").await;
    app.publish(&carol, "from-carol").await;

    let response = app.get("/follow/bob", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/followed", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let followed = set_cookie_value(&response, "show_followed").unwrap();
    assert_eq!(followed, "show_followed=1");

    let cookie = format!("{alice}; {followed}");
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("from-bob"));
    assert!(!html.contains("from-carol"));

    // Their own posts stay visible on the followed tab.
    app.publish(&alice, "from-alice").await;
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("from-alice"));

    // Switching back to All clears the preference cookie.
    let response = app.get("/all", Some(&alice)).await;
    let cleared = set_cookie_value(&response, "show_followed").unwrap();
    let cookie = format!("{alice}; {cleared}");
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("from-carol"));
}

#[tokio::test]
async fn the_feed_tabs_need_a_login() {
    let app = TestApp::new().await;
    let response = app.get("/all", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=/all");
}

#[tokio::test]
async fn the_feed_splits_into_pages() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    for n in 1..=6 {
        app.publish(&alice, &format!("post-{n}")).await;
    }

    let html = body_text(app.get("/", None).await).await;
    assert!(html.contains(">post-6<"));
    assert!(html.contains(">post-2<"));
    assert!(!html.contains(">post-1<"));
    assert!(html.contains("/?page=2"));

    let html = body_text(app.get("/?page=2", None).await).await;
    assert!(html.contains(">post-1<"));
    assert!(!html.contains(">post-6<"));
}

#[tokio::test]
async fn a_nonsense_page_number_is_the_first_page() {
    let app = TestApp::new().await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    app.publish(&alice, "the-only-post").await;

    let response = app.get("/?page=banana", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("the-only-post"));
}
