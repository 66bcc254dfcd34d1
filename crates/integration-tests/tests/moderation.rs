use axum::http::StatusCode;
use integration_tests::{body_text, extract_first, location, TestApp};

async fn app_with_admin() -> (TestApp, String, String, String) {
    let app = TestApp::with_admin_email(Some("root@example.com")).await;
    let admin = app.signed_up("root@example.com", "root").await;
    let alice = app.signed_up("alice@example.com", "alice").await;
    let post = app.publish(&alice, "discussion").await;
    (app, admin, alice, post)
}

#[tokio::test]
async fn the_queue_is_gated_on_the_moderate_permission() {
    let (app, admin, alice, _post) = app_with_admin().await;

    let response = app.get("/moderate", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=/moderate");

    let response = app.get("/moderate", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/moderate", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabling_hides_the_comment_from_regular_viewers() {
    let (app, admin, alice, post) = app_with_admin().await;
    app.post_form(&format!("/post/{post}"), "body=rude-remark", Some(&alice))
        .await;

    let html = body_text(app.get("/moderate", Some(&admin)).await).await;
    assert!(html.contains("rude-remark"));
    let comment = extract_first(&html, "/moderate/disable/").unwrap();

    let response = app
        .get(&format!("/moderate/disable/{comment}?page=1"), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/moderate?page=1");

    // Regular viewers see the placeholder, not the body.
    let html = body_text(app.get(&format!("/post/{post}"), Some(&alice)).await).await;
    assert!(html.contains("This comment has been disabled by a moderator."));
    assert!(!html.contains("rude-remark"));

    // Moderators see both the placeholder and the body on the post page.
    let html = body_text(app.get(&format!("/post/{post}"), Some(&admin)).await).await;
    assert!(html.contains("This comment has been disabled by a moderator."));
    assert!(html.contains("rude-remark"));

    // The queue still shows the body, now behind an Enable link.
    let html = body_text(app.get("/moderate", Some(&admin)).await).await;
    assert!(html.contains("rude-remark"));
    assert!(html.contains(&format!("/moderate/enable/{comment}")));

    let response = app
        .get(&format!("/moderate/enable/{comment}?page=1"), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(app.get(&format!("/post/{post}"), Some(&alice)).await).await;
    assert!(html.contains("rude-remark"));
    assert!(!html.contains("This comment has been disabled by a moderator."));
}

#[tokio::test]
async fn toggling_needs_the_moderate_permission_too() {
    let (app, admin, alice, post) = app_with_admin().await;
    app.post_form(&format!("/post/{post}"), "body=target", Some(&alice))
        .await;
    let html = body_text(app.get("/moderate", Some(&admin)).await).await;
    let comment = extract_first(&html, "/moderate/disable/").unwrap();

    let response = app
        .get(&format!("/moderate/disable/{comment}"), Some(&alice))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let html = body_text(app.get(&format!("/post/{post}"), None).await).await;
    assert!(html.contains("target"));
}

#[tokio::test]
async fn the_queue_rejects_out_of_range_pages() {
    let (app, admin, alice, post) = app_with_admin().await;
    for n in 1..=6 {
        app.post_form(&format!("/post/{post}"), &format!("body=note-{n}"), Some(&alice))
            .await;
    }

    // Six comments at five per page make exactly two pages.
    let response = app.get("/moderate?page=2", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/moderate?page=3", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/moderate?page=0", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/moderate?page=-1", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unparsable page numbers still mean page one.
    let response = app.get("/moderate?page=banana", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn the_queue_lists_newest_comments_first_and_pages() {
    let (app, admin, alice, post) = app_with_admin().await;
    for n in 1..=6 {
        app.post_form(&format!("/post/{post}"), &format!("body=note-{n}"), Some(&alice))
            .await;
    }

    let html = body_text(app.get("/moderate", Some(&admin)).await).await;
    assert!(html.contains(">note-6<"));
    assert!(html.contains(">note-2<"));
    assert!(!html.contains(">note-1<"));
    assert!(html.contains("/moderate?page=2"));

    let html = body_text(app.get("/moderate?page=2", Some(&admin)).await).await;
    assert!(html.contains(">note-1<"));

    // Toggle links carry the page they came from.
    let comment = extract_first(&html, "/moderate/disable/").unwrap();
    assert!(html.contains(&format!("/moderate/disable/{comment}?page=2")));
    let response = app
        .get(&format!("/moderate/disable/{comment}?page=2"), Some(&admin))
        .await;
    assert_eq!(location(&response), "/moderate?page=2");
}

#[tokio::test]
async fn an_empty_queue_still_renders() {
    let app = TestApp::with_admin_email(Some("root@example.com")).await;
    let admin = app.signed_up("root@example.com", "root").await;

    let response = app.get("/moderate", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Moderate Comments"));
}
