//! A real router over a fresh in-memory database, plus the request helpers
//! the HTTP-level tests share.

use std::sync::Arc;

use api_adapters::ApiContext;
use auth_adapters::{ArgonHasher, SessionSigner};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use domains::UserStore;
use services::{AccountService, ModerationService, PostService};
use storage_adapters::{SqlitePostStore, SqliteUserStore};
use tower::ServiceExt;

/// Every account the harness registers signs in with this password.
pub const PASSWORD: &str = "Passw0rd-test";

/// Listings are paged small so tests reach a second page cheaply.
pub const PER_PAGE: u32 = 5;

pub struct TestApp {
    pub router: Router,
    pub users: Arc<SqliteUserStore>,
    pub posts: Arc<SqlitePostStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_admin_email(None).await
    }

    pub async fn with_admin_email(admin_email: Option<&str>) -> Self {
        let pool = storage_adapters::connect_memory().await.unwrap();
        let users = Arc::new(SqliteUserStore::new(pool.clone()));
        let posts = Arc::new(SqlitePostStore::new(pool));
        users.seed_roles().await.unwrap();

        let accounts = AccountService::new(
            users.clone(),
            Arc::new(ArgonHasher),
            admin_email.map(String::from),
        );
        let post_service = PostService::new(posts.clone(), PER_PAGE, PER_PAGE);
        let moderation = ModerationService::new(posts.clone(), PER_PAGE);
        let sessions = SessionSigner::new("integration-test-secret", 2);

        let ctx = ApiContext::new(accounts, post_service, moderation, sessions);
        Self {
            router: api_adapters::router(ctx, "static"),
            users,
            posts,
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Posts an `application/x-www-form-urlencoded` body. Values must
    /// already be form-safe; use `+` for spaces.
    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, email: &str, username: &str) -> Response<Body> {
        let body = format!("email={email}&username={username}&password={PASSWORD}");
        self.post_form("/auth/register", &body, None).await
    }

    pub async fn login(&self, email: &str) -> String {
        let body = format!("email={email}&password={PASSWORD}");
        let response = self.post_form("/auth/login", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        set_cookie_value(&response, "quill_session").expect("login sets the session cookie")
    }

    /// Registers an account and returns a session cookie for it.
    pub async fn signed_up(&self, email: &str, username: &str) -> String {
        let response = self.register(email, username).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        self.login(email).await
    }

    /// Publishes a post as the given session and returns the post id taken
    /// from the feed's detail link.
    pub async fn publish(&self, cookie: &str, body: &str) -> String {
        let response = self.post_form("/", &format!("body={body}"), Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let feed = body_text(self.get("/", Some(cookie)).await).await;
        extract_first(&feed, "/post/").expect("the feed links to the new post")
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The first `name=value` pair from the response's `Set-Cookie` headers,
/// ready to send back in a `Cookie` header.
pub fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let pair = value.to_str().ok()?.split(';').next()?.trim().to_string();
            pair.starts_with(&prefix).then_some(pair)
        })
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Pulls the id out of the first `{prefix}{id}` href in a page.
pub fn extract_first(html: &str, prefix: &str) -> Option<String> {
    let start = html.find(prefix)? + prefix.len();
    let rest = &html[start..];
    let end = rest.find(|c: char| c == '"' || c == '#' || c == '?')?;
    Some(rest[..end].to_string())
}
