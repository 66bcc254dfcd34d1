//! The HTTP surface: routing, handlers, templates, session and flash
//! cookies, and the Prometheus exposition endpoint. Everything here talks to
//! the services layer; no storage types leak in.

use std::sync::Arc;

use auth_adapters::SessionSigner;
use axum::routing::get;
use axum::Router;
use prometheus_client::registry::Registry;
use services::{AccountService, ModerationService, PostService};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod cookies;
pub mod error;
pub mod extract;
pub mod flash;
pub mod handlers;
pub mod metrics;
pub mod templates;

pub use error::WebError;
pub use metrics::HttpMetrics;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub moderation: Arc<ModerationService>,
    pub sessions: Arc<SessionSigner>,
    pub registry: Arc<Registry>,
    pub metrics: HttpMetrics,
}

impl ApiContext {
    pub fn new(
        accounts: AccountService,
        posts: PostService,
        moderation: ModerationService,
        sessions: SessionSigner,
    ) -> Self {
        let mut registry = Registry::default();
        let metrics = HttpMetrics::new(&mut registry);
        Self {
            accounts: Arc::new(accounts),
            posts: Arc::new(posts),
            moderation: Arc::new(moderation),
            sessions: Arc::new(sessions),
            registry: Arc::new(registry),
            metrics,
        }
    }
}

pub fn router(ctx: ApiContext, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(handlers::feed).post(handlers::publish))
        .route("/all", get(handlers::show_all))
        .route("/followed", get(handlers::show_followed))
        .route("/post/{id}", get(handlers::post_detail).post(handlers::add_comment))
        .route("/edit/{id}", get(handlers::edit_form).post(handlers::edit_submit))
        .route("/moderate", get(handlers::moderate))
        .route("/moderate/enable/{id}", get(handlers::moderate_enable))
        .route("/moderate/disable/{id}", get(handlers::moderate_disable))
        .route("/auth/register", get(handlers::register_form).post(handlers::register_submit))
        .route("/auth/login", get(handlers::login_form).post(handlers::login_submit))
        .route("/auth/logout", get(handlers::logout))
        .route("/user/{username}", get(handlers::profile))
        .route("/follow/{username}", get(handlers::follow))
        .route("/unfollow/{username}", get(handlers::unfollow))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(ctx.clone(), metrics::track))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
