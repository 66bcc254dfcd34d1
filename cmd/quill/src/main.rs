//! The entry point: loads settings, opens the database, wires the services
//! together and serves the site until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::ApiContext;
use auth_adapters::{ArgonHasher, SessionSigner};
use configs::Settings;
use domains::UserStore;
use secrecy::ExposeSecret;
use services::{AccountService, ModerationService, PostService};
use storage_adapters::{SqlitePostStore, SqliteUserStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    let pool = storage_adapters::connect(
        &settings.database.url,
        Duration::from_millis(settings.database.slow_query_ms),
    )
    .await
    .context("opening the database")?;

    let users = Arc::new(SqliteUserStore::new(pool.clone()));
    let posts = Arc::new(SqlitePostStore::new(pool));
    users.seed_roles().await.context("seeding the role catalog")?;

    let accounts = AccountService::new(
        users,
        Arc::new(ArgonHasher),
        settings.admin_email.clone(),
    );
    let post_service = PostService::new(
        posts.clone(),
        settings.pagination.posts_per_page,
        settings.pagination.comments_per_page,
    );
    let moderation = ModerationService::new(posts, settings.pagination.comments_per_page);
    let sessions = SessionSigner::new(
        settings.session.secret.expose_secret(),
        settings.session.ttl_hours,
    );

    let ctx = ApiContext::new(accounts, post_service, moderation, sessions);
    let app = api_adapters::router(ctx, &settings.server.static_dir);

    let addr = settings.server.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "quill is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    if settings.logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutting down");
}
