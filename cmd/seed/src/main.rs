//! Fills the development database with fake accounts, posts, comments and
//! a follow graph.
//!
//! Usage: `seed [users] [posts] [comments]`. Every generated account signs
//! in with the password `password`.

use std::time::Duration;

use anyhow::Context;
use chrono::{Duration as Span, Utc};
use configs::Settings;
use domains::{AppError, Comment, CredentialHasher, Post, PostStore, User, UserStore};
use fake::faker::internet::en::{FreeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use storage_adapters::{SqlitePostStore, SqliteUserStore};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let mut args = std::env::args().skip(1);
    let user_count = parse_count(args.next(), 25)?;
    let post_count = parse_count(args.next(), 100)?;
    let comment_count = parse_count(args.next(), 300)?;

    let settings = Settings::load().context("loading settings")?;
    let pool = storage_adapters::connect(
        &settings.database.url,
        Duration::from_millis(settings.database.slow_query_ms),
    )
    .await
    .context("opening the database")?;

    let users = SqliteUserStore::new(pool.clone());
    let posts = SqlitePostStore::new(pool);
    users.seed_roles().await.context("seeding the role catalog")?;

    let accounts = seed_users(&users, user_count).await?;
    tracing::info!(count = accounts.len(), "users created");

    let published = seed_posts(&posts, &accounts, post_count).await?;
    tracing::info!(count = published.len(), "posts created");

    seed_comments(&posts, &accounts, &published, comment_count).await?;
    tracing::info!(count = comment_count, "comments created");

    seed_follows(&users, &accounts).await?;
    tracing::info!("follow graph created");

    Ok(())
}

fn parse_count(arg: Option<String>, default: usize) -> anyhow::Result<usize> {
    match arg {
        Some(raw) => raw.parse().with_context(|| format!("invalid count {raw:?}")),
        None => Ok(default),
    }
}

/// A timestamp somewhere in the last year, so listings page realistically.
fn past_moment() -> chrono::DateTime<Utc> {
    Utc::now() - Span::days((0..365).fake()) - Span::seconds((0..86_400).fake())
}

/// Creates users one at a time, retrying with fresh fakes when the
/// generated email or username collides with an existing row.
async fn seed_users(store: &SqliteUserStore, count: usize) -> anyhow::Result<Vec<Uuid>> {
    let hasher = auth_adapters::ArgonHasher;
    let password_hash = hasher
        .hash("password")
        .map_err(|err| anyhow::anyhow!("hashing the shared password: {err}"))?;
    let role = store.default_role().await.context("loading the default role")?;

    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let user = User {
            id: Uuid::now_v7(),
            email: FreeEmail().fake(),
            username: Username().fake(),
            password_hash: password_hash.clone(),
            role_id: role.id,
            created_at: past_moment(),
        };
        match store.create_user(&user).await {
            Ok(()) => ids.push(user.id),
            Err(AppError::Conflict(_)) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(ids)
}

async fn seed_posts(
    store: &SqlitePostStore,
    authors: &[Uuid],
    count: usize,
) -> anyhow::Result<Vec<Uuid>> {
    if authors.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let post = Post {
            id: Uuid::now_v7(),
            author_id: authors[(0..authors.len()).fake::<usize>()],
            body: Paragraph(1..4).fake(),
            created_at: past_moment(),
        };
        store.create_post(&post).await?;
        ids.push(post.id);
    }
    Ok(ids)
}

async fn seed_comments(
    store: &SqlitePostStore,
    authors: &[Uuid],
    posts: &[Uuid],
    count: usize,
) -> anyhow::Result<()> {
    if authors.is_empty() || posts.is_empty() {
        return Ok(());
    }
    for _ in 0..count {
        let comment = Comment {
            id: Uuid::now_v7(),
            post_id: posts[(0..posts.len()).fake::<usize>()],
            author_id: authors[(0..authors.len()).fake::<usize>()],
            body: Sentence(3..12).fake(),
            disabled: false,
            created_at: past_moment(),
        };
        store.create_comment(&comment).await?;
    }
    Ok(())
}

/// Everyone follows a handful of other accounts. Duplicate picks are fine,
/// the store ignores repeated follows.
async fn seed_follows(store: &SqliteUserStore, accounts: &[Uuid]) -> anyhow::Result<()> {
    if accounts.len() < 2 {
        return Ok(());
    }
    for follower in accounts {
        for _ in 0..3 {
            let followed = accounts[(0..accounts.len()).fake::<usize>()];
            if followed != *follower {
                store.follow(*follower, followed).await?;
            }
        }
    }
    Ok(())
}
