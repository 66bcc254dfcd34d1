//! Port traits implemented by the adapter crates.
//!
//! Services depend on these, never on sqlx or argon2 directly. Mock
//! implementations are generated for the service unit tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentEntry, FeedPost, FollowCounts, Post, Role, User};
use crate::page::{Page, PageRequest};

/// Accounts, roles and the follow graph.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;
    /// The role new accounts receive.
    async fn default_role(&self) -> Result<Role>;
    /// Upserts the builtin role catalog by name. Idempotent.
    async fn seed_roles(&self) -> Result<()>;

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()>;
    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()>;
    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool>;
    async fn follow_counts(&self, user_id: Uuid) -> Result<FollowCounts>;
}

/// Posts and their comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: &Post) -> Result<()>;
    async fn post_by_id(&self, id: Uuid) -> Result<Option<FeedPost>>;
    /// Returns false when no post carries `id`.
    async fn update_post_body(&self, id: Uuid, body: &str) -> Result<bool>;

    /// Every post, newest first.
    async fn recent_posts(&self, page: PageRequest) -> Result<Page<FeedPost>>;
    /// Posts by authors the viewer follows, plus the viewer's own.
    async fn followed_posts(&self, viewer_id: Uuid, page: PageRequest) -> Result<Page<FeedPost>>;
    async fn posts_by_author(&self, author_id: Uuid, page: PageRequest) -> Result<Page<FeedPost>>;

    async fn create_comment(&self, comment: &Comment) -> Result<()>;
    async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
    /// A post's comments, oldest first.
    async fn comments_of_post(&self, post_id: Uuid, page: PageRequest)
        -> Result<Page<CommentEntry>>;
    async fn count_comments(&self, post_id: Uuid) -> Result<u64>;
    /// Every comment on the site, newest first.
    async fn recent_comments(&self, page: PageRequest) -> Result<Page<CommentEntry>>;
    /// Returns false when no comment carries `id`.
    async fn set_comment_disabled(&self, id: Uuid, disabled: bool) -> Result<bool>;
}

/// Password hashing. Sync on purpose: argon2 is CPU-bound and callers run
/// it on the request task like any other handler work.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}
