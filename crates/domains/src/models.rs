//! # Domain Models
//!
//! The core entities of Quill. UUID v7 gives time-ordered, globally unique
//! identification for every row.

use bitmask_enum::bitmask;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capabilities a role can grant, one bit each.
///
/// The values are part of the persisted format (roles store the combined
/// mask as an integer), so they never change.
#[bitmask(i64)]
pub enum Permission {
    /// May follow other users.
    Follow = 0x01,
    /// May comment on posts.
    Comment = 0x02,
    /// May write posts.
    Write = 0x04,
    /// May moderate comments written by others.
    Moderate = 0x08,
    /// May administer the site, including editing any post.
    Admin = 0x80,
}

impl Default for Permission {
    fn default() -> Self {
        Self::none()
    }
}

impl Permission {
    /// Checks if the current permission set has every bit of `other`.
    pub fn has_permission(&self, other: Self) -> bool {
        (*self & other) == other
    }
}

/// A named permission set users are assigned at registration.
#[derive(Debug, Clone)]
pub struct Role {
    pub id: Uuid,
    /// Unique display name (e.g. "Moderator").
    pub name: String,
    pub permissions: Permission,
    /// Exactly one role carries this flag; new accounts receive it.
    pub is_default: bool,
}

/// Seed entry for the builtin role catalog.
pub struct RoleSeed {
    pub name: &'static str,
    pub permissions: Permission,
    pub is_default: bool,
}

/// The builtin roles, upserted by name at startup so permission masks are
/// assigned exactly once per deployment and stay in sync with this table.
pub static BUILTIN_ROLES: Lazy<[RoleSeed; 3]> = Lazy::new(|| {
    [
        RoleSeed {
            name: "User",
            permissions: Permission::Follow | Permission::Comment | Permission::Write,
            is_default: true,
        },
        RoleSeed {
            name: "Moderator",
            permissions: Permission::Follow
                | Permission::Comment
                | Permission::Write
                | Permission::Moderate,
            is_default: false,
        },
        RoleSeed {
            name: "Administrator",
            permissions: Permission::from(0xff),
            is_default: false,
        },
    ]
});

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The email the user signs in with. Unique.
    pub email: String,
    /// The public handle shown next to posts and comments. Unique.
    pub username: String,
    /// The argon2 hash of the user's password.
    pub password_hash: String,
    /// The role assigned at registration.
    pub role_id: Uuid,
    /// The time the account was created.
    pub created_at: DateTime<Utc>,
}

/// A signed-in principal: the user plus their role's resolved permissions.
///
/// Anonymous viewers are represented as the absence of one (`Option`), so
/// they hold no permissions at all.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user: User,
    pub permissions: Permission,
}

impl AuthedUser {
    /// The permission test every handler gates on.
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.has_permission(permission)
    }
}

/// The fundamental unit of publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id,
            body,
            created_at: Utc::now(),
        }
    }
}

/// A reply attached to a single post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    /// Set by moderators; the body is hidden from regular viewers while set.
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            author_id,
            body,
            disabled: false,
            created_at: Utc::now(),
        }
    }
}

/// Lightweight author projection carried next to listed posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

/// A post as it appears in feeds: joined with its author and comment count.
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub post: Post,
    pub author: Author,
    pub comments: u64,
}

/// A comment joined with its author, as listed on post and moderation pages.
#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: Author,
}

/// Follower/following totals shown on profile pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}
