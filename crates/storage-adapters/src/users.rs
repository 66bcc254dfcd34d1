use async_trait::async_trait;
use chrono::Utc;
use domains::{
    AppError, FollowCounts, Permission, Result, Role, User, UserStore, BUILTIN_ROLES,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, map_db, uuid_to_blob};

/// Accounts, roles and the follow graph on SQLite.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_user(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role_id: blob_to_uuid(row.get::<Vec<u8>, _>("role_id").as_slice()),
        created_at: row.get("created_at"),
    }
}

fn map_role(row: &SqliteRow) -> Role {
    Role {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        name: row.get("name"),
        permissions: Permission::from(row.get::<i64, _>("permissions")),
        is_default: row.get("is_default"),
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, role_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(uuid_to_blob(user.role_id))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_user))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_user))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_user))
    }

    async fn role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT * FROM roles WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_role))
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT * FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_role))
    }

    async fn default_role(&self) -> Result<Role> {
        let row = sqlx::query("SELECT * FROM roles WHERE is_default = 1 LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        row.as_ref()
            .map(map_role)
            .ok_or_else(|| AppError::Internal("no default role; roles were never seeded".into()))
    }

    /// Upserts the builtin catalog by name so permission masks can be
    /// corrected on upgrade without touching role ids.
    async fn seed_roles(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;

        for role in BUILTIN_ROLES.iter() {
            sqlx::query(
                "INSERT INTO roles (id, name, permissions, is_default) VALUES (?, ?, ?, ?) \
                 ON CONFLICT (name) DO UPDATE SET \
                 permissions = excluded.permissions, is_default = excluded.is_default",
            )
            .bind(uuid_to_blob(Uuid::now_v7()))
            .bind(role.name)
            .bind(role.permissions.bits())
            .bind(role.is_default)
            .execute(&mut *tx)
            .await
            .map_err(map_db)?;
        }

        tx.commit().await.map_err(map_db)?;
        Ok(())
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(uuid_to_blob(follower_id))
        .bind(uuid_to_blob(followed_id))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
            .bind(uuid_to_blob(follower_id))
            .bind(uuid_to_blob(followed_id))
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM follows WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(uuid_to_blob(follower_id))
        .bind(uuid_to_blob(followed_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn follow_counts(&self, user_id: Uuid) -> Result<FollowCounts> {
        let row = sqlx::query(
            "SELECT \
             (SELECT COUNT(*) FROM follows WHERE followed_id = ?) AS followers, \
             (SELECT COUNT(*) FROM follows WHERE follower_id = ?) AS following",
        )
        .bind(uuid_to_blob(user_id))
        .bind(uuid_to_blob(user_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)?;

        Ok(FollowCounts {
            followers: row.get::<i64, _>("followers") as u64,
            following: row.get::<i64, _>("following") as u64,
        })
    }
}
