use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, AuthedUser, CredentialHasher, FollowCounts, Result, User, UserStore,
};
use uuid::Uuid;

/// Registration input, straight from the signup form.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Accounts, sign-in and the follow graph.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    admin_email: Option<String>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            admin_email,
        }
    }

    /// Creates an account with the default role, or the Administrator role
    /// when the email matches the configured admin email.
    pub async fn register(&self, account: NewAccount) -> Result<User> {
        validate_email(&account.email).map_err(AppError::validation)?;
        validate_username(&account.username).map_err(AppError::validation)?;
        validate_password(&account.password).map_err(AppError::validation)?;

        if self.users.user_by_email(&account.email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists.".into(),
            ));
        }
        if self.users.user_by_username(&account.username).await?.is_some() {
            return Err(AppError::Conflict("This username is already taken.".into()));
        }

        let role = if self.admin_email.as_deref() == Some(account.email.as_str()) {
            self.users.role_by_name("Administrator").await?.ok_or_else(|| {
                AppError::Internal("Administrator role missing; roles were never seeded".into())
            })?
        } else {
            self.users.default_role().await?
        };

        let user = User {
            id: Uuid::now_v7(),
            email: account.email,
            username: account.username,
            password_hash: self.hasher.hash(&account.password)?,
            role_id: role.id,
            created_at: Utc::now(),
        };
        self.users.create_user(&user).await?;

        tracing::info!(user = %user.username, role = %role.name, "account registered");
        Ok(user)
    }

    /// `None` for unknown email and for a wrong password alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = match self.users.user_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if self.hasher.verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Resolves a session's user id into the user plus their role's
    /// permissions. `None` when the account no longer exists.
    pub async fn authed_by_id(&self, id: Uuid) -> Result<Option<AuthedUser>> {
        match self.users.user_by_id(id).await? {
            Some(user) => Ok(Some(self.with_permissions(user).await?)),
            None => Ok(None),
        }
    }

    pub async fn with_permissions(&self, user: User) -> Result<AuthedUser> {
        let role = self.users.role_by_id(user.role_id).await?.ok_or_else(|| {
            AppError::Internal(format!("role {} missing for user {}", user.role_id, user.id))
        })?;
        Ok(AuthedUser {
            user,
            permissions: role.permissions,
        })
    }

    pub async fn profile(&self, username: &str) -> Result<Option<(User, FollowCounts)>> {
        match self.users.user_by_username(username).await? {
            Some(user) => {
                let counts = self.users.follow_counts(user.id).await?;
                Ok(Some((user, counts)))
            }
            None => Ok(None),
        }
    }

    pub async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        self.users.is_following(follower_id, followed_id).await
    }

    /// Follows `username`. The bool is false when the link already existed.
    pub async fn follow(&self, follower_id: Uuid, username: &str) -> Result<(User, bool)> {
        let target = self
            .users
            .user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User", username))?;

        if self.users.is_following(follower_id, target.id).await? {
            return Ok((target, false));
        }
        self.users.follow(follower_id, target.id).await?;
        Ok((target, true))
    }

    /// Unfollows `username`. The bool is false when there was no link.
    pub async fn unfollow(&self, follower_id: Uuid, username: &str) -> Result<(User, bool)> {
        let target = self
            .users
            .user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User", username))?;

        if !self.users.is_following(follower_id, target.id).await? {
            return Ok((target, false));
        }
        self.users.unfollow(follower_id, target.id).await?;
        Ok((target, true))
    }
}

/// Validates an email.
pub fn validate_email(email: &str) -> std::result::Result<(), &'static str> {
    if email.len() < 5 {
        return Err("Email must be at least 5 characters long");
    }

    if email.len() > 100 {
        return Err("Email must be at most 100 characters long");
    }

    if !email_address::EmailAddress::is_valid(email) {
        return Err("Email is not a valid email address");
    }

    Ok(())
}

/// Validates a username.
pub fn validate_username(username: &str) -> std::result::Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters long");
    }

    if username.len() > 20 {
        return Err("Username must be at most 20 characters long");
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username must only contain alphanumeric characters and underscores");
    }

    Ok(())
}

/// Validates a password.
pub fn validate_password(password: &str) -> std::result::Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }

    if password.len() > 100 {
        return Err("Password must be at most 100 characters long");
    }

    Ok(())
}
