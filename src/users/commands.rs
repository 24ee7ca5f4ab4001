//! Command definitions
//!
//! Commands represent intentions to change user state. Each one carries its
//! own handler through [`Command`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::bus::{Command, UserServices};
use super::model::{AccountChanges, FollowAction, FollowOutcome, User};

// =========================================================================
// CreateUserCommand
// =========================================================================

/// Register a new account.
///
/// The id is chosen by the caller so it can be returned without a read.
#[derive(Clone)]
pub struct CreateUserCommand {
    pub user_id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub email: String,
    pub password: String,
    pub is_private: bool,
}

impl CreateUserCommand {
    pub fn new(full_name: String, gender: String, email: String, password: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            full_name,
            gender,
            email,
            password,
            is_private: false,
        }
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }
}

impl std::fmt::Debug for CreateUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserCommand")
            .field("user_id", &self.user_id)
            .field("full_name", &self.full_name)
            .field("gender", &self.gender)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("is_private", &self.is_private)
            .finish()
    }
}

#[async_trait]
impl Command for CreateUserCommand {
    async fn handle(self, services: &UserServices) -> AppResult<()> {
        let passwords = services.passwords.clone();
        let password = self.password;

        // Argon2 is CPU bound
        let hashed_password = tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let user = User::new(
            self.user_id,
            self.full_name,
            self.gender,
            self.email,
            hashed_password,
            self.is_private,
        );
        services.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(())
    }
}

// =========================================================================
// FollowOrUnfollowUserCommand
// =========================================================================

/// Follow or unfollow another user
#[derive(Debug, Clone)]
pub struct FollowOrUnfollowUserCommand {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub action: FollowAction,
}

impl FollowOrUnfollowUserCommand {
    pub fn follow(follower_id: Uuid, followee_id: Uuid) -> Self {
        Self {
            follower_id,
            followee_id,
            action: FollowAction::Follow,
        }
    }

    pub fn unfollow(follower_id: Uuid, followee_id: Uuid) -> Self {
        Self {
            follower_id,
            followee_id,
            action: FollowAction::Unfollow,
        }
    }
}

#[async_trait]
impl Command for FollowOrUnfollowUserCommand {
    async fn handle(self, services: &UserServices) -> AppResult<()> {
        if self.follower_id == self.followee_id {
            return Err(AppError::InvalidRequest(
                "You cannot follow or unfollow yourself".to_string(),
            ));
        }

        match services
            .users
            .follow(self.follower_id, self.followee_id, self.action)
            .await?
        {
            FollowOutcome::Applied => {
                tracing::debug!(
                    follower_id = %self.follower_id,
                    followee_id = %self.followee_id,
                    action = ?self.action,
                    "Follow counters updated"
                );
                Ok(())
            }
            FollowOutcome::UserMissing(id) => Err(AppError::UserNotFound(id.to_string())),
        }
    }
}

// =========================================================================
// UpdateAccountCommand
// =========================================================================

/// Change profile fields of the caller's own account
#[derive(Debug, Clone)]
pub struct UpdateAccountCommand {
    pub user_id: Uuid,
    pub changes: AccountChanges,
}

impl UpdateAccountCommand {
    pub fn new(user_id: Uuid, changes: AccountChanges) -> Self {
        Self { user_id, changes }
    }
}

#[async_trait]
impl Command for UpdateAccountCommand {
    async fn handle(self, services: &UserServices) -> AppResult<()> {
        services
            .users
            .update_account(self.user_id, &self.changes)
            .await?
            .ok_or_else(|| AppError::UserNotFound(self.user_id.to_string()))?;
        Ok(())
    }
}

// =========================================================================
// SetProfileImageCommand
// =========================================================================

/// Point the account at an already stored profile image
#[derive(Debug, Clone)]
pub struct SetProfileImageCommand {
    pub user_id: Uuid,
    pub profile_url: String,
}

impl SetProfileImageCommand {
    pub fn new(user_id: Uuid, profile_url: String) -> Self {
        Self {
            user_id,
            profile_url,
        }
    }
}

#[async_trait]
impl Command for SetProfileImageCommand {
    async fn handle(self, services: &UserServices) -> AppResult<()> {
        services
            .users
            .set_profile_url(self.user_id, &self.profile_url)
            .await?
            .ok_or_else(|| AppError::UserNotFound(self.user_id.to_string()))?;
        Ok(())
    }
}
