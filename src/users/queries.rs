//! Query definitions

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::TokenError;
use crate::error::{AppError, AppResult};

use super::bus::{Query, UserServices};
use super::model::User;

// =========================================================================
// GetUserProfileByIdQuery
// =========================================================================

#[derive(Debug, Clone)]
pub struct GetUserProfileByIdQuery {
    pub user_id: Uuid,
}

impl GetUserProfileByIdQuery {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl Query for GetUserProfileByIdQuery {
    type Output = User;

    async fn handle(self, services: &UserServices) -> AppResult<User> {
        services
            .users
            .find_by_id(self.user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(self.user_id.to_string()))
    }
}

// =========================================================================
// GetUserProfileByTokenQuery
// =========================================================================

/// Resolve a bearer token to the account it was issued for
#[derive(Debug, Clone)]
pub struct GetUserProfileByTokenQuery {
    pub token: String,
}

impl GetUserProfileByTokenQuery {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Query for GetUserProfileByTokenQuery {
    type Output = User;

    async fn handle(self, services: &UserServices) -> AppResult<User> {
        let claims = services.tokens.verify(&self.token)?;

        let user_id = Uuid::parse_str(&claims.user_id)
            .map_err(|_| TokenError::UnknownSubject(claims.user_id.clone()))?;

        let user = services
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(TokenError::UnknownSubject(claims.user_id))?;

        Ok(user)
    }
}

// =========================================================================
// LoginQuery
// =========================================================================

/// Exchange credentials for a signed token
#[derive(Clone)]
pub struct LoginQuery {
    pub email: String,
    pub password: String,
}

impl LoginQuery {
    pub fn new(email: String, password: String) -> Self {
        Self { email, password }
    }
}

impl std::fmt::Debug for LoginQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginQuery")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Query for LoginQuery {
    type Output = String;

    async fn handle(self, services: &UserServices) -> AppResult<String> {
        // Same error for unknown email and wrong password
        let user = services
            .users
            .find_by_email(&self.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let passwords = services.passwords.clone();
        let password = self.password;
        let stored_hash = user.hashed_password.clone();
        let matches =
            tokio::task::spawn_blocking(move || passwords.verify(&password, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

        if !matches {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = services
            .tokens
            .issue(user.id, user.is_private)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{PasswordService, TokenService, UserClaims};
    use crate::users::bus::Command;
    use crate::users::commands::CreateUserCommand;
    use crate::users::store::InMemoryUserStore;

    fn services() -> UserServices {
        UserServices::new(
            Arc::new(InMemoryUserStore::new()),
            TokenService::new("secret", 60),
            PasswordService::with_cost(1024, 1).unwrap(),
        )
    }

    async fn register(services: &UserServices, is_private: bool) -> Uuid {
        let command = CreateUserCommand::new(
            "Grace Hopper".to_string(),
            "female".to_string(),
            "grace@example.com".to_string(),
            "cobol".to_string(),
        )
        .with_private(is_private);
        let id = command.user_id;
        command.handle(services).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let services = services();
        let id = register(&services, true).await;

        let token = LoginQuery::new("grace@example.com".into(), "cobol".into())
            .handle(&services)
            .await
            .unwrap();

        let claims = services.tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, id.to_string());
        assert!(claims.is_private);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let services = services();
        register(&services, false).await;

        let wrong_password = LoginQuery::new("grace@example.com".into(), "fortran".into())
            .handle(&services)
            .await;
        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));

        let unknown_email = LoginQuery::new("nobody@example.com".into(), "cobol".into())
            .handle(&services)
            .await;
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_profile_by_token() {
        let services = services();
        let id = register(&services, false).await;
        let token = services.tokens.issue(id, false).unwrap();

        let user = GetUserProfileByTokenQuery::new(token)
            .handle(&services)
            .await
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_profile_by_token_for_deleted_subject() {
        let services = services();
        let token = services.tokens.issue(Uuid::new_v4(), false).unwrap();

        let result = GetUserProfileByTokenQuery::new(token).handle(&services).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidToken(TokenError::UnknownSubject(_)))
        ));
    }

    #[tokio::test]
    async fn test_profile_by_token_with_non_uuid_subject() {
        let services = services();
        let token = services
            .tokens
            .sign(&UserClaims {
                user_id: "not-a-uuid".to_string(),
                is_private: false,
                iat: None,
                exp: None,
            })
            .unwrap();

        let result = GetUserProfileByTokenQuery::new(token).handle(&services).await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_profile_by_id_missing() {
        let services = services();
        let result = GetUserProfileByIdQuery::new(Uuid::new_v4())
            .handle(&services)
            .await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[test]
    fn test_login_debug_hides_password() {
        let query = LoginQuery::new("ada@example.com".to_string(), "correct horse".to_string());
        let printed = format!("{:?}", query);
        assert!(!printed.contains("correct horse"));
        assert!(printed.contains("[REDACTED]"));
    }
}
