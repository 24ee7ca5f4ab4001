//! User API Routes
//!
//! Every handler turns the request into a command or query and dispatches it
//! on the bus; none of them touch the store.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Extension, Multipart, Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::{health_check, parse_uuid, MultipartForm, SuccessResponse, ValidatedJson};
use crate::auth::extract_bearer_token;
use crate::error::{AppError, AppResult};
use crate::media::MediaStore;

use super::bus::{CommandBus, QueryBus};
use super::commands::{
    CreateUserCommand, FollowOrUnfollowUserCommand, SetProfileImageCommand, UpdateAccountCommand,
};
use super::model::{AccountChanges, User};
use super::queries::{GetUserProfileByIdQuery, GetUserProfileByTokenQuery, LoginQuery};

/// Shared state of the user service
#[derive(Clone)]
pub struct UserState {
    pub commands: CommandBus,
    pub queries: QueryBus,
    pub profiles: Arc<dyn MediaStore>,
}

/// The authenticated caller, loaded from the token subject
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "fullName is required"))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "gender is required"))]
    pub gender: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "fullName must not be empty"))]
    pub full_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdateAccountResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProfileResponse {
    pub success: bool,
    pub profile_url: String,
}

// =========================================================================
// User Router
// =========================================================================

/// Create the user router
pub fn create_router(state: UserState) -> Router<UserState> {
    let authenticated = Router::new()
        .route("/myProfile", get(my_profile))
        .route("/followUser/:user_id", get(follow_user))
        .route("/unfollowUser/:user_id", get(unfollow_user))
        .route(
            "/updateMyAccount",
            get(update_my_account).post(update_my_account),
        )
        .route("/uploadProfile", post(upload_profile))
        .route_layer(middleware::from_fn_with_state(state, current_user_middleware));

    Router::new()
        .route("/", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/viewProfile/:user_id", get(view_profile))
        .merge(authenticated)
}

// =========================================================================
// Current User Middleware
// =========================================================================

/// Resolve the bearer token to its user row and attach it as [`CurrentUser`]
pub async fn current_user_middleware(
    State(state): State<UserState>,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let token = extract_bearer_token(request.headers())?
        .ok_or(AppError::MissingAuthorization)?
        .to_string();

    let user = state
        .queries
        .send(GetUserProfileByTokenQuery::new(token))
        .await?;
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

// =========================================================================
// POST /register
// =========================================================================

async fn register(
    State(state): State<UserState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let command = CreateUserCommand::new(
        request.full_name,
        request.gender,
        request.email,
        request.password,
    )
    .with_private(request.is_private);
    let id = command.user_id;

    state.commands.send(command).await?;

    Ok(Json(RegisterResponse { success: true, id }))
}

// =========================================================================
// POST /login
// =========================================================================

async fn login(
    State(state): State<UserState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state
        .queries
        .send(LoginQuery::new(request.email, request.password))
        .await?;

    Ok(Json(LoginResponse { token }))
}

// =========================================================================
// GET /myProfile
// =========================================================================

async fn my_profile(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

// =========================================================================
// GET /viewProfile/:user_id
// =========================================================================

/// Public profiles only; a private account is refused for every caller
async fn view_profile(
    State(state): State<UserState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let id = parse_uuid(&user_id, "user id")?;
    let user = state.queries.send(GetUserProfileByIdQuery::new(id)).await?;

    if user.is_private {
        return Err(AppError::PrivateAccount);
    }

    Ok(Json(user))
}

// =========================================================================
// GET /followUser/:user_id, GET /unfollowUser/:user_id
// =========================================================================

async fn follow_user(
    State(state): State<UserState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let target = parse_uuid(&user_id, "user id")?;
    state
        .commands
        .send(FollowOrUnfollowUserCommand::follow(caller.id, target))
        .await?;
    Ok(SuccessResponse::ok())
}

async fn unfollow_user(
    State(state): State<UserState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let target = parse_uuid(&user_id, "user id")?;
    state
        .commands
        .send(FollowOrUnfollowUserCommand::unfollow(caller.id, target))
        .await?;
    Ok(SuccessResponse::ok())
}

// =========================================================================
// GET|POST /updateMyAccount
// =========================================================================

async fn update_my_account(
    State(state): State<UserState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<UpdateAccountRequest>,
) -> AppResult<Json<UpdateAccountResponse>> {
    if parse_uuid(&request.id, "user id")? != caller.id {
        return Err(AppError::Forbidden(
            "you can only update your own account".to_string(),
        ));
    }

    let changes = AccountChanges {
        full_name: request.full_name,
        email: request.email,
        is_private: request.is_private,
    };
    state
        .commands
        .send(UpdateAccountCommand::new(caller.id, changes))
        .await?;

    let user = state
        .queries
        .send(GetUserProfileByIdQuery::new(caller.id))
        .await?;

    Ok(Json(UpdateAccountResponse {
        success: true,
        user,
    }))
}

// =========================================================================
// POST /uploadProfile
// =========================================================================

async fn upload_profile(
    State(state): State<UserState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadProfileResponse>> {
    let mut form = MultipartForm::read(multipart).await?;
    let profile = form
        .take_file("profile", "")
        .ok_or_else(|| AppError::InvalidRequest("profile is required".to_string()))?;

    let profile_url = state.profiles.put(profile).await?;

    state
        .commands
        .send(SetProfileImageCommand::new(caller.id, profile_url.clone()))
        .await?;

    tracing::info!(user_id = %caller.id, profile_url = %profile_url, "Profile image updated");
    Ok(Json(UploadProfileResponse {
        success: true,
        profile_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{ "fullName": "Ada", "gender": "female", "email": "ada@example.com", "password": "pw" }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(!request.is_private);

        let request: RegisterRequest = serde_json::from_str(
            r#"{ "fullName": "Ada", "gender": "female", "email": "not-an-email", "password": "pw" }"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: RegisterRequest =
            serde_json::from_str(r#"{ "email": "ada@example.com" }"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_account_request_optional_fields() {
        let request: UpdateAccountRequest =
            serde_json::from_str(r#"{ "id": "abc", "isPrivate": true }"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.is_private, Some(true));
        assert!(request.full_name.is_none());

        let request: UpdateAccountRequest =
            serde_json::from_str(r#"{ "id": "abc", "email": "nope" }"#).unwrap();
        assert!(request.validate().is_err());
    }
}
