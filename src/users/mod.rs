//! User service
//!
//! Accounts in a relational table behind a command/query bus. Registration,
//! login, public profiles and the liveness check are open; everything else
//! resolves the bearer token to the caller's row first.

pub mod bus;
pub mod commands;
pub mod model;
pub mod queries;
pub mod routes;
pub mod store;

use std::path::Path;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::services::ServeDir;

use crate::server::with_http_layers;

pub use bus::{buses, Command, CommandBus, Query, QueryBus, UserServices};
pub use model::{AccountChanges, FollowAction, FollowOutcome, User};
pub use routes::{CurrentUser, UserState};
pub use store::{InMemoryUserStore, PgUserStore, UserStore};

/// URL prefix profile images are served under
pub const PROFILE_URL_PREFIX: &str = "/profiles";

/// Largest accepted request body (profile images)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build the complete user service application
pub fn build_app(state: UserState, profile_dir: &Path) -> Router {
    let router = routes::create_router(state.clone())
        .nest_service(PROFILE_URL_PREFIX, ServeDir::new(profile_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    with_http_layers(router)
}
