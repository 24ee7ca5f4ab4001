//! music_sharing library
//!
//! Shared by the `music-service` and `user-service` binaries, and re-exported
//! for integration testing.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod media;
pub mod music;
pub mod server;
pub mod users;

mod error;

pub use config::{Config, ServiceKind};
pub use error::{AppError, AppResult, ErrorResponse};
