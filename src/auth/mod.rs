//! Authentication module
//!
//! Bearer token signing/verification and password hashing.

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordService};
pub use token::{extract_bearer_token, TokenError, TokenService, UserClaims};
