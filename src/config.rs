//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Which of the two services is being configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Music,
    User,
}

impl ServiceKind {
    /// Service-specific database URL variable, checked before `DATABASE_URL`
    fn database_url_env(self) -> &'static str {
        match self {
            ServiceKind::Music => "MUSIC_DATABASE_URL",
            ServiceKind::User => "USER_DATABASE_URL",
        }
    }

    fn default_port(self) -> &'static str {
        match self {
            ServiceKind::Music => "3000",
            ServiceKind::User => "3001",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Shared HMAC secret for bearer tokens
    pub jwt_secret: String,

    /// Lifetime of issued tokens
    pub jwt_ttl_secs: u64,

    /// Directory for uploaded music files and posters
    pub media_dir: PathBuf,

    /// Directory for uploaded profile images
    pub profile_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env(service: ServiceKind) -> Result<Self, ConfigError> {
        let database_url = env::var(service.database_url_env())
            .or_else(|_| env::var("DATABASE_URL"))
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| service.default_port().to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingEnv("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET"));
        }

        let jwt_ttl_secs = env::var("JWT_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("JWT_TTL_SECS"))?;

        let media_dir = env::var("MEDIA_DIR")
            .unwrap_or_else(|_| "./static/media".to_string())
            .into();

        let profile_dir = env::var("PROFILE_DIR")
            .unwrap_or_else(|_| "./static/profiles".to_string())
            .into();

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            jwt_ttl_secs,
            media_dir,
            profile_dir,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
