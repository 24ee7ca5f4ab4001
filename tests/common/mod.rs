//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tempfile::TempDir;

use music_sharing::auth::{PasswordService, TokenService};
use music_sharing::media::LocalMediaStore;
use music_sharing::music::{self, InMemoryMusicStore, MusicState, MEDIA_URL_PREFIX};
use music_sharing::users::{self, InMemoryUserStore, UserServices, UserState, PROFILE_URL_PREFIX};

pub const SECRET: &str = "test-secret";

pub const BOUNDARY: &str = "X-TEST-BOUNDARY";

/// Music service over an in-memory catalog
pub struct MusicApp {
    pub router: Router,
    pub store: Arc<InMemoryMusicStore>,
    pub tokens: TokenService,
    pub media_dir: TempDir,
}

pub fn music_app() -> MusicApp {
    let media_dir = TempDir::new().unwrap();
    let store = Arc::new(InMemoryMusicStore::new());
    let tokens = TokenService::new(SECRET, 3600);

    let state = MusicState {
        musics: store.clone(),
        media: Arc::new(LocalMediaStore::new(media_dir.path(), MEDIA_URL_PREFIX)),
        tokens: tokens.clone(),
    };

    MusicApp {
        router: music::build_app(state, media_dir.path()),
        store,
        tokens,
        media_dir,
    }
}

/// User service over an in-memory user table
pub struct UserApp {
    pub router: Router,
    pub store: Arc<InMemoryUserStore>,
    pub tokens: TokenService,
    pub profile_dir: TempDir,
}

pub fn user_app() -> UserApp {
    let profile_dir = TempDir::new().unwrap();
    let store = Arc::new(InMemoryUserStore::new());
    let tokens = TokenService::new(SECRET, 3600);

    let services = UserServices::new(
        store.clone(),
        tokens.clone(),
        PasswordService::with_cost(1024, 1).unwrap(),
    );
    let (commands, queries) = users::buses(services);

    let state = UserState {
        commands,
        queries,
        profiles: Arc::new(LocalMediaStore::new(profile_dir.path(), PROFILE_URL_PREFIX)),
    };

    UserApp {
        router: users::build_app(state, profile_dir.path()),
        store,
        tokens,
        profile_dir,
    }
}

// =========================================================================
// Request helpers
// =========================================================================

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_empty(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// One part of a multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Database
// =========================================================================

/// Pool on `DATABASE_URL` with both services' tables migrated and emptied
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    music_sharing::db::migrate(&pool, music_sharing::ServiceKind::Music)
        .await
        .expect("Failed to migrate music schema");
    music_sharing::db::migrate(&pool, music_sharing::ServiceKind::User)
        .await
        .expect("Failed to migrate user schema");

    sqlx::query("TRUNCATE TABLE musics, users")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
