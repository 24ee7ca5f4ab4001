//! Music service
//!
//! Catalog of music entries kept in a document collection. Every endpoint
//! except the liveness check requires a bearer token; the metadata and
//! poster endpoints additionally require the caller to be the path owner.

pub mod model;
pub mod routes;
pub mod seed;
pub mod store;

use std::path::Path;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::services::ServeDir;

use crate::api::{health_check, middleware::claims_middleware};
use crate::server::with_http_layers;

pub use model::{LikeChange, MetadataChanges, Music};
pub use routes::MusicState;
pub use seed::seed_musics;
pub use store::{InMemoryMusicStore, MusicStore, PgMusicStore};

/// URL prefix uploaded files are served under
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Largest accepted request body (audio uploads)
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the complete music service application
pub fn build_app(state: MusicState, media_dir: &Path) -> Router {
    // route_layer: unknown paths fall through to 404, not 401
    let protected_routes = routes::create_router().route_layer(middleware::from_fn_with_state(
        state.tokens.clone(),
        claims_middleware,
    ));

    let router = Router::new()
        .route("/", get(health_check))
        .merge(protected_routes)
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(media_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    with_http_layers(router)
}
