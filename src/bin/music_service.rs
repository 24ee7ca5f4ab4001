//! Music service
//!
//! Music catalog backed by a JSONB document table, with uploads stored on
//! local disk and served under `/media`.

use std::sync::Arc;

use music_sharing::auth::TokenService;
use music_sharing::media::LocalMediaStore;
use music_sharing::music::{self, MusicState, PgMusicStore, MEDIA_URL_PREFIX};
use music_sharing::{db, server, Config, ServiceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    server::init_tracing();

    let config = Config::from_env(ServiceKind::Music)?;

    tracing::info!(environment = %config.environment, "Starting music service");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;
    db::migrate(&pool, ServiceKind::Music).await?;
    tracing::info!("Database connected successfully");

    let musics = Arc::new(PgMusicStore::new(pool.clone()));
    music::seed_musics(musics.as_ref()).await?;

    tokio::fs::create_dir_all(&config.media_dir).await?;

    let state = MusicState {
        musics,
        media: Arc::new(LocalMediaStore::new(&config.media_dir, MEDIA_URL_PREFIX)),
        tokens: TokenService::new(&config.jwt_secret, config.jwt_ttl_secs),
    };

    let app = music::build_app(state, &config.media_dir);
    server::serve(app, &config).await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}
