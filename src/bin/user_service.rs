//! User service
//!
//! Accounts in a relational table behind a command/query bus, with profile
//! images served under `/profiles`.

use std::sync::Arc;

use music_sharing::auth::{PasswordService, TokenService};
use music_sharing::media::LocalMediaStore;
use music_sharing::users::{self, PgUserStore, UserServices, UserState, PROFILE_URL_PREFIX};
use music_sharing::{db, server, Config, ServiceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    server::init_tracing();

    let config = Config::from_env(ServiceKind::User)?;

    tracing::info!(environment = %config.environment, "Starting user service");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;
    db::migrate(&pool, ServiceKind::User).await?;
    tracing::info!("Database connected successfully");

    tokio::fs::create_dir_all(&config.profile_dir).await?;

    let services = UserServices::new(
        Arc::new(PgUserStore::new(pool.clone())),
        TokenService::new(&config.jwt_secret, config.jwt_ttl_secs),
        PasswordService::new(),
    );
    let (commands, queries) = users::buses(services);

    let state = UserState {
        commands,
        queries,
        profiles: Arc::new(LocalMediaStore::new(&config.profile_dir, PROFILE_URL_PREFIX)),
    };

    let app = users::build_app(state, &config.profile_dir);
    server::serve(app, &config).await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}
