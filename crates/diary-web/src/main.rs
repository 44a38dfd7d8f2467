mod auth;
mod backup;
mod config;
mod error;
mod flash;
mod mail;
mod pages;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use diary_core::services::DatabaseService;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production injects the environment.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("diary_web=info".parse()?),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting diary-web with config: {:?}", config);

    let db = DatabaseService::open_path(&config.database_path)?;
    let state = AppState::from_config(config, db)?;
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("diary-web listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
