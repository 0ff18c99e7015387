mod config;
mod error;
mod routes;
mod session;
mod store;

use std::sync::Arc;

use config::AppConfig;
use routes::{app_router, AppState};
use store::SqliteSessionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rigsheet_api=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting rigsheet-api with config: {:?}", config);

    let store = Arc::new(SqliteSessionStore::open(&config.db_path)?);
    let state = AppState::new(config.clone(), store);
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("rigsheet-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
