use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use forum::config::{Cli, Config};
use forum::db::{self, SqliteForumRepository};
use forum::routes;
use forum::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting forum");

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.database)?;
    db::run_migrations(&pool)?;

    // Build app state
    let store = SqliteForumRepository::new(pool, config.request_timeout());
    let state = AppState {
        store: Arc::new(store),
        config: config.clone(),
    };

    tracing::info!("Serving static files from {}", config.static_dir().display());
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.listen_address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
