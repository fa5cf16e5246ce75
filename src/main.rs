use std::sync::Arc;

use microblog_api::config::AppConfig;
use microblog_api::store::PgStore;
use microblog_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microblog_api=debug,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("starting microblog API in {:?} mode", config.environment);

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let store = PgStore::connect(&database_url).await?;

    let port = config.server.port;
    let state = AppState::new(Arc::new(store), config);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
