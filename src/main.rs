use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_river::aggregator::Aggregator;
use news_river::cache::TtlCache;
use news_river::config::Config;
use news_river::fetcher::Fetcher;
use news_river::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_river=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("feeds.toml")?;
    let registry = config.registry();
    info!("Loaded {} sources from configuration", registry.len());

    // Create the aggregation pipeline; the cache lives for the whole
    // process and is shared by every request
    let aggregator = Aggregator::new(Arc::new(Fetcher::new()), registry);
    let cache = TtlCache::new(Duration::from_secs(config.cache_ttl));

    let state = Arc::new(AppState {
        aggregator,
        cache,
        page_size: config.page_size,
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server starting on http://localhost:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
