use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soc_dashboard::config::Config;
use soc_dashboard::fetcher::Fetcher;
use soc_dashboard::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soc_dashboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load_or_default("dashboard.toml")?;
    info!(
        "Serving feeds '{}' and '{}' (fetch timeout {}s)",
        config.feeds.news.label, config.feeds.cisa.label, config.fetch_timeout_secs
    );

    let fetcher = Arc::new(Fetcher::new(Duration::from_secs(config.fetch_timeout_secs))?);

    let state = Arc::new(AppState {
        feeds: config.feeds.clone(),
        fetcher,
        refresh_interval: config.refresh_interval,
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("SOC Dashboard is running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
