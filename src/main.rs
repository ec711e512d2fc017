use std::net::SocketAddr;
use anyhow::Context;
use tokio::net::TcpListener;
use token_feed::api::create_router;
use token_feed::app::{build_cache, build_state};
use token_feed::config::loader::AppConfig;
use token_feed::observability::metrics::register_metrics;
use token_feed::observability::tracing::init_tracing;
use token_feed::DEFAULT_APP_ENV;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_APP_ENV.to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_tracing(config.server.log_format);
    register_metrics();
    tracing::info!("Starting token feed ({})", env);

    let cache = build_cache(&config.cache).await;
    let state = build_state(&config, cache).context("building providers")?;

    let broadcaster = state.broadcaster.clone();
    broadcaster.start().await;

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing listen address")?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    broadcaster.stop().await;
    Ok(())
}
