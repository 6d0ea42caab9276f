//! feed-pager: paginated feed cache with prefetching.
//!
//! Opens one paginator against a remote feed API and exposes its state and
//! navigation controls over HTTP, so a view layer (or curl) can page through
//! the feed:
//!   view → HTTP control API → paginator → page cache / remote feed API

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use feed_pager::config::{Cli, Config};
use feed_pager::fetch::source::HttpPageSource;
use feed_pager::paginator::Paginator;
use feed_pager::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "feed_pager=debug,tower_http=debug"
    } else {
        "feed_pager=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("feed-pager v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);
    config.validate()?;
    let config = Arc::new(config);

    info!(
        base_url = %config.source.base_url,
        endpoint = %config.server.initial_endpoint,
        page_size = config.paginator.page_size,
        "Configuration loaded"
    );

    info!(
        capacity = config.cache.capacity,
        ttl_secs = config.cache.ttl_secs,
        prefetch = config.prefetch.enabled,
        prefetch_delay_ms = config.prefetch.delay_ms,
        "Page cache settings"
    );

    // Open the paginator on the initial endpoint.
    let source = HttpPageSource::<serde_json::Value>::new(&config.source)?;
    let paginator = Paginator::open(source, config.server.initial_endpoint.clone(), &config);

    // Build application state.
    let state = Arc::new(AppState {
        paginator: paginator.clone(),
        config: config.clone(),
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = %listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    paginator.close();
    info!("Shut down");

    Ok(())
}
