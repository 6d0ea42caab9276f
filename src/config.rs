//! Runtime configuration for feed-pager.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! Every knob is static: page size, cache bounds and prefetch pacing never
//! change while a paginator is running.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "feed-pager", about = "Paginated feed cache with prefetching")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Base URL of the remote feed API (overrides the config file).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Endpoint to open on startup (overrides the config file).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control surface settings.
    pub server: ServerConfig,

    /// Remote page source settings.
    pub source: SourceConfig,

    /// Paging settings.
    pub paginator: PaginatorConfig,

    /// Page cache bounds.
    pub cache: CacheConfig,

    /// Prefetching settings.
    pub prefetch: PrefetchConfig,
}

/// HTTP control surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// Endpoint the paginator opens on startup.
    pub initial_endpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            initial_endpoint: "/posts".to_string(),
        }
    }
}

/// Remote feed API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL that endpoints are appended to.
    pub base_url: String,

    /// Transport-level request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorConfig {
    /// Items requested per page.
    pub page_size: u32,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self { page_size: 15 }
    }
}

/// Page cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached pages.
    pub capacity: usize,

    /// Seconds a cached page stays servable after insertion.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Prefetch pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Warm the next page after every settled foreground load.
    pub enabled: bool,

    /// Extra delay before a prefetch starts. Zero means the prefetch only
    /// yields to already-runnable tasks.
    pub delay_ms: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 0,
        }
    }
}

impl PrefetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(base_url) = &cli.base_url {
            self.source.base_url = base_url.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.server.initial_endpoint = endpoint.clone();
        }
    }

    /// Reject values that would make the cache or paging degenerate.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.paginator.page_size > 0, "paginator.page_size must be positive");
        anyhow::ensure!(self.cache.capacity > 0, "cache.capacity must be positive");
        anyhow::ensure!(self.cache.ttl_secs > 0, "cache.ttl_secs must be positive");
        Ok(())
    }
}
