//! Command-line configuration.
//!
//! Every option can also come from the environment (or a `.env` file). Values
//! given on the command line override those in `--config`, which override the
//! built-in defaults.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use wc_core::ConsoleConfig;

use crate::TRACING_TARGET_CONFIG;

#[derive(Debug, Clone, Parser)]
#[command(name = "wc-server")]
#[command(about = "Web console for browsing a vector database")]
#[command(version)]
pub struct Cli {
    /// JSON file with a full or partial console configuration.
    #[arg(long, env = "WC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service URL used until the first reconnect.
    #[arg(long, env = "WEAVIATE_URL")]
    pub weaviate_url: Option<String>,

    /// API key sent as a bearer token.
    #[arg(long, env = "WEAVIATE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Rows per page when the request does not say.
    #[arg(long, env = "WC_PAGE_SIZE")]
    pub page_size: Option<usize>,

    #[arg(long, env = "WC_MAX_PAGE_SIZE")]
    pub max_page_size: Option<usize>,

    /// Allow sorting on any property, not only dates.
    #[arg(long, env = "WC_ALLOW_ANY_SORT")]
    pub allow_any_sort: bool,

    /// Parallel count queries when listing collections.
    #[arg(long, env = "WC_COUNT_CONCURRENCY")]
    pub count_concurrency: Option<usize>,

    #[arg(long, env = "WC_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Name of the demo collection created by the seed action.
    #[arg(long, env = "WC_SEED_COLLECTION")]
    pub seed_collection: Option<String>,
}

impl Cli {
    /// Loads `.env` (if present) before parsing so clap sees its variables.
    pub fn init() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                eprintln!("Warning: failed to load .env file: {err}");
            }
        }
        Self::parse()
    }

    /// Builds the console configuration.
    pub fn console_config(&self) -> anyhow::Result<ConsoleConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => ConsoleConfig::default(),
        };

        if let Some(url) = &self.weaviate_url {
            config.service.default_url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            config.service.api_key = Some(key.clone());
        }
        if let Some(timeout) = self.probe_timeout_ms {
            config.service.probe_timeout_ms = timeout;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(size) = self.page_size {
            config.query.default_limit = size;
        }
        if let Some(max) = self.max_page_size {
            config.query.max_limit = max;
        }
        if self.allow_any_sort {
            config.query.sort_requires_date = false;
        }
        if let Some(n) = self.count_concurrency {
            config.query.count_concurrency = n;
        }
        if let Some(name) = &self.seed_collection {
            config.seed.collection = name.clone();
        }

        anyhow::ensure!(
            config.query.default_limit >= 1 && config.query.default_limit <= config.query.max_limit,
            "page size {} must be between 1 and the maximum page size {}",
            config.query.default_limit,
            config.query.max_limit
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            default_url = config.service.default_url.as_deref().unwrap_or("<unset>"),
            authenticated = config.service.api_key.is_some(),
            host = %config.server.host,
            port = config.server.port,
            page_size = config.query.default_limit,
            max_page_size = config.query.max_limit,
            sort_requires_date = config.query.sort_requires_date,
            "console configuration"
        );

        Ok(config)
    }
}
