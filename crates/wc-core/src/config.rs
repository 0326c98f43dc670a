use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub query: QueryPolicy,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the vector database lives and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Fallback endpoint used until a reconnect sets one explicitly.
    pub default_url: Option<String>,
    /// Bearer credential attached to every request when present.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Upper bound for the reachability and metadata probes of a reconnect.
    pub probe_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            api_key: None,
            probe_timeout_ms: 5000,
        }
    }
}

/// Paging and sorting policy applied to object reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPolicy {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Only accept sort directives on date-typed properties.
    pub sort_requires_date: bool,
    /// In-flight aggregate count probes while listing collections.
    pub count_concurrency: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 250,
            sort_requires_date: true,
            count_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Reserved name of the demo collection.
    pub collection: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            collection: "TestCollection".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}
