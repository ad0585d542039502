use serde::Deserialize;

/// Default GraphQL endpoint of the public character API
pub const DEFAULT_ENDPOINT: &str = "https://rickandmortyapi.com/graphql";

/// Main configuration structure for Character-Sync
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream GraphQL source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// GraphQL endpoint that every page request is POSTed to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// User-Agent header sent with each request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Total request timeout in seconds (transport default when unset)
    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,

    /// Connect timeout in seconds (transport default when unset)
    #[serde(rename = "connect-timeout-secs", default)]
    pub connect_timeout_secs: Option<u64>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Rows per INSERT statement during a bulk write
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,

    /// Page size used when the client does not ask for one
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound for a client-requested page size
    #[serde(rename = "max-page-size", default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: None,
            timeout_secs: None,
            connect_timeout_secs: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_database_path() -> String {
    "./characters.db".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}
