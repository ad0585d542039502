//! Character-Sync: a GraphQL character scraper with a small read API
//!
//! This crate periodically pulls character records from a paginated GraphQL
//! source, stores them in SQLite, and serves them back over HTTP.

pub mod config;
pub mod output;
pub mod server;
pub mod storage;
pub mod sync;

use thiserror::Error;

/// Main error type for Character-Sync setup and serving
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a single page from the GraphQL source
///
/// These never escape a sync run; the fetcher logs them and degrades the
/// affected page to an empty contribution.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error for page {page}: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for page {page}: {body}")]
    Status { page: u32, status: u16, body: String },

    #[error("GraphQL errors for page {page}: {errors}")]
    GraphQl {
        page: u32,
        errors: serde_json::Value,
    },

    #[error("No 'data' key in response for page {page}")]
    MissingData { page: u32 },

    #[error("Malformed response for page {page}: {message}")]
    Malformed { page: u32, message: String },
}

impl FetchError {
    /// The page number the failed request was for
    pub fn page(&self) -> u32 {
        match self {
            Self::Transport { page, .. }
            | Self::Status { page, .. }
            | Self::GraphQl { page, .. }
            | Self::MissingData { page }
            | Self::Malformed { page, .. } => *page,
        }
    }
}

/// Result type alias for Character-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use storage::{CharacterStorage, SqliteStorage};
pub use sync::{sync_characters, CharacterFetcher, NewCharacter, SyncReport};
