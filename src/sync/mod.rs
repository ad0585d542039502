//! Sync module: scrape the GraphQL source and persist the results
//!
//! This module contains:
//! - The GraphQL query template and response parsing
//! - The paginated, partially failure-tolerant fetcher
//! - The conflict-ignoring bulk persister
//! - The end-to-end sync entry points

mod fetcher;
mod persister;
mod query;

pub use fetcher::{build_http_client, CharacterFetcher};
pub use persister::persist_characters;
pub use query::{
    parse_page_response, CharactersPage, GraphQlRequest, PageInfo, PageVariables,
    GET_CHARACTERS_QUERY,
};

pub use crate::storage::NewCharacter;

use crate::config::Config;
use crate::storage::{CharacterStorage, RunStatus, SqliteStorage};
use crate::SyncError;
use std::path::Path;
use std::time::{Duration, Instant};

/// Outcome of one sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Records returned by the fetcher, duplicates included
    pub fetched: usize,
    /// Rows newly written to storage
    pub inserted: usize,
    pub elapsed: Duration,
}

/// Fetches every character and persists the result, once
///
/// Never fails: fetch and storage errors are logged and show up only as
/// lower counts in the returned report. Sync-run bookkeeping is best effort.
pub async fn sync_characters<S>(
    fetcher: &CharacterFetcher,
    storage: &mut S,
    batch_size: usize,
) -> SyncReport
where
    S: CharacterStorage + ?Sized,
{
    let start = Instant::now();

    let run_id = match storage.create_sync_run() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to record sync run start");
            None
        }
    };

    let characters = fetcher.fetch_all().await;

    let (inserted, status) = match persist_characters(storage, &characters, batch_size) {
        Ok(inserted) => (inserted, RunStatus::Completed),
        Err(e) => {
            tracing::error!(error = %e, "Failed to save characters");
            (0, RunStatus::Failed)
        }
    };

    if let Some(run_id) = run_id {
        if let Err(e) =
            storage.finish_sync_run(run_id, status, characters.len() as u64, inserted as u64)
        {
            tracing::warn!(run_id, error = %e, "Failed to record sync run outcome");
        }
    }

    SyncReport {
        fetched: characters.len(),
        inserted,
        elapsed: start.elapsed(),
    }
}

/// Opens storage and runs one sync with a fetcher scoped to this call
///
/// Only setup can fail (opening the database, building the HTTP client);
/// the sync itself reports through logs.
pub async fn run_sync(config: &Config) -> Result<SyncReport, SyncError> {
    let mut storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
    let fetcher = CharacterFetcher::new(&config.source)?;

    tracing::info!("Syncing characters from {}", fetcher.endpoint());
    let report = sync_characters(&fetcher, &mut storage, config.storage.batch_size).await;

    tracing::info!(
        "Sync finished: {} fetched, {} inserted in {:.3}s",
        report.fetched,
        report.inserted,
        report.elapsed.as_secs_f64()
    );

    Ok(report)
}
