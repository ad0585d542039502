//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CharacterRecord, NewCharacter, RunStatus, SyncRunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sync run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The sync pipeline only ever writes through [`insert_ignoring_conflicts`],
/// and the HTTP API only ever reads.
///
/// [`insert_ignoring_conflicts`]: CharacterStorage::insert_ignoring_conflicts
pub trait CharacterStorage {
    // ===== Characters =====

    /// Inserts all characters in one bulk write, skipping conflicts
    ///
    /// A character whose `api_id` already exists in storage, or appears
    /// earlier in the same slice, is skipped without error.
    ///
    /// # Arguments
    ///
    /// * `characters` - The records to insert
    /// * `batch_size` - Maximum rows per INSERT statement
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_ignoring_conflicts(
        &mut self,
        characters: &[NewCharacter],
        batch_size: usize,
    ) -> StorageResult<usize>;

    /// Counts characters, optionally filtered by case-insensitive name substring
    fn count_characters(&self, name_filter: Option<&str>) -> StorageResult<u64>;

    /// Lists characters ordered by local id
    fn list_characters(
        &self,
        name_filter: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> StorageResult<Vec<CharacterRecord>>;

    /// Picks one stored character uniformly at random
    fn random_character(&self) -> StorageResult<Option<CharacterRecord>>;

    // ===== Sync Runs =====

    /// Records the start of a sync run and returns its ID
    fn create_sync_run(&mut self) -> StorageResult<i64>;

    /// Records the outcome of a sync run
    fn finish_sync_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        fetched: u64,
        inserted: u64,
    ) -> StorageResult<()>;

    /// Gets the most recent sync runs, newest first
    fn recent_sync_runs(&self, limit: u32) -> StorageResult<Vec<SyncRunRecord>>;
}
