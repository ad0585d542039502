//! Statistics generation from the character database
//!
//! This module provides functionality for extracting and displaying
//! sync statistics from the storage layer.

use crate::storage::{CharacterStorage, RunStatus, StorageResult, SyncRunRecord};

/// How many past sync runs the report shows
pub const RECENT_RUN_LIMIT: u32 = 5;

/// Sync statistics summary
#[derive(Debug, Clone)]
pub struct SyncStatistics {
    /// Total number of stored characters
    pub total_characters: u64,

    /// Most recent sync runs, newest first
    pub recent_runs: Vec<SyncRunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn CharacterStorage) -> StorageResult<SyncStatistics> {
    Ok(SyncStatistics {
        total_characters: storage.count_characters(None)?,
        recent_runs: storage.recent_sync_runs(RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SyncStatistics) {
    println!("=== Character Statistics ===\n");

    println!("Stored characters: {}", stats.total_characters);
    println!();

    if stats.recent_runs.is_empty() {
        println!("No sync runs recorded yet");
        return;
    }

    println!("Recent Sync Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} {} [{}] fetched {}, inserted {}{}",
            run.id,
            run.started_at,
            run.status.to_db_string(),
            run.fetched,
            run.inserted,
            run.finished_at
                .as_deref()
                .map(|finished| format!(", finished {}", finished))
                .unwrap_or_default()
        );
    }

    let failed = stats
        .recent_runs
        .iter()
        .filter(|run| run.status == RunStatus::Failed)
        .count();
    if failed > 0 {
        println!("\n{} of the last {} runs failed", failed, stats.recent_runs.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewCharacter, SqliteStorage};

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_sync_run().unwrap();
        storage
            .insert_ignoring_conflicts(
                &[NewCharacter {
                    api_id: "1".to_string(),
                    name: "Rick Sanchez".to_string(),
                    status: "Alive".to_string(),
                    species: "Human".to_string(),
                    gender: "Male".to_string(),
                    image: "u1".to_string(),
                }],
                1000,
            )
            .unwrap();
        storage
            .finish_sync_run(run_id, RunStatus::Completed, 1, 1)
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_characters, 1);
        assert_eq!(stats.recent_runs.len(), 1);
        assert_eq!(stats.recent_runs[0].status, RunStatus::Completed);
    }

    #[test]
    fn test_recent_runs_are_capped() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        for _ in 0..(RECENT_RUN_LIMIT + 3) {
            storage.create_sync_run().unwrap();
        }

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.recent_runs.len(), RECENT_RUN_LIMIT as usize);
    }
}
