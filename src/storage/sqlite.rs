//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CharacterStorage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CharacterStorage, StorageError, StorageResult};
use crate::storage::{CharacterRecord, NewCharacter, RunStatus, SyncRunRecord};
use crate::SyncError;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const CHARACTER_COLUMNS: &str = "id, api_id, name, status, species, gender, image, created_at";

const INSERT_PREFIX: &str = "INSERT OR IGNORE INTO characters \
     (api_id, name, name_folded, status, species, gender, image, created_at) VALUES ";

const ROW_PLACEHOLDER: &str = "(?, ?, ?, ?, ?, ?, ?, ?)";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and ensures the schema exists
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SyncError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Folds a name for case-insensitive matching
///
/// SQLite's LIKE only folds ASCII, so names are lowercased here and matched
/// against the `name_folded` column.
fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Builds a LIKE pattern that matches `name` as a literal substring of the
/// folded name
fn like_pattern(name: &str) -> String {
    let escaped = fold_name(name)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<CharacterRecord> {
    Ok(CharacterRecord {
        id: row.get(0)?,
        api_id: row.get(1)?,
        name: row.get(2)?,
        status: row.get(3)?,
        species: row.get(4)?,
        gender: row.get(5)?,
        image: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl CharacterStorage for SqliteStorage {
    // ===== Characters =====

    fn insert_ignoring_conflicts(
        &mut self,
        characters: &[NewCharacter],
        batch_size: usize,
    ) -> StorageResult<usize> {
        if characters.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        for chunk in characters.chunks(batch_size.max(1)) {
            let sql = format!(
                "{}{}",
                INSERT_PREFIX,
                vec![ROW_PLACEHOLDER; chunk.len()].join(", ")
            );

            let folded: Vec<String> = chunk.iter().map(|c| fold_name(&c.name)).collect();
            let values = chunk.iter().zip(&folded).flat_map(|(c, name_folded)| {
                [
                    c.api_id.as_str(),
                    c.name.as_str(),
                    name_folded.as_str(),
                    c.status.as_str(),
                    c.species.as_str(),
                    c.gender.as_str(),
                    c.image.as_str(),
                    now.as_str(),
                ]
            });

            inserted += tx.execute(&sql, params_from_iter(values))?;
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn count_characters(&self, name_filter: Option<&str>) -> StorageResult<u64> {
        let pattern = name_filter.map(like_pattern);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM characters WHERE (?1 IS NULL OR name_folded LIKE ?1 ESCAPE '\\')",
            params![pattern],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_characters(
        &self,
        name_filter: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> StorageResult<Vec<CharacterRecord>> {
        let pattern = name_filter.map(like_pattern);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM characters
             WHERE (?1 IS NULL OR name_folded LIKE ?1 ESCAPE '\\')
             ORDER BY id LIMIT ?2 OFFSET ?3",
            CHARACTER_COLUMNS
        ))?;

        let characters = stmt
            .query_map(
                params![pattern, i64::from(limit), offset as i64],
                character_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(characters)
    }

    fn random_character(&self) -> StorageResult<Option<CharacterRecord>> {
        let character = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM characters ORDER BY RANDOM() LIMIT 1",
                    CHARACTER_COLUMNS
                ),
                [],
                character_from_row,
            )
            .optional()?;
        Ok(character)
    }

    // ===== Sync Runs =====

    fn create_sync_run(&mut self) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sync_runs (started_at, status) VALUES (?1, ?2)",
            params![now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_sync_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        fetched: u64,
        inserted: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sync_runs SET status = ?1, finished_at = ?2, fetched = ?3, inserted = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                fetched as i64,
                inserted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn recent_sync_runs(&self, limit: u32) -> StorageResult<Vec<SyncRunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, status, fetched, inserted
             FROM sync_runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![i64::from(limit)], |row| {
                Ok(SyncRunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(RunStatus::Failed),
                    fetched: row.get::<_, i64>(4)? as u64,
                    inserted: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
