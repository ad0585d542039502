//! Bulk persistence of fetched characters

use crate::storage::{CharacterStorage, NewCharacter, StorageResult};
use std::time::Instant;

/// Writes fetched characters in a single bulk operation
///
/// Records whose `api_id` is already stored, or repeated within
/// `characters`, are skipped silently. An empty slice never touches storage.
///
/// # Returns
///
/// The number of newly inserted rows
pub fn persist_characters<S>(
    storage: &mut S,
    characters: &[NewCharacter],
    batch_size: usize,
) -> StorageResult<usize>
where
    S: CharacterStorage + ?Sized,
{
    if characters.is_empty() {
        tracing::debug!("No characters to save");
        return Ok(0);
    }

    let start = Instant::now();
    let inserted = storage.insert_ignoring_conflicts(characters, batch_size)?;

    tracing::info!(
        received = characters.len(),
        inserted,
        skipped = characters.len() - inserted,
        "Saved characters in {:.3}s",
        start.elapsed().as_secs_f64()
    );

    Ok(inserted)
}
