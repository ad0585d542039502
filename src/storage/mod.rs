//! Storage module for persisting character data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Conflict-ignoring bulk insertion of scraped characters
//! - Filtered, paginated and random reads for the HTTP API
//! - Sync run bookkeeping

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CharacterStorage, StorageError, StorageResult};

use serde::{Deserialize, Deserializer, Serialize};

/// A character as delivered by the upstream source, ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCharacter {
    /// The upstream identifier, used as the uniqueness key
    #[serde(deserialize_with = "deserialize_external_id")]
    pub api_id: String,
    pub name: String,
    pub status: String,
    pub species: String,
    pub gender: String,
    pub image: String,
}

/// A stored character row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterRecord {
    pub id: i64,
    pub api_id: String,
    pub name: String,
    pub status: String,
    pub species: String,
    pub gender: String,
    pub image: String,
    #[serde(skip_serializing)]
    pub created_at: String,
}

/// Represents one sync invocation
#[derive(Debug, Clone)]
pub struct SyncRunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub fetched: u64,
    pub inserted: u64,
}

/// Status of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Accepts the upstream id either as a JSON string or a JSON integer
fn deserialize_external_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            let parsed = RunStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_new_character_accepts_string_and_numeric_ids() {
        let from_string: NewCharacter = serde_json::from_str(
            r#"{"api_id":"7","name":"Abradolf Lincler","status":"unknown","species":"Human","gender":"Male","image":"u7"}"#,
        )
        .unwrap();
        assert_eq!(from_string.api_id, "7");

        let from_number: NewCharacter = serde_json::from_str(
            r#"{"api_id":8,"name":"Adjudicator Rick","status":"Dead","species":"Human","gender":"Male","image":"u8"}"#,
        )
        .unwrap();
        assert_eq!(from_number.api_id, "8");
    }

    #[test]
    fn test_character_record_hides_created_at() {
        let record = CharacterRecord {
            id: 1,
            api_id: "1".to_string(),
            name: "Rick Sanchez".to_string(),
            status: "Alive".to_string(),
            species: "Human".to_string(),
            gender: "Male".to_string(),
            image: "u1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["api_id"], "1");
        assert_eq!(json["name"], "Rick Sanchez");
        assert!(json.get("created_at").is_none());
    }
}
