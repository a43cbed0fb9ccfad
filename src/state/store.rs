//! State store and clock collaborators.
//!
//! The engine never reads these directly; [`GameTimer`](super::GameTimer)
//! does the read-modify-write cycle against them.

use std::cell::Cell;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::warn;

use super::record::{StateError, TimerState};
use crate::config::{TimerConfig, DEFAULT_TABLE};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored document failed validation
    #[error("Invalid stored state for {user_id}: {source}")]
    InvalidState {
        user_id: String,
        #[source]
        source: StateError,
    },

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Point lookup and whole-record replace of per-user timer records.
///
/// Both calls succeed or fail atomically. A missing record is `Ok(None)`.
pub trait StateStore {
    fn read(&self, user_id: &str) -> Result<Option<TimerState>, StoreError>;

    fn write(&mut self, user_id: &str, state: &TimerState) -> Result<(), StoreError>;
}

/// In-memory store keeping each record as its persisted JSON document.
///
/// Reads decode and validate the document the same way a database-backed
/// store would.
#[derive(Debug)]
pub struct MemoryStore {
    table: String,
    /// User ID to persisted document
    records: HashMap<String, serde_json::Value>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_table(DEFAULT_TABLE)
    }

    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records: HashMap::new(),
        }
    }

    /// Store on the configured table.
    pub fn from_config(config: &TimerConfig) -> Self {
        Self::with_table(config.table.clone())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Raw persisted document for a user.
    pub fn document(&self, user_id: &str) -> Option<&serde_json::Value> {
        self.records.get(user_id)
    }

    /// Replace a user's raw document without validation (imports, migrations).
    pub fn put_document(&mut self, user_id: impl Into<String>, document: serde_json::Value) {
        self.records.insert(user_id.into(), document);
    }

    pub fn remove(&mut self, user_id: &str) -> Option<serde_json::Value> {
        self.records.remove(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.records.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, user_id: &str) -> Result<Option<TimerState>, StoreError> {
        let Some(document) = self.records.get(user_id) else {
            return Ok(None);
        };

        TimerState::from_json(document.clone())
            .map(Some)
            .map_err(|source| {
                warn!(table = %self.table, user_id, error = %source, "Rejected stored timer record");
                StoreError::InvalidState {
                    user_id: user_id.to_string(),
                    source,
                }
            })
    }

    fn write(&mut self, user_id: &str, state: &TimerState) -> Result<(), StoreError> {
        let document = state.to_json().map_err(|source| StoreError::InvalidState {
            user_id: user_id.to_string(),
            source,
        })?;
        self.records.insert(user_id.to_string(), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::engine;
    use pretty_assertions::assert_eq;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(at(1000));
        assert_eq!(clock.now(), at(1000));

        clock.advance(Duration::milliseconds(500));
        assert_eq!(clock.now(), at(1500));

        clock.set(at(10));
        assert_eq!(clock.now(), at(10));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.table(), DEFAULT_TABLE);
        assert!(store.read("user-1").unwrap().is_none());

        let state = engine::start_turn(None, &"red".into(), at(1000))
            .unwrap()
            .into_updated()
            .unwrap();
        store.write("user-1", &state).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains("user-1"));
        assert_eq!(store.read("user-1").unwrap(), Some(state));
        assert_eq!(
            store.document("user-1").unwrap()["currentTurnStartTime"],
            serde_json::json!(1000)
        );
    }

    #[test]
    fn test_memory_store_rejects_corrupt_document() {
        let mut store = MemoryStore::with_table("timers");
        store.put_document(
            "user-1",
            serde_json::json!({"status": "overtime", "currentPlayer": "red"}),
        );

        let err = store.read("user-1").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidState {
                source: StateError::Malformed(_),
                ..
            }
        ));
        assert!(err.to_string().contains("user-1"));
    }

    #[test]
    fn test_memory_store_from_config() {
        let config = TimerConfig::from_json(r#"{"table": "timers_v2"}"#).unwrap();
        let store = MemoryStore::from_config(&config);
        assert_eq!(store.table(), "timers_v2");

        let store = MemoryStore::from_config(&TimerConfig::default());
        assert_eq!(store.table(), DEFAULT_TABLE);
    }

    #[test]
    fn test_memory_store_remove() {
        let mut store = MemoryStore::new();
        store.write("user-1", &TimerState::new_game()).unwrap();
        assert!(store.remove("user-1").is_some());
        assert!(!store.contains("user-1"));
    }
}
