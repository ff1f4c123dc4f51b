//! SQLite registry of standup entities.
//!
//! The single source of truth: no in-process cache, every mutation path
//! reads then writes the full entity. Entities are stored as JSON
//! documents alongside their key columns. Uses WAL mode.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::model::Standup;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a standup already exists for this group")]
    AlreadyExists,
    #[error("no standup for this group")]
    NotFound,
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Registry handle wrapping a SQLite connection.
pub struct StandupStore {
    db: Mutex<Connection>,
}

impl StandupStore {
    /// Open (or create) the registry database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        let store = Self { db: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory registry (for testing).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        let store = Self { db: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        db.execute_batch(
            "PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS standups (
                group_id      TEXT PRIMARY KEY,
                channel_id    TEXT NOT NULL,
                document_json TEXT NOT NULL,
                created_at    TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a fresh entity (empty roster, no responses) for the group.
    /// Fails with [`StoreError::AlreadyExists`] if the group already has one.
    pub fn create(
        &self,
        group_id: &str,
        report_channel_id: &str,
    ) -> Result<Standup, StoreError> {
        let standup = Standup::new(group_id, report_channel_id);
        let json = serde_json::to_string(&standup)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let db = self.db.lock().unwrap();
        let exists = db
            .query_row(
                "SELECT 1 FROM standups WHERE group_id = ?1",
                params![group_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::AlreadyExists);
        }

        db.execute(
            "INSERT INTO standups (group_id, channel_id, document_json) VALUES (?1, ?2, ?3)",
            params![group_id, report_channel_id, json],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(standup)
    }

    /// Fetch the entity for a group.
    pub fn get(&self, group_id: &str) -> Result<Standup, StoreError> {
        let db = self.db.lock().unwrap();
        let json: Option<String> = db
            .query_row(
                "SELECT document_json FROM standups WHERE group_id = ?1",
                params![group_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match json {
            Some(j) => {
                serde_json::from_str(&j).map_err(|e| StoreError::Serialization(e.to_string()))
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Snapshot of every stored entity, oldest first.
    pub fn list_all(&self) -> Result<Vec<Standup>, StoreError> {
        let db = self.db.lock().unwrap();
        let mut stmt = db
            .prepare("SELECT document_json FROM standups ORDER BY rowid ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let standups = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .filter_map(|j| serde_json::from_str::<Standup>(&j).ok())
            .collect();

        Ok(standups)
    }

    /// Fully overwrite the stored entity for its group id. Fails with
    /// [`StoreError::NotFound`] when the row no longer exists (the group
    /// was deleted concurrently).
    pub fn save(&self, standup: &Standup) -> Result<(), StoreError> {
        let json = serde_json::to_string(standup)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let db = self.db.lock().unwrap();
        let n = db
            .execute(
                "UPDATE standups SET channel_id = ?2, document_json = ?3 WHERE group_id = ?1",
                params![standup.group_id, standup.report_channel_id, json],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if n == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Remove a group's entity. Idempotent — absent rows are not an error.
    pub fn delete(&self, group_id: &str) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "DELETE FROM standups WHERE group_id = ?1",
            params![group_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    /// Every standup whose roster contains the member.
    pub fn find_for_member(&self, member_id: &str) -> Result<Vec<Standup>, StoreError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|s| s.is_member(member_id))
            .collect())
    }
}
