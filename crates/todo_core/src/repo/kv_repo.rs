//! Key-value persistence backends.
//!
//! # Responsibility
//! - Provide `get`/`set` over string keys and values.
//! - Offer a SQLite implementation for real use and an in-memory one for
//!   tests and ephemeral sessions.
//!
//! # Invariants
//! - `set` replaces the whole value stored under a key.

use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Key-value storage contract used for state persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed key-value store over the `kv_store` table.
///
/// The connection must come from `open_db`/`open_db_in_memory` so the
/// schema is in place.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryEntries {
    values: HashMap<String, String>,
    writes: usize,
    fail_writes: bool,
}

/// In-memory key-value store.
///
/// Clones share the same entries, so a test can keep one handle while the
/// store owns another, and reopen a fresh store over the same data to
/// simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Rc<RefCell<MemoryEntries>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls across all handles.
    pub fn write_count(&self) -> usize {
        self.entries.borrow().writes
    }

    /// Makes subsequent writes fail with `RepoError::Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.entries.borrow_mut().fail_writes = fail;
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        let mut entries = self.entries.borrow_mut();
        if entries.fail_writes {
            return Err(RepoError::Unavailable(format!(
                "writes disabled for key `{key}`"
            )));
        }
        entries.values.insert(key.to_string(), value.to_string());
        entries.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKeyValueStore};
    use crate::repo::RepoError;

    #[test]
    fn memory_store_shares_entries_between_clones() {
        let store = MemoryKeyValueStore::new();
        let handle = store.clone();

        store.set("k", "v1").expect("write should succeed");
        store.set("k", "v2").expect("overwrite should succeed");

        assert_eq!(handle.get("k").expect("read should succeed"), Some("v2".to_string()));
        assert_eq!(handle.write_count(), 2);
        assert_eq!(handle.get("missing").expect("read should succeed"), None);
    }

    #[test]
    fn memory_store_can_reject_writes() {
        let store = MemoryKeyValueStore::new();
        store.fail_writes(true);

        let err = store.set("k", "v").expect_err("write should fail");
        assert!(matches!(err, RepoError::Unavailable(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get("k").expect("read should succeed"), None);
    }
}
