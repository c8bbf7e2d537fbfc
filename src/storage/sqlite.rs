use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

use super::{KeyValueStore, StorageError};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        let storage = Self::new(Connection::open(path)?);
        storage.initialize()?;
        tracing::debug!("Opened key-value storage at {}", path.display());
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = Self::new(Connection::open_in_memory()?);
        storage.initialize()?;
        Ok(storage)
    }

    pub fn initialize(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> bool {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        );
        result.unwrap_or(0) > 0
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_key_value_table() {
        let conn = Connection::open_in_memory().unwrap();
        let storage = SqliteStorage::new(conn);

        storage.initialize().unwrap();

        assert!(storage.table_exists("kv"));
    }

    #[test]
    fn loads_nonexistent_key_returns_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();

        assert_eq!(storage.get("calendarEvents").unwrap(), None);
    }

    #[test]
    fn stores_and_overwrites_value() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();

        storage.set("calendarEvents", "[]").unwrap();
        storage.set("calendarEvents", r#"[{"title":"x"}]"#).unwrap();

        assert_eq!(
            storage.get("calendarEvents").unwrap().as_deref(),
            Some(r#"[{"title":"x"}]"#)
        );
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.set("calendarEvents", "[]").unwrap();
        }

        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.get("calendarEvents").unwrap().as_deref(), Some("[]"));
    }
}
