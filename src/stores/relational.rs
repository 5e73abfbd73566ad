//! Embedded key-value table (`state.vscdb`).
//!
//! The database is optional: when the file does not exist nothing is created
//! and the update reports [`RelationalUpdate::Absent`].

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde_json::Value;

use crate::identity::Identity;
use crate::stores::StoreError;
use crate::stores::document::KEY_PREFIX;

/// Name of the key-value table.
pub const TABLE: &str = "ItemTable";

/// Alias read by another part of the target application; carries `devDeviceId`.
pub const SERVICE_MACHINE_ID_KEY: &str = "storage.serviceMachineId";

/// Outcome of a relational update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalUpdate {
    /// Number of rows upserted.
    Written(usize),
    Absent,
}

/// Key-value table inside an `SQLite` database file.
#[derive(Debug, Clone)]
pub struct RelationalStore {
    path: PathBuf,
}

impl RelationalStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Keys and JSON-encoded values written for `identity`.
    #[must_use]
    pub fn rows(identity: &Identity) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = identity
            .fields()
            .iter()
            .map(|(name, value)| (format!("{KEY_PREFIX}{name}"), encode(value)))
            .collect();
        rows.push((SERVICE_MACHINE_ID_KEY.to_string(), encode(&identity.dev_device_id)));
        rows
    }

    /// Upsert every identity row in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if the database cannot be opened or written.
    /// A missing database file is not an error.
    pub fn update(&self, identity: &Identity) -> Result<RelationalUpdate, StoreError> {
        if !self.exists() {
            return Ok(RelationalUpdate::Absent);
        }

        let mut connection = self.open()?;
        let tx = connection.transaction().map_err(|e| self.sqlite_error(&e))?;

        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);"
        ))
        .map_err(|e| self.sqlite_error(&e))?;

        let rows = Self::rows(identity);
        for (key, value) in &rows {
            tx.execute(
                &format!("INSERT OR REPLACE INTO {TABLE} (key, value) VALUES (?1, ?2)"),
                params![key, value],
            )
            .map_err(|e| self.sqlite_error(&e))?;
        }

        tx.commit().map_err(|e| self.sqlite_error(&e))?;
        Ok(RelationalUpdate::Written(rows.len()))
    }

    /// Raw stored value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathNotFound` if the database does not exist, or
    /// `StoreError::Sqlite` if it cannot be queried.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if !self.exists() {
            return Err(StoreError::PathNotFound(self.path.display().to_string()));
        }

        let connection = self.open()?;
        connection
            .query_row(
                &format!("SELECT value FROM {TABLE} WHERE key = ?1"),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| self.sqlite_error(&e))
    }

    fn open(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.sqlite_error(&e))
    }

    fn sqlite_error(&self, err: &rusqlite::Error) -> StoreError {
        StoreError::Sqlite(format!("{}: {err}", self.path.display()))
    }
}

/// Encode a string the way the document store does: as a quoted JSON string.
fn encode(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Decode a value written by [`encode`]. Non-JSON values are returned verbatim.
#[must_use]
pub fn decode(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(s)) => s,
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_db(temp: &TempDir) -> RelationalStore {
        let path = temp.path().join("state.vscdb");
        let connection = Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);
                 INSERT INTO ItemTable VALUES ('telemetry.machineId', '\"old\"');
                 INSERT INTO ItemTable VALUES ('workbench.panel', '{\"open\":true}');",
            )
            .unwrap();
        RelationalStore::new(path)
    }

    #[test]
    fn absent_database_is_skipped() {
        let temp = TempDir::new().unwrap();
        let store = RelationalStore::new(temp.path().join("state.vscdb"));

        let outcome = store.update(&Identity::generate()).unwrap();

        assert_eq!(outcome, RelationalUpdate::Absent);
        assert!(!store.exists());
    }

    #[test]
    fn upserts_all_rows() {
        let temp = TempDir::new().unwrap();
        let store = seeded_db(&temp);
        let identity = Identity::generate();

        let outcome = store.update(&identity).unwrap();

        assert_eq!(outcome, RelationalUpdate::Written(5));
        let machine_id = store.get("telemetry.machineId").unwrap().unwrap();
        assert_eq!(machine_id, format!("\"{}\"", identity.machine_id));
        assert_eq!(decode(&machine_id), identity.machine_id);
        let alias = store.get(SERVICE_MACHINE_ID_KEY).unwrap().unwrap();
        assert_eq!(decode(&alias), identity.dev_device_id);
    }

    #[test]
    fn other_rows_are_untouched() {
        let temp = TempDir::new().unwrap();
        let store = seeded_db(&temp);

        store.update(&Identity::generate()).unwrap();

        assert_eq!(
            store.get("workbench.panel").unwrap().as_deref(),
            Some("{\"open\":true}")
        );
    }

    #[test]
    fn missing_table_is_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.vscdb");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 1;")
            .unwrap();
        let store = RelationalStore::new(path);
        let identity = Identity::generate();

        store.update(&identity).unwrap();

        assert_eq!(
            store.get("telemetry.sqmId").unwrap().map(|v| decode(&v)),
            Some(identity.sqm_id)
        );
    }

    #[test]
    fn garbage_file_is_a_database_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.vscdb");
        std::fs::write(&path, "not a database ".repeat(512)).unwrap();

        let err = RelationalStore::new(path)
            .update(&Identity::generate())
            .unwrap_err();

        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn decode_passes_through_non_json() {
        assert_eq!(decode("plain"), "plain");
        assert_eq!(decode("\"quoted\""), "quoted");
    }
}
