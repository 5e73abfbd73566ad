//! Single-value marker file (`machineid`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::stores::{StoreError, ensure_parent};

/// A file whose whole content is one identifier.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file's content with `value`, no trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an I/O variant of `StoreError` if the directory or file cannot be
    /// written.
    pub fn update(&self, value: &str) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, value).map_err(|e| StoreError::from_io("write", &self.path, &e))
    }

    /// Current value, or `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O variant of `StoreError` if the file exists but cannot be read.
    pub fn read(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(|s| Some(s.trim().to_string()))
            .map_err(|e| StoreError::from_io("read", &self.path, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn overwrites_existing_content() {
        let temp = TempDir::new().unwrap();
        let store = FlatFileStore::new(temp.path().join("machineid"));
        fs::write(store.path(), "old-value\nwith extra lines\n").unwrap();

        store.update("new-value").unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), "new-value");
    }

    #[test]
    fn creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let store = FlatFileStore::new(temp.path().join("Cursor/machineid"));

        store.update("abc").unwrap();

        assert_eq!(store.read().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let store = FlatFileStore::new(temp.path().join("machineid"));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn directory_in_the_way_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("machineid");
        fs::create_dir(&path).unwrap();

        let err = FlatFileStore::new(path).update("abc").unwrap_err();

        assert!(!matches!(err, StoreError::Parse(_) | StoreError::Backup(_)));
    }
}
