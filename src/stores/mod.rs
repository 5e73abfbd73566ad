//! Store adapters.
//!
//! Each store holds some subset of the [`Identity`](crate::identity::Identity)
//! in its own format. Adapters are independent of each other; sequencing and
//! the fatal/non-fatal decision belong to [`rotation`](crate::rotation).

pub mod document;
pub mod flat_file;
pub mod registry;
pub mod relational;

use std::io;
use std::path::Path;

/// Errors that can occur while reading, backing up or writing a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Failed to parse {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Not supported on this platform: {0}")]
    PlatformUnsupported(String),

    #[error("Database error: {0}")]
    Sqlite(String),
}

impl StoreError {
    /// Classify an I/O error raised while touching `path`.
    pub(crate) fn from_io(action: &str, path: &Path, err: &io::Error) -> Self {
        let message = format!("{action} {}: {err}", path.display());
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::Permission(message),
            io::ErrorKind::NotFound => Self::PathNotFound(message),
            _ => Self::Io(message),
        }
    }
}

/// Create the parent directory of `path` if it is missing.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::from_io("create dir", parent, &e))?;
    }
    Ok(())
}
