//! Pre-mutation snapshots of store files.
//!
//! Backups are named `<basename>.bak_<YYYYMMDD_HHMMSS>` and live in a single
//! backup directory. They are only ever added, never rewritten or removed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::stores::StoreError;

/// Timestamp layout used in backup file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A backup written during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub created_at: DateTime<Local>,
}

/// Result of a backup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created(BackupRecord),
    /// A backup with the same name already exists (same second).
    AlreadyPresent(PathBuf),
    /// Nothing to protect.
    NoOriginal,
}

impl BackupOutcome {
    /// One-line description for the operation log.
    #[must_use]
    pub fn describe(&self, original: &Path) -> String {
        match self {
            Self::Created(record) => format!(
                "Backed up {} to {}",
                original.display(),
                record.backup.display()
            ),
            Self::AlreadyPresent(path) => format!("Backup already present: {}", path.display()),
            Self::NoOriginal => format!("No existing file to back up: {}", original.display()),
        }
    }
}

/// Writes timestamped copies of store files into one directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Back up `path` using the current local time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backup` if the backup directory cannot be created or
    /// the copy fails.
    pub fn backup(&self, path: &Path) -> Result<BackupOutcome, StoreError> {
        self.backup_at(path, Local::now())
    }

    /// Back up `path` as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backup` if the backup directory cannot be created or
    /// the copy fails.
    pub fn backup_at(&self, path: &Path, now: DateTime<Local>) -> Result<BackupOutcome, StoreError> {
        if !path.exists() {
            return Ok(BackupOutcome::NoOriginal);
        }

        let destination = self.destination(path, now)?;
        if destination.exists() {
            tracing::debug!(backup = %destination.display(), "backup already present");
            return Ok(BackupOutcome::AlreadyPresent(destination));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Backup(format!("create dir {}: {e}", self.dir.display())))?;

        fs::copy(path, &destination).map_err(|e| {
            StoreError::Backup(format!(
                "copy {} to {}: {e}",
                path.display(),
                destination.display()
            ))
        })?;
        copy_modified_time(path, &destination)?;

        tracing::info!(original = %path.display(), backup = %destination.display(), "backup created");

        Ok(BackupOutcome::Created(BackupRecord {
            original: path.to_path_buf(),
            backup: destination,
            created_at: now,
        }))
    }

    fn destination(&self, path: &Path, now: DateTime<Local>) -> Result<PathBuf, StoreError> {
        let name = path
            .file_name()
            .ok_or_else(|| StoreError::Backup(format!("no file name in {}", path.display())))?;

        Ok(self.dir.join(format!(
            "{}.bak_{}",
            name.to_string_lossy(),
            now.format(TIMESTAMP_FORMAT)
        )))
    }
}

/// Give `destination` the modification time of `original`.
///
/// `fs::copy` brings permission bits across but stamps the copy with the
/// current time.
fn copy_modified_time(original: &Path, destination: &Path) -> Result<(), StoreError> {
    let modified = fs::metadata(original)
        .and_then(|meta| meta.modified())
        .map_err(|e| StoreError::Backup(format!("read mtime of {}: {e}", original.display())))?;

    fs::File::options()
        .write(true)
        .open(destination)
        .and_then(|file| file.set_modified(modified))
        .map_err(|e| StoreError::Backup(format!("set mtime of {}: {e}", destination.display())))
}
