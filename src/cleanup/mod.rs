//! Removal of per-workspace state the target application keeps next to its
//! identity: the edit `History` directory (emptied), `workspaceStorage`
//! (deleted) and the application's own copy of the state database, which
//! still holds the previous identity rows. Failures are reported per target
//! and never stop the others.

use std::fs;
use std::path::{Path, PathBuf};

/// What happens to a cleanup target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    /// Remove every child, keep the directory itself.
    Empty,
    /// Remove the file, or the directory and everything under it.
    Delete,
}

/// A file or directory to clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupTarget {
    pub path: PathBuf,
    pub action: CleanupAction,
}

/// Result for a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStatus {
    Removed,
    /// Number of children removed.
    Emptied(usize),
    Missing,
    /// Reasons for every entry that could not be removed.
    Failed(Vec<String>),
}

/// Cleanup targets under the application's `User` directory.
#[must_use]
pub fn default_targets(base: &Path) -> Vec<CleanupTarget> {
    vec![
        CleanupTarget {
            path: base.join("History"),
            action: CleanupAction::Empty,
        },
        CleanupTarget {
            path: base.join("workspaceStorage"),
            action: CleanupAction::Delete,
        },
        CleanupTarget {
            path: base.join("globalStorage").join("state.vscdb.backup"),
            action: CleanupAction::Delete,
        },
    ]
}

/// Clean every target, in order.
#[must_use]
pub fn clean(targets: &[CleanupTarget]) -> Vec<(CleanupTarget, CleanupStatus)> {
    targets
        .iter()
        .map(|target| {
            let status = clean_one(target);
            match &status {
                CleanupStatus::Failed(reasons) => {
                    tracing::warn!(path = %target.path.display(), ?reasons, "cleanup incomplete");
                }
                other => tracing::info!(path = %target.path.display(), status = ?other, "cleaned"),
            }
            (target.clone(), status)
        })
        .collect()
}

fn clean_one(target: &CleanupTarget) -> CleanupStatus {
    if !target.path.exists() {
        return CleanupStatus::Missing;
    }

    match target.action {
        CleanupAction::Delete => match remove_path(&target.path) {
            Ok(()) => CleanupStatus::Removed,
            Err(e) => CleanupStatus::Failed(vec![format!("{}: {e}", target.path.display())]),
        },
        CleanupAction::Empty => empty_dir(&target.path),
    }
}

fn empty_dir(dir: &Path) -> CleanupStatus {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return CleanupStatus::Failed(vec![format!("{}: {e}", dir.display())]),
    };

    let mut removed = 0;
    let mut failures = Vec::new();

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                failures.push(format!("{}: {e}", dir.display()));
                continue;
            }
        };
        match remove_path(&path) {
            Ok(()) => removed += 1,
            Err(e) => failures.push(format!("{}: {e}", path.display())),
        }
    }

    if failures.is_empty() {
        CleanupStatus::Emptied(removed)
    } else {
        CleanupStatus::Failed(failures)
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn history_is_emptied_but_kept() {
        let temp = TempDir::new().unwrap();
        let history = temp.path().join("History");
        fs::create_dir_all(history.join("abc123")).unwrap();
        fs::write(history.join("abc123/entries.json"), "[]").unwrap();
        fs::write(history.join("loose.txt"), "x").unwrap();

        let results = clean(&default_targets(temp.path()));

        assert_eq!(results[0].1, CleanupStatus::Emptied(2));
        assert!(history.is_dir());
        assert_eq!(fs::read_dir(&history).unwrap().count(), 0);
    }

    #[test]
    fn workspace_storage_is_deleted() {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("workspaceStorage/deadbeef");
        fs::create_dir_all(&storage).unwrap();
        fs::write(storage.join("state.vscdb"), "x").unwrap();

        let results = clean(&default_targets(temp.path()));

        assert_eq!(results[1].1, CleanupStatus::Removed);
        assert!(!temp.path().join("workspaceStorage").exists());
    }

    #[test]
    fn stale_state_database_copy_is_deleted() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("globalStorage");
        fs::create_dir_all(&global).unwrap();
        fs::write(global.join("state.vscdb"), "live").unwrap();
        fs::write(global.join("state.vscdb.backup"), "stale").unwrap();

        let results = clean(&default_targets(temp.path()));

        assert_eq!(results[2].1, CleanupStatus::Removed);
        assert!(!global.join("state.vscdb.backup").exists());
        assert_eq!(fs::read_to_string(global.join("state.vscdb")).unwrap(), "live");
    }

    #[test]
    fn missing_targets_are_reported() {
        let temp = TempDir::new().unwrap();

        let results = clean(&default_targets(temp.path()));

        assert!(results.iter().all(|(_, s)| *s == CleanupStatus::Missing));
    }
}
