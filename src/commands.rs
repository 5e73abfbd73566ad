//! Command implementations behind the CLI.

use std::path::PathBuf;

use crate::cleanup::{self, CleanupStatus, CleanupTarget};
use crate::config::Config;
use crate::identity::FIELDS;
use crate::rotation::{AppStopped, RotationReport, Rotator};
use crate::stores::document::DocumentStore;
use crate::stores::registry::{DisabledRegistry, SystemRegistry};

/// Message shown when a mutating command runs without the stopped confirmation.
pub const NOT_STOPPED_MESSAGE: &str = "The target application must be fully closed first. \
    Quit it (including background processes), then re-run with --app-stopped.";

/// Turn the CLI flag into the confirmation token.
///
/// # Errors
///
/// Returns an error if the caller did not confirm the application is stopped.
pub fn confirm_stopped(app_stopped: bool) -> anyhow::Result<AppStopped> {
    if !app_stopped {
        anyhow::bail!(NOT_STOPPED_MESSAGE);
    }
    Ok(AppStopped::confirmed_by_caller())
}

/// Rotate the identity across every configured store.
///
/// # Arguments
///
/// * `stopped` - Caller's confirmation that the target application is closed
/// * `no_registry` - Skip the registry step even if enabled in config
///
/// # Errors
///
/// Returns an error only if config loading fails. Store failures are reported
/// through the returned [`RotationReport`].
pub fn rotate(stopped: &AppStopped, no_registry: bool) -> anyhow::Result<RotationReport> {
    let config = Config::load()?;
    let paths = config.store_paths();

    let report = if no_registry || !config.registry.enabled {
        Rotator::with_registry(paths, DisabledRegistry).rotate(stopped)
    } else {
        let registry = SystemRegistry::new(&config.registry.key, &config.registry.value_name);
        Rotator::with_registry(paths, registry).rotate(stopped)
    };

    Ok(report)
}

/// Read the identity fields currently in the document store.
///
/// # Errors
///
/// Returns an error if config loading fails or the document cannot be parsed.
pub fn show() -> anyhow::Result<Vec<(&'static str, Option<String>)>> {
    let config = Config::load()?;
    let store = DocumentStore::new(config.store_paths().document);

    let mut fields = Vec::with_capacity(FIELDS.len());
    for name in FIELDS {
        fields.push((name, store.field(name)?));
    }
    Ok(fields)
}

/// Every resolved store path.
///
/// # Errors
///
/// Returns an error if config loading fails.
pub fn paths() -> anyhow::Result<Vec<(&'static str, PathBuf)>> {
    let config = Config::load()?;
    let base = config.base_path();
    let paths = config.store_paths();

    Ok(vec![
        ("base", base),
        ("document", paths.document),
        ("machine id", paths.flat_file),
        ("state database", paths.relational),
        ("backups", paths.backup_dir),
    ])
}

/// Empty the history directory and delete workspace storage.
///
/// # Errors
///
/// Returns an error if config loading fails. Per-target failures are reported
/// in the returned statuses.
pub fn clean(_stopped: &AppStopped) -> anyhow::Result<Vec<(CleanupTarget, CleanupStatus)>> {
    let config = Config::load()?;
    let targets = cleanup::default_targets(&config.base_path());
    Ok(cleanup::clean(&targets))
}

/// Write the default config file.
///
/// Returns the path and whether a new file was written.
///
/// # Errors
///
/// Returns an error if no config location can be determined or the write fails.
pub fn init_config() -> anyhow::Result<(PathBuf, bool)> {
    let path = Config::config_path().ok_or(crate::config::ConfigError::NoConfigDir)?;
    let written = Config::write_default(&path)?;
    Ok((path, written))
}
