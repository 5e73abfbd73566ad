//! Rotation orchestrator.
//!
//! Runs one rotation as a strictly sequential pipeline:
//!
//! 1. generate a new [`Identity`]
//! 2. document store (fatal)
//! 3. flat file (fatal)
//! 4. relational store (fatal when present, skipped when absent)
//! 5. platform registry (never fatal)
//!
//! Every mutating step backs up its file first; a failed backup stops the run
//! before that store is touched. There is no cross-store transaction, so a
//! fatal failure leaves earlier stores rotated and later ones untouched.

pub mod log;

use std::fmt;
use std::path::PathBuf;

use crate::backup::BackupManager;
use crate::identity::Identity;
use crate::stores::StoreError;
use crate::stores::document::DocumentStore;
use crate::stores::flat_file::FlatFileStore;
use crate::stores::registry::RegistryWriter;
use crate::stores::relational::{RelationalStore, RelationalUpdate};

pub use log::OperationLog;

/// Confirmation that the target application is not running.
///
/// Rotation never checks processes itself; whoever constructs this value
/// vouches for it.
#[derive(Debug, Clone, Copy)]
pub struct AppStopped {
    _private: (),
}

impl AppStopped {
    #[must_use]
    pub fn confirmed_by_caller() -> Self {
        Self { _private: () }
    }
}

/// Locations of every file-backed store touched by a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub document: PathBuf,
    pub flat_file: PathBuf,
    pub relational: PathBuf,
    pub backup_dir: PathBuf,
}

/// Store-updating stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DocumentStore,
    FlatFile,
    RelationalStore,
    PlatformRegistry,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DocumentStore => "document store",
            Self::FlatFile => "machine id file",
            Self::RelationalStore => "state database",
            Self::PlatformRegistry => "platform registry",
        };
        f.write_str(name)
    }
}

/// Result of a single step, inspected by the orchestrator.
#[derive(Debug)]
pub enum StepOutcome {
    Done(String),
    Skipped(String),
    /// Failed, but the run continues.
    Warning(String),
    /// Failed; the run stops here.
    Fatal(StoreError),
}

/// Final verdict of a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    Completed(Identity),
    Failed { step: Step, reason: String },
}

/// Immutable record returned from [`Rotator::rotate`].
#[derive(Debug, Clone)]
pub struct RotationReport {
    outcome: RotationOutcome,
    log: Vec<String>,
}

impl RotationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RotationOutcome::Completed(_))
    }

    #[must_use]
    pub fn outcome(&self) -> &RotationOutcome {
        &self.outcome
    }

    /// The new identity, if every required store was updated.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match &self.outcome {
            RotationOutcome::Completed(identity) => Some(identity),
            RotationOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn failed_step(&self) -> Option<Step> {
        match &self.outcome {
            RotationOutcome::Completed(_) => None,
            RotationOutcome::Failed { step, .. } => Some(*step),
        }
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Split into `(success, identity or error message, log)`.
    #[must_use]
    pub fn into_parts(self) -> (bool, Result<Identity, String>, Vec<String>) {
        match self.outcome {
            RotationOutcome::Completed(identity) => (true, Ok(identity), self.log),
            RotationOutcome::Failed { step, reason } => {
                (false, Err(format!("{step}: {reason}")), self.log)
            }
        }
    }
}

/// Sequences backup and update across all stores.
#[derive(Debug)]
pub struct Rotator<R> {
    document: DocumentStore,
    flat_file: FlatFileStore,
    relational: RelationalStore,
    backups: BackupManager,
    registry: R,
}

impl<R: RegistryWriter> Rotator<R> {
    #[must_use]
    pub fn with_registry(paths: StorePaths, registry: R) -> Self {
        Self {
            document: DocumentStore::new(paths.document),
            flat_file: FlatFileStore::new(paths.flat_file),
            relational: RelationalStore::new(paths.relational),
            backups: BackupManager::new(paths.backup_dir),
            registry,
        }
    }

    /// Run one rotation. Each step is attempted at most once.
    pub fn rotate(&self, _stopped: &AppStopped) -> RotationReport {
        let mut log = OperationLog::new();

        log.info("Generating new identity");
        let identity = Identity::generate();
        for (name, value) in identity.fields() {
            log.info(format!("  {name} = {value}"));
        }

        let steps = [
            Step::DocumentStore,
            Step::FlatFile,
            Step::RelationalStore,
            Step::PlatformRegistry,
        ];

        for step in steps {
            let outcome = self.run_step(step, &identity, &mut log);
            match outcome {
                StepOutcome::Done(note) => log.info(note),
                StepOutcome::Skipped(note) => log.info(format!("{step}: {note}")),
                StepOutcome::Warning(reason) => log.warn(format!("{step} not updated: {reason}")),
                StepOutcome::Fatal(err) => {
                    let reason = err.to_string();
                    log.error(format!("Rotation aborted at {step}: {reason}"));
                    return RotationReport {
                        outcome: RotationOutcome::Failed { step, reason },
                        log: log.into_lines(),
                    };
                }
            }
        }

        log.info("Rotation completed");
        RotationReport {
            outcome: RotationOutcome::Completed(identity),
            log: log.into_lines(),
        }
    }

    fn run_step(&self, step: Step, identity: &Identity, log: &mut OperationLog) -> StepOutcome {
        match step {
            Step::DocumentStore => self.update_document(identity, log),
            Step::FlatFile => self.update_flat_file(identity, log),
            Step::RelationalStore => self.update_relational(identity, log),
            Step::PlatformRegistry => self.update_registry(identity),
        }
    }

    fn backup(&self, path: &std::path::Path, log: &mut OperationLog) -> Result<(), StoreError> {
        let outcome = self.backups.backup(path)?;
        log.info(outcome.describe(path));
        Ok(())
    }

    fn update_document(&self, identity: &Identity, log: &mut OperationLog) -> StepOutcome {
        let path = self.document.path();
        if let Err(err) = self.backup(path, log) {
            return StepOutcome::Fatal(err);
        }
        match self.document.update(identity) {
            Ok(()) => StepOutcome::Done(format!("Updated identity keys in {}", path.display())),
            Err(err) => StepOutcome::Fatal(err),
        }
    }

    fn update_flat_file(&self, identity: &Identity, log: &mut OperationLog) -> StepOutcome {
        let path = self.flat_file.path();
        if let Err(err) = self.backup(path, log) {
            return StepOutcome::Fatal(err);
        }
        match self.flat_file.update(&identity.machine_id) {
            Ok(()) => StepOutcome::Done(format!("Wrote machine id to {}", path.display())),
            Err(err) => StepOutcome::Fatal(err),
        }
    }

    fn update_relational(&self, identity: &Identity, log: &mut OperationLog) -> StepOutcome {
        let path = self.relational.path();
        if !self.relational.exists() {
            return StepOutcome::Skipped(format!("store absent, skipped ({})", path.display()));
        }
        if let Err(err) = self.backup(path, log) {
            return StepOutcome::Fatal(err);
        }
        match self.relational.update(identity) {
            Ok(RelationalUpdate::Written(rows)) => {
                StepOutcome::Done(format!("Upserted {rows} rows in {}", path.display()))
            }
            Ok(RelationalUpdate::Absent) => {
                StepOutcome::Skipped(format!("store absent, skipped ({})", path.display()))
            }
            Err(err) => StepOutcome::Fatal(err),
        }
    }

    fn update_registry(&self, identity: &Identity) -> StepOutcome {
        let location = self.registry.location();
        match self.registry.write_machine_id(&identity.machine_id) {
            Ok(()) => StepOutcome::Done(format!("Wrote machine id to {location}")),
            Err(StoreError::PlatformUnsupported(reason)) => StepOutcome::Skipped(reason),
            Err(err) => StepOutcome::Warning(format!("{location}: {err}")),
        }
    }
}
