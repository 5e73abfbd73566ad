//! idrotate - rotate an application's locally persisted machine identity.
//!
//! The target application reads its telemetry identifiers from several
//! independent stores. This library generates a fresh [`identity::Identity`]
//! and writes it to each of them, backing every file up first.
//!
//! # Modules
//!
//! - [`rotation`] - The orchestrator and its result types
//! - [`identity`] - Identifier generation
//! - [`backup`] - Timestamped pre-mutation backups
//! - [`stores`] - Document, flat-file, relational and registry adapters
//! - [`cleanup`] - Removal of history and workspace storage
//! - [`commands`] - High-level operations used by the CLI
//! - [`config`] - Configuration loading and store path resolution
//! - [`cli`] - Command-line interface definitions

pub mod backup;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod identity;
pub mod rotation;
pub mod stores;
