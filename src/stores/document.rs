//! JSON document store (`storage.json`).
//!
//! The document is a flat object. Only the `telemetry.*` identity keys are
//! owned here; every other entry belongs to the target application and is
//! written back untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::identity::Identity;
use crate::stores::{StoreError, ensure_parent};

/// Namespace prefixed to every identity field in this store.
pub const KEY_PREFIX: &str = "telemetry.";

/// Document store rooted at a single JSON file.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing file reads as an empty object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` if the file is not UTF-8 or not a JSON
    /// object, or an I/O variant if it cannot be read.
    pub fn read(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => {
                StoreError::Parse(format!("{}: not valid UTF-8", self.path.display()))
            }
            _ => StoreError::from_io("read", &self.path, &e),
        })?;

        match serde_json::from_str(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::Parse(format!(
                "{}: expected a JSON object, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
            Err(e) => Err(StoreError::Parse(format!("{}: {e}", self.path.display()))),
        }
    }

    /// Read one identity field, if present and a string.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn field(&self, name: &str) -> Result<Option<String>, StoreError> {
        let document = self.read()?;
        Ok(document
            .get(&format!("{KEY_PREFIX}{name}"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Overwrite the identity keys and write the whole document back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` for a corrupt existing document (nothing is
    /// written in that case), or an I/O variant if the write fails.
    pub fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut document = self.read()?;

        for (name, value) in identity.fields() {
            document.insert(format!("{KEY_PREFIX}{name}"), Value::String(value.to_string()));
        }

        ensure_parent(&self.path)?;

        let contents = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| StoreError::Io(format!("serialize {}: {e}", self.path.display())))?;

        fs::write(&self.path, contents).map_err(|e| StoreError::from_io("write", &self.path, &e))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
