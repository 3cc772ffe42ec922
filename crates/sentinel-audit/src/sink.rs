//! Persistence callbacks. `AuditLog::append` calls the configured sink
//! before it mutates in-memory state — a sink failure must never leave the
//! chain in a state where the in-memory tail and the durable tail disagree.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuditError;
use crate::record::AuditRecord;

/// A durability backend for the audit log. Invoked synchronously, in
/// order, once per successful append.
pub trait AuditSink: Send + Sync {
    fn persist(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// A sink that does nothing — the default for tests and for callers who
/// accept in-memory-only durability.
#[derive(Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn persist(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// An append-only, line-oriented JSON file sink: one record per line,
/// UTF-8, newline-terminated, fsync-before-ack (distilled spec §6,
/// "Persistent state").
pub struct FileSink {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::Failure(format!("opening {}: {e}", path.display())))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every line back as a raw JSON string, in append order. Used by
    /// the startup recovery routine ([`crate::load_and_verify`]).
    pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>, AuditError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AuditError::Failure(format!("reading {}: {e}", path.as_ref().display())))?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_string())
            .collect())
    }
}

impl AuditSink for FileSink {
    fn persist(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)
            .map_err(|e| AuditError::Failure(format!("serializing record: {e}")))?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| AuditError::Failure("file sink lock poisoned".to_string()))?;
        writeln!(file, "{line}")
            .map_err(|e| AuditError::Failure(format!("writing to {}: {e}", self.path.display())))?;
        file.sync_data()
            .map_err(|e| AuditError::Failure(format!("fsync {}: {e}", self.path.display())))?;
        Ok(())
    }
}
