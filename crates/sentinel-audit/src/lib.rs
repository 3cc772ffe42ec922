//! The tamper-evident, hash-chained, append-only audit trail (C1).
//!
//! This is the ground truth for consumed tokens, completed submissions,
//! and policy events across the rest of the governance core. There is no
//! `delete`, `update`, `truncate`, `clear`, or `disable` operation — see
//! the module doc on [`AuditLog`] for why that's load-bearing, not an
//! oversight.

#![deny(unsafe_code)]

mod error;
mod export;
mod log;
mod record;
mod sink;

pub use error::AuditError;
pub use export::{reconstruct, AuditExport};
pub use log::AuditLog;
pub use record::{AuditAppend, AuditKind, AuditRecord, Outcome, SubjectRef};
pub use sink::{AuditSink, FileSink, NullSink};

/// Read a [`FileSink`]-formatted file line by line, verify the chain, and
/// return the parsed records in append order. Used at process start to
/// rebuild C4's in-memory consumed-confirmation set (distilled §6
/// "Persistent state").
pub fn load_and_verify(path: impl AsRef<std::path::Path>) -> Result<Vec<AuditRecord>, AuditError> {
    let lines = FileSink::read_lines(path)?;
    let records: Vec<AuditRecord> = lines
        .iter()
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| AuditError::Failure(format!("parsing audit line: {e}")))
        })
        .collect::<Result<_, _>>()?;

    let mut expected_previous = sentinel_types::Hash256::genesis();
    for record in &records {
        if record.previous_hash() != expected_previous {
            return Err(AuditError::IntegrityFailure {
                record_id: record.id().to_string(),
                reason: "previous_hash does not match preceding record's hash".to_string(),
            });
        }
        let recomputed = record.recompute_hash()?;
        if recomputed != record.record_hash() {
            return Err(AuditError::IntegrityFailure {
                record_id: record.id().to_string(),
                reason: "record_hash does not match recomputed content hash".to_string(),
            });
        }
        expected_previous = record.record_hash();
    }

    Ok(records)
}

/// Full startup recovery: verify the file, rebuild an [`AuditLog`] from its
/// contents, and keep appending to the same file going forward.
pub fn recover_from_file(path: impl AsRef<std::path::Path>) -> Result<AuditLog, AuditError> {
    let path = path.as_ref();
    let records = load_and_verify(path)?;
    let sink = std::sync::Arc::new(FileSink::open(path)?);
    Ok(AuditLog::restore(records, sink))
}

#[cfg(test)]
mod recovery_tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn load_and_verify_round_trips_a_file_backed_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = Arc::new(FileSink::open(&path).unwrap());
        let log = AuditLog::with_sink(sink);

        for i in 0..4 {
            log.append(AuditAppend {
                actor: sentinel_types::ActorId::system(),
                kind: AuditKind::Custom(format!("e{i}")),
                outcome: Outcome::Success,
                subjects: vec![],
                details: sentinel_types::Details::new(),
            })
            .unwrap();
        }

        let recovered = load_and_verify(&path).unwrap();
        assert_eq!(recovered.len(), 4);
    }

    #[test]
    fn recover_from_file_rebuilds_a_log_that_accepts_further_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        {
            let sink = Arc::new(FileSink::open(&path).unwrap());
            let log = AuditLog::with_sink(sink);
            log.append(AuditAppend {
                actor: sentinel_types::ActorId::system(),
                kind: AuditKind::ConfirmationConsumed,
                outcome: Outcome::Success,
                subjects: vec![crate::record::SubjectRef::Confirmation("c-1".to_string())],
                details: sentinel_types::Details::new(),
            })
            .unwrap();
        }

        let recovered = recover_from_file(&path).unwrap();
        assert_eq!(recovered.len(), 1);
        assert!(recovered.verify_chain().is_ok());

        recovered
            .append(AuditAppend {
                actor: sentinel_types::ActorId::system(),
                kind: AuditKind::Custom("post-recovery".to_string()),
                outcome: Outcome::Success,
                subjects: vec![],
                details: sentinel_types::Details::new(),
            })
            .unwrap();
        assert_eq!(recovered.len(), 2);
        assert!(recovered.verify_chain().is_ok());
    }

    #[test]
    fn load_and_verify_detects_a_persisted_record_tampered_without_touching_its_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        {
            let sink = Arc::new(FileSink::open(&path).unwrap());
            let log = AuditLog::with_sink(sink);
            let mut details = sentinel_types::Details::new();
            details.insert("outcome".to_string(), "pending".into());
            log.append(AuditAppend {
                actor: sentinel_types::ActorId::new("reviewer-1"),
                kind: AuditKind::Custom("decision".to_string()),
                outcome: Outcome::Success,
                subjects: vec![],
                details,
            })
            .unwrap();
        }

        // Edit the persisted line's `details` field in place without
        // recomputing `record_hash` -- exactly what an attacker editing
        // the file directly would do.
        let original = std::fs::read_to_string(&path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(original.trim()).unwrap();
        value["details"]["outcome"] = serde_json::json!("approved");
        std::fs::write(&path, format!("{}\n", serde_json::to_string(&value).unwrap())).unwrap();

        let err = load_and_verify(&path).unwrap_err();
        assert!(matches!(err, AuditError::IntegrityFailure { .. }));
        assert!(recover_from_file(&path).is_err());
    }
}
