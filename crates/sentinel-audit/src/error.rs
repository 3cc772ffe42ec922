//! Audit error taxonomy. Both variants are HARD STOP per the governance
//! core's error propagation policy: a caller must not catch-and-swallow
//! either one and continue as if nothing happened.

use sentinel_types::HashError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit persistence failed: {0}")]
    Failure(String),

    #[error("audit chain integrity failure at record {record_id}: {reason}")]
    IntegrityFailure { record_id: String, reason: String },

    #[error("failed to canonicalize audit record content: {0}")]
    Canonicalization(#[from] HashError),
}

impl AuditError {
    /// Stable short reason identifier, carried by every error in the
    /// governance core alongside its human-readable `Display`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuditError::Failure(_) => "audit_failure",
            AuditError::IntegrityFailure { .. } => "audit_integrity_failure",
            AuditError::Canonicalization(_) => "audit_failure",
        }
    }

    /// True for every variant in this crate — both are HARD STOP.
    pub fn is_hard_stop(&self) -> bool {
        true
    }
}
