use thiserror::Error;

/// Closed taxonomy of boundary violations. Every runtime boundary-violation
/// in this crate is HARD STOP per distilled §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("network execution attempt via '{0}'")]
    NetworkAttempt(String),

    #[error("automation attempt: '{0}'")]
    AutomationAttempt(String),

    #[error("friction bypass attempt: '{0}'")]
    BypassAttempt(String),

    #[error("read-only violation: write op '{operation}' attempted on read-only phase '{phase}'")]
    ReadOnlyViolation { phase: String, operation: String },

    #[error("boundary violation: {0}")]
    Generic(String),
}

impl BoundaryError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            BoundaryError::NetworkAttempt(_) => "network_attempt",
            BoundaryError::AutomationAttempt(_) => "automation_attempt",
            BoundaryError::BypassAttempt(_) => "automation_attempt",
            BoundaryError::ReadOnlyViolation { .. } => "read_only_violation",
            BoundaryError::Generic(_) => "generic_boundary_violation",
        }
    }

    /// All runtime boundary violations are HARD STOP (distilled §7).
    pub fn is_hard_stop(&self) -> bool {
        true
    }
}
