//! The pipeline's aggregate error taxonomy: one variant per component the
//! pipeline composes, plus the two outcomes specific to the external call
//! itself (distilled §4.8, §7). Grounded on `aas-ledger::LedgerError`
//! wrapping `StorageError` and `substrate-commitment`'s `CommitmentError` —
//! both wrap a lower layer's closed enum behind `#[error(transparent)]`
//! rather than flattening it into their own variants.

use thiserror::Error;

/// The external call's own failure modes, distinct from anything a
/// component crate raises.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransmissionFailure {
    #[error("external call timed out before the configured deadline")]
    Timeout,

    #[error("external call rejected: {0}")]
    Rejected(String),

    #[error("external call failed: {0}")]
    Failed(String),

    /// Distilled §6: "Transport must be HTTPS; non-HTTPS endpoints are a
    /// configuration error." Caught at client construction, not at call
    /// time, so a misconfigured endpoint never reaches the network.
    #[error("configuration error: {0}")]
    Configuration(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Boundary(sentinel_boundary::BoundaryError),

    #[error(transparent)]
    Duplicate(sentinel_duplicate::DuplicateError),

    #[error(transparent)]
    Friction(sentinel_friction::FrictionError),

    #[error(transparent)]
    Token(sentinel_token::TokenError),

    #[error(transparent)]
    Confirmation(sentinel_confirmation::ConfirmationError),

    #[error(transparent)]
    Audit(sentinel_audit::AuditError),

    #[error(transparent)]
    Transmission(#[from] TransmissionFailure),

    /// The recomputed content hash no longer matches the one the
    /// confirmation was bound to — the report changed after a human
    /// signed off on it and before it reached the wire. HARD STOP
    /// (distilled §4.8, §7): this is the `report-tampering-detected`
    /// condition, and it additionally writes a `SECURITY_ALERT:` line to
    /// stderr independent of whatever tracing subscriber is installed.
    #[error("report tampering detected: content changed after confirmation was issued")]
    ReportTamperingDetected,
}

/// Distilled §7: "every error carries a stable short reason identifier...
/// Security-relevant errors...are additionally emitted to a standard-error
/// stream." `#[from]` alone can't run that side effect, so each inner
/// error's conversion into `PipelineError` is implemented by hand and
/// announces on the way through instead of leaving it to each call site to
/// remember.
macro_rules! announcing_from {
    ($variant:ident, $inner:ty) => {
        impl From<$inner> for PipelineError {
            fn from(inner: $inner) -> Self {
                let err = PipelineError::$variant(inner);
                err.announce_if_hard_stop();
                err
            }
        }
    };
}

announcing_from!(Boundary, sentinel_boundary::BoundaryError);
announcing_from!(Duplicate, sentinel_duplicate::DuplicateError);
announcing_from!(Friction, sentinel_friction::FrictionError);
announcing_from!(Token, sentinel_token::TokenError);
announcing_from!(Confirmation, sentinel_confirmation::ConfirmationError);
announcing_from!(Audit, sentinel_audit::AuditError);

impl PipelineError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            PipelineError::Boundary(inner) => inner.reason_code(),
            PipelineError::Duplicate(inner) => inner.reason_code(),
            PipelineError::Friction(inner) => inner.reason_code(),
            PipelineError::Token(inner) => inner.reason_code(),
            PipelineError::Confirmation(inner) => inner.reason_code(),
            PipelineError::Audit(inner) => inner.reason_code(),
            PipelineError::Transmission(TransmissionFailure::Timeout) => "transmission_timeout",
            PipelineError::Transmission(TransmissionFailure::Configuration(_)) => "configuration_error",
            PipelineError::Transmission(_) => "transmission_failure",
            PipelineError::ReportTamperingDetected => "report_tampering_detected",
        }
    }

    pub fn is_hard_stop(&self) -> bool {
        match self {
            PipelineError::Boundary(inner) => inner.is_hard_stop(),
            PipelineError::Duplicate(inner) => inner.is_hard_stop(),
            PipelineError::Friction(inner) => inner.is_hard_stop(),
            PipelineError::Token(inner) => inner.is_hard_stop(),
            PipelineError::Confirmation(inner) => inner.is_hard_stop(),
            PipelineError::Audit(inner) => inner.is_hard_stop(),
            PipelineError::Transmission(_) => false,
            PipelineError::ReportTamperingDetected => true,
        }
    }

    /// Emits the stderr line distilled §7 requires independent of
    /// `tracing`, for every HARD STOP condition.
    pub(crate) fn announce_if_hard_stop(&self) {
        if self.is_hard_stop() {
            tracing::error!(reason_code = self.reason_code(), "{self}");
            eprintln!("SECURITY_ALERT: {} ({})", self, self.reason_code());
        }
    }
}
