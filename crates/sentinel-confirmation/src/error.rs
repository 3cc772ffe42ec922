use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("confirmation {0} has already been used")]
    AlreadyUsed(String),

    #[error("confirmation {0} expired")]
    Expired(String),

    #[error(transparent)]
    Audit(#[from] sentinel_audit::AuditError),
}

impl ConfirmationError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            ConfirmationError::AlreadyUsed(_) => "token_already_used",
            ConfirmationError::Expired(_) => "confirmation_expired",
            ConfirmationError::Audit(inner) => inner.reason_code(),
        }
    }

    /// A failed audit write is HARD STOP (distilled §4.1); replay and
    /// expiry are ordinary, expected rejections.
    pub fn is_hard_stop(&self) -> bool {
        matches!(self, ConfirmationError::Audit(inner) if inner.is_hard_stop())
    }
}
