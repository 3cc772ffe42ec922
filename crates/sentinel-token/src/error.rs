use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token {0} has already been used")]
    AlreadyUsed(String),

    #[error("token {0} expired")]
    Expired(String),

    #[error("token {0} does not match the supplied operation")]
    Mismatch(String),

    #[error("token generation failure: {0}")]
    Generation(String),

    /// Distilled §3 "Scope / Attestation": "authorization is consulted
    /// before token issuance." Raised by `TokenRegistry::generate`/
    /// `generate_batch` when the supplied attestation has expired or does
    /// not cover the operation's target.
    #[error("attestation does not authorize subject {0}")]
    NotAuthorized(String),
}

impl TokenError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            TokenError::AlreadyUsed(_) => "token_already_used",
            TokenError::Expired(_) => "token_expired",
            TokenError::Mismatch(_) => "token_mismatch",
            TokenError::Generation(_) => "token_generation_failure",
            TokenError::NotAuthorized(_) => "policy_denied",
        }
    }

    /// None of C3's own errors are HARD STOP in isolation — they are
    /// ordinary validation rejections a caller is expected to handle
    /// (distilled §4.3 lists all three as a closed, expected taxonomy).
    pub fn is_hard_stop(&self) -> bool {
        false
    }
}
