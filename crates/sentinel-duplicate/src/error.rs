use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DuplicateError {
    #[error("duplicate submission for key {0}: already active in this process")]
    ActiveDuplicate(String),

    #[error("duplicate submission for key {0}: a transmitted record already exists in the audit")]
    AuditDuplicate(String),

    #[error("duplicate submission for key {0}: more than one transmitted record found post-transmit")]
    CriticalDuplicate(String),
}

impl DuplicateError {
    pub fn reason_code(&self) -> &'static str {
        "duplicate_submission"
    }

    /// A post-transmission critical duplicate means the external side
    /// effect may have already fired twice — HARD STOP. The pre-transmit
    /// checks are ordinary, expected rejections.
    pub fn is_hard_stop(&self) -> bool {
        matches!(self, DuplicateError::CriticalDuplicate(_))
    }
}
