use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrictionError {
    #[error("deliberation for subject {subject} is {remaining_seconds:.1}s too short")]
    DeliberationTooShort { subject: String, remaining_seconds: f64 },

    #[error("edit for subject {0} did not change the presented content")]
    EditNotVerified(String),

    #[error("challenge for subject {0} was not posed or was answered empty")]
    ChallengeNotAnswered(String),

    #[error("cooldown for subject {subject} is {remaining_seconds:.1}s too short")]
    CooldownViolation { subject: String, remaining_seconds: f64 },

    #[error("subject {0} is not in the expected gate state for this transition")]
    WrongState(String),

    #[error("audit completeness check failed for subject {0}: missing friction evidence")]
    IncompleteAuditTrail(String),

    #[error(transparent)]
    Confirmation(#[from] sentinel_confirmation::ConfirmationError),
}

impl FrictionError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            FrictionError::DeliberationTooShort { .. } => "deliberation_too_short",
            FrictionError::EditNotVerified(_) => "edit_not_verified",
            FrictionError::ChallengeNotAnswered(_) => "challenge_not_answered",
            FrictionError::CooldownViolation { .. } => "cooldown_violation",
            FrictionError::WrongState(_) => "friction_wrong_state",
            FrictionError::IncompleteAuditTrail(_) => "friction_audit_incomplete",
            FrictionError::Confirmation(inner) => inner.reason_code(),
        }
    }

    pub fn is_hard_stop(&self) -> bool {
        matches!(self, FrictionError::Confirmation(inner) if inner.is_hard_stop())
    }
}
