//! The audit record schema shared by every component that writes to a
//! [`crate::AuditLog`].

use chrono::{DateTime, Utc};
use sentinel_types::{ActorId, Details, Hash256};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A reference to some other entity a record is about. Opaque at this
/// layer — the audit log never resolves these, it only stores and filters
/// on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SubjectRef {
    Token(String),
    Confirmation(String),
    Request(String),
    Submission(String),
    Decision(String),
}

impl SubjectRef {
    fn canonical_tag(&self) -> (&'static str, &str) {
        match self {
            SubjectRef::Token(id) => ("token", id.as_str()),
            SubjectRef::Confirmation(id) => ("confirmation", id.as_str()),
            SubjectRef::Request(id) => ("request", id.as_str()),
            SubjectRef::Submission(id) => ("submission", id.as_str()),
            SubjectRef::Decision(id) => ("decision", id.as_str()),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.canonical_tag().1 == needle
    }
}

/// Closed taxonomy of audit record kinds. One shared schema; every
/// subsystem that owns an `AuditLog` instance writes records drawn from
/// this same enum, so a chain can be replayed and understood without
/// knowing which subsystem produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    TokenIssued,
    TokenConsumed,
    TokenReplayBlocked,
    FrictionDeliberation,
    FrictionEdit,
    FrictionChallenge,
    FrictionCooldown,
    ConfirmationIssued,
    ConfirmationConsumed,
    ConfirmationReplayBlocked,
    DuplicateBlocked,
    TamperingDetected,
    Transmitted,
    TransmissionPending,
    TransmissionFailed,
    PolicyDenied,
    BoundaryViolation,
    /// Escape hatch for a caller-defined event kind not otherwise named
    /// here. Kept closed-ish: the string is still part of the hashed
    /// content, so it cannot be used to smuggle an unhashed field.
    Custom(String),
}

impl AuditKind {
    fn code(&self) -> String {
        match self {
            AuditKind::TokenIssued => "token_issued".to_string(),
            AuditKind::TokenConsumed => "token_consumed".to_string(),
            AuditKind::TokenReplayBlocked => "token_replay_blocked".to_string(),
            AuditKind::FrictionDeliberation => "friction_deliberation".to_string(),
            AuditKind::FrictionEdit => "friction_edit".to_string(),
            AuditKind::FrictionChallenge => "friction_challenge".to_string(),
            AuditKind::FrictionCooldown => "friction_cooldown".to_string(),
            AuditKind::ConfirmationIssued => "confirmation_issued".to_string(),
            AuditKind::ConfirmationConsumed => "confirmation_consumed".to_string(),
            AuditKind::ConfirmationReplayBlocked => "confirmation_replay_blocked".to_string(),
            AuditKind::DuplicateBlocked => "duplicate_blocked".to_string(),
            AuditKind::TamperingDetected => "tampering_detected".to_string(),
            AuditKind::Transmitted => "transmitted".to_string(),
            AuditKind::TransmissionPending => "transmission_pending".to_string(),
            AuditKind::TransmissionFailed => "transmission_failed".to_string(),
            AuditKind::PolicyDenied => "policy_denied".to_string(),
            AuditKind::BoundaryViolation => "boundary_violation".to_string(),
            AuditKind::Custom(name) => format!("custom:{name}"),
        }
    }
}

/// Closed outcome taxonomy for a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Blocked,
    ReplayAttempted,
    PolicyDenied,
    Error,
}

/// The payload a caller supplies to [`crate::AuditLog::append`]. Hashing
/// and sequencing fields (id, timestamp, previous-hash, record-hash) are
/// assigned by the log itself, never by the caller.
#[derive(Clone, Debug)]
pub struct AuditAppend {
    pub actor: ActorId,
    pub kind: AuditKind,
    pub outcome: Outcome,
    pub subjects: Vec<SubjectRef>,
    pub details: Details,
}

/// An immutable, hash-linked entry in the chain. Construct-and-never-mutate:
/// there is no setter on any field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    id: String,
    timestamp: DateTime<Utc>,
    actor: ActorId,
    kind: AuditKind,
    outcome: Outcome,
    subjects: Vec<SubjectRef>,
    details: Details,
    previous_hash: Hash256,
    record_hash: Hash256,
}

impl AuditRecord {
    pub(crate) fn seal(
        id: String,
        timestamp: DateTime<Utc>,
        append: AuditAppend,
        previous_hash: Hash256,
    ) -> Result<Self, AuditError> {
        let record_hash = compute_record_hash(
            &id,
            timestamp,
            &append.kind,
            &append.actor,
            append.outcome,
            &append.details,
            previous_hash,
        )?;
        Ok(Self {
            id,
            timestamp,
            actor: append.actor,
            kind: append.kind,
            outcome: append.outcome,
            subjects: append.subjects,
            details: append.details,
            previous_hash,
            record_hash,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn kind(&self) -> &AuditKind {
        &self.kind
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn subjects(&self) -> &[SubjectRef] {
        &self.subjects
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn previous_hash(&self) -> Hash256 {
        self.previous_hash
    }

    pub fn record_hash(&self) -> Hash256 {
        self.record_hash
    }

    pub fn references(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s.matches(subject))
    }

    /// Recompute this record's hash from its own content, for
    /// [`crate::AuditLog::verify_chain`].
    pub(crate) fn recompute_hash(&self) -> Result<Hash256, AuditError> {
        compute_record_hash(
            &self.id,
            self.timestamp,
            &self.kind,
            &self.actor,
            self.outcome,
            &self.details,
            self.previous_hash,
        )
    }
}

/// The canonical tuple hashed for every record:
/// `(id, timestamp-ISO, kind, actor, outcome, canonical(details), previous-hash)`.
fn compute_record_hash(
    id: &str,
    timestamp: DateTime<Utc>,
    kind: &AuditKind,
    actor: &ActorId,
    outcome: Outcome,
    details: &Details,
    previous_hash: Hash256,
) -> Result<Hash256, AuditError> {
    let value = serde_json::json!({
        "id": id,
        "timestamp": timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "kind": kind.code(),
        "actor": actor.0,
        "outcome": outcome,
        "details": details,
        "previous_hash": previous_hash.to_hex(),
    });
    Hash256::of_json(&value).map_err(AuditError::from)
}
