//! The confirmation consumption registry (distilled §4.4): an in-memory
//! consumed-set backed by the audit as ground truth, with the audit write
//! ordered strictly before the in-memory mutation so a crash between them
//! is safe to recover from.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use sentinel_audit::{AuditAppend, AuditKind, AuditLog, Outcome, SubjectRef};
use sentinel_types::{ActorId, ConfirmationId, Details};

use crate::confirmation::Confirmation;
use crate::error::ConfirmationError;

pub struct ConfirmationRegistry {
    consumed: Mutex<HashSet<ConfirmationId>>,
}

impl Default for ConfirmationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationRegistry {
    pub fn new() -> Self {
        Self { consumed: Mutex::new(HashSet::new()) }
    }

    /// `true` iff the id is in the in-memory set OR the audit contains a
    /// consumed-record for it. An audit hit reconstructs the in-memory
    /// entry so subsequent calls are O(1).
    pub fn is_used(&self, confirmation_id: ConfirmationId, audit: &AuditLog) -> bool {
        if self.consumed.lock().expect("confirmation registry lock poisoned").contains(&confirmation_id) {
            return true;
        }

        let id_str = confirmation_id.to_string();
        let found_in_audit = audit
            .by_subject(&id_str)
            .iter()
            .any(|r| matches!(r.kind(), AuditKind::ConfirmationConsumed));

        if found_in_audit {
            self.consumed.lock().expect("confirmation registry lock poisoned").insert(confirmation_id);
        }

        found_in_audit
    }

    /// If `is_used`, append a replay-blocked record (with the replaying
    /// submitter's identity) and raise `AlreadyUsed`.
    fn replay_check(
        &self,
        confirmation: &Confirmation,
        submitter: &ActorId,
        audit: &AuditLog,
    ) -> Result<(), ConfirmationError> {
        if self.is_used(confirmation.confirmation_id, audit) {
            tracing::warn!(
                confirmation_id = %confirmation.confirmation_id,
                submitter = %submitter.0,
                "blocked replay of an already-consumed confirmation"
            );
            audit.append(AuditAppend {
                actor: submitter.clone(),
                kind: AuditKind::ConfirmationReplayBlocked,
                outcome: Outcome::ReplayAttempted,
                subjects: vec![SubjectRef::Confirmation(confirmation.confirmation_id.to_string())],
                details: Details::new(),
            })?;
            return Err(ConfirmationError::AlreadyUsed(confirmation.confirmation_id.to_string()));
        }
        Ok(())
    }

    /// Runs the replay check; if not used, writes a consumed-record to the
    /// audit first, then adds to the in-memory set. If the audit write
    /// fails the in-memory state is left untouched.
    pub fn consume(
        &self,
        confirmation: &Confirmation,
        submitter: &ActorId,
        audit: &AuditLog,
        outcome: Outcome,
        error: Option<&str>,
    ) -> Result<(), ConfirmationError> {
        self.replay_check(confirmation, submitter, audit)?;

        let mut details = Details::new();
        if let Some(err) = error {
            details.insert("error".to_string(), err.into());
        }

        audit.append(AuditAppend {
            actor: submitter.clone(),
            kind: AuditKind::ConfirmationConsumed,
            outcome,
            subjects: vec![
                SubjectRef::Confirmation(confirmation.confirmation_id.to_string()),
                SubjectRef::Request(confirmation.request_id.to_string()),
            ],
            details,
        })?;

        self.consumed.lock().expect("confirmation registry lock poisoned").insert(confirmation.confirmation_id);
        tracing::debug!(confirmation_id = %confirmation.confirmation_id, "confirmation consumed");
        Ok(())
    }

    /// Replay check, expiry check, and consume in one call.
    pub fn validate_and_consume(
        &self,
        confirmation: &Confirmation,
        submitter: &ActorId,
        audit: &AuditLog,
    ) -> Result<(), ConfirmationError> {
        self.replay_check(confirmation, submitter, audit)?;

        if confirmation.is_expired(Utc::now()) {
            return Err(ConfirmationError::Expired(confirmation.confirmation_id.to_string()));
        }

        self.consume(confirmation, submitter, audit, Outcome::Success, None)
    }

    /// On process start, scan the audit for consumed-records and rebuild
    /// the in-memory set. Returns the count restored — this is the
    /// mechanism by which single-use survives restarts.
    pub fn reconstruct_from_audit(&self, audit: &AuditLog) -> usize {
        let mut restored = 0;
        let mut consumed = self.consumed.lock().expect("confirmation registry lock poisoned");
        for record in audit.by_kind(|k| matches!(k, AuditKind::ConfirmationConsumed)) {
            for subject in record.subjects() {
                if let SubjectRef::Confirmation(id) = subject {
                    if let Ok(parsed) = id.parse::<ConfirmationId>() {
                        if consumed.insert(parsed) {
                            restored += 1;
                        }
                    }
                }
            }
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirmation::FrictionEvidence;
    use sentinel_types::{Hash256, RequestId};

    fn confirmation() -> Confirmation {
        Confirmation::new(
            RequestId::new(),
            ActorId::new("approver"),
            Utc::now() + chrono::Duration::hours(1),
            Hash256::of_bytes(b"content"),
            FrictionEvidence {
                deliberation_record_id: "d".into(),
                edit_record_id: "e".into(),
                challenge_record_id: "c".into(),
                cooldown_record_id: "k".into(),
            },
        )
    }

    #[test]
    fn fresh_confirmation_is_not_used() {
        let audit = AuditLog::new();
        let registry = ConfirmationRegistry::new();
        let c = confirmation();
        assert!(!registry.is_used(c.confirmation_id, &audit));
    }

    #[test]
    fn validate_and_consume_succeeds_once() {
        let audit = AuditLog::new();
        let registry = ConfirmationRegistry::new();
        let c = confirmation();
        let submitter = ActorId::new("researcher");

        registry.validate_and_consume(&c, &submitter, &audit).unwrap();
        assert!(registry.is_used(c.confirmation_id, &audit));
    }

    #[test]
    fn replay_is_blocked_and_logged() {
        let audit = AuditLog::new();
        let registry = ConfirmationRegistry::new();
        let c = confirmation();
        let submitter = ActorId::new("researcher");

        registry.validate_and_consume(&c, &submitter, &audit).unwrap();
        let err = registry.validate_and_consume(&c, &submitter, &audit).unwrap_err();
        assert!(matches!(err, ConfirmationError::AlreadyUsed(_)));

        let replay_records = audit.by_kind(|k| matches!(k, AuditKind::ConfirmationReplayBlocked));
        assert_eq!(replay_records.len(), 1);
    }

    #[test]
    fn expired_confirmation_is_rejected() {
        let audit = AuditLog::new();
        let registry = ConfirmationRegistry::new();
        let mut c = confirmation();
        c.expires_at = Utc::now() - chrono::Duration::seconds(1);

        let err = registry.validate_and_consume(&c, &ActorId::new("researcher"), &audit).unwrap_err();
        assert!(matches!(err, ConfirmationError::Expired(_)));
    }

    #[test]
    fn reconstruct_from_audit_restores_consumed_set() {
        let audit = AuditLog::new();
        let c = confirmation();
        registry_consume_directly(&audit, &c);

        let fresh_registry = ConfirmationRegistry::new();
        let restored = fresh_registry.reconstruct_from_audit(&audit);
        assert_eq!(restored, 1);
        assert!(fresh_registry.is_used(c.confirmation_id, &audit));
    }

    fn registry_consume_directly(audit: &AuditLog, c: &Confirmation) {
        let registry = ConfirmationRegistry::new();
        registry.validate_and_consume(c, &ActorId::new("researcher"), audit).unwrap();
    }
}
