//! The friction gate (C6): the only place in the governance core where a
//! confirmation can be minted, and only after deliberation, a verified
//! edit, an answered challenge, and a cooldown have each produced their
//! own audit record. There is no `auto_approve`, no `skip_*`, no
//! `bypass_*` method anywhere on [`FrictionGate`] — distilled §4.6: "these
//! are not optional functions omitted from a default implementation; they
//! must not be implementable at all."

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use sentinel_audit::{AuditAppend, AuditKind, AuditLog, Outcome, SubjectRef};
use sentinel_confirmation::{Confirmation, FrictionEvidence};
use sentinel_types::{ActorId, Details, Hash256, RequestId};

use crate::error::FrictionError;
use crate::state::{FrictionState, GateState};

pub struct FrictionGate {
    states: Mutex<HashMap<RequestId, FrictionState>>,
    min_deliberation_seconds: f64,
    min_cooldown_seconds: f64,
}

impl FrictionGate {
    /// Overrides below the hard floors are clamped up, never accepted —
    /// distilled §4.6: "any attempt to configure below the hard-minimum
    /// silently clamps to the hard-minimum."
    pub fn new(min_deliberation_seconds: f64, min_cooldown_seconds: f64) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            min_deliberation_seconds: min_deliberation_seconds.max(sentinel_policy::MIN_DELIBERATION_SECONDS),
            min_cooldown_seconds: min_cooldown_seconds.max(sentinel_policy::MIN_COOLDOWN_SECONDS),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(sentinel_policy::MIN_DELIBERATION_SECONDS, sentinel_policy::MIN_COOLDOWN_SECONDS)
    }

    fn with_state<T>(
        &self,
        subject: RequestId,
        f: impl FnOnce(&mut FrictionState) -> Result<T, FrictionError>,
    ) -> Result<T, FrictionError> {
        let mut states = self.states.lock().expect("friction gate lock poisoned");
        let state = states.get_mut(&subject).ok_or_else(|| FrictionError::WrongState(subject.to_string()))?;
        f(state)
    }

    /// `initial → deliberating`. The caller is expected to suspend here —
    /// the gate does not sleep internally (distilled §5).
    pub fn start_deliberation(&self, subject: RequestId, approver: ActorId, presented_content: Vec<u8>) {
        let mut states = self.states.lock().expect("friction gate lock poisoned");
        states.insert(subject, FrictionState::new(approver, presented_content));
    }

    /// `deliberating → edit-pending`, permitted only once the floor has
    /// elapsed on the monotonic clock.
    pub fn end_deliberation(&self, subject: RequestId, audit: &AuditLog) -> Result<(), FrictionError> {
        let (approver, elapsed) = self.with_state(subject, |st| {
            if st.state != GateState::Deliberating {
                return Err(FrictionError::WrongState(subject.to_string()));
            }
            let elapsed = st.deliberation_start.elapsed().as_secs_f64();
            if elapsed < self.min_deliberation_seconds {
                tracing::warn!(subject = %subject, elapsed, floor = self.min_deliberation_seconds, "deliberation ended before the floor elapsed");
                return Err(FrictionError::DeliberationTooShort {
                    subject: subject.to_string(),
                    remaining_seconds: self.min_deliberation_seconds - elapsed,
                });
            }
            st.state = GateState::EditPending;
            Ok((st.approver.clone(), elapsed))
        })?;

        let mut details = Details::new();
        details.insert("elapsed_seconds".to_string(), elapsed.into());
        audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::FrictionDeliberation,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Request(subject.to_string())],
            details,
        })?;
        Ok(())
    }

    /// `edit-pending → challenge-pending`. Requires the new content to
    /// differ from the originally-presented content by at least one byte.
    /// Automatically poses the challenge question on success — posing is
    /// a deterministic step, not a human action, so it has no separate
    /// public entry point.
    pub fn record_edit(
        &self,
        subject: RequestId,
        new_content: Vec<u8>,
        question: impl Into<String>,
        audit: &AuditLog,
    ) -> Result<(), FrictionError> {
        let question = question.into();
        let approver = self.with_state(subject, |st| {
            if st.state != GateState::EditPending {
                return Err(FrictionError::WrongState(subject.to_string()));
            }
            if new_content == st.presented_content {
                return Err(FrictionError::EditNotVerified(subject.to_string()));
            }
            st.presented_content = new_content;
            st.challenge_question = Some(question.clone());
            st.state = GateState::ChallengePending;
            Ok(st.approver.clone())
        })?;

        audit.append(AuditAppend {
            actor: approver.clone(),
            kind: AuditKind::FrictionEdit,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Request(subject.to_string())],
            details: Details::new(),
        })?;

        let mut posed_details = Details::new();
        posed_details.insert("event".to_string(), "posed".into());
        posed_details.insert("question".to_string(), question.into());
        audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::FrictionChallenge,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Request(subject.to_string())],
            details: posed_details,
        })?;

        Ok(())
    }

    /// `challenge-pending → cooling-down`. Requires the question was
    /// posed (checked against the audit, not just in-memory state) and
    /// the answer is nonempty, non-whitespace.
    pub fn answer_challenge(
        &self,
        subject: RequestId,
        answer: &str,
        audit: &AuditLog,
    ) -> Result<(), FrictionError> {
        let posed_exists = audit
            .by_subject(&subject.to_string())
            .iter()
            .any(|r| matches!(r.kind(), AuditKind::FrictionChallenge));
        if !posed_exists || answer.trim().is_empty() {
            return Err(FrictionError::ChallengeNotAnswered(subject.to_string()));
        }

        let approver = self.with_state(subject, |st| {
            if st.state != GateState::ChallengePending {
                return Err(FrictionError::WrongState(subject.to_string()));
            }
            st.state = GateState::CoolingDown;
            st.cooldown_start = Some(Instant::now());
            Ok(st.approver.clone())
        })?;

        let mut details = Details::new();
        details.insert("event".to_string(), "answered".into());
        details.insert("answer".to_string(), answer.into());
        audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::FrictionChallenge,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Request(subject.to_string())],
            details,
        })?;
        Ok(())
    }

    /// `cooling-down → ready`, permitted only once the floor has elapsed.
    /// An earlier call raises `CooldownViolation` — there is no
    /// `end_cooldown` variant that skips the check.
    pub fn check_cooldown(&self, subject: RequestId, audit: &AuditLog) -> Result<(), FrictionError> {
        let (approver, elapsed) = self.with_state(subject, |st| {
            if st.state != GateState::CoolingDown {
                return Err(FrictionError::WrongState(subject.to_string()));
            }
            let start = st.cooldown_start.expect("cooling-down state always has a start time");
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed < self.min_cooldown_seconds {
                tracing::warn!(subject = %subject, elapsed, floor = self.min_cooldown_seconds, "cooldown ended before the floor elapsed");
                return Err(FrictionError::CooldownViolation {
                    subject: subject.to_string(),
                    remaining_seconds: self.min_cooldown_seconds - elapsed,
                });
            }
            st.state = GateState::Ready;
            Ok((st.approver.clone(), elapsed))
        })?;

        let mut details = Details::new();
        details.insert("elapsed_seconds".to_string(), elapsed.into());
        audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::FrictionCooldown,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Request(subject.to_string())],
            details,
        })?;
        Ok(())
    }

    /// `ready → consumed`. Re-verifies audit-completeness (one record per
    /// friction item, referencing this subject) before minting a
    /// confirmation. The friction state is destroyed here — its evidence
    /// survives only in the audit (distilled §3 "Relationships").
    pub fn issue_confirmation(
        &self,
        subject: RequestId,
        validity: ChronoDuration,
        audit: &AuditLog,
    ) -> Result<Confirmation, FrictionError> {
        let (approver, content_hash) = {
            let states = self.states.lock().expect("friction gate lock poisoned");
            let state = states.get(&subject).ok_or_else(|| FrictionError::WrongState(subject.to_string()))?;
            if state.state != GateState::Ready {
                return Err(FrictionError::WrongState(subject.to_string()));
            }
            (state.approver.clone(), Hash256::of_bytes(&state.presented_content))
        };

        let records = audit.by_subject(&subject.to_string());
        let has = |kind_matches: fn(&AuditKind) -> bool| records.iter().any(|r| kind_matches(r.kind()));
        let deliberation_record = records.iter().find(|r| matches!(r.kind(), AuditKind::FrictionDeliberation));
        let edit_record = records.iter().find(|r| matches!(r.kind(), AuditKind::FrictionEdit));
        let challenge_record = records
            .iter()
            .find(|r| matches!(r.kind(), AuditKind::FrictionChallenge) && r.details().contains_key("answer"));
        let cooldown_record = records.iter().find(|r| matches!(r.kind(), AuditKind::FrictionCooldown));

        let complete = has(|k| matches!(k, AuditKind::FrictionDeliberation))
            && has(|k| matches!(k, AuditKind::FrictionEdit))
            && challenge_record.is_some()
            && has(|k| matches!(k, AuditKind::FrictionCooldown));

        if !complete {
            return Err(FrictionError::IncompleteAuditTrail(subject.to_string()));
        }

        let evidence = FrictionEvidence {
            deliberation_record_id: deliberation_record.unwrap().id().to_string(),
            edit_record_id: edit_record.unwrap().id().to_string(),
            challenge_record_id: challenge_record.unwrap().id().to_string(),
            cooldown_record_id: cooldown_record.unwrap().id().to_string(),
        };

        let confirmation = Confirmation::new(
            subject,
            approver.clone(),
            Utc::now() + validity,
            content_hash,
            evidence,
        );

        audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::ConfirmationIssued,
            outcome: Outcome::Success,
            subjects: vec![
                SubjectRef::Request(subject.to_string()),
                SubjectRef::Confirmation(confirmation.confirmation_id.to_string()),
            ],
            details: Details::new(),
        })?;

        self.states.lock().expect("friction gate lock poisoned").remove(&subject);
        tracing::debug!(subject = %subject, confirmation_id = %confirmation.confirmation_id, "confirmation issued");
        Ok(confirmation)
    }

    pub fn state_of(&self, subject: RequestId) -> Option<GateState> {
        self.states.lock().expect("friction gate lock poisoned").get(&subject).map(|s| s.state)
    }
}

#[cfg(test)]
impl FrictionGate {
    /// Backdate a subject's in-progress timer, mirroring the Python
    /// original's tests manipulating `start_monotonic` directly instead of
    /// sleeping for the real floor duration.
    fn backdate_deliberation(&self, subject: RequestId, seconds: f64) {
        let mut states = self.states.lock().unwrap();
        if let Some(st) = states.get_mut(&subject) {
            st.deliberation_start = Instant::now() - std::time::Duration::from_secs_f64(seconds);
        }
    }

    fn backdate_cooldown(&self, subject: RequestId, seconds: f64) {
        let mut states = self.states.lock().unwrap();
        if let Some(st) = states.get_mut(&subject) {
            st.cooldown_start = Some(Instant::now() - std::time::Duration::from_secs_f64(seconds));
        }
    }
}
