//! The submission pipeline (C8): composes C2 (boundary), C5 (duplicate),
//! C6 (friction), and C4 (confirmation) into the decision → confirmation →
//! transmission → record flow of distilled §4.8. Grounded on
//! `aas-service`'s role as the crate that composes lower-layer components
//! without owning their state itself.
//!
//! The pipeline does not sleep. Distilled §5 is explicit that deliberation
//! and cooldown waits are the *only* required suspension points in the
//! core, and that the gate "does not sleep internally; callers poll or
//! await state transitions" — so [`SubmissionPipeline::prepare`] hands the
//! caller a [`sentinel_friction::FrictionGate`] handle to drive at its own
//! pace (a UI event loop, a CLI prompt, a test backdating the monotonic
//! clock) and only [`SubmissionPipeline::finalize_transmission`] performs
//! the actual side effect once a [`Confirmation`] exists.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration as ChronoDuration;
use sentinel_advisor::{RubberStampDetector, RubberStampWarning};
use sentinel_audit::{AuditAppend, AuditKind, AuditLog, Outcome, SubjectRef};
use sentinel_boundary::BoundaryGuard;
use sentinel_confirmation::{Confirmation, ConfirmationRegistry};
use sentinel_duplicate::{DuplicateGuard, SubmissionHandle};
use sentinel_friction::FrictionGate;
use sentinel_token::{AuthorizationToken, CanonicalOperation, TokenRegistry};
use sentinel_types::{ActorId, DestinationId, Details, Hash256, RequestId, SubjectId};

use crate::clients::{SubmissionPlatformClient, SubmissionReceipt, SubmissionRequest, SubmissionStatus};
use crate::error::{PipelineError, TransmissionFailure};

/// Everything a submission needs to be uniquely identified across C5 (the
/// (subject, destination) uniqueness key) and C6 (the request id the
/// friction gate tracks — distinct from the subject, per distilled §3:
/// "a friction-state is owned by the request it gates").
#[derive(Clone, Copy, Debug)]
pub struct SubmitRequest {
    pub subject: SubjectId,
    pub destination: DestinationId,
    pub request_id: RequestId,
}

/// Returned by [`SubmissionPipeline::prepare`]: the still-held duplicate
/// lock plus enough identity to drive the friction gate and eventually
/// call [`SubmissionPipeline::finalize_transmission`].
pub struct PreparedSubmission {
    handle: SubmissionHandle,
    request: SubmitRequest,
    destination_name: String,
}

pub struct SubmissionPipeline {
    audit: Arc<AuditLog>,
    boundary: BoundaryGuard,
    duplicate: Arc<DuplicateGuard>,
    friction: Arc<FrictionGate>,
    confirmations: Arc<ConfirmationRegistry>,
    tokens: Arc<TokenRegistry>,
    advisor: Arc<RubberStampDetector>,
    platform_client: Arc<dyn SubmissionPlatformClient>,
}

impl SubmissionPipeline {
    pub fn new(
        audit: Arc<AuditLog>,
        boundary: BoundaryGuard,
        duplicate: Arc<DuplicateGuard>,
        friction: Arc<FrictionGate>,
        confirmations: Arc<ConfirmationRegistry>,
        tokens: Arc<TokenRegistry>,
        advisor: Arc<RubberStampDetector>,
        platform_client: Arc<dyn SubmissionPlatformClient>,
    ) -> Self {
        Self { audit, boundary, duplicate, friction, confirmations, tokens, advisor, platform_client }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn friction(&self) -> &FrictionGate {
        &self.friction
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Steps 1-3 of distilled §4.8: accept the request, run C2's
    /// forbidden-action check on the named operation, then acquire the
    /// C5 uniqueness lock for (subject, destination). On any failure the
    /// duplicate lock (if acquired) is released before returning.
    pub fn prepare(
        &self,
        request: SubmitRequest,
        operation_name: &str,
        destination_name: impl Into<String>,
        submitter: &ActorId,
    ) -> Result<PreparedSubmission, PipelineError> {
        self.boundary.check_action(operation_name)?;

        let key = sentinel_duplicate::SubmissionKey::new(request.subject, request.destination);
        let handle = self.duplicate.check_and_acquire(key, submitter, &self.audit)?;

        Ok(PreparedSubmission { handle, request, destination_name: destination_name.into() })
    }

    /// Release a [`PreparedSubmission`]'s duplicate lock without
    /// transmitting — the path for a human who abandons the submission
    /// before friction completes.
    pub fn abandon(&self, prepared: PreparedSubmission) {
        self.duplicate.release_on_error(prepared.handle);
    }

    /// Steps 6-11 of distilled §4.8. `confirmation` must have been issued
    /// by `self.friction()` for `prepared.request.request_id` (step 5,
    /// driven by the caller beforehand). `final_content` is the exact
    /// byte sequence about to be transmitted.
    pub async fn finalize_transmission(
        &self,
        prepared: PreparedSubmission,
        confirmation: Confirmation,
        final_content: Vec<u8>,
        submitter: ActorId,
        deadline: StdDuration,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let PreparedSubmission { handle, request, destination_name } = prepared;

        // Step 6: recompute the content hash from the exact bytes about to
        // go out and compare against what the confirmation was bound to.
        // A mismatch means the report changed after a human signed off on
        // it — HARD STOP, logged, and announced on stderr independent of
        // whatever tracing subscriber is installed.
        let recomputed = Hash256::of_bytes(&final_content);
        if recomputed != confirmation.content_hash {
            self.duplicate.release_on_error(handle);
            let err = self.record_tampering(&request, &submitter, confirmation.confirmation_id.to_string())?;
            return Err(err);
        }

        // Step 7: consume the confirmation before the external side effect.
        if let Err(e) = self.confirmations.validate_and_consume(
            &confirmation,
            &submitter,
            &self.audit,
        ) {
            self.duplicate.release_on_error(handle);
            return Err(e.into());
        }

        self.record_advisory(&confirmation, &submitter);

        // Step 8: the single network request, bounded by a caller-supplied
        // deadline. A timeout is a transmission failure, never a
        // replay-allowing state (distilled §5).
        let submission_request = SubmissionRequest {
            destination: destination_name,
            subject: request.subject.to_string(),
            payload: final_content,
        };

        let outcome = tokio::time::timeout(deadline, self.platform_client.submit(submission_request)).await;

        // Distilled §6 "External submission platform contract": the
        // pipeline treats `status` as a closed acknowledged | rejected |
        // pending enum and never re-derives it. `Pending` means the
        // platform accepted the request but has not yet resolved it -- the
        // side effect already fired, so it is neither a success outcome
        // nor a transmission failure.
        let (transmitted, audit_kind, result) = match outcome {
            Ok(Ok(receipt)) => match receipt.status {
                SubmissionStatus::Acknowledged => (true, AuditKind::Transmitted, Ok(receipt)),
                SubmissionStatus::Pending => (true, AuditKind::TransmissionPending, Ok(receipt)),
                SubmissionStatus::Rejected => {
                    let reference = receipt.platform_reference.clone().unwrap_or_default();
                    (
                        false,
                        AuditKind::TransmissionFailed,
                        Err(PipelineError::Transmission(TransmissionFailure::Rejected(reference))),
                    )
                }
            },
            Ok(Err(e)) => (false, AuditKind::TransmissionFailed, Err(PipelineError::Transmission(TransmissionFailure::Failed(e)))),
            Err(_) => (false, AuditKind::TransmissionFailed, Err(PipelineError::Transmission(TransmissionFailure::Timeout))),
        };

        // Step 9: release the duplicate lock, re-verifying post-transmit if
        // the side effect actually fired.
        let release_result = self.duplicate.verify_and_release(handle, &submitter, transmitted, &self.audit);

        // Step 10: write the terminal audit record.
        let key_subject = sentinel_duplicate::SubmissionKey::new(request.subject, request.destination).as_subject_string();
        match &result {
            Ok(receipt) => {
                let mut details = Details::new();
                if let Some(reference) = &receipt.platform_reference {
                    details.insert("platform_reference".to_string(), reference.as_str().into());
                }
                self.audit.append(AuditAppend {
                    actor: submitter.clone(),
                    kind: audit_kind,
                    outcome: Outcome::Success,
                    subjects: vec![
                        SubjectRef::Submission(key_subject),
                        SubjectRef::Confirmation(confirmation.confirmation_id.to_string()),
                    ],
                    details,
                })?;
            }
            Err(e) => {
                let mut details = Details::new();
                details.insert("error".to_string(), e.to_string().into());
                self.audit.append(AuditAppend {
                    actor: submitter.clone(),
                    kind: audit_kind,
                    outcome: Outcome::Error,
                    subjects: vec![
                        SubjectRef::Submission(key_subject),
                        SubjectRef::Confirmation(confirmation.confirmation_id.to_string()),
                    ],
                    details,
                })?;
            }
        }

        release_result?;
        result
    }

    fn record_tampering(
        &self,
        request: &SubmitRequest,
        submitter: &ActorId,
        confirmation_id: String,
    ) -> Result<PipelineError, PipelineError> {
        let key_subject =
            sentinel_duplicate::SubmissionKey::new(request.subject, request.destination).as_subject_string();
        self.audit.append(AuditAppend {
            actor: submitter.clone(),
            kind: AuditKind::TamperingDetected,
            outcome: Outcome::Blocked,
            subjects: vec![SubjectRef::Submission(key_subject), SubjectRef::Confirmation(confirmation_id)],
            details: Details::new(),
        })?;
        let err = PipelineError::ReportTamperingDetected;
        err.announce_if_hard_stop();
        Ok(err)
    }

    fn record_advisory(&self, confirmation: &Confirmation, _submitter: &ActorId) {
        let deliberation_seconds = self
            .audit
            .by_subject(&confirmation.request_id.to_string())
            .into_iter()
            .find(|r| matches!(r.kind(), AuditKind::FrictionDeliberation))
            .and_then(|r| r.details().get("elapsed_seconds").cloned())
            .and_then(|v| match v {
                sentinel_types::DetailValue::Float(f) => Some(f),
                sentinel_types::DetailValue::Int(i) => Some(i as f64),
                _ => None,
            })
            .unwrap_or(0.0);

        self.advisor.record_confirmation(
            confirmation.approver.clone(),
            &confirmation.confirmation_id.to_string(),
            deliberation_seconds,
        );
    }

    /// Surface C7's advisory warning for the approver behind a
    /// confirmation. Purely informational — distilled §4.7: "C7 never
    /// blocks" — callers may suppress display when
    /// [`RubberStampWarning::is_advisory_silent`] is true, but must never
    /// use this to reject or delay a submission.
    pub fn advisory_for(&self, approver: &ActorId) -> RubberStampWarning {
        self.advisor.analyze_pattern(approver)
    }

    /// Authorize a side-effectful action (distilled §1's "execution of an
    /// action", distinct from report transmission) with a single-use C3
    /// token rather than a C4 confirmation. Grounded on
    /// `execution_layer/approval.py`'s `HumanApprovalHook` minting an
    /// `ExecutionToken` ahead of a browser action. Distilled §3 "Scope /
    /// Attestation": authorization is consulted before token issuance, so
    /// `attestation` must cover `operation.target` or generation fails.
    pub fn authorize_action(
        &self,
        approver: ActorId,
        operation: &CanonicalOperation,
        validity: ChronoDuration,
        attestation: &sentinel_policy::Attestation,
    ) -> Result<AuthorizationToken, PipelineError> {
        self.boundary.check_action(&operation.kind)?;
        let token = self.tokens.generate(approver.clone(), operation, validity, attestation)?;

        let mut details = Details::new();
        details.insert("kind".to_string(), operation.kind.as_str().into());
        details.insert("target".to_string(), operation.target.as_str().into());
        self.audit.append(AuditAppend {
            actor: approver,
            kind: AuditKind::TokenIssued,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Token(token.token_id.to_string())],
            details,
        })?;

        Ok(token)
    }

    /// Validate and invalidate a C3 token against the action it
    /// authorizes, then perform the action via the caller-supplied
    /// closure. The token is invalidated (and the consumption logged)
    /// before the closure runs, mirroring the at-most-once argument of
    /// distilled §5 for the submission path. Deliberately not named
    /// `execute_action` — that literal string is one of the boundary
    /// guard's own forbidden-action patterns.
    pub fn perform_authorized_action<F, T>(
        &self,
        token: &mut AuthorizationToken,
        operation: &CanonicalOperation,
        submitter: ActorId,
        perform: F,
    ) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Result<T, String>,
    {
        self.tokens.validate(token, std::slice::from_ref(operation))?;
        self.tokens.invalidate(token);

        self.audit.append(AuditAppend {
            actor: submitter,
            kind: AuditKind::TokenConsumed,
            outcome: Outcome::Success,
            subjects: vec![SubjectRef::Token(token.token_id.to_string())],
            details: Details::new(),
        })?;

        perform().map_err(|e| PipelineError::Transmission(TransmissionFailure::Failed(e)))
    }
}
