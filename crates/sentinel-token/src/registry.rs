//! The token registry: generation, matching, and the consumed-set guard
//! (distilled §4.3, §5 "C3 consumed set is guarded by a lock;
//! add-and-check-absence must be atomic").

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sentinel_policy::Attestation;
use sentinel_types::{ActorId, TokenId};

use crate::error::TokenError;
use crate::operation::CanonicalOperation;
use crate::token::{AuthorizationToken, TokenStatus};

pub struct TokenRegistry {
    consumed: Mutex<HashSet<TokenId>>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self { consumed: Mutex::new(HashSet::new()) }
    }

    /// Token ids are drawn from a cryptographically-secure source: a
    /// `Uuid::new_v4` mixed with 16 bytes from `OsRng`, matching distilled
    /// §4.3's "drawn from a cryptographically-secure source" requirement
    /// (a plain v4 UUID alone only guarantees uniqueness, not CSPRNG
    /// unpredictability).
    fn secure_token_id() -> TokenId {
        let mut os_bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut os_bytes);
        let uuid_bytes = *uuid::Uuid::new_v4().as_bytes();
        let mut mixed = [0u8; 16];
        for i in 0..16 {
            mixed[i] = uuid_bytes[i] ^ os_bytes[i];
        }
        TokenId::from_uuid(uuid::Uuid::from_bytes(mixed))
    }

    /// Mints a single-subject token. Distilled §3 "Scope / Attestation":
    /// "authorization is consulted before token issuance" — `attestation`
    /// must cover `subject.target` and must not be expired, checked before
    /// any token is minted.
    pub fn generate(
        &self,
        approver: ActorId,
        subject: &CanonicalOperation,
        validity: Duration,
        attestation: &Attestation,
    ) -> Result<AuthorizationToken, TokenError> {
        let now = Utc::now();
        if !attestation.permits(&subject.target, now) {
            tracing::warn!(target = %subject.target, "token generation denied: attestation does not authorize subject");
            return Err(TokenError::NotAuthorized(subject.target.clone()));
        }

        Ok(AuthorizationToken::new_single(
            approver,
            subject.canonical_hash(),
            validity,
            Self::secure_token_id(),
            now,
        ))
    }

    /// Mints a batch token. Every operation's target must be covered by
    /// `attestation` before any token is minted — a batch is all-or-nothing.
    pub fn generate_batch(
        &self,
        approver: ActorId,
        subjects: &[CanonicalOperation],
        validity: Duration,
        attestation: &Attestation,
    ) -> Result<AuthorizationToken, TokenError> {
        let now = Utc::now();
        for subject in subjects {
            if !attestation.permits(&subject.target, now) {
                tracing::warn!(target = %subject.target, "batch token generation denied: attestation does not authorize subject");
                return Err(TokenError::NotAuthorized(subject.target.clone()));
            }
        }

        let hashes = subjects.iter().map(|s| s.canonical_hash()).collect();
        Ok(AuthorizationToken::new_batch(approver, hashes, validity, Self::secure_token_id(), now))
    }

    /// Single-subject token matches iff equal; batch token matches iff the
    /// ordered tuple of canonical hashes of the supplied operations equals
    /// `batch_subject_hashes` exactly.
    pub fn matches(&self, token: &AuthorizationToken, operations: &[CanonicalOperation]) -> bool {
        match &token.batch_subject_hashes {
            None => operations.len() == 1 && operations[0].canonical_hash() == token.subject_hash,
            Some(batch) => {
                operations.len() == batch.len()
                    && operations.iter().zip(batch.iter()).all(|(op, h)| op.canonical_hash() == *h)
            }
        }
    }

    pub fn validate(
        &self,
        token: &AuthorizationToken,
        operations: &[CanonicalOperation],
    ) -> Result<(), TokenError> {
        let consumed = self.consumed.lock().expect("token registry lock poisoned");
        if consumed.contains(&token.token_id) || token.status() == TokenStatus::Consumed {
            drop(consumed);
            tracing::warn!(token_id = %token.token_id, "rejected validation of an already-consumed token");
            return Err(TokenError::AlreadyUsed(token.token_id.to_string()));
        }
        drop(consumed);

        if token.is_expired(Utc::now()) {
            tracing::warn!(token_id = %token.token_id, "rejected validation of an expired token");
            return Err(TokenError::Expired(token.token_id.to_string()));
        }

        if !self.matches(token, operations) {
            tracing::warn!(token_id = %token.token_id, "rejected validation: token does not match the supplied operation");
            return Err(TokenError::Mismatch(token.token_id.to_string()));
        }

        Ok(())
    }

    /// Atomically adds the token id to the consumed set. Idempotent: a
    /// second call against an already-consumed token id is a no-op, and
    /// any subsequent `validate` continues to fail with `AlreadyUsed`.
    pub fn invalidate(&self, token: &mut AuthorizationToken) {
        let mut consumed = self.consumed.lock().expect("token registry lock poisoned");
        consumed.insert(token.token_id);
        drop(consumed);
        token.mark_consumed();
        tracing::debug!(token_id = %token.token_id, "token invalidated");
    }

    pub fn is_consumed(&self, token_id: TokenId) -> bool {
        self.consumed.lock().expect("token registry lock poisoned").contains(&token_id)
    }
}

/// Refreshes a token's status against the wall clock: a `Pending` token
/// whose `expires_at` has passed becomes `Expired` in place. Exposed for
/// callers that display status without going through `validate`.
pub fn refresh_expiry(token: &mut AuthorizationToken, now: DateTime<Utc>) {
    token.mark_expired_if_due(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_policy::Scope;
    use sentinel_types::Details;

    fn op(target: &str) -> CanonicalOperation {
        CanonicalOperation::new("navigate", target, Details::new())
    }

    fn attestation() -> Attestation {
        Attestation::new(
            Scope::new(vec!["https://*".to_string()], vec![]),
            ActorId::new("attester"),
            Utc::now(),
            Utc::now() + Duration::hours(1),
        )
    }

    fn expired_attestation() -> Attestation {
        Attestation::new(
            Scope::new(vec!["https://*".to_string()], vec![]),
            ActorId::new("attester"),
            Utc::now() - Duration::hours(2),
            Utc::now() - Duration::seconds(1),
        )
    }

    #[test]
    fn matching_operation_validates_successfully() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let token = reg.generate(ActorId::new("approver"), &subject, Duration::hours(1), &attestation()).unwrap();
        assert!(reg.validate(&token, &[subject]).is_ok());
    }

    #[test]
    fn mismatched_operation_fails_with_mismatch() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let other = op("https://b.example");
        let token = reg.generate(ActorId::new("approver"), &subject, Duration::hours(1), &attestation()).unwrap();
        let err = reg.validate(&token, &[other]).unwrap_err();
        assert_eq!(err, TokenError::Mismatch(token.token_id.to_string()));
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let token =
            reg.generate(ActorId::new("approver"), &subject, Duration::seconds(-1), &attestation()).unwrap();
        let err = reg.validate(&token, &[subject]).unwrap_err();
        assert_eq!(err, TokenError::Expired(token.token_id.to_string()));
    }

    #[test]
    fn invalidate_is_idempotent_and_blocks_reuse() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let mut token =
            reg.generate(ActorId::new("approver"), &subject, Duration::hours(1), &attestation()).unwrap();

        reg.invalidate(&mut token);
        reg.invalidate(&mut token);

        let err = reg.validate(&token, &[subject]).unwrap_err();
        assert_eq!(err, TokenError::AlreadyUsed(token.token_id.to_string()));
    }

    #[test]
    fn batch_token_matches_ordered_tuple_only() {
        let reg = TokenRegistry::new();
        let subjects = vec![op("https://a.example"), op("https://b.example")];
        let token =
            reg.generate_batch(ActorId::new("approver"), &subjects, Duration::hours(1), &attestation()).unwrap();

        assert!(reg.matches(&token, &subjects));
        let reordered = vec![subjects[1].clone(), subjects[0].clone()];
        assert!(!reg.matches(&token, &reordered));
    }

    #[test]
    fn token_ids_are_unique_across_many_generations() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let token =
                reg.generate(ActorId::new("approver"), &subject, Duration::hours(1), &attestation()).unwrap();
            assert!(seen.insert(token.token_id));
        }
    }

    #[test]
    fn generation_denied_when_attestation_does_not_cover_subject() {
        let reg = TokenRegistry::new();
        let subject = op("https://unauthorized.example");
        let err = reg
            .generate(ActorId::new("approver"), &subject, Duration::hours(1), &attestation_excluding_unauthorized())
            .unwrap_err();
        assert_eq!(err, TokenError::NotAuthorized("https://unauthorized.example".to_string()));
    }

    #[test]
    fn generation_denied_when_attestation_expired() {
        let reg = TokenRegistry::new();
        let subject = op("https://a.example");
        let err =
            reg.generate(ActorId::new("approver"), &subject, Duration::hours(1), &expired_attestation()).unwrap_err();
        assert_eq!(err, TokenError::NotAuthorized("https://a.example".to_string()));
    }

    #[test]
    fn batch_generation_denied_when_any_subject_is_uncovered() {
        let reg = TokenRegistry::new();
        let subjects = vec![op("https://a.example"), op("https://unauthorized.example")];
        let err = reg
            .generate_batch(
                ActorId::new("approver"),
                &subjects,
                Duration::hours(1),
                &attestation_excluding_unauthorized(),
            )
            .unwrap_err();
        assert_eq!(err, TokenError::NotAuthorized("https://unauthorized.example".to_string()));
    }

    fn attestation_excluding_unauthorized() -> Attestation {
        Attestation::new(
            Scope::new(vec!["https://*".to_string()], vec!["https://unauthorized.example".to_string()]),
            ActorId::new("attester"),
            Utc::now(),
            Utc::now() + Duration::hours(1),
        )
    }
}
