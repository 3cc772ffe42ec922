//! Single-use authorization token (distilled §3 "Authorization Token",
//! §4.3). A token never reverts out of `Consumed`, and expiry is absolute
//! wall-clock.

use chrono::{DateTime, Duration, Utc};
use sentinel_types::{ActorId, Hash256, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
    Pending,
    Consumed,
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub token_id: TokenId,
    pub approver: ActorId,
    pub approved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub subject_hash: Hash256,
    pub batch_subject_hashes: Option<Vec<Hash256>>,
    status: TokenStatus,
}

impl AuthorizationToken {
    pub(crate) fn new_single(
        approver: ActorId,
        subject_hash: Hash256,
        validity: Duration,
        token_id: TokenId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token_id,
            approver,
            approved_at: now,
            expires_at: now + validity,
            subject_hash,
            batch_subject_hashes: None,
            status: TokenStatus::Pending,
        }
    }

    pub(crate) fn new_batch(
        approver: ActorId,
        batch_subject_hashes: Vec<Hash256>,
        validity: Duration,
        token_id: TokenId,
        now: DateTime<Utc>,
    ) -> Self {
        let subject_hash = Hash256::of_json(&serde_json::json!(batch_subject_hashes
            .iter()
            .map(|h| h.to_hex())
            .collect::<Vec<_>>()))
        .expect("batch hash list always serializes");
        Self {
            token_id,
            approver,
            approved_at: now,
            expires_at: now + validity,
            subject_hash,
            batch_subject_hashes: Some(batch_subject_hashes),
            status: TokenStatus::Pending,
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub(crate) fn mark_consumed(&mut self) {
        self.status = TokenStatus::Consumed;
    }

    pub(crate) fn mark_expired_if_due(&mut self, now: DateTime<Utc>) {
        if self.status == TokenStatus::Pending && self.is_expired(now) {
            self.status = TokenStatus::Expired;
        }
    }
}
