//! The Confirmation entity (distilled §3 "Confirmation"): a human-issued,
//! single-use authorization for one pending operation, bound to the exact
//! content shown and the four friction-gate evidence records that produced
//! it.

use chrono::{DateTime, Utc};
use sentinel_types::{ActorId, ConfirmationId, Hash256, RequestId};
use serde::{Deserialize, Serialize};

/// References to the four audit records the friction gate wrote before
/// issuing this confirmation (distilled §3 "friction-evidence").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrictionEvidence {
    pub deliberation_record_id: String,
    pub edit_record_id: String,
    pub challenge_record_id: String,
    pub cooldown_record_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmation_id: ConfirmationId,
    pub request_id: RequestId,
    pub approver: ActorId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub content_hash: Hash256,
    pub human_initiated: bool,
    pub friction_evidence: FrictionEvidence,
}

impl Confirmation {
    pub fn new(
        request_id: RequestId,
        approver: ActorId,
        expires_at: DateTime<Utc>,
        content_hash: Hash256,
        friction_evidence: FrictionEvidence,
    ) -> Self {
        Self {
            confirmation_id: ConfirmationId::new(),
            request_id,
            approver,
            created_at: Utc::now(),
            expires_at,
            content_hash,
            human_initiated: true,
            friction_evidence,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
