//! External contracts the pipeline calls through (distilled §6 "External
//! truth-engine contract" / "External submission platform contract"). The
//! pipeline depends only on these traits — never a concrete HTTP client —
//! so the boundary-enforced core never imports a network crate directly
//! (grounded on `maple-storage::traits`'s trait/impl split).

use async_trait::async_trait;
use sentinel_types::{Details, Hash256};

/// A verification request against the truth engine: "is this the content
/// a human actually confirmed?"
#[derive(Clone, Debug)]
pub struct TruthEngineRequest {
    pub subject: String,
    pub content_hash: Hash256,
    pub details: Details,
}

#[derive(Clone, Debug)]
pub struct TruthEngineVerdict {
    pub verified: bool,
    pub reason: Option<String>,
}

#[async_trait]
pub trait TruthEngineClient: Send + Sync {
    async fn verify(&self, request: TruthEngineRequest) -> Result<TruthEngineVerdict, String>;
}

/// A transmission to the destination submission platform.
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    pub destination: String,
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Distilled §6 "External submission platform contract": "it does not
/// interpret status beyond the enum acknowledged | rejected | pending."
/// Closed on purpose — the pipeline is forbidden from re-deriving or
/// collapsing this into a boolean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStatus {
    Acknowledged,
    Rejected,
    Pending,
}

#[derive(Clone, Debug)]
pub struct SubmissionReceipt {
    pub status: SubmissionStatus,
    pub platform_reference: Option<String>,
}

#[async_trait]
pub trait SubmissionPlatformClient: Send + Sync {
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, String>;
}

/// A reference implementation over `reqwest`, kept behind the
/// `reqwest_clients` feature so the default build of this crate — and
/// everything downstream of it — never pulls a network crate into the
/// boundary-enforced surfaces. C2 would flag exactly this import if it
/// ever leaked into the core rather than staying in this opt-in module.
#[cfg(feature = "reqwest_clients")]
pub mod reqwest_clients {
    use super::*;

    /// Distilled §6: "Transport must be HTTPS; non-HTTPS endpoints are a
    /// configuration error." Shared by every reference client constructor
    /// so the check can't be skipped by adding a new one.
    fn require_https(base_url: &str) -> Result<(), crate::error::TransmissionFailure> {
        if base_url.starts_with("https://") {
            Ok(())
        } else {
            Err(crate::error::TransmissionFailure::Configuration(format!(
                "endpoint '{base_url}' is not HTTPS"
            )))
        }
    }

    pub struct ReqwestTruthEngineClient {
        base_url: String,
        http: reqwest::Client,
    }

    impl ReqwestTruthEngineClient {
        pub fn new(base_url: impl Into<String>) -> Result<Self, crate::error::TransmissionFailure> {
            let base_url = base_url.into();
            require_https(&base_url)?;
            Ok(Self { base_url, http: reqwest::Client::new() })
        }
    }

    #[async_trait]
    impl TruthEngineClient for ReqwestTruthEngineClient {
        async fn verify(&self, request: TruthEngineRequest) -> Result<TruthEngineVerdict, String> {
            let url = format!("{}/verify", self.base_url);
            let response = self
                .http
                .post(&url)
                .json(&serde_json::json!({
                    "subject": request.subject,
                    "content_hash": request.content_hash.to_hex(),
                    "details": request.details,
                }))
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
            Ok(TruthEngineVerdict {
                verified: body.get("verified").and_then(|v| v.as_bool()).unwrap_or(false),
                reason: body.get("reason").and_then(|v| v.as_str()).map(str::to_string),
            })
        }
    }

    pub struct ReqwestSubmissionPlatformClient {
        base_url: String,
        http: reqwest::Client,
    }

    impl ReqwestSubmissionPlatformClient {
        pub fn new(base_url: impl Into<String>) -> Result<Self, crate::error::TransmissionFailure> {
            let base_url = base_url.into();
            require_https(&base_url)?;
            Ok(Self { base_url, http: reqwest::Client::new() })
        }
    }

    #[async_trait]
    impl SubmissionPlatformClient for ReqwestSubmissionPlatformClient {
        async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, String> {
            let url = format!("{}/submit/{}", self.base_url, request.destination);
            let response = self
                .http
                .post(&url)
                .body(request.payload)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(format!("submission platform returned {}", response.status()));
            }
            let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
            let status = match body.get("status").and_then(|v| v.as_str()) {
                Some("rejected") => SubmissionStatus::Rejected,
                Some("pending") => SubmissionStatus::Pending,
                _ => SubmissionStatus::Acknowledged,
            };
            Ok(SubmissionReceipt {
                status,
                platform_reference: body.get("reference").and_then(|v| v.as_str()).map(str::to_string),
            })
        }
    }

}
