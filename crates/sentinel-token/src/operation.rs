//! Canonical form of an operation a token authorizes — kind, target, and
//! sorted-key parameters, hashed with [`sentinel_types::Hash256`]
//! (distilled §4.3 "Canonical form of an operation").

use sentinel_types::{Details, Hash256};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOperation {
    pub kind: String,
    pub target: String,
    pub parameters: Details,
}

impl CanonicalOperation {
    pub fn new(kind: impl Into<String>, target: impl Into<String>, parameters: Details) -> Self {
        Self { kind: kind.into(), target: target.into(), parameters }
    }

    /// A deterministic byte string derived from kind, target, and
    /// sorted-key parameters, digested with a strong 256-bit hash.
    /// `Details` is a `BTreeMap`, so serialization is already sorted-key.
    pub fn canonical_hash(&self) -> Hash256 {
        Hash256::of_json(&serde_json::json!({
            "kind": self.kind,
            "target": self.target,
            "parameters": self.parameters,
        }))
        .expect("CanonicalOperation always serializes")
    }
}
