//! The one shared canonicalization and hashing routine.
//!
//! Every component that needs to hash "the same thing" — an audit record's
//! details, an operation's canonical form — goes through [`Hash256::of_json`].
//! Divergence here would silently break the chain-integrity and
//! content-binding invariants the governance core depends on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 256-bit cryptographic digest, displayed as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hash256([u8; 32]);

#[derive(Debug, Error)]
pub enum HashError {
    #[error("hash must be 64 hex characters, got {0}")]
    WrongLength(usize),
    #[error("invalid hex in hash: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("failed to canonicalize value: {0}")]
    Canonicalize(#[from] serde_json::Error),
}

impl Hash256 {
    /// Hash of the empty byte string, used as the audit chain's genesis sentinel.
    pub fn genesis() -> Self {
        Self::of_bytes(b"sentinel-genesis")
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a JSON value after sorting object keys and using a stable
    /// scalar encoding. `serde_json`'s default `Map` is already a `BTreeMap`
    /// (the `preserve_order` feature is not enabled anywhere in this
    /// workspace), so a plain `to_vec` over the value is already
    /// byte-identical across any reproduction — this is what lets
    /// `verify_chain` and `validate(token, operation)` be reproducible.
    pub fn of_json(value: &serde_json::Value) -> Result<Self, HashError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::of_bytes(&bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(HashError::WrongLength(s.len()));
        }
        let bytes = hex::decode(s)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl TryFrom<String> for Hash256 {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hash256> for String {
    fn from(value: Hash256) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_hex_chars() {
        let h = Hash256::of_bytes(b"hello");
        assert_eq!(h.to_hex().len(), 64);
        assert!(h.to_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(Hash256::of_bytes(b"x"), Hash256::of_bytes(b"x"));
        assert_ne!(Hash256::of_bytes(b"x"), Hash256::of_bytes(b"y"));
    }

    #[test]
    fn roundtrip_through_hex() {
        let h = Hash256::of_bytes(b"roundtrip");
        let parsed: Hash256 = h.to_hex().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn json_canonicalization_is_key_order_independent() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(Hash256::of_json(&a).unwrap(), Hash256::of_json(&b).unwrap());
    }

    #[test]
    fn genesis_is_stable() {
        assert_eq!(Hash256::genesis(), Hash256::genesis());
        assert_eq!(Hash256::genesis().to_hex().len(), 64);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!("abcd".parse::<Hash256>(), Err(HashError::WrongLength(4))));
    }
}
