//! Scalar detail values attached to audit records and canonical operations.
//!
//! A closed scalar enum plus a `BTreeMap` for the surrounding mapping keeps
//! key order structurally guaranteed (rather than sorted ad hoc right before
//! hashing), and keeps the set of representable values closed so a detail
//! can never silently carry something unhashable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::{HashError, Hash256};

/// A single scalar value. Closed on purpose — if it grows, every
/// hash-canonicalization call site must be re-audited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        DetailValue::Bool(v)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        DetailValue::Int(v)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        DetailValue::Float(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        DetailValue::Str(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        DetailValue::Str(v)
    }
}

/// A sorted mapping of string keys to scalar values — the "details"
/// attached to an audit record, or the "parameters" of a canonical operation.
pub type Details = BTreeMap<String, DetailValue>;

/// Hash a `Details` map using the shared canonicalization routine.
pub fn canonical_details_hash(details: &Details) -> Result<Hash256, HashError> {
    let value = serde_json::to_value(details)?;
    Hash256::of_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_hash_is_independent_of_insertion_order() {
        let mut a = Details::new();
        a.insert("b".into(), DetailValue::Int(1));
        a.insert("a".into(), DetailValue::Int(2));

        let mut b = Details::new();
        b.insert("a".into(), DetailValue::Int(2));
        b.insert("b".into(), DetailValue::Int(1));

        assert_eq!(
            canonical_details_hash(&a).unwrap(),
            canonical_details_hash(&b).unwrap()
        );
    }

    #[test]
    fn different_values_hash_differently() {
        let mut a = Details::new();
        a.insert("k".into(), DetailValue::Str("x".into()));
        let mut b = Details::new();
        b.insert("k".into(), DetailValue::Str("y".into()));
        assert_ne!(
            canonical_details_hash(&a).unwrap(),
            canonical_details_hash(&b).unwrap()
        );
    }
}
