//! Scope and Attestation — the human-declared authorization boundary a
//! token or confirmation is checked against (distilled §3 "Scope /
//! Attestation", §3 glossary: "a human-produced, expiring declaration
//! that a subject is within authorized scope").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subject pattern: either an exact string or a wildcard-suffix pattern
/// (`"https://authorized.example/*"`). Grounded on the original's
/// `_matches_pattern` in `governance_friction/boundaries.py`-adjacent scope
/// checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectPattern {
    Exact(String),
    WildcardSuffix(String),
}

impl SubjectPattern {
    /// Parse `"prefix/*"` as a wildcard-suffix pattern, anything else as
    /// exact. `"*"` alone is rejected at construction by [`Scope::new`]
    /// (an unconstrained wildcard defeats the purpose of a scope).
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) if !prefix.is_empty() => SubjectPattern::WildcardSuffix(prefix.to_string()),
            _ => SubjectPattern::Exact(raw.to_string()),
        }
    }

    pub fn matches(&self, subject: &str) -> bool {
        match self {
            SubjectPattern::Exact(exact) => exact == subject,
            SubjectPattern::WildcardSuffix(prefix) => subject.starts_with(prefix.as_str()),
        }
    }
}

/// Authorized/excluded subject-set pair. Exclusion always wins over
/// authorization (distilled §3 invariant: "authorization is consulted
/// before token issuance").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scope {
    authorized: Vec<SubjectPattern>,
    excluded: Vec<SubjectPattern>,
}

impl Scope {
    pub fn new(authorized: Vec<String>, excluded: Vec<String>) -> Self {
        Self {
            authorized: authorized.iter().map(|s| SubjectPattern::parse(s)).collect(),
            excluded: excluded.iter().map(|s| SubjectPattern::parse(s)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self { authorized: Vec::new(), excluded: Vec::new() }
    }

    /// `true` only if `subject` matches an authorized pattern and matches
    /// no excluded pattern. Exclusion takes priority.
    pub fn permits(&self, subject: &str) -> bool {
        if self.excluded.iter().any(|p| p.matches(subject)) {
            return false;
        }
        self.authorized.iter().any(|p| p.matches(subject))
    }
}

/// A human-produced, expiring declaration that a subject (or scope) is
/// within authorized bounds. Attestations are the only mechanism by which
/// a [`Scope`] becomes binding at a point in time (distilled §3 field
/// list: authorized-subject-set, excluded-subject-set, attester-identity,
/// attested-at, expires-at).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attestation {
    pub scope: Scope,
    pub attester: sentinel_types::ActorId,
    pub attested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Attestation {
    pub fn new(
        scope: Scope,
        attester: sentinel_types::ActorId,
        attested_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self { scope, attester, attested_at, expires_at }
    }

    /// Expiry is absolute: a clock read exactly at `expires_at` is expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn permits(&self, subject: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.scope.permits(subject)
    }
}
