//! The structured policy configuration document (distilled §6
//! "Policy configuration"). Defines and validates the in-memory shape
//! only — loading from TOML/JSON, environment discovery, and CLI flags
//! are a caller concern (distilled §1 non-goal: "configuration loaders").

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Hard floors below which deliberation/cooldown durations may never be
/// configured, matching the Python original's `MIN_DELIBERATION_SECONDS`
/// and `MIN_COOLDOWN_SECONDS` (`governance_friction/tests/test_cooldown.py`).
pub const MIN_DELIBERATION_SECONDS: f64 = 5.0;
pub const MIN_COOLDOWN_SECONDS: f64 = 3.0;

/// The structured document of distilled §6: authorized/excluded subject
/// sets, attestation validity period, deliberation/cooldown overrides
/// (clamped to floors at construction, not at use), per-phase forbidden
/// lists, and the read-only adjacency matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub scope: Scope,
    pub attestation_validity_seconds: i64,
    min_deliberation_seconds: f64,
    min_cooldown_seconds: f64,
    pub forbidden_imports: BTreeSet<String>,
    pub forbidden_actions: BTreeSet<String>,
    pub read_only_phases: BTreeSet<String>,
}

impl PolicyConfig {
    /// Construct a config, clamping deliberation/cooldown overrides up to
    /// their floors immediately — a caller can only ever loosen friction
    /// by raising the override, never lower it below the hard minimum
    /// (distilled §4.6 invariant: "no override may reduce below the
    /// floor").
    pub fn new(
        scope: Scope,
        attestation_validity_seconds: i64,
        min_deliberation_seconds: f64,
        min_cooldown_seconds: f64,
        forbidden_imports: BTreeSet<String>,
        forbidden_actions: BTreeSet<String>,
        read_only_phases: BTreeSet<String>,
    ) -> Self {
        Self {
            scope,
            attestation_validity_seconds,
            min_deliberation_seconds: min_deliberation_seconds.max(MIN_DELIBERATION_SECONDS),
            min_cooldown_seconds: min_cooldown_seconds.max(MIN_COOLDOWN_SECONDS),
            forbidden_imports,
            forbidden_actions,
            read_only_phases,
        }
    }

    pub fn min_deliberation_seconds(&self) -> f64 {
        self.min_deliberation_seconds
    }

    pub fn min_cooldown_seconds(&self) -> f64 {
        self.min_cooldown_seconds
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(
            Scope::empty(),
            24 * 3600,
            MIN_DELIBERATION_SECONDS,
            MIN_COOLDOWN_SECONDS,
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_below_floor_is_clamped_up() {
        let cfg = PolicyConfig::new(
            Scope::empty(),
            3600,
            0.1,
            0.1,
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        );
        assert_eq!(cfg.min_deliberation_seconds(), MIN_DELIBERATION_SECONDS);
        assert_eq!(cfg.min_cooldown_seconds(), MIN_COOLDOWN_SECONDS);
    }

    #[test]
    fn override_above_floor_is_preserved() {
        let cfg = PolicyConfig::new(
            Scope::empty(),
            3600,
            30.0,
            10.0,
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        );
        assert_eq!(cfg.min_deliberation_seconds(), 30.0);
        assert_eq!(cfg.min_cooldown_seconds(), 10.0);
    }

    #[test]
    fn default_config_uses_floors() {
        let cfg = PolicyConfig::default();
        assert_eq!(cfg.min_deliberation_seconds(), MIN_DELIBERATION_SECONDS);
        assert_eq!(cfg.min_cooldown_seconds(), MIN_COOLDOWN_SECONDS);
    }
}
