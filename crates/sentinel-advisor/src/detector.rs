//! The rubber-stamp advisory detector (C7). Reads confirmation history
//! grouped by approver and emits purely informational warnings — see the
//! module doc on [`crate::RubberStampWarning`] for why there is no
//! blocking path.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sentinel_types::ActorId;

use crate::warning::{RubberStampWarning, WarningLevel};

/// Reviewers with fewer than this many recorded decisions are always
/// cold-start: never enough history to accuse anyone of rubber-stamping
/// (distilled §4.7, default 5).
pub const MIN_DECISIONS_FOR_ANALYSIS: usize = 5;

const RAPID_SUCCESSION_WINDOW: Duration = Duration::from_secs(10);
const RAPID_SUCCESSION_THRESHOLD: usize = 3;
const FLOOR_PATTERN_MIN_DECISIONS: usize = 10;
const FLOOR_PATTERN_TOLERANCE_SECONDS: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct ReviewerStatistics {
    pub decision_count: usize,
    pub average_deliberation: f64,
    pub min_deliberation: f64,
    pub max_deliberation: f64,
}

pub struct RubberStampDetector {
    history: Mutex<HashMap<ActorId, Vec<(Instant, f64)>>>,
    min_deliberation_floor: f64,
}

impl Default for RubberStampDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RubberStampDetector {
    pub fn new() -> Self {
        Self::with_floor(sentinel_policy_floor())
    }

    pub fn with_floor(min_deliberation_floor: f64) -> Self {
        Self { history: Mutex::new(HashMap::new()), min_deliberation_floor }
    }

    /// `decision_id` is accepted for API symmetry with the caller's
    /// confirmation flow but is not itself part of the pattern signal —
    /// only the timing and count matter here.
    pub fn record_confirmation(&self, approver: ActorId, _decision_id: &str, deliberation_seconds: f64) {
        self.history
            .lock()
            .expect("rubber-stamp history lock poisoned")
            .entry(approver)
            .or_default()
            .push((Instant::now(), deliberation_seconds));
    }

    pub fn get_reviewer_statistics(&self, approver: &ActorId) -> ReviewerStatistics {
        let history = self.history.lock().expect("rubber-stamp history lock poisoned");
        let decisions = history.get(approver).cloned().unwrap_or_default();
        if decisions.is_empty() {
            return ReviewerStatistics { decision_count: 0, average_deliberation: 0.0, min_deliberation: 0.0, max_deliberation: 0.0 };
        }
        let values: Vec<f64> = decisions.iter().map(|(_, e)| *e).collect();
        let sum: f64 = values.iter().sum();
        ReviewerStatistics {
            decision_count: values.len(),
            average_deliberation: sum / values.len() as f64,
            min_deliberation: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max_deliberation: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn clear_history(&self, approver: &ActorId) {
        self.history.lock().expect("rubber-stamp history lock poisoned").remove(approver);
    }

    /// Cold-start reviewers always get `warning_level = None,
    /// is_cold_start = true`. Otherwise: three or more confirmations
    /// within any 10-second window raises at least `Low`; average
    /// deliberation pinned at the floor across >= 10 confirmations raises
    /// at least `Medium`; both together raise `High`.
    pub fn analyze_pattern(&self, approver: &ActorId) -> RubberStampWarning {
        let history = self.history.lock().expect("rubber-stamp history lock poisoned");
        let decisions = history.get(approver).cloned().unwrap_or_default();
        drop(history);

        let decision_count = decisions.len();
        let is_cold_start = decision_count < MIN_DECISIONS_FOR_ANALYSIS;

        if is_cold_start {
            return RubberStampWarning {
                warning_level: WarningLevel::None,
                reason: "cold start: not enough decision history for analysis".to_string(),
                decision_count,
                approval_rate: 1.0,
                average_deliberation_seconds: average(&decisions),
                is_cold_start: true,
            };
        }

        let rapid_succession = has_rapid_succession(&decisions);
        let pinned_at_floor = decision_count >= FLOOR_PATTERN_MIN_DECISIONS
            && (average(&decisions) - self.min_deliberation_floor).abs() <= FLOOR_PATTERN_TOLERANCE_SECONDS;

        let (level, reason) = match (rapid_succession, pinned_at_floor) {
            (true, true) => (
                WarningLevel::High,
                "rapid-succession confirmations combined with deliberation pinned at the floor".to_string(),
            ),
            (false, true) => (
                WarningLevel::Medium,
                "average deliberation time is pinned at the configured floor".to_string(),
            ),
            (true, false) => (
                WarningLevel::Low,
                "three or more confirmations within a 10-second window".to_string(),
            ),
            (false, false) => (WarningLevel::None, "no rubber-stamp pattern detected".to_string()),
        };

        RubberStampWarning {
            warning_level: level,
            reason,
            decision_count,
            approval_rate: 1.0,
            average_deliberation_seconds: average(&decisions),
            is_cold_start: false,
        }
    }
}

fn average(decisions: &[(Instant, f64)]) -> f64 {
    if decisions.is_empty() {
        return 0.0;
    }
    decisions.iter().map(|(_, e)| e).sum::<f64>() / decisions.len() as f64
}

fn has_rapid_succession(decisions: &[(Instant, f64)]) -> bool {
    let mut timestamps: Vec<Instant> = decisions.iter().map(|(t, _)| *t).collect();
    timestamps.sort();
    for window in timestamps.windows(RAPID_SUCCESSION_THRESHOLD) {
        let span = window[window.len() - 1].duration_since(window[0]);
        if span <= RAPID_SUCCESSION_WINDOW {
            return true;
        }
    }
    false
}

fn sentinel_policy_floor() -> f64 {
    sentinel_policy::MIN_DELIBERATION_SECONDS
}
