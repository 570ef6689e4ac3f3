//! Path ranking: the six scoring rules over the occurrence map
//! (spec.md §4.4).

use std::collections::BTreeMap;

use narrascope_kernel::PathKey;
use serde::{Deserialize, Serialize};

/// Selectable scoring rule, round-trippable through config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    PredFreq,
    InversePredFreq,
    EntropyPredFreq,
    PredObjectFreq,
    InversePredObjectFreq,
    EntropyPredObjectFreq,
}

impl ScoringRule {
    /// `pred_*` and `pred_object_*` variants share identical scoring math —
    /// the distinction is which key shape (`Predicate` vs. an endpoint
    /// variant) populates the occurrence map at the point a given rule is
    /// selected, not a different formula.
    fn score(self, count: u64, total: u64) -> f64 {
        let c = count as f64;
        match self {
            Self::PredFreq | Self::PredObjectFreq => c,
            Self::InversePredFreq | Self::InversePredObjectFreq => -c,
            Self::EntropyPredFreq | Self::EntropyPredObjectFreq => {
                let n = total as f64;
                if n == 0.0 || c == 0.0 {
                    0.0
                } else {
                    let p = c / n;
                    -(p * p.ln())
                }
            }
        }
    }
}

/// Scores the occurrence map and returns the single highest-ranked path.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    pub rule: ScoringRule,
}

impl Ranker {
    #[must_use]
    pub fn new(rule: ScoringRule) -> Self {
        Self { rule }
    }

    /// Highest-scoring path, ties broken by `PathKey`'s `Ord` (priority
    /// ascending, then lexicographic) — the same tie-break spec.md §4.4
    /// specifies in words. `None` on an empty map, which the loop treats as
    /// "no more paths" (spec.md §7's `RankerError::Empty`).
    #[must_use]
    pub fn rank(&self, occurrences: &BTreeMap<PathKey, u64>) -> Option<PathKey> {
        self.rank_with_score(occurrences).map(|(key, _)| key)
    }

    /// Same as [`Ranker::rank`] but also returns the winning score, for
    /// callers that persist it in the expansion record (spec.md §3).
    #[must_use]
    pub fn rank_with_score(&self, occurrences: &BTreeMap<PathKey, u64>) -> Option<(PathKey, f64)> {
        let total: u64 = occurrences.values().sum();
        occurrences
            .iter()
            .map(|(key, &count)| (key, self.rule.score(count, total)))
            .max_by(|(key_a, score_a), (key_b, score_b)| {
                score_a
                    .partial_cmp(score_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| key_b.cmp(key_a))
            })
            .map(|(key, score)| (key.clone(), score))
    }
}
