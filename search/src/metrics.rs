//! Precision/recall/F1 against a gold standard (spec.md §4.8).

use std::collections::{BTreeMap, BTreeSet};

use narrascope_kernel::Iri;
use serde::Serialize;

/// One iteration's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSample {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Resolves discovered entities through an alias map, then scores them
/// against a fixed gold standard.
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    pub referents: BTreeMap<Iri, Iri>,
    pub gold_standard: BTreeSet<Iri>,
}

impl MetricsObserver {
    #[must_use]
    pub fn new(referents: BTreeMap<Iri, Iri>, gold_standard: BTreeSet<Iri>) -> Self {
        Self {
            referents,
            gold_standard,
        }
    }

    /// `found` is `{subjects of ingoing} ∪ {objects of outgoing}`, passed in
    /// by the loop since resolving that set belongs to loop bookkeeping, not
    /// the observer (spec.md §4.8).
    #[must_use]
    pub fn observe(&self, found: &BTreeSet<Iri>) -> MetricsSample {
        let resolved: BTreeSet<Iri> = found
            .iter()
            .map(|iri| self.referents.get(iri).cloned().unwrap_or_else(|| iri.clone()))
            .collect();

        let true_positives = resolved.intersection(&self.gold_standard).count() as f64;
        let precision = if resolved.is_empty() {
            0.0
        } else {
            true_positives / resolved.len() as f64
        };
        let recall = if self.gold_standard.is_empty() {
            0.0
        } else {
            true_positives / self.gold_standard.len() as f64
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        MetricsSample { precision, recall, f1 }
    }
}

/// The `{best_f1, best_f1_it, last_*}` metadata bundle spec.md §6 emits,
/// folded across every iteration a run observes.
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    best_f1: f64,
    best_f1_it: u32,
    last: Option<MetricsSample>,
}

impl MetricsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, iteration: u32, sample: MetricsSample) {
        if sample.f1 > self.best_f1 {
            self.best_f1 = sample.f1;
            self.best_f1_it = iteration;
        }
        self.last = Some(sample);
    }

    #[must_use]
    pub fn best_f1(&self) -> f64 {
        self.best_f1
    }

    #[must_use]
    pub fn best_f1_it(&self) -> u32 {
        self.best_f1_it
    }

    #[must_use]
    pub fn last(&self) -> Option<MetricsSample> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_recall_f1_match_scenario_six() {
        let observer = MetricsObserver::new(
            BTreeMap::new(),
            BTreeSet::from([Iri::new("E1"), Iri::new("E2"), Iri::new("E3")]),
        );
        let found = BTreeSet::from([Iri::new("E1"), Iri::new("E2"), Iri::new("X")]);
        let sample = observer.observe(&found);
        assert!((sample.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((sample.recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((sample.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn referents_resolve_aliases_before_scoring() {
        let mut referents = BTreeMap::new();
        referents.insert(Iri::new("alias"), Iri::new("E1"));
        let observer = MetricsObserver::new(referents, BTreeSet::from([Iri::new("E1")]));
        let sample = observer.observe(&BTreeSet::from([Iri::new("alias")]));
        assert_eq!(sample.precision, 1.0);
        assert_eq!(sample.recall, 1.0);
    }

    #[test]
    fn tracker_keeps_best_f1_iteration() {
        let mut tracker = MetricsTracker::new();
        tracker.record(1, MetricsSample { precision: 0.5, recall: 0.5, f1: 0.5 });
        tracker.record(2, MetricsSample { precision: 0.9, recall: 0.9, f1: 0.9 });
        tracker.record(3, MetricsSample { precision: 0.1, recall: 0.1, f1: 0.1 });
        assert_eq!(tracker.best_f1_it(), 2);
        assert!((tracker.best_f1() - 0.9).abs() < 1e-9);
        assert_eq!(tracker.last().unwrap().f1, 0.1);
    }
}
