//! Candidate selection for the chosen path (spec.md §4.5).

use narrascope_kernel::Iri;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// `all` expands every candidate; `random` expands exactly one, drawn
/// uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    All,
    Random,
}

/// Deterministic when seeded: tests and the reproducibility property
/// (spec.md §5, §8) depend on `StdRng` being seeded rather than
/// entropy-sourced.
pub struct NodeSelector {
    mode: SelectionMode,
    rng: StdRng,
}

impl NodeSelector {
    #[must_use]
    pub fn new(mode: SelectionMode, seed: u64) -> Self {
        Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Select the candidates to expand this iteration. Returns all of
    /// `candidates` in `All` mode; exactly one (or none, if `candidates` is
    /// empty) in `Random` mode.
    pub fn select(&mut self, candidates: &[Iri]) -> Vec<Iri> {
        match self.mode {
            SelectionMode::All => candidates.to_vec(),
            SelectionMode::Random => candidates
                .choose(&mut self.rng)
                .cloned()
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_mode_returns_every_candidate() {
        let mut selector = NodeSelector::new(SelectionMode::All, 0);
        let candidates = vec![Iri::new("A"), Iri::new("B"), Iri::new("C")];
        assert_eq!(selector.select(&candidates), candidates);
    }

    #[test]
    fn random_mode_returns_exactly_one() {
        let mut selector = NodeSelector::new(SelectionMode::Random, 7);
        let candidates = vec![Iri::new("A"), Iri::new("B"), Iri::new("C")];
        let selected = selector.select(&candidates);
        assert_eq!(selected.len(), 1);
        assert!(candidates.contains(&selected[0]));
    }

    #[test]
    fn same_seed_yields_same_choice() {
        let candidates = vec![Iri::new("A"), Iri::new("B"), Iri::new("C"), Iri::new("D")];
        let mut a = NodeSelector::new(SelectionMode::Random, 42);
        let mut b = NodeSelector::new(SelectionMode::Random, 42);
        assert_eq!(a.select(&candidates), b.select(&candidates));
    }

    #[test]
    fn random_mode_on_empty_candidates_returns_empty() {
        let mut selector = NodeSelector::new(SelectionMode::Random, 1);
        assert!(selector.select(&[]).is_empty());
    }
}
