//! Pending-ingoing / pending-outgoing frontier stores (spec.md §3, §9
//! "dynamic dataframe manipulation").
//!
//! Modelled as an append-only row log plus `BTreeMap` indices, per spec.md
//! §9's explicit design note, rather than the source's ad hoc table
//! rewrites: purging is a set-difference over live row indices, not a
//! rebuild.

use std::collections::BTreeMap;

use narrascope_kernel::{Iri, PathKey};

use crate::ordering::AnnotatedTriple;

/// One directional relation store: a row log plus indices for both
/// predicate-only and predicate+endpoint path-key lookups.
#[derive(Debug, Clone, Default)]
struct Relation {
    rows: Vec<AnnotatedTriple>,
    /// Live row ids, i.e. not yet purged. Kept separate from `rows.len()`
    /// so purge is a set-difference rather than a `Vec` rewrite.
    live: Vec<bool>,
    by_predicate: BTreeMap<Iri, Vec<usize>>,
    by_predicate_endpoint: BTreeMap<(Iri, Iri), Vec<usize>>,
}

impl Relation {
    fn push(&mut self, row: AnnotatedTriple, predicate_endpoint_key: (Iri, Iri)) {
        let id = self.rows.len();
        self.by_predicate
            .entry(row.triple.predicate.clone())
            .or_default()
            .push(id);
        self.by_predicate_endpoint
            .entry(predicate_endpoint_key)
            .or_default()
            .push(id);
        self.live.push(true);
        self.rows.push(row);
    }

    fn purge(&mut self, is_candidate_visited: impl Fn(&AnnotatedTriple) -> bool) {
        for (id, row) in self.rows.iter().enumerate() {
            if is_candidate_visited(row) {
                self.live[id] = false;
            }
        }
    }

    fn candidates_by_predicate(&self, predicate: &Iri, candidate_of: impl Fn(&AnnotatedTriple) -> Option<Iri>) -> Vec<Iri> {
        self.by_predicate
            .get(predicate)
            .into_iter()
            .flatten()
            .filter(|&&id| self.live[id])
            .filter_map(|&id| candidate_of(&self.rows[id]))
            .collect()
    }

    fn candidates_by_predicate_endpoint(
        &self,
        key: &(Iri, Iri),
        candidate_of: impl Fn(&AnnotatedTriple) -> Option<Iri>,
    ) -> Vec<Iri> {
        self.by_predicate_endpoint
            .get(key)
            .into_iter()
            .flatten()
            .filter(|&&id| self.live[id])
            .filter_map(|&id| candidate_of(&self.rows[id]))
            .collect()
    }
}

/// The pending-ingoing and pending-outgoing frontier, indexed for fast
/// path-key lookup.
#[derive(Debug, Clone, Default)]
pub struct PendingStore {
    ingoing: Relation,
    outgoing: Relation,
}

impl PendingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ingoing row `(?s, p, node)`. Indexed by predicate alone and
    /// by `(predicate, node)` — `node` here is the already-expanded
    /// endpoint, matching the `ingoing-<p>;<o>` path-key shape.
    pub fn push_ingoing(&mut self, row: AnnotatedTriple) {
        let key = (row.triple.predicate.clone(), row.triple.object.as_str().into());
        self.ingoing.push(row, key);
    }

    /// Append an outgoing row `(node, p, ?o)`. Indexed by predicate alone
    /// and by `(node, predicate)`, matching the `outgoing-<s>;<p>` shape.
    pub fn push_outgoing(&mut self, row: AnnotatedTriple) {
        let key = (row.triple.subject.clone(), row.triple.predicate.clone());
        self.outgoing.push(row, key);
    }

    /// Remove from both relations any row whose candidate endpoint is now
    /// in `visited`.
    pub fn purge(&mut self, visited: &std::collections::BTreeSet<Iri>) {
        self.ingoing.purge(|row| visited.contains(&row.triple.subject));
        self.outgoing
            .purge(|row| row.triple.object.as_iri().is_some_and(|o| visited.contains(o)));
    }

    /// Candidate nodes reachable through `path`, empty if the path is
    /// unknown or fully purged.
    #[must_use]
    pub fn candidates_for(&self, path: &PathKey) -> Vec<Iri> {
        match path {
            PathKey::Predicate { predicate, .. } => {
                let mut out = self
                    .ingoing
                    .candidates_by_predicate(predicate, |row| Some(row.triple.subject.clone()));
                out.extend(
                    self.outgoing
                        .candidates_by_predicate(predicate, |row| row.triple.object.as_iri().cloned()),
                );
                out
            }
            PathKey::IngoingEndpoint { predicate, object, .. } => {
                let key = (predicate.clone(), object.as_str().into());
                self.ingoing
                    .candidates_by_predicate_endpoint(&key, |row| Some(row.triple.subject.clone()))
            }
            PathKey::OutgoingEndpoint { subject, predicate, .. } => {
                let key = (subject.as_str().into(), predicate.clone());
                self.outgoing
                    .candidates_by_predicate_endpoint(&key, |row| row.triple.object.as_iri().cloned())
            }
        }
    }
}
