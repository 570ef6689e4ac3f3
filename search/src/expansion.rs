//! Per-node expansion: the five steps of spec.md §4.6, the unit `rayon`
//! fans out over in the search loop.

use std::collections::BTreeSet;

use narrascope_kernel::{AdapterError, Direction, Iri, TaggedTriple};

use crate::filter::{self, FilterConfig};
use crate::ordering::{self, AnnotatedTriple, OrderingConfig};
use crate::store::TripleStore;

/// The independent output bundle one node's expansion produces. Owned and
/// self-contained so `rayon::par_iter` can hand it back across the fan-out
/// boundary without borrowing anything from the worker (spec.md §5).
#[derive(Debug, Clone, Default)]
pub struct ExpansionOutput {
    pub subgraph_ingoing: Vec<TaggedTriple>,
    pub pending_ingoing: Vec<AnnotatedTriple>,
    pub subgraph_outgoing: Vec<TaggedTriple>,
    pub pending_outgoing: Vec<AnnotatedTriple>,
    pub discarded: BTreeSet<Iri>,
}

/// Expand one node at `iteration`: query the adapter, filter, order, and
/// tag the surviving triples.
///
/// # Errors
///
/// Propagates `AdapterError` from the underlying `neighbours`/`superclass`
/// calls. A `NotFound` here is not special-cased — the caller (the search
/// loop) is responsible for treating it as an empty neighbourhood per
/// spec.md §7, since that decision depends on loop-level bookkeeping
/// (marking the node visited) this function has no access to.
pub fn expand_node(
    store: &dyn TripleStore,
    filter_config: &FilterConfig,
    ordering_config: &OrderingConfig,
    node: &Iri,
    excluded_predicates: &[Iri],
    iteration: u32,
) -> Result<ExpansionOutput, AdapterError> {
    let neighbourhood = store.neighbours(node, excluded_predicates)?;

    let mut candidates: Vec<Iri> = neighbourhood
        .ingoing
        .iter()
        .map(|t| t.subject.clone())
        .collect();
    candidates.extend(
        neighbourhood
            .outgoing
            .iter()
            .filter_map(|t| t.object.as_iri().cloned()),
    );
    candidates.sort();
    candidates.dedup();

    let discarded = filter::discard(filter_config, &candidates, &neighbourhood.spec_outgoing);

    let surviving_ingoing: Vec<_> = neighbourhood
        .ingoing
        .into_iter()
        .filter(|t| !discarded.contains(&t.subject))
        .collect();
    let surviving_outgoing: Vec<_> = neighbourhood
        .outgoing
        .into_iter()
        .filter(|t| !t.object.as_iri().is_some_and(|o| discarded.contains(o)))
        .collect();

    let pending_ingoing = ordering::annotate(store, ordering_config, surviving_ingoing, Direction::Ingoing)?;
    let pending_outgoing =
        ordering::annotate(store, ordering_config, surviving_outgoing, Direction::Outgoing)?;

    let subgraph_ingoing = pending_ingoing
        .iter()
        .map(|a| TaggedTriple::new(a.triple.clone(), Direction::Ingoing, iteration))
        .collect();
    let subgraph_outgoing = pending_outgoing
        .iter()
        .map(|a| TaggedTriple::new(a.triple.clone(), Direction::Outgoing, iteration))
        .collect();

    Ok(ExpansionOutput {
        subgraph_ingoing,
        pending_ingoing,
        subgraph_outgoing,
        pending_outgoing,
        discarded,
    })
}
