//! Domain/range ordering: superclass annotation and target-type pruning
//! (spec.md §4.3).

use std::collections::BTreeMap;

use narrascope_kernel::{AdapterError, Direction, Iri, Node, Triple};

use crate::store::TripleStore;

/// `domain_range` toggle plus the configured target classes ordering prunes
/// against.
#[derive(Debug, Clone, Default)]
pub struct OrderingConfig {
    pub domain_range: bool,
    pub target_types: Vec<Iri>,
}

/// A triple annotated with the superclass of each endpoint.
///
/// `object_superclass` is `None` when the object is a literal — literals
/// have no `rdfs:subClassOf` chain, so the original's per-endpoint
/// superclass lookup is a no-op there. This is a narrower refinement of
/// spec.md's description, not a departure from it: the prune rule below
/// only ever reads whichever side is the "free endpoint", and for ingoing
/// triples the free endpoint (the subject) is always a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTriple {
    pub triple: Triple,
    pub subject_superclass: Iri,
    pub object_superclass: Option<Iri>,
}

/// Annotate every triple with its endpoints' superclasses, then — if
/// `domain_range` is on — drop any whose free endpoint's superclass doesn't
/// intersect `target_types`.
///
/// The free endpoint is the object for `Outgoing` triples, the subject for
/// `Ingoing` triples (spec.md §4.3 point 2). `SpecOutgoing` triples are not
/// meant to pass through ordering; callers should not call this on them.
///
/// # Errors
///
/// Propagates `AdapterError` from the `superclass` lookups; a `Cycle` is not
/// raised here (the adapter already folds cycles into "return the node
/// itself" per spec.md §4.1, §7).
pub fn annotate(
    store: &dyn TripleStore,
    config: &OrderingConfig,
    triples: Vec<Triple>,
    direction: Direction,
) -> Result<Vec<AnnotatedTriple>, AdapterError> {
    let mut out = Vec::with_capacity(triples.len());
    for triple in triples {
        let subject_superclass = store.superclass(&triple.subject)?;
        let object_superclass = match &triple.object {
            Node::Resource(iri) => Some(store.superclass(iri)?),
            Node::Literal(_) => None,
        };

        if config.domain_range && !free_endpoint_matches(&triple, direction, &subject_superclass, object_superclass.as_ref(), &config.target_types) {
            continue;
        }

        out.push(AnnotatedTriple {
            triple,
            subject_superclass,
            object_superclass,
        });
    }
    Ok(out)
}

fn free_endpoint_matches(
    _triple: &Triple,
    direction: Direction,
    subject_superclass: &Iri,
    object_superclass: Option<&Iri>,
    target_types: &[Iri],
) -> bool {
    if target_types.is_empty() {
        return true;
    }
    match direction {
        Direction::Outgoing => object_superclass.is_some_and(|sc| target_types.contains(sc)),
        Direction::Ingoing => target_types.contains(subject_superclass),
        Direction::SpecOutgoing => true,
    }
}

/// Running `(path, iteration, total_seen, per-target-class counts)` table,
/// accumulated across iterations (spec.md §4.3 point 3).
#[derive(Debug, Clone, Default)]
pub struct OrderingInfo {
    pub total_seen: u64,
    pub per_target_class: BTreeMap<Iri, u64>,
}

/// Accumulates [`OrderingInfo`] per path key across the whole run.
#[derive(Debug, Clone, Default)]
pub struct OrderingTracker {
    table: BTreeMap<String, OrderingInfo>,
}

impl OrderingTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one path's freshly-annotated batch into the running table.
    pub fn record(&mut self, path_key: &str, annotated: &[AnnotatedTriple]) {
        let entry = self.table.entry(path_key.to_string()).or_default();
        entry.total_seen += annotated.len() as u64;
        for a in annotated {
            if let Some(sc) = &a.object_superclass {
                *entry.per_target_class.entry(sc.clone()).or_insert(0) += 1;
            }
        }
    }

    #[must_use]
    pub fn get(&self, path_key: &str) -> Option<&OrderingInfo> {
        self.table.get(path_key)
    }
}
