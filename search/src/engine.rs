//! The iteration state machine (spec.md §4.7): owns every piece of mutable
//! state and drives one run to completion.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use narrascope_kernel::{AdapterError, Direction, Iri, Node, PathKey, Priority, TaggedTriple, Triple};
use serde::{Deserialize, Serialize};

use crate::expansion::expand_node;
use crate::filter::FilterConfig;
use crate::frontier::PendingStore;
use crate::metrics::{MetricsObserver, MetricsSample, MetricsTracker};
use crate::node_selector::{NodeSelector, SelectionMode};
use crate::ordering::OrderingConfig;
use crate::ranker::Ranker;
use crate::sink::{EventSink, IterationEvent};
use crate::store::TripleStore;

/// Explicit parallelism knob (REDESIGN FLAGS): replaces the source's
/// overload of `type_interface == ""` with a field independent of adapter
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    Sequential,
    Pool(usize),
}

/// Which of the original's four search modes this run performs. Governs
/// which optional state (`metrics`, `path_node_to_start`) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    TypeNodeMetrics,
    TypeNodeNoMetrics,
    SpecificNode,
    SimpleExploration,
}

/// Static run configuration, fixed for the lifetime of a [`SearchEngine`].
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    pub start: Iri,
    pub iterations: u32,
    pub predicate_filter: Vec<Iri>,
    pub demoted_predicates: Vec<Iri>,
    pub target_node: Option<Iri>,
    pub mode: SearchMode,
    pub parallelism: Parallelism,
}

/// Why the run stopped (spec.md §6 "Exit conditions").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    BudgetExhausted,
    NoMorePaths,
    TargetFound,
}

/// Per-iteration `{subgraph_size, unique_events}` snapshot (spec.md §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubgraphInfo {
    pub subgraph_size: usize,
    pub unique_events: usize,
}

/// `{iteration, chosen_path, expanded_nodes, score}` (spec.md §3).
#[derive(Debug, Clone)]
pub struct ExpansionRecord {
    pub iteration: u32,
    pub chosen_path: Option<PathKey>,
    pub expanded_nodes: Vec<Iri>,
    pub score: Option<f64>,
}

/// Final run summary returned from `run`/`run_with_cancellation`.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub iterations_run: u32,
    pub subgraph_size: usize,
    pub best_f1: Option<f64>,
    pub best_f1_it: Option<u32>,
    pub last_metrics: Option<MetricsSample>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit: ExitReason,
    pub metadata: RunMetadata,
}

const MAX_EXPANSION_RETRIES: u32 = 3;

/// Owns all mutable search state and drives the loop of spec.md §4.7.
pub struct SearchEngine<'a> {
    store: &'a dyn TripleStore,
    filter: FilterConfig,
    ordering: OrderingConfig,
    ranker: Ranker,
    selector: NodeSelector,
    policy: SearchPolicy,

    subgraph: Vec<TaggedTriple>,
    subgraph_dedup: BTreeSet<(Iri, Iri, Node, Direction)>,
    pending_ingoing: PendingStore,
    pending_outgoing: PendingStore,
    visited: BTreeSet<Iri>,
    occurrences: BTreeMap<PathKey, u64>,
    records: Vec<ExpansionRecord>,
    subgraph_info: BTreeMap<u32, SubgraphInfo>,
    unique_events: BTreeSet<Iri>,
    path_node_to_start: Option<BTreeMap<Iri, Vec<Triple>>>,
    metrics: Option<MetricsObserver>,
    metrics_tracker: MetricsTracker,
}

impl<'a> SearchEngine<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn TripleStore,
        filter: FilterConfig,
        ordering: OrderingConfig,
        ranker: Ranker,
        selector: NodeSelector,
        policy: SearchPolicy,
        metrics: Option<MetricsObserver>,
    ) -> Self {
        let path_node_to_start = matches!(policy.mode, SearchMode::SpecificNode).then(BTreeMap::new);
        Self {
            store,
            filter,
            ordering,
            ranker,
            selector,
            policy,
            subgraph: Vec::new(),
            subgraph_dedup: BTreeSet::new(),
            pending_ingoing: PendingStore::new(),
            pending_outgoing: PendingStore::new(),
            visited: BTreeSet::new(),
            occurrences: BTreeMap::new(),
            records: Vec::new(),
            subgraph_info: BTreeMap::new(),
            unique_events: BTreeSet::new(),
            path_node_to_start,
            metrics,
            metrics_tracker: MetricsTracker::new(),
        }
    }

    #[must_use]
    pub fn subgraph(&self) -> &[TaggedTriple] {
        &self.subgraph
    }

    #[must_use]
    pub fn records(&self) -> &[ExpansionRecord] {
        &self.records
    }

    #[must_use]
    pub fn subgraph_info(&self) -> &BTreeMap<u32, SubgraphInfo> {
        &self.subgraph_info
    }

    #[must_use]
    pub fn path_node_to_start(&self, node: &Iri) -> Option<&Vec<Triple>> {
        self.path_node_to_start.as_ref().and_then(|m| m.get(node))
    }

    /// Run to completion with no cancellation signal.
    pub fn run(&mut self, sink: &mut dyn EventSink) -> RunOutcome {
        self.run_with_cancellation(sink, &AtomicBool::new(false))
    }

    /// Run to completion, checking `cancel` at the top of every iteration
    /// (spec.md §5). A cancellation mid-run is reported as
    /// `ExitReason::BudgetExhausted` with `iterations_run` short of the
    /// configured budget.
    pub fn run_with_cancellation(&mut self, sink: &mut dyn EventSink, cancel: &AtomicBool) -> RunOutcome {
        let mut iterations_run = 0;

        for iteration in 1..=self.policy.iterations {
            if cancel.load(AtomicOrdering::Relaxed) {
                break;
            }

            let (chosen_path, score) = if iteration == 1 {
                (None, None)
            } else {
                match self.ranker.rank_with_score(&self.occurrences) {
                    Some((path, score)) => (Some(path), Some(score)),
                    None => return self.finish(ExitReason::NoMorePaths, iterations_run),
                }
            };

            let candidates = self.candidates_for_iteration(iteration, chosen_path.as_ref());
            let selected = self.selector.select(&candidates);

            let outputs = self.expand_all(&selected, iteration);

            let mut new_pending_ingoing = Vec::new();
            let mut new_pending_outgoing = Vec::new();
            for (node, output) in selected.iter().zip(outputs) {
                self.visited.insert(node.clone());
                new_pending_ingoing.extend(output.pending_ingoing.iter().cloned());
                new_pending_outgoing.extend(output.pending_outgoing.iter().cloned());
                self.merge_expansion(iteration, node, output);
            }
            if let Some(path) = &chosen_path {
                self.consume_path(path);
            }

            self.pending_ingoing.purge(&self.visited);
            self.pending_outgoing.purge(&self.visited);

            let metrics_sample = self.observe_metrics();
            if let Some(sample) = metrics_sample {
                self.metrics_tracker.record(iteration, sample);
            }

            self.subgraph_info.insert(
                iteration,
                SubgraphInfo {
                    subgraph_size: self.subgraph.len(),
                    unique_events: self.unique_events.len(),
                },
            );
            self.records.push(ExpansionRecord {
                iteration,
                chosen_path: chosen_path.clone(),
                expanded_nodes: selected.clone(),
                score,
            });

            sink.record(&IterationEvent {
                iteration,
                chosen_path,
                expanded_nodes: selected,
                score,
                new_subgraph_rows: self
                    .subgraph
                    .iter()
                    .filter(|t| t.iteration == iteration)
                    .cloned()
                    .collect(),
                new_pending_ingoing,
                new_pending_outgoing,
                occurrences_snapshot: self.occurrences.clone(),
                metrics: metrics_sample,
            });

            iterations_run = iteration;

            if let Some(target) = &self.policy.target_node {
                if self
                    .path_node_to_start
                    .as_ref()
                    .is_some_and(|m| m.contains_key(target))
                {
                    return self.finish(ExitReason::TargetFound, iterations_run);
                }
            }
        }

        self.finish(ExitReason::BudgetExhausted, iterations_run)
    }

    fn candidates_for_iteration(&self, iteration: u32, chosen_path: Option<&PathKey>) -> Vec<Iri> {
        if iteration == 1 {
            return vec![self.policy.start.clone()];
        }
        let Some(path) = chosen_path else {
            return Vec::new();
        };
        let mut candidates = self.pending_ingoing.candidates_for(path);
        candidates.extend(self.pending_outgoing.candidates_for(path));
        candidates.retain(|n| !self.visited.contains(n));
        candidates.sort();
        candidates.dedup();
        candidates
    }

    fn expand_all(&self, selected: &[Iri], iteration: u32) -> Vec<crate::expansion::ExpansionOutput> {
        let excluded = &self.policy.predicate_filter;
        let call = |node: &Iri| expand_with_retry(self.store, &self.filter, &self.ordering, node, excluded, iteration);

        match self.policy.parallelism {
            Parallelism::Sequential => selected.iter().map(call).collect(),
            Parallelism::Pool(threads) => {
                use rayon::prelude::*;
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => pool.install(|| selected.par_iter().map(call).collect()),
                    Err(_) => selected.iter().map(call).collect(),
                }
            }
        }
    }

    fn merge_expansion(&mut self, _iteration: u32, node: &Iri, output: crate::expansion::ExpansionOutput) {
        for tagged in output.subgraph_ingoing {
            self.insert_subgraph_row(tagged);
        }
        for tagged in output.subgraph_outgoing {
            self.insert_subgraph_row(tagged);
        }

        if self.path_node_to_start.is_some() {
            for row in &output.pending_ingoing {
                self.extend_path_to_start(node, &row.triple.subject, &row.triple);
            }
            for row in &output.pending_outgoing {
                if let Some(object) = row.triple.object.as_iri() {
                    self.extend_path_to_start(node, object, &row.triple);
                }
            }
        }

        for row in &output.pending_ingoing {
            self.bump_occurrences(Direction::Ingoing, row);
        }
        for row in output.pending_ingoing {
            self.pending_ingoing.push_ingoing(row);
        }
        for row in &output.pending_outgoing {
            self.bump_occurrences(Direction::Outgoing, row);
        }
        for row in output.pending_outgoing {
            self.pending_outgoing.push_outgoing(row);
        }
    }

    /// Extend `path_node_to_start` for a newly discovered candidate
    /// endpoint, per spec.md §4.7's "Path provenance": the new entry is the
    /// bridging triple prepended to `node`'s own path (empty for the seed).
    /// The first discovery of a node wins; later rediscoveries through a
    /// longer path never overwrite it.
    fn extend_path_to_start(&mut self, node: &Iri, candidate: &Iri, bridging_triple: &Triple) {
        let Some(map) = &mut self.path_node_to_start else {
            return;
        };
        if map.contains_key(candidate) {
            return;
        }
        let mut path = vec![bridging_triple.clone()];
        if let Some(existing) = map.get(node) {
            path.extend(existing.iter().cloned());
        }
        map.insert(candidate.clone(), path);
    }

    fn insert_subgraph_row(&mut self, tagged: TaggedTriple) {
        let key = (
            tagged.triple.subject.clone(),
            tagged.triple.predicate.clone(),
            tagged.triple.object.clone(),
            tagged.direction,
        );
        if self.subgraph_dedup.insert(key) {
            self.unique_events.insert(tagged.triple.subject.clone());
            if let Some(obj) = tagged.triple.object.as_iri() {
                self.unique_events.insert(obj.clone());
            }
            self.subgraph.push(tagged);
        }
    }

    fn bump_occurrences(&mut self, direction: Direction, row: &crate::ordering::AnnotatedTriple) {
        let superclass_is_target = self.ordering.target_types.contains(&row.subject_superclass);
        let predicate_is_demoted = self.policy.demoted_predicates.contains(&row.triple.predicate);
        let priority = Priority::classify(superclass_is_target, predicate_is_demoted);

        let predicate_key = PathKey::Predicate {
            priority,
            predicate: row.triple.predicate.clone(),
        };
        *self.occurrences.entry(predicate_key).or_insert(0) += 1;

        let endpoint_key = match direction {
            Direction::Ingoing => PathKey::IngoingEndpoint {
                priority,
                predicate: row.triple.predicate.clone(),
                object: row.triple.object.clone(),
            },
            Direction::Outgoing => PathKey::OutgoingEndpoint {
                priority,
                subject: Node::Resource(row.triple.subject.clone()),
                predicate: row.triple.predicate.clone(),
            },
            Direction::SpecOutgoing => return,
        };
        *self.occurrences.entry(endpoint_key).or_insert(0) += 1;
    }

    fn consume_path(&mut self, path: &PathKey) {
        match self.selector_mode() {
            SelectionMode::Random => {
                if let Some(count) = self.occurrences.get_mut(path) {
                    if *count > 1 {
                        *count -= 1;
                    } else {
                        self.occurrences.remove(path);
                    }
                }
            }
            SelectionMode::All => {
                self.occurrences.remove(path);
            }
        }
    }

    fn selector_mode(&self) -> SelectionMode {
        self.selector.mode()
    }

    fn observe_metrics(&self) -> Option<MetricsSample> {
        let observer = self.metrics.as_ref()?;
        let found: BTreeSet<Iri> = self
            .subgraph
            .iter()
            .filter_map(|t| match t.direction {
                Direction::Ingoing => Some(t.triple.subject.clone()),
                Direction::Outgoing => t.triple.object.as_iri().cloned(),
                Direction::SpecOutgoing => None,
            })
            .collect();
        Some(observer.observe(&found))
    }

    fn finish(&self, exit: ExitReason, iterations_run: u32) -> RunOutcome {
        RunOutcome {
            exit,
            metadata: RunMetadata {
                iterations_run,
                subgraph_size: self.subgraph.len(),
                best_f1: self.metrics.as_ref().map(|_| self.metrics_tracker.best_f1()),
                best_f1_it: self.metrics.as_ref().map(|_| self.metrics_tracker.best_f1_it()),
                last_metrics: self.metrics_tracker.last(),
            },
        }
    }
}

fn expand_with_retry(
    store: &dyn TripleStore,
    filter: &FilterConfig,
    ordering: &OrderingConfig,
    node: &Iri,
    excluded: &[Iri],
    iteration: u32,
) -> crate::expansion::ExpansionOutput {
    let mut last_err = None;
    for attempt in 0..MAX_EXPANSION_RETRIES {
        let attempt_result = catch_unwind(AssertUnwindSafe(|| {
            expand_node(store, filter, ordering, node, excluded, iteration)
        }));

        match attempt_result {
            Ok(Ok(output)) => return output,
            Ok(Err(AdapterError::NotFound(_))) => return crate::expansion::ExpansionOutput::default(),
            Ok(Err(e)) => last_err = Some(e),
            Err(_) => last_err = Some(AdapterError::Io("expansion worker panicked".into())),
        }
        tracing::warn!(?node, attempt, ?last_err, "retrying node expansion");
        std::thread::sleep(Duration::from_millis(10 * 2u64.pow(attempt)));
    }
    tracing::error!(?node, ?last_err, "node expansion exhausted retries, treating as empty");
    crate::expansion::ExpansionOutput::default()
}
