//! Event sink: decouples the search loop from persistence format
//! (spec.md §1 "the driver persists it").

use std::collections::BTreeMap;
use std::sync::mpsc;

use narrascope_kernel::{Iri, PathKey, TaggedTriple};

use crate::metrics::MetricsSample;
use crate::ordering::AnnotatedTriple;

/// Everything observable about one completed iteration. `narrascope-harness`
/// turns this into JSONL rows; tests can inspect it directly via
/// `ChannelSink`.
#[derive(Debug, Clone)]
pub struct IterationEvent {
    pub iteration: u32,
    pub chosen_path: Option<PathKey>,
    pub expanded_nodes: Vec<Iri>,
    pub score: Option<f64>,
    pub new_subgraph_rows: Vec<TaggedTriple>,
    /// Freshly-discovered pending-ingoing rows this iteration contributed,
    /// before they were folded into the frontier (spec.md §6 "Emitted
    /// artifacts").
    pub new_pending_ingoing: Vec<AnnotatedTriple>,
    pub new_pending_outgoing: Vec<AnnotatedTriple>,
    pub occurrences_snapshot: BTreeMap<PathKey, u64>,
    pub metrics: Option<MetricsSample>,
}

/// Consumes one [`IterationEvent`] per completed iteration. The loop holds a
/// `&mut dyn EventSink`; it never knows what's on the other side.
pub trait EventSink {
    fn record(&mut self, event: &IterationEvent);
}

/// Discards every event. Default for runs that don't need a persisted
/// trace (benchmarks, unit tests exercising only the returned
/// [`crate::engine::RunOutcome`]).
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &IterationEvent) {}
}

/// Forwards events over a bounded channel, for a harness running the loop
/// on a background thread (spec.md §5's single-threaded-outer-loop model
/// still holds; this just moves that thread off the caller's).
pub struct ChannelSink {
    tx: mpsc::SyncSender<IterationEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<IterationEvent>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn record(&mut self, event: &IterationEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::warn!(iteration = event.iteration, "event sink receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_events_in_order() {
        let (mut sink, rx) = ChannelSink::new(4);
        for i in 1..=3 {
            sink.record(&IterationEvent {
                iteration: i,
                chosen_path: None,
                expanded_nodes: vec![],
                score: None,
                new_subgraph_rows: vec![],
                new_pending_ingoing: vec![],
                new_pending_outgoing: vec![],
                occurrences_snapshot: BTreeMap::new(),
                metrics: None,
            });
        }
        drop(sink);
        let received: Vec<u32> = rx.iter().map(|e| e.iteration).collect();
        assert_eq!(received, vec![1, 2, 3]);
    }

    #[test]
    fn null_sink_accepts_events_without_panicking() {
        let mut sink = NullSink;
        sink.record(&IterationEvent {
            iteration: 1,
            chosen_path: None,
            expanded_nodes: vec![],
            score: None,
            new_subgraph_rows: vec![],
            new_pending_ingoing: vec![],
            new_pending_outgoing: vec![],
            occurrences_snapshot: BTreeMap::new(),
            metrics: None,
        });
    }
}
