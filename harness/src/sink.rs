//! JSONL persistence for a run's events (spec.md §6 "Emitted artifacts").
//!
//! One file per artifact kind, one JSON object per line, flushed after every
//! iteration so a killed run leaves a readable prefix rather than a
//! half-written buffer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use narrascope_kernel::{Direction, Node};
use narrascope_search::{AnnotatedTriple, EventSink, IterationEvent};
use serde_json::{json, Value};

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Ingoing => "ingoing",
        Direction::Outgoing => "outgoing",
        Direction::SpecOutgoing => "spec. outgoing",
    }
}

fn pending_row(iteration: u32, type_df: &'static str, triple: &AnnotatedTriple) -> Value {
    json!({
        "iteration": iteration,
        "type_df": type_df,
        "subject": triple.triple.subject.to_string(),
        "predicate": triple.triple.predicate.to_string(),
        "object": triple.triple.object.to_string(),
        "object_is_literal": matches!(triple.triple.object, Node::Literal(_)),
        "subject_superclass": triple.subject_superclass.to_string(),
        "object_superclass": triple.object_superclass.as_ref().map(ToString::to_string),
    })
}

/// Writes `subgraph.jsonl`, `pending.jsonl`, `occurrences.jsonl`,
/// `expanded.jsonl`, and (when the run tracks metrics) `metrics.jsonl` into
/// one output directory.
pub struct JsonlSink {
    subgraph: BufWriter<File>,
    pending: BufWriter<File>,
    occurrences: BufWriter<File>,
    expanded: BufWriter<File>,
    metrics: Option<BufWriter<File>>,
}

impl JsonlSink {
    /// Create (or truncate) the JSONL files under `out_dir`. `out_dir` must
    /// already exist; callers create it once up front.
    ///
    /// # Errors
    ///
    /// Any `io::Error` opening one of the output files.
    pub fn create(out_dir: &Path, with_metrics: bool) -> io::Result<Self> {
        let open = |name: &str| -> io::Result<BufWriter<File>> {
            Ok(BufWriter::new(File::create(out_dir.join(name))?))
        };
        Ok(Self {
            subgraph: open("subgraph.jsonl")?,
            pending: open("pending.jsonl")?,
            occurrences: open("occurrences.jsonl")?,
            expanded: open("expanded.jsonl")?,
            metrics: with_metrics.then(|| open("metrics.jsonl")).transpose()?,
        })
    }

    fn write_line(writer: &mut BufWriter<File>, value: &Value) -> io::Result<()> {
        writeln!(writer, "{value}")
    }

    fn record_fallible(&mut self, event: &IterationEvent) -> io::Result<()> {
        Self::write_line(
            &mut self.expanded,
            &json!({
                "iteration": event.iteration,
                "path_expanded": event.chosen_path.as_ref().map(ToString::to_string),
                "node_expanded": event.expanded_nodes.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "score": event.score,
            }),
        )?;

        for row in &event.new_subgraph_rows {
            Self::write_line(
                &mut self.subgraph,
                &json!({
                    "subject": row.triple.subject.to_string(),
                    "predicate": row.triple.predicate.to_string(),
                    "object": row.triple.object.to_string(),
                    "type_df": direction_label(row.direction),
                    "iteration": row.iteration,
                }),
            )?;
        }

        for row in &event.new_pending_ingoing {
            Self::write_line(&mut self.pending, &pending_row(event.iteration, "ingoing", row))?;
        }
        for row in &event.new_pending_outgoing {
            Self::write_line(&mut self.pending, &pending_row(event.iteration, "outgoing", row))?;
        }

        Self::write_line(
            &mut self.occurrences,
            &json!({
                "iteration": event.iteration,
                "occurrences": event
                    .occurrences_snapshot
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<std::collections::BTreeMap<_, _>>(),
            }),
        )?;

        if let (Some(writer), Some(sample)) = (&mut self.metrics, event.metrics) {
            Self::write_line(
                writer,
                &json!({
                    "iteration": event.iteration,
                    "precision": sample.precision,
                    "recall": sample.recall,
                    "f1": sample.f1,
                }),
            )?;
        }

        self.subgraph.flush()?;
        self.pending.flush()?;
        self.occurrences.flush()?;
        self.expanded.flush()?;
        if let Some(writer) = &mut self.metrics {
            writer.flush()?;
        }
        Ok(())
    }
}

impl EventSink for JsonlSink {
    fn record(&mut self, event: &IterationEvent) {
        if let Err(err) = self.record_fallible(event) {
            tracing::error!(iteration = event.iteration, %err, "failed writing iteration event to JSONL");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrascope_kernel::{Iri, PathKey, Priority, TaggedTriple, Triple};
    use std::collections::BTreeMap;

    #[test]
    fn subgraph_rows_and_expanded_record_are_written_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlSink::create(dir.path(), false).unwrap();

        let triple = Triple::new(Iri::new("A"), Iri::new("p"), Node::Resource(Iri::new("B")));
        let event = IterationEvent {
            iteration: 1,
            chosen_path: Some(PathKey::Predicate {
                priority: Priority::Other,
                predicate: Iri::new("p"),
            }),
            expanded_nodes: vec![Iri::new("A")],
            score: Some(0.5),
            new_subgraph_rows: vec![TaggedTriple::new(triple, Direction::Outgoing, 1)],
            new_pending_ingoing: vec![],
            new_pending_outgoing: vec![],
            occurrences_snapshot: BTreeMap::new(),
            metrics: None,
        };
        sink.record(&event);

        let subgraph = std::fs::read_to_string(dir.path().join("subgraph.jsonl")).unwrap();
        assert_eq!(subgraph.lines().count(), 1);
        assert!(subgraph.contains("\"type_df\":\"outgoing\""));

        let expanded = std::fs::read_to_string(dir.path().join("expanded.jsonl")).unwrap();
        assert!(expanded.contains("\"iteration\":1"));

        assert!(!dir.path().join("metrics.jsonl").exists());
    }

    #[test]
    fn metrics_file_is_created_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::create(dir.path(), true).unwrap();
        drop(sink);
        assert!(dir.path().join("metrics.jsonl").exists());
    }
}
