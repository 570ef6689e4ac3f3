//! Command-line surface: typed replacement for the original's `-j/-m/-n/-e`
//! argparse flags (spec.md §6).

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use narrascope_kernel::{AdapterError, Iri};
use narrascope_search::{NodeSelector, SearchEngine, SearchMode, SelectionMode};
use serde::Serialize;

use crate::adapter::{HdtAdapter, RemoteAdapter};
use crate::config::{self, AdapterSelection, ConfigLoadError};
use crate::sink::JsonlSink;

/// Mirrors `narrascope_search::SearchMode` as a `clap`-derivable enum; kept
/// distinct so the search crate doesn't need to depend on `clap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum CliMode {
    TypeNodeMetrics,
    TypeNodeNoMetrics,
    SpecificNode,
    SimpleExploration,
}

impl From<CliMode> for SearchMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::TypeNodeMetrics => Self::TypeNodeMetrics,
            CliMode::TypeNodeNoMetrics => Self::TypeNodeNoMetrics,
            CliMode::SpecificNode => Self::SpecificNode,
            CliMode::SimpleExploration => Self::SimpleExploration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum CliSelectionMode {
    All,
    Random,
}

impl From<CliSelectionMode> for SelectionMode {
    fn from(mode: CliSelectionMode) -> Self {
        match mode {
            CliSelectionMode::All => Self::All,
            CliSelectionMode::Random => Self::Random,
        }
    }
}

/// `narrascope --config run.yaml --mode simple-exploration --out-dir out/`
#[derive(Debug, Parser)]
#[command(name = "narrascope", about = "Informed iterative expansion over an RDF knowledge graph")]
pub struct Cli {
    /// Path to the run's YAML or JSON configuration file (spec.md §6).
    #[arg(long, short = 'j')]
    pub config: PathBuf,

    /// Which of the four search modes to run.
    #[arg(long, short = 'm', value_enum)]
    pub mode: CliMode,

    /// Target node IRI; required when `--mode specific-node`.
    #[arg(long, short = 'e')]
    pub end_node: Option<String>,

    /// Candidate selection strategy applied to the chosen path each
    /// iteration.
    #[arg(long, short = 'n', value_enum, default_value = "all")]
    pub node_selection: CliSelectionMode,

    /// Seed for the node selector's RNG; fixes the run's reproducibility
    /// (spec.md §5, §8).
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Directory the JSONL artifacts and final `metadata.json` are written
    /// to. Created if it doesn't exist.
    #[arg(long)]
    pub out_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("creating output directory {path}: {source}")]
    CreateOutDir { path: PathBuf, source: std::io::Error },
    #[error("opening JSONL sink: {0}")]
    Sink(#[source] std::io::Error),
    #[error("writing metadata.json: {0}")]
    Metadata(#[source] serde_json::Error),
}

/// `{iterations_run, exit_reason, subgraph_size, best_f1, best_f1_it,
/// last_metrics}`, the `metadata.json` payload (spec.md §6).
#[derive(Debug, Serialize)]
struct RunSummary {
    exit_reason: &'static str,
    iterations_run: u32,
    subgraph_size: usize,
    best_f1: Option<f64>,
    best_f1_it: Option<u32>,
    last_precision: Option<f64>,
    last_recall: Option<f64>,
    last_f1: Option<f64>,
}

/// Parse, validate, run to completion, and persist artifacts. The only
/// entry point `src/bin/narrascope.rs` calls.
///
/// # Errors
///
/// Any `ConfigLoadError`/`AdapterError` raised while preparing the run, or
/// an I/O failure writing output. Never panics: mid-run adapter failures are
/// retried inside [`SearchEngine`] and only escape as the run's exit reason.
pub fn run(cli: Cli) -> Result<(), RunError> {
    let mode: SearchMode = cli.mode.into();
    let target_node = cli.end_node.as_deref().map(Iri::new);

    let raw = config::load_raw(&cli.config)?;
    let run_config = config::validate(raw, mode, target_node)?;
    let post_filter = run_config.post_filter_config();

    fs::create_dir_all(&cli.out_dir).map_err(|source| RunError::CreateOutDir {
        path: cli.out_dir.clone(),
        source,
    })?;

    let meta_predicates = run_config.dataset_config.meta_predicates();
    let store: Box<dyn narrascope_search::TripleStore> = match run_config.adapter {
        AdapterSelection::Hdt { dataset_path } => Box::new(HdtAdapter::open(
            &dataset_path,
            &run_config.dataset_config,
            post_filter,
        )?),
        AdapterSelection::Remote { endpoint } => {
            Box::new(RemoteAdapter::new(endpoint, meta_predicates, post_filter))
        }
    };

    let selector = NodeSelector::new(cli.node_selection.into(), cli.seed);
    let mut engine = SearchEngine::new(
        store.as_ref(),
        run_config.filter,
        run_config.ordering,
        run_config.ranker,
        selector,
        run_config.policy,
        run_config.metrics,
    );

    // `JsonlSink` only ever writes a `metrics.jsonl` line when an iteration
    // event actually carries a sample, so always opening the file costs a
    // run without metrics nothing.
    let mut sink = JsonlSink::create(&cli.out_dir, true).map_err(RunError::Sink)?;
    let outcome = engine.run(&mut sink);

    let summary = RunSummary {
        exit_reason: match outcome.exit {
            narrascope_search::ExitReason::BudgetExhausted => "budget_exhausted",
            narrascope_search::ExitReason::NoMorePaths => "no_more_paths",
            narrascope_search::ExitReason::TargetFound => "target_found",
        },
        iterations_run: outcome.metadata.iterations_run,
        subgraph_size: outcome.metadata.subgraph_size,
        best_f1: outcome.metadata.best_f1,
        best_f1_it: outcome.metadata.best_f1_it,
        last_precision: outcome.metadata.last_metrics.map(|m| m.precision),
        last_recall: outcome.metadata.last_metrics.map(|m| m.recall),
        last_f1: outcome.metadata.last_metrics.map(|m| m.f1),
    };

    let metadata_path = cli.out_dir.join("metadata.json");
    let json = serde_json::to_string_pretty(&summary).map_err(RunError::Metadata)?;
    fs::write(&metadata_path, json).map_err(|source| RunError::CreateOutDir {
        path: metadata_path,
        source,
    })?;

    tracing::info!(
        exit_reason = summary.exit_reason,
        iterations_run = summary.iterations_run,
        subgraph_size = summary.subgraph_size,
        "run complete"
    );
    Ok(())
}
