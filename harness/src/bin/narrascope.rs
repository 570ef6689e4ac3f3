//! Binary entry point: parses the CLI, runs a search, exits non-zero on
//! failure. All real logic lives in `narrascope_harness::cli`.

use clap::Parser;
use narrascope_harness::cli::{run, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        tracing::error!(%err, "run failed");
        std::process::exit(1);
    }
}
