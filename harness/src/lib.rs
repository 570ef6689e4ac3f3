//! narrascope harness: orchestration around the search engine.
//!
//! Owns the two concrete triple-store adapters, configuration loading and
//! validation, the JSONL event sink, and the CLI entry point. The engine
//! itself (`narrascope_search`) knows nothing about any of this — it only
//! sees `&dyn TripleStore` and `&mut dyn EventSink`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod cli;
pub mod config;
pub mod sink;

pub use config::{ConfigLoadError, RawConfig, RunConfig};
pub use sink::JsonlSink;
