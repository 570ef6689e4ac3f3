//! narrascope kernel: the pure data model for informed graph expansion.
//!
//! This crate defines IRIs, triples, tagged triples, path keys, and the
//! per-dataset meta-predicate configuration. It performs no I/O and knows
//! nothing about adapters, ranking, or the search loop — those live in
//! `narrascope_search` and `narrascope_harness`.
//!
//! # Module dependency direction
//!
//! `model` ← `path` ← (nothing else here depends on it)
//! `dataset_config` and `error` are leaves.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dataset_config;
pub mod error;
pub mod model;
pub mod path;

pub use dataset_config::{DatasetConfig, DatasetKind};
pub use error::{AdapterError, ConfigError};
pub use model::{Direction, Iri, Literal, Node, TaggedTriple, Triple};
pub use path::{PathKey, Priority};
