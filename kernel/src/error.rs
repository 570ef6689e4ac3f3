//! Shared error vocabulary crossing the kernel/search/harness boundary.

use crate::model::Iri;

/// Failure from a triple-store adapter.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// No such node in the store. The search loop treats this as an empty
    /// neighbourhood: the node is marked visited with zero expansion.
    #[error("node not found: {0}")]
    NotFound(Iri),

    /// Transport/storage failure. Retried a bounded number of times with
    /// exponential backoff before being surfaced as an iteration failure.
    #[error("adapter I/O error: {0}")]
    Io(String),

    /// A `rdfs:subClassOf` walk revisited a node. The walk returns the node
    /// itself as its own superclass when this occurs.
    #[error("cyclic subClassOf chain detected at {0}")]
    Cycle(Iri),
}

/// Failure validating a configuration value before a run starts.
///
/// Always fatal; never raised mid-run.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("invalid config key `{key}`: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub reason: String,
}

impl ConfigError {
    #[must_use]
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
