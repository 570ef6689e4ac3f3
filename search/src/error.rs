//! Typed search errors.

use narrascope_kernel::AdapterError;

/// Failure surfaced by the search engine.
///
/// Most failures in the loop are non-fatal by design (spec.md §7): an
/// adapter `NotFound` just yields an empty neighbourhood, and a `RankerError`
/// equivalent ("no path") drives a normal terminal transition rather than
/// an error return. `SearchError` covers what remains: fatal config
/// problems and I/O that outlived its retry budget.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A triple-store call failed after retries were exhausted.
    #[error("adapter failure: {0}")]
    Adapter(#[from] AdapterError),

    /// A fatal, pre-flight configuration problem (e.g. an unparsable date
    /// window). Never raised mid-run.
    #[error("bad date window: {0}")]
    BadDate(String),
}
