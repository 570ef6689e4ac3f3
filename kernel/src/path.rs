//! Path keys: the reusable expansion directions the ranker scores.

use std::cmp::Ordering;
use std::fmt;

use crate::model::{Iri, Node};

/// The priority prefix participating in lexicographic score ordering.
///
/// `Target` (1) beats `Demoted` (2) beats `Other` (3) — lower numeric value
/// wins, which is also the derive order here since `Ord` on a fieldless
/// enum follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Target = 1,
    Demoted = 2,
    Other = 3,
}

impl Priority {
    /// `1` if the predicate's superclass belongs to the configured target
    /// types, `2` for an explicitly demoted predicate, `3` otherwise.
    #[must_use]
    pub fn classify(superclass_is_target: bool, predicate_is_demoted: bool) -> Self {
        if superclass_is_target {
            Self::Target
        } else if predicate_is_demoted {
            Self::Demoted
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// A canonical identifier for a reusable expansion direction.
///
/// `Display` produces the exact string shapes from the path-key grammar:
/// `"<priority>-<p>"`, `"<priority>-ingoing-<p>;<o>"`,
/// `"<priority>-outgoing-<s>;<p>"`. This string is what gets logged in the
/// occurrence map and expansion records, so it must be stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Predicate {
        priority: Priority,
        predicate: Iri,
    },
    IngoingEndpoint {
        priority: Priority,
        predicate: Iri,
        object: Node,
    },
    OutgoingEndpoint {
        priority: Priority,
        subject: Node,
        predicate: Iri,
    },
}

impl PathKey {
    #[must_use]
    pub fn priority(&self) -> Priority {
        match self {
            Self::Predicate { priority, .. }
            | Self::IngoingEndpoint { priority, .. }
            | Self::OutgoingEndpoint { priority, .. } => *priority,
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate { priority, predicate } => write!(f, "{priority}-{predicate}"),
            Self::IngoingEndpoint {
                priority,
                predicate,
                object,
            } => write!(f, "{priority}-ingoing-{predicate};{object}"),
            Self::OutgoingEndpoint {
                priority,
                subject,
                predicate,
            } => write!(f, "{priority}-outgoing-{subject};{predicate}"),
        }
    }
}

/// Ordering used for ranker tie-break: priority first, then the rendered
/// key lexicographically. Two distinct `PathKey`s never compare equal here
/// because the rendered string is injective over the variant's fields.
impl PartialOrd for PathKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}
