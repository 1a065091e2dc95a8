//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

/// Which of a node's two collections an index addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Child,
    Leaf,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Child => write!(f, "child"),
            ItemKind::Leaf => write!(f, "leaf"),
        }
    }
}

/// Domain errors represent precondition violations on the decision tree.
/// A failing operation leaves the tree as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{kind} index {index} out of range (have {len})")]
    OutOfRangeIndex {
        kind: ItemKind,
        index: usize,
        len: usize,
    },

    #[error("{kind} index {index} given more than once")]
    DuplicateIndex { kind: ItemKind, index: usize },

    #[error("not a {kind} index: '{token}'")]
    InvalidIndexToken { kind: ItemKind, token: String },

    #[error("group '{0}' would be empty: select at least one child or leaf")]
    EmptyGroup(String),

    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("relative delta must be finite and greater than -1, got {0}")]
    InvalidDelta(f64),

    #[error("node '{0}' has no children to choose from")]
    NoChildren(String),

    #[error("node '{node}': {children} children but {probabilities} probabilities")]
    MismatchedArityOnDecode {
        node: String,
        children: usize,
        probabilities: usize,
    },

    #[error("node '{node}': invalid probability {value}")]
    InvalidProbability { node: String, value: f64 },

    #[error("node '{node}': cannot draw from weights: {message}")]
    InvalidWeights { node: String, message: String },

    #[error("invalid visit policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
