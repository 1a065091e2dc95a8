//! Domain layer: the decision tree and its traversal rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod node;
pub mod policy;
pub mod tree;
pub mod verdict;

pub use error::{DomainError, DomainResult, ItemKind};
pub use node::{Leaf, Node, DESCRIPTION_PREVIEW_CHARS};
pub use policy::VisitPolicy;
pub use tree::{
    parse_index_list, DecisionTree, GroupSpec, TreeDocument, WeightedChild, PROBABILITY_TOLERANCE,
};
pub use verdict::Verdict;
