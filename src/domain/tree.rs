//! Weighted decision tree: growth, regrouping, reweighting and weighted selection
//!
//! A [`DecisionTree`] owns its weighted children and its unweighted leaves.
//! Child probabilities always sum to 1 (within [`PROBABILITY_TOLERANCE`]) when
//! there is at least one child; every mutation ends with [`DecisionTree::normalize`].

use std::fmt;

use itertools::Itertools;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use termtree::Tree;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult, ItemKind};
use crate::domain::node::{Leaf, Node};

/// Accepted deviation of the children's probability sum from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A child subtree together with its selection probability.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedChild {
    pub node: DecisionTree,
    pub probability: f64,
}

/// Request to move some of a node's children and leaves into a new group node.
///
/// Indices address the node's collections as listed to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub description: String,
    pub children: Vec<usize>,
    pub leaves: Vec<usize>,
}

/// Internal vertex of the decision tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    name: String,
    description: String,
    children: Vec<WeightedChild>,
    leaves: Vec<Leaf>,
}

impl DecisionTree {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            children: Vec::new(),
            leaves: Vec::new(),
        }
    }

    /// Starting tree of a first session.
    pub fn root() -> Self {
        Self::new("root", "")
    }

    /// Build a node from existing parts.
    ///
    /// Probabilities must be finite and non-negative; they are normalized.
    pub fn from_weighted(
        name: impl Into<String>,
        description: impl Into<String>,
        children: impl IntoIterator<Item = (DecisionTree, f64)>,
        leaves: impl IntoIterator<Item = Leaf>,
    ) -> DomainResult<Self> {
        let mut tree = Self::new(name, description);
        for (node, probability) in children {
            if !probability.is_finite() || probability < 0.0 {
                return Err(DomainError::InvalidProbability {
                    node: tree.name,
                    value: probability,
                });
            }
            tree.children.push(WeightedChild { node, probability });
        }
        tree.leaves.extend(leaves);
        tree.normalize();
        Ok(tree)
    }

    pub fn children(&self) -> &[WeightedChild] {
        &self.children
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn child(&self, index: usize) -> Option<&DecisionTree> {
        self.children.get(index).map(|c| &c.node)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut DecisionTree> {
        self.children.get_mut(index).map(|c| &mut c.node)
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.children.iter().map(|c| c.probability).collect()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Children plus leaves.
    pub fn item_count(&self) -> usize {
        self.children.len() + self.leaves.len()
    }

    /// Add a child subtree, or decline when `name` is blank.
    ///
    /// The newcomer starts at `1 / previous_child_count` (or 1 for a first
    /// child) before all siblings are rescaled, so it enters at roughly the
    /// average weight. Returns the new child's index.
    pub fn add_child(&mut self, name: &str, description: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            debug!(node = %self.name, "add_child declined");
            return None;
        }
        let probability = if self.children.is_empty() {
            1.0
        } else {
            1.0 / self.children.len() as f64
        };
        self.children.push(WeightedChild {
            node: DecisionTree::new(name, description.trim()),
            probability,
        });
        self.normalize();
        debug!(node = %self.name, child = name, "added child");
        Some(self.children.len() - 1)
    }

    /// Append a leaf, or decline when `name` is blank.
    pub fn add_leaf(&mut self, name: &str, description: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            debug!(node = %self.name, "add_leaf declined");
            return false;
        }
        self.leaves.push(Leaf::new(name, description.trim()));
        debug!(node = %self.name, leaf = name, "added leaf");
        true
    }

    /// Multiply one child's weight by `1 + relative_delta`, then renormalize.
    pub fn update_probability(&mut self, index: usize, relative_delta: f64) -> DomainResult<()> {
        if !relative_delta.is_finite() || relative_delta <= -1.0 {
            return Err(DomainError::InvalidDelta(relative_delta));
        }
        let len = self.children.len();
        let child = self
            .children
            .get_mut(index)
            .ok_or(DomainError::OutOfRangeIndex {
                kind: ItemKind::Child,
                index,
                len,
            })?;
        child.probability *= 1.0 + relative_delta;
        self.normalize();
        trace!(node = %self.name, index, relative_delta, "updated probability");
        Ok(())
    }

    /// Rescale child probabilities to sum to 1.
    ///
    /// No-op without children. Zero total mass falls back to a uniform split.
    pub fn normalize(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let total: f64 = self.children.iter().map(|c| c.probability).sum();
        if total > 0.0 && total.is_finite() {
            for child in &mut self.children {
                child.probability /= total;
            }
        } else {
            let uniform = 1.0 / self.children.len() as f64;
            for child in &mut self.children {
                child.probability = uniform;
            }
        }
    }

    /// Whether an interactive partition round still has something to regroup.
    pub fn needs_partition_pass(&self) -> bool {
        self.children.len() > 1 || !self.leaves.is_empty()
    }

    /// Move the selected children and leaves into a new group node.
    ///
    /// The group's weight is the summed weight of the children it absorbs
    /// (leaves add nothing); absorbed children are renormalized inside the
    /// group and keep their relative order. The group is appended as the last
    /// child. All indices are validated before anything moves, so on error
    /// the tree is unchanged. Returns the group's index.
    #[instrument(level = "debug", skip(self, group), fields(node = %self.name, group = %group.name))]
    pub fn partition(&mut self, group: GroupSpec) -> DomainResult<usize> {
        let name = group.name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyGroupName);
        }
        if group.children.is_empty() && group.leaves.is_empty() {
            return Err(DomainError::EmptyGroup(name.to_string()));
        }
        let child_indices =
            validated_indices(ItemKind::Child, &group.children, self.children.len())?;
        let leaf_indices = validated_indices(ItemKind::Leaf, &group.leaves, self.leaves.len())?;

        let mut node = DecisionTree::new(name, group.description.trim());
        node.children = take_sorted(&mut self.children, &child_indices);
        node.leaves = take_sorted(&mut self.leaves, &leaf_indices);
        let probability: f64 = node.children.iter().map(|c| c.probability).sum();
        node.normalize();
        debug!(
            children = node.children.len(),
            leaves = node.leaves.len(),
            probability,
            "created group"
        );

        self.children.push(WeightedChild { node, probability });
        self.normalize();
        Ok(self.children.len() - 1)
    }

    /// Draw one child index with probability proportional to its weight.
    pub fn select_child<R: Rng + ?Sized>(&self, rng: &mut R) -> DomainResult<usize> {
        if self.children.is_empty() {
            return Err(DomainError::NoChildren(self.name.clone()));
        }
        let weights = WeightedIndex::new(self.children.iter().map(|c| c.probability)).map_err(
            |e| DomainError::InvalidWeights {
                node: self.name.clone(),
                message: e.to_string(),
            },
        )?;
        Ok(weights.sample(rng))
    }

    /// Orientation block shown to the operator: indexed children, then leaves.
    pub fn contents_listing(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.children.is_empty() {
            lines.push("Children:".to_string());
            lines.extend(
                self.children
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("  [{}] {}", i, c.node.label())),
            );
        }
        if !self.leaves.is_empty() {
            lines.push("Leaves:".to_string());
            lines.extend(
                self.leaves
                    .iter()
                    .enumerate()
                    .map(|(i, l)| format!("  [{}] {}", i, l.label())),
            );
        }
        lines
    }

    /// Whole subtree for display; children carry their probability.
    pub fn to_termtree(&self) -> Tree<String> {
        self.build_termtree(self.label())
    }

    fn build_termtree(&self, root: String) -> Tree<String> {
        let children = self.children.iter().map(|c| {
            c.node
                .build_termtree(format!("{} [{:.2}]", c.node.label(), c.probability))
        });
        let leaves = self.leaves.iter().map(|l| Tree::new(l.label()));
        Tree::new(root).with_leaves(children.chain(leaves))
    }
}

impl Node for DecisionTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Check an operator-supplied index set and return it sorted ascending.
fn validated_indices(kind: ItemKind, indices: &[usize], len: usize) -> DomainResult<Vec<usize>> {
    if let Some(&index) = indices.iter().find(|&&i| i >= len) {
        return Err(DomainError::OutOfRangeIndex { kind, index, len });
    }
    if let Some(&index) = indices.iter().duplicates().next() {
        return Err(DomainError::DuplicateIndex { kind, index });
    }
    Ok(indices.iter().copied().sorted_unstable().collect())
}

/// Remove the items at `sorted` (ascending, unique, in range), preserving order.
fn take_sorted<T>(items: &mut Vec<T>, sorted: &[usize]) -> Vec<T> {
    let mut taken: Vec<T> = sorted.iter().rev().map(|&i| items.remove(i)).collect();
    taken.reverse();
    taken
}

/// Parse operator input like `"0 2 5"` (spaces or commas) into indices.
pub fn parse_index_list(input: &str, kind: ItemKind) -> DomainResult<Vec<usize>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| DomainError::InvalidIndexToken {
                    kind,
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Persisted shape of a node.
///
/// Children and their probabilities are parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub leaves: Vec<Leaf>,
    #[serde(default)]
    pub children_probabilities: Vec<f64>,
    #[serde(default)]
    pub children: Vec<TreeDocument>,
}

impl From<&DecisionTree> for TreeDocument {
    fn from(tree: &DecisionTree) -> Self {
        Self {
            name: tree.name.clone(),
            description: tree.description.clone(),
            leaves: tree.leaves.clone(),
            children_probabilities: tree.probabilities(),
            children: tree.children.iter().map(|c| (&c.node).into()).collect(),
        }
    }
}

impl TryFrom<TreeDocument> for DecisionTree {
    type Error = DomainError;

    fn try_from(document: TreeDocument) -> DomainResult<Self> {
        if document.children.len() != document.children_probabilities.len() {
            return Err(DomainError::MismatchedArityOnDecode {
                node: document.name,
                children: document.children.len(),
                probabilities: document.children_probabilities.len(),
            });
        }
        let children = document
            .children
            .into_iter()
            .map(DecisionTree::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        DecisionTree::from_weighted(
            document.name,
            document.description,
            children.into_iter().zip(document.children_probabilities),
            document.leaves,
        )
    }
}
