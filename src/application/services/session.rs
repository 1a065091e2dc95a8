//! Interactive session service
//!
//! Walks the tree one node at a time from the root. At every node it may grow
//! a child (and move into it), add a leaf (and end), regroup the node, and
//! finally suggest children by weight until the operator accepts one. A
//! session follows a single path downwards and never returns to siblings.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{
    parse_index_list, DecisionTree, DomainError, DomainResult, GroupSpec, ItemKind, Node,
    Verdict, VisitPolicy,
};
use crate::infrastructure::traits::Operator;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// A new leaf was added to the last visited node.
    LeafAdded { name: String },
    /// The last visited node had no children and no leaf was added.
    Exhausted,
}

/// Names of the visited nodes (root first) and how the walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReport {
    pub path: Vec<String>,
    pub outcome: VisitOutcome,
}

enum Step {
    Descend(usize),
    Stop(VisitOutcome),
}

/// Drives the guided traversal against an operator.
pub struct SessionService<R: Rng> {
    operator: Arc<dyn Operator>,
    policy: VisitPolicy,
    rng: R,
}

impl<R: Rng> SessionService<R> {
    /// Fails with [`DomainError::InvalidPolicy`] when `policy` does not validate.
    pub fn new(operator: Arc<dyn Operator>, policy: VisitPolicy, rng: R) -> DomainResult<Self> {
        policy.validate()?;
        Ok(Self {
            operator,
            policy,
            rng,
        })
    }

    /// Walk from `root` down to where the operator stops.
    ///
    /// Mutations made before an error are kept; the tree stays valid.
    #[instrument(level = "debug", skip_all, fields(root = %root.name()))]
    pub fn visit(&mut self, root: &mut DecisionTree) -> ApplicationResult<VisitReport> {
        let mut path = Vec::new();
        let mut current = root;
        loop {
            path.push(current.name().to_string());
            match self.step(current)? {
                Step::Descend(index) => {
                    let len = current.child_count();
                    current = current
                        .child_mut(index)
                        .ok_or(DomainError::OutOfRangeIndex {
                            kind: ItemKind::Child,
                            index,
                            len,
                        })?;
                }
                Step::Stop(outcome) => {
                    info!(depth = path.len(), ?outcome, "session finished");
                    return Ok(VisitReport { path, outcome });
                }
            }
        }
    }

    fn step(&mut self, node: &mut DecisionTree) -> ApplicationResult<Step> {
        self.operator.tell(&format!("Visiting: {}", node.label()));
        self.show_contents(node);

        if self.policy.growth_gate(&mut self.rng, node.child_count()) {
            if let Some(index) = self.offer_child(node)? {
                return Ok(Step::Descend(index));
            }
        }

        if self
            .policy
            .leaf_gate(&mut self.rng, node.child_count(), node.leaf_count())
        {
            if let Some(name) = self.offer_leaf(node)? {
                return Ok(Step::Stop(VisitOutcome::LeafAdded { name }));
            }
        }

        if self.policy.partition_gate(&mut self.rng, node.item_count()) {
            self.partition(node)?;
        }

        if node.child_count() == 0 {
            self.operator.tell("Nothing to choose from here yet.");
            return Ok(Step::Stop(VisitOutcome::Exhausted));
        }
        self.choose(node).map(Step::Descend)
    }

    fn offer_child(&self, node: &mut DecisionTree) -> ApplicationResult<Option<usize>> {
        self.operator.tell("Add child!");
        let name = self.ask("Enter child name: ")?;
        if name.trim().is_empty() {
            self.operator.tell("Ok, no child!");
            return Ok(None);
        }
        let description = self.ask("Enter child description: ")?;
        Ok(node.add_child(&name, &description))
    }

    fn offer_leaf(&self, node: &mut DecisionTree) -> ApplicationResult<Option<String>> {
        self.operator.tell("Add leaf!");
        let name = self.ask("Enter leaf name: ")?;
        if name.trim().is_empty() {
            self.operator.tell("Ok, no leaf!");
            return Ok(None);
        }
        let description = self.ask("Enter leaf description: ")?;
        Ok(node
            .add_leaf(&name, &description)
            .then(|| name.trim().to_string()))
    }

    /// Interactively regroup `node` until the operator enters an empty group
    /// name or nothing is left to group.
    ///
    /// A malformed group is reported to the operator and ends the regrouping;
    /// groups created before it are kept.
    #[instrument(level = "debug", skip_all, fields(node = %node.name()))]
    pub fn partition(&self, node: &mut DecisionTree) -> ApplicationResult<()> {
        self.operator.tell("Partition!");
        while node.needs_partition_pass() {
            self.operator.tell("Currently:");
            self.show_contents(node);
            let name = self.ask("Enter group name (empty to leave): ")?;
            if name.trim().is_empty() {
                self.operator
                    .tell("Empty name, leaving existing members as is");
                break;
            }
            let description = self.ask("Enter group description: ")?;
            let children = self.ask("Enter group children (space separated): ")?;
            let leaves = self.ask("Enter group leaves (space separated): ")?;

            match Self::group_spec(name, description, &children, &leaves)
                .and_then(|group| node.partition(group))
            {
                Ok(index) => debug!(index, "group added"),
                Err(e) => {
                    warn!(error = %e, "partition aborted");
                    self.operator.warn(&format!("partition aborted: {e}"));
                    break;
                }
            }
        }
        Ok(())
    }

    fn group_spec(
        name: String,
        description: String,
        children: &str,
        leaves: &str,
    ) -> DomainResult<GroupSpec> {
        Ok(GroupSpec {
            name,
            description,
            children: parse_index_list(children, ItemKind::Child)?,
            leaves: parse_index_list(leaves, ItemKind::Leaf)?,
        })
    }

    /// Suggest weighted draws until one is accepted; returns its index.
    fn choose(&mut self, node: &mut DecisionTree) -> ApplicationResult<usize> {
        loop {
            let index = node.select_child(&mut self.rng)?;
            let label = node.child(index).map(|c| c.label()).unwrap_or_default();
            self.operator.tell(&format!("Suggesting: {label}"));

            let verdict = self.ask_verdict()?;
            debug!(index, %verdict, "suggestion answered");
            if let Some(delta) = self.policy.delta_for(verdict) {
                node.update_probability(index, delta)?;
            }
            if verdict.accepts() {
                return Ok(index);
            }
        }
    }

    fn ask_verdict(&self) -> ApplicationResult<Verdict> {
        loop {
            let answer = self.ask("Is this ok? [(s)uper/(o)k/(n)o]: ")?;
            match Verdict::parse(&answer) {
                Some(verdict) => return Ok(verdict),
                None => self
                    .operator
                    .tell(&format!("Unknown answer '{}'", answer.trim())),
            }
        }
    }

    fn show_contents(&self, node: &DecisionTree) {
        for line in node.contents_listing() {
            self.operator.tell(&line);
        }
    }

    fn ask(&self, prompt: &str) -> ApplicationResult<String> {
        self.operator.ask(prompt).at_prompt(prompt)
    }
}
