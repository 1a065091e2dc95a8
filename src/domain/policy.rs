//! Random gates deciding whether a visit grows, adds a leaf, or regroups

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::verdict::Verdict;

/// Tunables of the guided traversal.
///
/// Draws are uniform over closed ranges. The growth gate opens when a draw in
/// `[0, growth_ceiling]` is at least the child count, so small nodes grow
/// eagerly and nodes with more than `growth_ceiling` children never do.
/// The leaf gate draws from the same `[0, growth_ceiling]` range against the
/// item count. The partition gate opens when a draw in
/// `[partition_floor, partition_ceiling]` is below the item count.
///
/// Gates assume a policy that passed [`VisitPolicy::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitPolicy {
    pub growth_ceiling: u32,
    pub partition_floor: u32,
    pub partition_ceiling: u32,
    /// Relative weight gain on a "super" answer
    pub reinforce: f64,
    /// Relative weight loss on a "no" answer
    pub penalize: f64,
}

impl Default for VisitPolicy {
    fn default() -> Self {
        Self {
            growth_ceiling: 20,
            partition_floor: 10,
            partition_ceiling: 30,
            reinforce: 0.2,
            penalize: 0.2,
        }
    }
}

impl VisitPolicy {
    pub fn admits_growth(draw: u32, child_count: usize) -> bool {
        draw as usize >= child_count
    }

    pub fn admits_leaf(draw: u32, child_count: usize, leaf_count: usize) -> bool {
        draw as usize >= child_count + leaf_count
    }

    pub fn admits_partition(draw: u32, item_count: usize) -> bool {
        (draw as usize) < item_count
    }

    pub fn growth_gate<R: Rng + ?Sized>(&self, rng: &mut R, child_count: usize) -> bool {
        let draw = rng.random_range(0..=self.growth_ceiling);
        Self::admits_growth(draw, child_count)
    }

    /// Always open for a node without children; otherwise a draw in
    /// `[0, growth_ceiling]` must reach the item count. There is no separate
    /// leaf ceiling.
    pub fn leaf_gate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        child_count: usize,
        leaf_count: usize,
    ) -> bool {
        if child_count == 0 {
            return true;
        }
        let draw = rng.random_range(0..=self.growth_ceiling);
        Self::admits_leaf(draw, child_count, leaf_count)
    }

    pub fn partition_gate<R: Rng + ?Sized>(&self, rng: &mut R, item_count: usize) -> bool {
        let draw = rng.random_range(self.partition_floor..=self.partition_ceiling);
        Self::admits_partition(draw, item_count)
    }

    /// Relative weight change applied for an operator verdict, `None` for no change.
    pub fn delta_for(&self, verdict: Verdict) -> Option<f64> {
        match verdict {
            Verdict::Super => Some(self.reinforce),
            Verdict::Ok => None,
            Verdict::No => Some(-self.penalize),
        }
    }

    /// Check ranges: partition bounds ordered, deltas in `[0, 1)`.
    pub fn validate(&self) -> DomainResult<()> {
        if self.partition_floor > self.partition_ceiling {
            return Err(DomainError::InvalidPolicy(format!(
                "partition_floor ({}) exceeds partition_ceiling ({})",
                self.partition_floor, self.partition_ceiling
            )));
        }
        for (label, value) in [("reinforce", self.reinforce), ("penalize", self.penalize)] {
            if !(0.0..1.0).contains(&value) {
                return Err(DomainError::InvalidPolicy(format!(
                    "{label} must be in [0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }
}
