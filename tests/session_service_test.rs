//! Tests for SessionService: the guided traversal and interactive partition
//!
//! Gates are pinned through the policy instead of relying on particular
//! random draws: `growth_ceiling = 0` makes the growth gate open only for
//! nodes without children and closes the leaf gate once a node has any
//! children; `partition_floor = partition_ceiling = 1000` disables regrouping,
//! `0..=0` makes it open for any non-empty node.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

use whatnext::application::services::{SessionService, VisitOutcome};
use whatnext::domain::{
    DecisionTree, DomainError, Leaf, Node, VisitPolicy, PROBABILITY_TOLERANCE,
};
use whatnext::infrastructure::traits::Operator;
use whatnext::util::testing;

/// Operator that answers from a script and records everything shown.
struct ScriptedOperator {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    fn new(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            transcript: Mutex::new(Vec::new()),
        })
    }

    fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }

    fn saw(&self, needle: &str) -> bool {
        self.transcript().iter().any(|line| line.contains(needle))
    }

    fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

impl Operator for ScriptedOperator {
    fn ask(&self, prompt: &str) -> io::Result<String> {
        self.transcript.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn tell(&self, message: &str) {
        self.transcript.lock().unwrap().push(message.to_string());
    }
}

fn policy(growth_ceiling: u32, partition: (u32, u32)) -> VisitPolicy {
    VisitPolicy {
        growth_ceiling,
        partition_floor: partition.0,
        partition_ceiling: partition.1,
        ..Default::default()
    }
}

const NO_PARTITION: (u32, u32) = (1000, 1000);
const ALWAYS_PARTITION: (u32, u32) = (0, 0);

fn session(operator: Arc<ScriptedOperator>, policy: VisitPolicy) -> SessionService<StdRng> {
    testing::init_test_setup();
    SessionService::new(operator, policy, StdRng::seed_from_u64(17)).expect("valid policy")
}

fn two_children() -> DecisionTree {
    DecisionTree::from_weighted(
        "root",
        "",
        vec![
            (DecisionTree::new("a", ""), 0.5),
            (DecisionTree::new("b", ""), 0.5),
        ],
        Vec::<Leaf>::new(),
    )
    .unwrap()
}

fn assert_sums_to_one(tree: &DecisionTree) {
    let sum: f64 = tree.probabilities().iter().sum();
    assert!((sum - 1.0).abs() < PROBABILITY_TOLERANCE, "sum {sum}");
}

// ============================================================
// Growth and leaves
// ============================================================

#[test]
fn given_empty_root_when_child_added_then_visit_continues_in_new_child() {
    let operator = ScriptedOperator::new(&[
        "work",
        "paid things",
        "", // no grandchild
        "write report",
        "",
    ]);
    let mut root = DecisionTree::root();

    let report = session(operator.clone(), policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(report.path, vec!["root", "work"]);
    assert_eq!(
        report.outcome,
        VisitOutcome::LeafAdded {
            name: "write report".into()
        }
    );
    assert_eq!(root.probabilities(), vec![1.0]);
    let work = root.child(0).unwrap();
    assert_eq!(work.label(), "work (paid things)");
    assert_eq!(work.leaves()[0].name, "write report");
    assert!(operator.saw("Visiting: work (paid things)"));
    assert!(operator.saw("Ok, no child!"));
    assert_eq!(operator.remaining(), 0);
}

#[test]
fn given_everything_declined_when_visiting_leaf_only_node_then_session_is_exhausted() {
    let operator = ScriptedOperator::new(&["", ""]);
    let mut root = DecisionTree::root();

    let report = session(operator.clone(), policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(report.outcome, VisitOutcome::Exhausted);
    assert_eq!(report.path, vec!["root"]);
    assert_eq!(root.item_count(), 0);
    assert!(operator.saw("Ok, no leaf!"));
}

#[test]
fn given_leaf_added_at_root_when_visiting_then_stops_without_descending() {
    let operator = ScriptedOperator::new(&["", "just rest", "on the couch"]);
    let mut root = DecisionTree::root();

    let report = session(operator, policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(report.path, vec!["root"]);
    assert_eq!(root.leaves()[0].label(), "just rest (on the couch)");
}

// ============================================================
// Weighted selection loop
// ============================================================

#[test]
fn given_rejection_then_super_when_selecting_then_weights_shift_and_visit_descends() {
    let operator = ScriptedOperator::new(&[
        "n",     // reject first suggestion
        "maybe", // unknown answer, asked again
        "s",     // accept next suggestion
        "",      // selected child: no grandchild
        "",      // no leaf
    ]);
    let mut root = two_children();

    let report = session(operator.clone(), policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(report.outcome, VisitOutcome::Exhausted);
    assert_eq!(report.path.len(), 2);
    assert!(["a", "b"].contains(&report.path[1].as_str()));
    let p = root.probabilities();
    assert!((p[0] - p[1]).abs() > 1e-6, "weights unchanged: {p:?}");
    assert_sums_to_one(&root);
    assert!(operator.saw("Unknown answer 'maybe'"));
    assert_eq!(
        operator
            .transcript()
            .iter()
            .filter(|l| l.starts_with("Suggesting: "))
            .count(),
        2
    );
}

#[test]
fn given_ok_answer_when_selecting_then_weights_are_untouched() {
    let operator = ScriptedOperator::new(&["o", "", ""]);
    let mut root = two_children();

    session(operator, policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(root.probabilities(), vec![0.5, 0.5]);
}

#[test]
fn given_super_answer_when_selecting_then_selected_child_is_reinforced() {
    let operator = ScriptedOperator::new(&["s", "", ""]);
    let mut root = two_children();

    let report = session(operator, policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap();

    let selected = if report.path[1] == "a" { 0 } else { 1 };
    let p = root.probabilities();
    assert!((p[selected] - 0.6 / 1.1).abs() < 1e-9);
}

// ============================================================
// Partition
// ============================================================

#[test]
fn given_three_children_when_operator_groups_two_then_node_is_regrouped() {
    let operator = ScriptedOperator::new(&["pair", "first two", "0 1", "", ""]);
    let mut node = DecisionTree::from_weighted(
        "root",
        "",
        vec![
            (DecisionTree::new("x", ""), 0.2),
            (DecisionTree::new("y", ""), 0.3),
            (DecisionTree::new("z", ""), 0.5),
        ],
        Vec::<Leaf>::new(),
    )
    .unwrap();

    session(operator.clone(), VisitPolicy::default())
        .partition(&mut node)
        .unwrap();

    assert_eq!(node.child_count(), 2);
    assert_eq!(node.child(1).unwrap().name(), "pair");
    assert!((node.probabilities()[1] - 0.5).abs() < 1e-9);
    assert!(operator.saw("Empty name, leaving existing members as is"));
    assert_eq!(operator.remaining(), 0);
}

#[test]
fn given_everything_grouped_when_partitioning_then_stops_without_asking_again() {
    let operator = ScriptedOperator::new(&["all", "", "0 1", "0"]);
    let mut node = two_children();
    node.add_leaf("l", "");

    session(operator.clone(), VisitPolicy::default())
        .partition(&mut node)
        .unwrap();

    assert_eq!(node.child_count(), 1);
    assert_eq!(node.leaf_count(), 0);
    assert_eq!(node.probabilities(), vec![1.0]);
    assert_eq!(operator.remaining(), 0);
}

#[test]
fn given_out_of_range_index_when_partitioning_then_reports_and_keeps_tree() {
    let operator = ScriptedOperator::new(&["g", "", "0 7", ""]);
    let mut node = two_children();
    let before = node.clone();

    session(operator.clone(), VisitPolicy::default())
        .partition(&mut node)
        .unwrap();

    assert_eq!(node, before);
    assert!(operator.saw("partition aborted: child index 7 out of range (have 2)"));
}

#[test]
fn given_garbage_index_when_partitioning_then_reports_and_keeps_tree() {
    let operator = ScriptedOperator::new(&["g", "", "zero", ""]);
    let mut node = two_children();
    let before = node.clone();

    session(operator.clone(), VisitPolicy::default())
        .partition(&mut node)
        .unwrap();

    assert_eq!(node, before);
    assert!(operator.saw("not a child index: 'zero'"));
}

#[test]
fn given_open_partition_gate_when_visiting_then_regroups_before_selecting() {
    let operator = ScriptedOperator::new(&[
        // root: partition a and b into "both"
        "both", "", "0 1", "",
        // root: only child "both" suggested
        "o",
        // both: decline regrouping, accept suggestion
        "", "o",
        // selected grandchild: no child, no leaf
        "", "",
    ]);
    let mut root = two_children();

    let report = session(operator.clone(), policy(0, ALWAYS_PARTITION))
        .visit(&mut root)
        .unwrap();

    assert_eq!(report.path.len(), 3);
    assert_eq!(report.path[1], "both");
    assert_eq!(root.child_count(), 1);
    assert_eq!(root.child(0).unwrap().child_count(), 2);
    assert_eq!(operator.remaining(), 0);
}

// ============================================================
// Policy validation
// ============================================================

#[rstest]
#[case(policy(20, (40, 30)))]
#[case(VisitPolicy { reinforce: 1.5, ..Default::default() })]
#[case(VisitPolicy { penalize: -0.1, ..Default::default() })]
fn given_invalid_policy_when_creating_session_then_rejects_before_any_draw(
    #[case] policy: VisitPolicy,
) {
    testing::init_test_setup();
    let operator = ScriptedOperator::new(&[]);

    let result = SessionService::new(operator.clone(), policy, StdRng::seed_from_u64(17));

    assert!(matches!(result, Err(DomainError::InvalidPolicy(_))));
    assert!(operator.transcript().is_empty());
}

// ============================================================
// Operator failures
// ============================================================

#[test]
fn given_input_closes_mid_session_when_visiting_then_errors_and_keeps_growth() {
    let operator = ScriptedOperator::new(&["work", ""]);
    let mut root = DecisionTree::root();

    let err = session(operator, policy(0, NO_PARTITION))
        .visit(&mut root)
        .unwrap_err();

    assert!(err.is_input_closed());
    assert_eq!(root.child_count(), 1);
    assert_eq!(root.child(0).unwrap().name(), "work");
    assert_sums_to_one(&root);
}
