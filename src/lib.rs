//! whatnext: a weighted decision tree that grows while you use it
//!
//! Layers:
//! - `domain`: the tree, its invariants and the traversal gates
//! - `application`: interactive session and persistence services
//! - `infrastructure`: terminal, filesystem and JSON codec ports
//! - `cli`: argument parsing and dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
