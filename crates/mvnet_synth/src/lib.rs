//! Rewriting algorithms over multi-valued logic networks.
//!
//! This crate builds on the graph model of `mvnet_ir`:
//! 1. **Substitution**: collapsing a fanin into its consumer, support
//!    reduction and in-place node replacement ([`collapse`])
//! 2. **Global composition**: every node's function over the primary
//!    inputs as decision diagrams ([`global`])
//! 3. **Partitioning**: extracting a node set into its own network and
//!    inserting it back ([`subnet`])
//! 4. **Passes**: minimum base and sweep, driven by the `[passes]` section
//!    of `mvnet.toml` ([`optimize`])
//!
//! [`NodeHeap`] is the priority queue passes use to pick nodes by weight.

#![warn(missing_docs)]

pub mod collapse;
pub mod global;
pub mod heap;
pub mod optimize;
pub mod subnet;

pub use collapse::{
    collapse, collapse_nodes, delete_dangling, eliminate_node, make_minimum_base, replace_node,
};
pub use global::{compute_global, GlobalFunctions, GlobalOptions, GlobalRef};
pub use heap::NodeHeap;
pub use optimize::{run_passes, MinimumBasePass, Pass, SweepPass};
pub use subnet::{extract, insert};
