//! The multi-valued logic network IR.
//!
//! This crate defines [`Network`], a mutable graph of multi-valued logic
//! nodes connected through mirrored fanin/fanout pins, together with the
//! primitives every rewriting pass relies on: traversal marking, graph
//! walks, canonical fanin ordering, the consistency checker, duplication,
//! and structural diffing.
//!
//! Local functions and decision diagrams are external collaborators, seen
//! only through the [`LocalFunction`] and [`DdManager`] traits.

#![warn(missing_docs)]

pub mod arena;
mod check;
mod compare;
mod copy;
pub mod dd;
pub mod error;
pub mod func;
pub mod ids;
pub mod latch;
pub mod network;
pub mod node;
pub mod order;
pub mod pin;
#[cfg(test)]
pub(crate) mod testing;
mod traverse;
pub mod walk;

pub use arena::{ArenaId, Pool, PoolExhausted};
pub use compare::{diff_networks, Difference, Side};
pub use dd::DdManager;
pub use error::{NetError, NetResult};
pub use func::{FunctionError, LocalFunction, MvCube};
pub use ids::{LatchId, NodeId, PinId};
pub use latch::{Latch, LatchReset};
pub use network::Network;
pub use node::{Node, NodeKind};
pub use order::{compare_nodes, reorder_fanins};
pub use pin::Pin;
pub use walk::{Direction, Levels};
