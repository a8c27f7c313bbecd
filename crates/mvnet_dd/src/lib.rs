//! Reference decision-diagram manager for the mvnet IR.
//!
//! [`BddManager`] is a plain reduced ordered BDD package: a unique table,
//! a memoized apply, external reference counts and mark-and-sweep garbage
//! collection. It implements [`DdManager`](mvnet_ir::DdManager) so that
//! global composition can run without an external package.

#![warn(missing_docs)]

mod manager;

pub use manager::{Bdd, BddManager};
