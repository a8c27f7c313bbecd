//! Reference local functions for the mvnet IR.
//!
//! [`Relation`] stores a multi-valued relation as an explicit table: one
//! [`ValueSet`](mvnet_common::ValueSet) of permitted output values per
//! input combination. It implements [`LocalFunction`](mvnet_ir::LocalFunction)
//! exactly, which makes it the collaborator of choice for tests and small
//! networks; it is not meant to scale past a few dozen input bits.

#![warn(missing_docs)]

mod relation;

pub use relation::{Relation, MAX_TABLE_ENTRIES};
