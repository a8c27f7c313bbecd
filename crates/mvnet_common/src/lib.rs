//! Shared foundational types used across the mvnet logic-network crates.
//!
//! This crate provides multi-valued value sets and their binary encoding,
//! and content hashing for structural network signatures.

#![warn(missing_docs)]

pub mod hash;
pub mod values;

pub use hash::{ContentHash, ContentHasher};
pub use values::{bits_for_values, validate_value_count, ValueSet, ValueSetError, MAX_VALUES};
