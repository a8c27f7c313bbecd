//! Boundary to the local-function collaborator.
//!
//! Every internal node carries a function of its fanins. The network never
//! inspects that function directly; it asks the collaborator, through
//! [`LocalFunction`], to re-express it whenever the fanin list changes
//! (reordering, duplicate folding, collapsing, support reduction).
//!
//! Input positions always refer to the owning node's fanin list: input `i`
//! is the node's `i`-th fanin.

use mvnet_common::{ValueSet, ValueSetError};
use std::fmt;

/// Errors reported by a local-function implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    /// The result would exceed the implementation's size limit.
    #[error("function over {inputs} inputs exceeds the limit of {limit} table entries")]
    TooLarge {
        /// Number of inputs of the rejected function.
        inputs: usize,
        /// The implementation's entry limit.
        limit: usize,
    },

    /// An input was given a domain that disagrees with the function.
    #[error("input {input} expects {expected} values but {found} were supplied")]
    DomainMismatch {
        /// Input position.
        input: usize,
        /// Value count the function was built with.
        expected: u32,
        /// Value count supplied by the caller.
        found: u32,
    },

    /// A value count outside the supported range.
    #[error(transparent)]
    Values(#[from] ValueSetError),
}

/// A product term over multi-valued inputs.
///
/// Literal `i` is the set of values input `i` may take; a literal equal to
/// the input's full domain does not constrain that input.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MvCube {
    /// One value set per input.
    pub literals: Vec<ValueSet>,
}

/// A node's local function, expressed over its fanins.
///
/// A local function is a relation: for every combination of input values it
/// names the set of output values the node may produce. Cloning duplicates
/// the function and dropping it frees it.
pub trait LocalFunction: Clone + fmt::Debug {
    /// Number of inputs.
    fn num_inputs(&self) -> usize;

    /// Value count of input `input`.
    fn input_values(&self, input: usize) -> u32;

    /// Value count of the output.
    fn output_values(&self) -> u32;

    /// The single-input function that copies its input.
    fn identity(values: u32) -> Self;

    /// Sorted positions of the inputs the function actually depends on.
    fn support(&self) -> Vec<usize>;

    /// Reorders inputs: input `i` of the result is input `order[i]` of `self`.
    fn permute(&self, order: &[usize]) -> Self;

    /// Forces inputs `keep` and `drop` to be equal and removes `drop`.
    ///
    /// Both inputs must have the same domain. Positions after `drop` shift
    /// down by one.
    fn merge_inputs(&self, keep: usize, drop: usize) -> Self;

    /// Fixes `input` to `value` and removes it.
    fn cofactor(&self, input: usize, value: u32) -> Self;

    /// Replaces `input` by a new input with `values` values, where new value
    /// `v` stands for old value `map[v]`.
    fn remap_input(&self, input: usize, values: u32, map: &[u32]) -> Self;

    /// Moves input `i` to position `positions[i]` in a space with the given
    /// `domains`. Inputs sent to the same position are identified.
    fn expand(&self, positions: &[usize], domains: &[u32]) -> Result<Self, FunctionError>;

    /// Substitutes `fanin` for input `input` of `self`.
    ///
    /// `node_map[i]` is the position of `self`'s input `i` in the merged
    /// space (`None` for `input` itself), `fanin_map[j]` that of `fanin`'s
    /// input `j`, and `domains` the merged space's value counts.
    fn collapse(
        &self,
        input: usize,
        fanin: &Self,
        node_map: &[Option<usize>],
        fanin_map: &[usize],
        domains: &[u32],
    ) -> Result<Self, FunctionError>;

    /// Restricts the function to its true support.
    ///
    /// Returns the reduced function and the sorted positions it kept.
    fn make_minimum_base(&self) -> (Self, Vec<usize>);

    /// The output value, if the function is a single constant.
    fn constant_value(&self) -> Option<u32>;

    /// For a deterministic one-input function, the output value per input value.
    fn single_input_map(&self) -> Option<Vec<u32>>;

    /// Cubes covering the input combinations that may produce `value`.
    fn onset(&self, value: u32) -> Vec<MvCube>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_too_large() {
        let err = FunctionError::TooLarge {
            inputs: 30,
            limit: 1 << 20,
        };
        assert_eq!(
            format!("{err}"),
            "function over 30 inputs exceeds the limit of 1048576 table entries"
        );
    }

    #[test]
    fn display_domain_mismatch() {
        let err = FunctionError::DomainMismatch {
            input: 1,
            expected: 2,
            found: 3,
        };
        assert_eq!(
            format!("{err}"),
            "input 1 expects 2 values but 3 were supplied"
        );
    }

    #[test]
    fn value_errors_convert() {
        let err: FunctionError = ValueSetError::TooFewValues(1).into();
        assert_eq!(format!("{err}"), "value count 1 is below the minimum of 2");
    }

    #[test]
    fn cube_equality() {
        let a = MvCube {
            literals: vec![ValueSet::single(1), ValueSet::full(2)],
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
