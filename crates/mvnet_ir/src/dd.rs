//! Boundary to the decision-diagram manager.
//!
//! The global composition engine expresses every node's function over the
//! primary inputs as decision diagrams owned by a [`DdManager`]. Managers
//! are reference counted: a result returned by a Boolean operation is
//! unreferenced, and the caller must [`ref_node`](DdManager::ref_node) what
//! it keeps. Unreferenced nodes are reclaimed only by an explicit
//! [`reorder`](DdManager::reorder) or garbage collection, never in the
//! middle of an operation.
//!
//! All methods take `&self`; managers use interior mutability so that
//! reference guards can release their node when dropped.

use crate::func::LocalFunction;
use mvnet_common::ValueSet;
use std::fmt;
use std::hash::Hash;

/// A reference-counted decision-diagram manager.
pub trait DdManager {
    /// Handle to a decision-diagram node.
    type Ref: Copy + Eq + Hash + fmt::Debug;

    /// Creates a fresh variable at the bottom of the order and returns its
    /// projection function (unreferenced).
    fn new_variable(&self) -> Self::Ref;

    /// Number of variables created so far.
    fn variable_count(&self) -> usize;

    /// The constant function.
    fn constant(&self, value: bool) -> Self::Ref;

    /// Conjunction.
    fn and(&self, a: Self::Ref, b: Self::Ref) -> Self::Ref;

    /// Disjunction.
    fn or(&self, a: Self::Ref, b: Self::Ref) -> Self::Ref;

    /// Negation.
    fn not(&self, a: Self::Ref) -> Self::Ref;

    /// Increments the reference count of `node`.
    fn ref_node(&self, node: Self::Ref);

    /// Decrements the reference count of `node`.
    fn deref_node(&self, node: Self::Ref);

    /// Allows [`reorder`](Self::reorder) to change the variable order.
    fn enable_reordering(&self);

    /// Freezes the variable order.
    fn disable_reordering(&self);

    /// Reclaims unreferenced nodes and, if enabled, reorders variables.
    fn reorder(&self);

    /// Number of distinct nodes reachable from `roots`.
    fn sharing_size(&self, roots: &[Self::Ref]) -> usize;

    /// Composes `function` with the global arrays of its inputs.
    ///
    /// `fanins[i][v]` is the characteristic function of "input `i` takes
    /// value `v`". Returns one referenced result per output value.
    fn compose<F: LocalFunction>(&self, function: &F, fanins: &[&[Self::Ref]]) -> Vec<Self::Ref>
    where
        Self: Sized,
    {
        debug_assert_eq!(function.num_inputs(), fanins.len());
        let mut result = Vec::with_capacity(function.output_values() as usize);
        for value in 0..function.output_values() {
            let mut acc = self.constant(false);
            for cube in function.onset(value) {
                let mut term = self.constant(true);
                for (input, literal) in cube.literals.iter().enumerate() {
                    let domain = function.input_values(input);
                    if *literal == ValueSet::full(domain) {
                        continue;
                    }
                    let mut lit = self.constant(false);
                    for v in literal.iter() {
                        lit = self.or(lit, fanins[input][v as usize]);
                    }
                    term = self.and(term, lit);
                }
                acc = self.or(acc, term);
            }
            self.ref_node(acc);
            result.push(acc);
        }
        result
    }
}
