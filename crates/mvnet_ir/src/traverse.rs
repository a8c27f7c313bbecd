//! Traversal marking.
//!
//! Every node carries a stamp and the network carries a counter. A node is
//! visited in the current pass when its stamp equals the counter, and was
//! visited in the previous pass when it equals the counter minus one.
//! Starting a pass bumps the counter, so no sweep over the nodes is needed.
//!
//! Stamps are only meaningful relative to the network that wrote them.

use crate::ids::NodeId;
use crate::network::Network;

impl<F> Network<F> {
    /// Starts a new traversal pass and returns its stamp.
    pub fn start_traversal(&mut self) -> u64 {
        self.traversal += 1;
        self.traversal
    }

    /// Reserves `count` consecutive stamps and returns the first one.
    ///
    /// Walks that need more than one mark per pass use `first..first + count`.
    pub fn reserve_traversals(&mut self, count: u64) -> u64 {
        let first = self.traversal + 1;
        self.traversal += count;
        first
    }

    /// The stamp of the current pass.
    pub fn traversal_id(&self) -> u64 {
        self.traversal
    }

    /// Marks `node` as visited in the current pass.
    pub fn mark_visited(&mut self, node: NodeId) {
        let stamp = self.traversal;
        self.node_mut(node).stamp = stamp;
    }

    /// Returns `true` if `node` was marked in the current pass.
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.node(node).stamp == self.traversal
    }

    /// Marks `node` as visited in the previous pass.
    pub fn mark_visited_prev(&mut self, node: NodeId) {
        let stamp = self.traversal.saturating_sub(1);
        self.node_mut(node).stamp = stamp;
    }

    /// Returns `true` if `node` was marked in the previous pass.
    pub fn was_visited_prev(&self, node: NodeId) -> bool {
        self.traversal > 0 && self.node(node).stamp == self.traversal - 1
    }

    /// Writes an explicit stamp; used with [`reserve_traversals`](Self::reserve_traversals).
    pub fn set_stamp(&mut self, node: NodeId, stamp: u64) {
        self.node_mut(node).stamp = stamp;
    }

    /// The stamp currently stored on `node`.
    pub fn stamp(&self, node: NodeId) -> u64 {
        self.node(node).stamp
    }
}
