//! Max-heap of nodes keyed by an integer weight.
//!
//! Every queued node stores its heap slot on itself (see
//! [`Node::heap_slot`](mvnet_ir::Node::heap_slot)), so membership tests,
//! removal and re-weighting of an arbitrary node are O(log n). A node can
//! sit in one heap at a time; the heap must be used with the network that
//! owns its nodes.

use mvnet_ir::{Network, NodeId};

/// Indexed binary max-heap of nodes.
#[derive(Debug, Default, Clone)]
pub struct NodeHeap {
    entries: Vec<(NodeId, i64)>,
}

impl NodeHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the heap.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot<F>(&self, net: &Network<F>, node: NodeId) -> Option<usize> {
        net.node(node)
            .heap_slot()
            .filter(|&slot| self.entries.get(slot).map(|e| e.0) == Some(node))
    }

    /// Returns `true` if `node` is in the heap.
    pub fn contains<F>(&self, net: &Network<F>, node: NodeId) -> bool {
        self.slot(net, node).is_some()
    }

    /// Current weight of `node`.
    pub fn weight<F>(&self, net: &Network<F>, node: NodeId) -> Option<i64> {
        self.slot(net, node).map(|slot| self.entries[slot].1)
    }

    /// Inserts `node` with `weight`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is already in the heap.
    pub fn insert<F>(&mut self, net: &mut Network<F>, node: NodeId, weight: i64) {
        assert!(!self.contains(net, node), "NodeHeap::insert: node already queued");
        let slot = self.entries.len();
        self.entries.push((node, weight));
        net.set_heap_slot(node, Some(slot));
        self.sift_up(net, slot);
    }

    /// Changes the weight of a queued node. Returns `false` if it is absent.
    pub fn update<F>(&mut self, net: &mut Network<F>, node: NodeId, weight: i64) -> bool {
        let Some(slot) = self.slot(net, node) else {
            return false;
        };
        let previous = std::mem::replace(&mut self.entries[slot].1, weight);
        if weight > previous {
            self.sift_up(net, slot);
        } else {
            self.sift_down(net, slot);
        }
        true
    }

    /// Removes `node`, returning its weight.
    pub fn remove<F>(&mut self, net: &mut Network<F>, node: NodeId) -> Option<i64> {
        let slot = self.slot(net, node)?;
        net.set_heap_slot(node, None);
        let (_, weight) = self.entries.swap_remove(slot);
        if slot < self.entries.len() {
            net.set_heap_slot(self.entries[slot].0, Some(slot));
            self.sift_up(net, slot);
            self.sift_down(net, slot);
        }
        Some(weight)
    }

    /// The heaviest node without removing it.
    pub fn peek_max(&self) -> Option<(NodeId, i64)> {
        self.entries.first().copied()
    }

    /// Removes and returns the heaviest node.
    pub fn pop_max<F>(&mut self, net: &mut Network<F>) -> Option<(NodeId, i64)> {
        let (node, _) = self.peek_max()?;
        self.remove(net, node).map(|weight| (node, weight))
    }

    /// Empties the heap and clears the slots of the queued nodes.
    pub fn clear<F>(&mut self, net: &mut Network<F>) {
        for (node, _) in self.entries.drain(..) {
            net.set_heap_slot(node, None);
        }
    }

    /// Checks the heap order and the slots stored on the nodes.
    pub fn check_order<F>(&self, net: &Network<F>) -> bool {
        let ordered = (1..self.entries.len())
            .all(|i| self.entries[(i - 1) / 2].1 >= self.entries[i].1);
        let indexed = self
            .entries
            .iter()
            .enumerate()
            .all(|(slot, &(node, _))| net.node(node).heap_slot() == Some(slot));
        ordered && indexed
    }

    fn swap<F>(&mut self, net: &mut Network<F>, i: usize, j: usize) {
        self.entries.swap(i, j);
        net.set_heap_slot(self.entries[i].0, Some(i));
        net.set_heap_slot(self.entries[j].0, Some(j));
    }

    fn sift_up<F>(&mut self, net: &mut Network<F>, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[parent].1 >= self.entries[slot].1 {
                break;
            }
            self.swap(net, parent, slot);
            slot = parent;
        }
    }

    fn sift_down<F>(&mut self, net: &mut Network<F>, mut slot: usize) {
        let len = self.entries.len();
        loop {
            let mut largest = slot;
            for child in [2 * slot + 1, 2 * slot + 2] {
                if child < len && self.entries[child].1 > self.entries[largest].1 {
                    largest = child;
                }
            }
            if largest == slot {
                break;
            }
            self.swap(net, slot, largest);
            slot = largest;
        }
    }
}
