//! Node definitions.
//!
//! A [`Node`] is one logic signal of a network: a primary input, a primary
//! output, or an internal node carrying a local function of its fanins.

use crate::ids::{LatchId, NodeId, PinId};
use serde::{Deserialize, Serialize};

/// The role of a node in its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A combinational input: no fanins, no local function.
    PrimaryInput,
    /// A combinational output: exactly one fanin, no fanouts.
    PrimaryOutput,
    /// A logic node with a local function over its fanins.
    Internal,
}

impl NodeKind {
    /// Short tag used in signatures and diagnostics.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::PrimaryInput => "pi",
            NodeKind::PrimaryOutput => "po",
            NodeKind::Internal => "int",
        }
    }
}

/// A logic signal.
///
/// Nodes are created unattached (ID 0) and receive their ID when they join
/// a network. Fanin pins are kept in canonical order once the node is
/// connected; fanout pins are unordered.
#[derive(Debug, Clone)]
pub struct Node<F> {
    pub(crate) kind: NodeKind,
    pub(crate) values: u32,
    pub(crate) id: u32,
    pub(crate) name: Option<String>,
    pub(crate) fanins: Vec<PinId>,
    pub(crate) fanouts: Vec<PinId>,
    pub(crate) func: Option<F>,
    pub(crate) level: u32,
    pub(crate) stamp: u64,
    pub(crate) copy: Option<NodeId>,
    pub(crate) latch: Option<LatchId>,
    pub(crate) heap_slot: Option<usize>,
}

impl<F> Node<F> {
    pub(crate) fn new(kind: NodeKind, values: u32, name: Option<String>) -> Self {
        Self {
            kind,
            values,
            id: 0,
            name,
            fanins: Vec::new(),
            fanouts: Vec::new(),
            func: None,
            level: 0,
            stamp: 0,
            copy: None,
            latch: None,
            heap_slot: None,
        }
    }

    /// The node's role.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Number of values the signal can take (2 for binary logic).
    pub fn values(&self) -> u32 {
        self.values
    }

    /// Network ID, or 0 if the node is not part of a network.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns `true` if the node has been added to a network.
    pub fn is_in_network(&self) -> bool {
        self.id != 0
    }

    /// The explicit name, if one was given.
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit name, or a name derived from the ID.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("[{}]", self.id),
        }
    }

    /// Fanin pins in canonical order.
    pub fn fanin_pins(&self) -> &[PinId] {
        &self.fanins
    }

    /// Fanout pins.
    pub fn fanout_pins(&self) -> &[PinId] {
        &self.fanouts
    }

    /// Number of fanins.
    pub fn fanin_count(&self) -> usize {
        self.fanins.len()
    }

    /// Number of fanouts.
    pub fn fanout_count(&self) -> usize {
        self.fanouts.len()
    }

    /// The local function, if any.
    pub fn function(&self) -> Option<&F> {
        self.func.as_ref()
    }

    /// Topological level from the last levelization.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Position in the priority heap currently holding the node.
    pub fn heap_slot(&self) -> Option<usize> {
        self.heap_slot
    }

    /// The copy recorded by the last duplication, if still set.
    pub fn copy(&self) -> Option<NodeId> {
        self.copy
    }

    /// The latch this node is the input or output of.
    pub fn latch(&self) -> Option<LatchId> {
        self.latch
    }

    /// Returns `true` for primary inputs.
    pub fn is_primary_input(&self) -> bool {
        self.kind == NodeKind::PrimaryInput
    }

    /// Returns `true` for primary outputs.
    pub fn is_primary_output(&self) -> bool {
        self.kind == NodeKind::PrimaryOutput
    }

    /// Returns `true` for internal nodes.
    pub fn is_internal(&self) -> bool {
        self.kind == NodeKind::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_unattached() {
        let node: Node<()> = Node::new(NodeKind::Internal, 2, None);
        assert!(!node.is_in_network());
        assert_eq!(node.fanin_count(), 0);
        assert_eq!(node.name(), "[0]");
    }

    #[test]
    fn explicit_name_wins() {
        let mut node: Node<()> = Node::new(NodeKind::PrimaryInput, 3, Some("a".into()));
        node.id = 4;
        assert_eq!(node.name(), "a");
        assert_eq!(node.explicit_name(), Some("a"));
        assert_eq!(node.values(), 3);
    }

    #[test]
    fn derived_name_uses_id() {
        let mut node: Node<()> = Node::new(NodeKind::Internal, 2, None);
        node.id = 17;
        assert_eq!(node.name(), "[17]");
    }

    #[test]
    fn kind_predicates() {
        let pi: Node<()> = Node::new(NodeKind::PrimaryInput, 2, None);
        let po: Node<()> = Node::new(NodeKind::PrimaryOutput, 2, None);
        assert!(pi.is_primary_input());
        assert!(po.is_primary_output());
        assert!(!po.is_internal());
        assert_eq!(NodeKind::Internal.tag(), "int");
    }
}
