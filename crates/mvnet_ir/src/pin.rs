//! Connection endpoints.
//!
//! Every edge `producer -> consumer` is stored twice: as a fanin pin in the
//! consumer's fanin list and as a fanout pin in the producer's fanout list.
//! The two pins name each other through `mirror`, so either side of an edge
//! can be reached from the other in O(1).

use crate::ids::{NodeId, PinId};

/// One endpoint of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    /// The node whose list holds this pin.
    pub owner: NodeId,
    /// The node at the other end of the edge.
    pub node: NodeId,
    /// The pin on the other side of the edge, once connected.
    pub mirror: Option<PinId>,
}

impl Pin {
    pub(crate) fn new(owner: NodeId, node: NodeId) -> Self {
        Self {
            owner,
            node,
            mirror: None,
        }
    }

    /// Returns `true` once the pin has a counterpart.
    pub fn is_connected(&self) -> bool {
        self.mirror.is_some()
    }
}
