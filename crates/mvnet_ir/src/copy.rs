//! Node and network duplication.

use crate::error::{NetError, NetResult};
use crate::func::LocalFunction;
use crate::ids::NodeId;
use crate::latch::LatchReset;
use crate::network::Network;
use log::debug;

impl<F: LocalFunction> Network<F> {
    /// Creates an unattached copy of `node` in this network.
    ///
    /// The copy has the same kind, value count, name, fanin list (not
    /// connected) and a clone of the function. The original records the
    /// copy as its back-reference until [`clear_copies`](Self::clear_copies).
    pub fn duplicate_node(&mut self, node: NodeId) -> NetResult<NodeId> {
        let n = self.node(node);
        let (kind, values) = (n.kind(), n.values());
        let name = n.explicit_name().map(str::to_string);
        let func = n.function().cloned();
        let fanins: Vec<NodeId> = self.fanins(node).collect();

        let copy = self.create_node(kind, values, name.as_deref())?;
        for fanin in fanins {
            self.add_fanin(copy, fanin)?;
        }
        if let Some(func) = func {
            self.set_function(copy, func);
        }
        self.node_mut(node).copy = Some(copy);
        Ok(copy)
    }

    /// Clones the whole network, latches included.
    ///
    /// Nodes are copied in ID order, so the copy has compacted IDs in the
    /// same relative order and identical canonical fanin lists.
    pub fn duplicate(&mut self) -> NetResult<Network<F>> {
        let mut dup = match self.capacity() {
            Some(capacity) => Network::with_capacity(self.name(), capacity),
            None => Network::new(self.name()),
        };
        let result = self.copy_into(&mut dup);
        self.clear_copies();
        result?;
        debug!("{}: duplicated {} nodes", self.name(), dup.node_count());
        Ok(dup)
    }

    fn copy_into(&mut self, dup: &mut Network<F>) -> NetResult<()> {
        let order = self.nodes();
        let mut copies = Vec::with_capacity(order.len());
        for &node in &order {
            let n = self.node(node);
            let copy = dup.create_node(n.kind(), n.values(), n.explicit_name())?;
            if let Some(func) = n.function() {
                dup.set_function(copy, func.clone());
            }
            self.node_mut(node).copy = Some(copy);
            copies.push(copy);
        }
        for (&node, &copy) in order.iter().zip(&copies) {
            for fanin in self.mapped_fanins(node)? {
                dup.add_fanin(copy, fanin)?;
            }
        }
        for &copy in &copies {
            dup.add_to_network(copy, false)?;
        }
        for &copy in &copies {
            dup.connect_node(copy)?;
        }

        for &latch in self.latches() {
            let record = self.latch(latch).clone();
            let reset = match record.reset {
                LatchReset::Logic(logic) => {
                    let n = self.node(logic);
                    let copy = dup.create_node(n.kind(), n.values(), n.explicit_name())?;
                    if let Some(func) = n.function() {
                        dup.set_function(copy, func.clone());
                    }
                    for fanin in self.mapped_fanins(logic)? {
                        dup.add_fanin(copy, fanin)?;
                    }
                    LatchReset::Logic(copy)
                }
                other => other,
            };
            let input = self.mapped(record.input)?;
            let output = self.mapped(record.output)?;
            dup.add_latch(input, output, reset)?;
        }
        Ok(())
    }

    fn mapped(&self, node: NodeId) -> NetResult<NodeId> {
        self.copy_of(node).ok_or_else(|| {
            NetError::consistency(self.node_name(node), "node has no copy in the duplicate")
        })
    }

    fn mapped_fanins(&self, node: NodeId) -> NetResult<Vec<NodeId>> {
        self.fanins(node).map(|f| self.mapped(f)).collect()
    }
}
