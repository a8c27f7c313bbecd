//! Structural consistency checker.
//!
//! [`Network::check`] verifies every global invariant and reports the first
//! violation it finds. It never repairs anything.

use crate::error::{NetError, NetResult};
use crate::func::LocalFunction;
use crate::ids::{NodeId, PinId};
use crate::network::Network;
use crate::node::NodeKind;
use crate::order::is_canonical;
use log::debug;

impl<F: LocalFunction> Network<F> {
    /// Verifies the structural invariants of the network.
    ///
    /// Checked, in order: list membership against the ID and name tables,
    /// arity rules per kind, function arity and domains, canonical fanin
    /// order, pin-mirror consistency, latch records, and acyclicity.
    pub fn check(&mut self) -> NetResult<()> {
        self.check_tables()?;
        let nodes = self.nodes();
        for &node in &nodes {
            self.check_arity(node)?;
            self.check_function(node)?;
            if !self.node(node).is_primary_input() && !is_canonical(self, node) {
                return Err(self.violation(node, "fanins are not in canonical order"));
            }
            self.check_pins(node)?;
        }
        self.check_latches()?;
        self.detect_cycle()?;
        debug!("{}: check passed on {} nodes", self.name(), nodes.len());
        Ok(())
    }

    fn violation(&self, node: NodeId, message: impl Into<String>) -> NetError {
        NetError::consistency(self.node_name(node), message)
    }

    fn check_tables(&self) -> NetResult<()> {
        let lists = [
            (NodeKind::PrimaryInput, self.primary_inputs()),
            (NodeKind::PrimaryOutput, self.primary_outputs()),
            (NodeKind::Internal, self.internal_nodes()),
        ];
        for (kind, list) in lists {
            for &node in list {
                let Some(n) = self.try_node(node) else {
                    return Err(NetError::consistency(
                        node.to_string(),
                        "stale handle in a node list",
                    ));
                };
                if n.kind() != kind {
                    return Err(self.violation(node, format!("listed as {}", kind.tag())));
                }
                if !n.is_in_network() || self.ids.get(n.id() as usize) != Some(&Some(node)) {
                    return Err(self.violation(node, "ID table does not point back to the node"));
                }
                if let Some(name) = n.explicit_name() {
                    if self.names.get(name) != Some(&node) {
                        return Err(self.violation(node, "name table does not point back to the node"));
                    }
                }
            }
        }
        let live = self.ids.iter().flatten().count();
        if live != self.node_count() {
            return Err(NetError::consistency(
                self.name(),
                format!("ID table holds {live} nodes, lists hold {}", self.node_count()),
            ));
        }
        for (name, &node) in &self.names {
            let named = self
                .try_node(node)
                .is_some_and(|n| n.is_in_network() && n.explicit_name() == Some(name.as_str()));
            if !named {
                return Err(NetError::consistency(
                    name.clone(),
                    "name table entry does not match a node",
                ));
            }
        }
        Ok(())
    }

    fn check_arity(&self, node: NodeId) -> NetResult<()> {
        let n = self.node(node);
        match n.kind() {
            NodeKind::PrimaryInput => {
                if n.fanin_count() != 0 || n.function().is_some() {
                    return Err(self.violation(node, "primary input with fanins or a function"));
                }
            }
            NodeKind::PrimaryOutput => {
                if n.fanin_count() != 1 {
                    return Err(self.violation(node, "primary output without exactly one fanin"));
                }
                if n.fanout_count() != 0 {
                    return Err(self.violation(node, "primary output with fanouts"));
                }
                let driver = self.fanin(node, 0);
                if self.node(driver).values() != n.values() {
                    return Err(self.violation(node, "value count differs from its driver"));
                }
            }
            NodeKind::Internal => {}
        }
        Ok(())
    }

    fn check_function(&self, node: NodeId) -> NetResult<()> {
        let n = self.node(node);
        if !n.is_internal() {
            return Ok(());
        }
        let Some(func) = n.function() else {
            return Err(self.violation(node, "internal node without a function"));
        };
        if func.num_inputs() != n.fanin_count() {
            return Err(self.violation(
                node,
                format!(
                    "function has {} inputs for {} fanins",
                    func.num_inputs(),
                    n.fanin_count()
                ),
            ));
        }
        if func.output_values() != n.values() {
            return Err(self.violation(node, "function output domain differs from the node"));
        }
        for (i, fanin) in self.fanins(node).enumerate() {
            if func.input_values(i) != self.node(fanin).values() {
                return Err(self.violation(
                    node,
                    format!("input {i} domain differs from '{}'", self.node_name(fanin)),
                ));
            }
        }
        Ok(())
    }

    fn check_pins(&self, node: NodeId) -> NetResult<()> {
        let n = self.node(node);
        for &pin in n.fanin_pins() {
            let p = self.pin(pin);
            let fanin_ok = p.owner == node
                && self.try_node(p.node).is_some_and(|f| f.is_in_network());
            if !fanin_ok {
                return Err(self.violation(node, "fanin pin points outside the network"));
            }
            let mirrored = self.mirrors(pin);
            if !mirrored {
                return Err(self.violation(
                    node,
                    format!("fanin '{}' has no matching fanout pin", self.node_name(p.node)),
                ));
            }
        }
        for &pin in n.fanout_pins() {
            let p = self.pin(pin);
            let mirrored = p.owner == node
                && self.mirrors(pin)
                && self.try_node(p.node).is_some_and(|c| c.is_in_network());
            if !mirrored {
                return Err(self.violation(node, "fanout pin has no matching fanin pin"));
            }
        }
        Ok(())
    }

    /// Returns `true` if `pin` and its mirror name each other and describe
    /// the same edge from opposite ends.
    fn mirrors(&self, pin: PinId) -> bool {
        let p = self.pin(pin);
        p.mirror
            .and_then(|m| self.pins.get(m))
            .is_some_and(|q| q.owner == p.node && q.node == p.owner && q.mirror == Some(pin))
    }

    fn check_latches(&self) -> NetResult<()> {
        for &latch in self.latches() {
            let record = self.latch(latch);
            let input_ok = self
                .try_node(record.input)
                .is_some_and(|n| n.is_primary_output() && n.latch() == Some(latch));
            let output_ok = self
                .try_node(record.output)
                .is_some_and(|n| n.is_primary_input() && n.latch() == Some(latch));
            if !input_ok || !output_ok {
                return Err(NetError::consistency(
                    latch.to_string(),
                    "latch endpoints do not refer back to the latch",
                ));
            }
        }
        Ok(())
    }
}
