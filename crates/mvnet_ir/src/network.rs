//! The mutable logic network.
//!
//! A [`Network`] owns every node, pin, and latch of one design in three
//! pools. Nodes are built unattached ([`create_node`](Network::create_node),
//! [`add_fanin`](Network::add_fanin), [`set_function`](Network::set_function))
//! and then joined to the network with
//! [`add_to_network`](Network::add_to_network), which assigns the next ID,
//! records the name, and optionally connects the mirrored fanout pins.

use crate::arena::Pool;
use crate::error::{NetError, NetResult};
use crate::func::LocalFunction;
use crate::ids::{LatchId, NodeId, PinId};
use crate::latch::{Latch, LatchReset};
use crate::node::{Node, NodeKind};
use crate::order::reorder_fanins;
use crate::pin::Pin;
use log::{debug, trace};
use mvnet_common::validate_value_count;
use std::collections::HashMap;

/// A multi-valued logic network.
pub struct Network<F> {
    name: String,
    pub(crate) nodes: Pool<NodeId, Node<F>>,
    pub(crate) pins: Pool<PinId, Pin>,
    pub(crate) latches: Pool<LatchId, Latch>,
    pub(crate) names: HashMap<String, NodeId>,
    /// Dense ID table; slot 0 is never used.
    pub(crate) ids: Vec<Option<NodeId>>,
    next_id: u32,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    internals: Vec<NodeId>,
    latch_list: Vec<LatchId>,
    pub(crate) traversal: u64,
}

impl<F> Network<F> {
    /// Creates an empty network without a node limit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Pool::new(),
            pins: Pool::new(),
            latches: Pool::new(),
            names: HashMap::new(),
            ids: vec![None],
            next_id: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            internals: Vec::new(),
            latch_list: Vec::new(),
            traversal: 0,
        }
    }

    /// Creates an empty network holding at most `max_nodes` nodes.
    pub fn with_capacity(name: impl Into<String>, max_nodes: usize) -> Self {
        Self {
            nodes: Pool::with_capacity(max_nodes),
            ..Self::new(name)
        }
    }

    /// The network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the network.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Node capacity limit, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.nodes.capacity()
    }

    /// Number of allocated node slots, attached or not.
    pub fn allocated_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn node(&self, id: NodeId) -> &Node<F> {
        &self.nodes[id]
    }

    /// Returns the node behind `id`, or `None` if the handle is stale.
    pub fn try_node(&self, id: NodeId) -> Option<&Node<F>> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<F> {
        &mut self.nodes[id]
    }

    /// Returns `true` if `id` refers to a live node (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Returns the pin behind `id`.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id]
    }

    /// Returns the latch behind `id`.
    pub fn latch(&self, id: LatchId) -> &Latch {
        &self.latches[id]
    }

    /// Number of nodes that are part of the network.
    pub fn node_count(&self) -> usize {
        self.inputs.len() + self.outputs.len() + self.internals.len()
    }

    /// Primary inputs in insertion order (latch outputs included).
    pub fn primary_inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Primary outputs in insertion order (latch inputs included).
    pub fn primary_outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Internal nodes in insertion order.
    pub fn internal_nodes(&self) -> &[NodeId] {
        &self.internals
    }

    /// Latches in insertion order.
    pub fn latches(&self) -> &[LatchId] {
        &self.latch_list
    }

    /// All nodes of the network in ID order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.ids.iter().flatten().copied().collect()
    }

    /// The largest ID assigned so far plus one.
    pub fn id_bound(&self) -> u32 {
        self.next_id
    }

    /// Looks a node up by its network ID.
    pub fn node_by_id(&self, id: u32) -> Option<NodeId> {
        self.ids.get(id as usize).copied().flatten()
    }

    /// Looks a node up by name.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Looks a node up by name, failing with [`NetError::UnknownNode`].
    pub fn find_node(&self, name: &str) -> NetResult<NodeId> {
        self.lookup(name)
            .ok_or_else(|| NetError::UnknownNode(name.to_string()))
    }

    /// The node's explicit or derived name.
    pub fn node_name(&self, id: NodeId) -> String {
        self.nodes[id].name()
    }

    /// The producers feeding `node`, in fanin order.
    pub fn fanins(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node].fanins.iter().map(|&p| self.pins[p].node)
    }

    /// The `index`-th fanin of `node`.
    pub fn fanin(&self, node: NodeId, index: usize) -> NodeId {
        self.pins[self.nodes[node].fanins[index]].node
    }

    /// The consumers of `node` (one entry per edge).
    pub fn fanouts(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node].fanouts.iter().map(|&p| self.pins[p].node)
    }

    /// Position of `fanin` in `node`'s fanin list.
    pub fn fanin_index(&self, node: NodeId, fanin: NodeId) -> Option<usize> {
        self.fanins(node).position(|f| f == fanin)
    }

    /// The copy recorded for `node` by the last duplication.
    pub fn copy_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].copy
    }

    /// Clears every copy back-reference.
    pub fn clear_copies(&mut self) {
        for id in self.nodes.ids() {
            self.nodes[id].copy = None;
        }
    }

    /// Replaces the function of `node`, returning the previous one.
    pub fn set_function(&mut self, node: NodeId, func: F) -> Option<F> {
        self.nodes[node].func.replace(func)
    }

    /// Removes and returns the function of `node`.
    pub fn take_function(&mut self, node: NodeId) -> Option<F> {
        self.nodes[node].func.take()
    }

    /// Sets the level field of `node`.
    pub fn set_level(&mut self, node: NodeId, level: u32) {
        self.nodes[node].level = level;
    }

    /// Records the heap slot of `node`; `None` marks it as not queued.
    pub fn set_heap_slot(&mut self, node: NodeId, slot: Option<usize>) {
        self.nodes[node].heap_slot = slot;
    }

    fn kind_list_mut(&mut self, kind: NodeKind) -> &mut Vec<NodeId> {
        match kind {
            NodeKind::PrimaryInput => &mut self.inputs,
            NodeKind::PrimaryOutput => &mut self.outputs,
            NodeKind::Internal => &mut self.internals,
        }
    }

    /// Creates mirrored fanout pins for every unconnected fanin pin.
    pub(crate) fn connect_fanins(&mut self, node: NodeId) -> NetResult<()> {
        let fanins = self.nodes[node].fanins.clone();
        for pin in fanins {
            if self.pins[pin].mirror.is_some() {
                continue;
            }
            let producer = self.pins[pin].node;
            let mut fanout = Pin::new(producer, node);
            fanout.mirror = Some(pin);
            let mirror = self.pins.alloc(fanout)?;
            self.nodes[producer].fanouts.push(mirror);
            self.pins[pin].mirror = Some(mirror);
        }
        Ok(())
    }

    /// Removes the mirrored fanout pin of `pin`, if any.
    pub(crate) fn unlink_pin(&mut self, pin: PinId) {
        if let Some(mirror) = self.pins[pin].mirror.take() {
            let producer = self.pins[mirror].owner;
            let fanouts = &mut self.nodes[producer].fanouts;
            if let Some(pos) = fanouts.iter().position(|&p| p == mirror) {
                fanouts.swap_remove(pos);
            }
            self.pins.recycle(mirror);
        }
    }

    /// Removes every mirrored fanout pin on the fanins of `node`.
    pub(crate) fn disconnect_fanins(&mut self, node: NodeId) {
        let fanins = self.nodes[node].fanins.clone();
        for pin in fanins {
            self.unlink_pin(pin);
        }
    }

    /// Removes fanin `index` of `node`, unlinking its mirror and recycling it.
    ///
    /// The function is not touched.
    pub fn remove_fanin_pin(&mut self, node: NodeId, index: usize) {
        let pin = self.nodes[node].fanins.remove(index);
        self.unlink_pin(pin);
        self.pins.recycle(pin);
    }

    /// Exchanges the fanin lists of `a` and `b`.
    ///
    /// Both lists are disconnected first and stay disconnected; attached
    /// nodes must be reconnected with [`connect_node`](Self::connect_node).
    pub fn swap_fanins(&mut self, a: NodeId, b: NodeId) {
        self.disconnect_fanins(a);
        self.disconnect_fanins(b);
        let from_a = std::mem::take(&mut self.nodes[a].fanins);
        let from_b = std::mem::take(&mut self.nodes[b].fanins);
        for &pin in &from_a {
            self.pins[pin].owner = b;
        }
        for &pin in &from_b {
            self.pins[pin].owner = a;
        }
        self.nodes[a].fanins = from_b;
        self.nodes[b].fanins = from_a;
    }

    /// Recycles an unattached node and its fanin pins.
    ///
    /// # Panics
    ///
    /// Panics if the node is still part of the network or still has fanouts.
    pub fn destroy_node(&mut self, node: NodeId) {
        assert!(
            !self.nodes[node].is_in_network(),
            "destroy_node: '{}' is still in the network",
            self.node_name(node)
        );
        assert!(
            self.nodes[node].fanouts.is_empty(),
            "destroy_node: '{}' still has fanouts",
            self.node_name(node)
        );
        let fanins = std::mem::take(&mut self.nodes[node].fanins);
        for pin in fanins {
            self.unlink_pin(pin);
            self.pins.recycle(pin);
        }
        self.nodes.recycle(node);
    }

    /// Assigns IDs `1..=n` to the nodes in their current ID order.
    ///
    /// The renumbering is monotone, so the canonical order of unnamed
    /// fanins is preserved.
    pub fn reassign_ids(&mut self) {
        let order = self.nodes();
        let mut ids = Vec::with_capacity(order.len() + 1);
        ids.push(None);
        for (i, &node) in order.iter().enumerate() {
            self.nodes[node].id = i as u32 + 1;
            ids.push(Some(node));
        }
        self.ids = ids;
        self.next_id = order.len() as u32 + 1;
        trace!("{}: reassigned {} ids", self.name, order.len());
    }
}

impl<F: LocalFunction> Network<F> {
    /// Creates an unattached node.
    ///
    /// # Panics
    ///
    /// Panics if `values` is not a legal value count.
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        values: u32,
        name: Option<&str>,
    ) -> NetResult<NodeId> {
        if let Err(err) = validate_value_count(values) {
            panic!("create_node: {err}");
        }
        let id = self
            .nodes
            .alloc(Node::new(kind, values, name.map(str::to_string)))?;
        Ok(id)
    }

    /// Appends `fanin` to the fanin list of the unattached node `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is already part of the network.
    pub fn add_fanin(&mut self, node: NodeId, fanin: NodeId) -> NetResult<PinId> {
        assert!(
            !self.nodes[node].is_in_network(),
            "add_fanin: '{}' is already in the network",
            self.node_name(node)
        );
        assert!(self.nodes.contains(fanin), "add_fanin: stale fanin handle");
        let pin = self.pins.alloc(Pin::new(node, fanin))?;
        self.nodes[node].fanins.push(pin);
        Ok(pin)
    }

    /// Adds an unattached node to the network.
    ///
    /// Fails with [`NetError::NameCollision`] if the node's name is taken and
    /// with [`NetError::Capacity`] if the ID space is exhausted; in both
    /// cases nothing is changed. With `connect`, the fanin list is brought
    /// into canonical order and mirrored fanout pins are created.
    ///
    /// # Panics
    ///
    /// Panics if the node is already attached or violates the arity rules
    /// of its kind.
    pub fn add_to_network(&mut self, node: NodeId, connect: bool) -> NetResult<()> {
        let n = &self.nodes[node];
        assert!(!n.is_in_network(), "add_to_network: node already attached");
        match n.kind {
            NodeKind::PrimaryInput => assert!(
                n.fanins.is_empty() && n.func.is_none(),
                "add_to_network: primary inputs take no fanins or function"
            ),
            NodeKind::PrimaryOutput => assert!(
                n.fanins.len() == 1,
                "add_to_network: primary outputs take exactly one fanin"
            ),
            NodeKind::Internal => {}
        }
        if let Some(name) = &n.name {
            if self.names.contains_key(name) {
                return Err(NetError::NameCollision { name: name.clone() });
            }
        }
        if self.next_id == u32::MAX {
            return Err(NetError::Capacity("node id space exhausted".to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;
        let kind = n.kind;
        if let Some(name) = n.name.clone() {
            self.names.insert(name, node);
        }
        self.nodes[node].id = id;
        self.ids.push(Some(node));
        debug_assert_eq!(self.ids.len(), self.next_id as usize);
        self.kind_list_mut(kind).push(node);
        trace!("{}: added '{}' as {}", self.name, self.node_name(node), kind.tag());

        if connect {
            self.connect_node(node)?;
        }
        Ok(())
    }

    /// Brings the fanins of an attached node into canonical order and
    /// creates their mirrored fanout pins.
    pub fn connect_node(&mut self, node: NodeId) -> NetResult<()> {
        if self.nodes[node].kind != NodeKind::PrimaryInput {
            reorder_fanins(self, node);
        }
        self.connect_fanins(node)
    }

    /// Creates and adds a primary input.
    pub fn add_primary_input(&mut self, name: &str, values: u32) -> NetResult<NodeId> {
        let node = self.create_node(NodeKind::PrimaryInput, values, Some(name))?;
        if let Err(err) = self.add_to_network(node, true) {
            self.destroy_node(node);
            return Err(err);
        }
        Ok(node)
    }

    /// Creates, connects, and adds an internal node computing `func` of `fanins`.
    pub fn add_internal(
        &mut self,
        name: Option<&str>,
        values: u32,
        fanins: &[NodeId],
        func: F,
    ) -> NetResult<NodeId> {
        let node = self.create_node(NodeKind::Internal, values, name)?;
        let built = fanins
            .iter()
            .try_for_each(|&f| self.add_fanin(node, f).map(|_| ()))
            .and_then(|()| {
                self.set_function(node, func);
                self.add_to_network(node, true)
            });
        if let Err(err) = built {
            if self.nodes[node].is_in_network() {
                self.remove_from_network(node, true, true);
            } else {
                self.destroy_node(node);
            }
            return Err(err);
        }
        Ok(node)
    }

    /// Adds a primary output driven by `driver`.
    ///
    /// The output takes `driver`'s value count. On failure nothing is changed.
    pub fn add_primary_output(&mut self, driver: NodeId, name: Option<&str>) -> NetResult<NodeId> {
        if let Some(name) = name {
            if self.names.contains_key(name) {
                return Err(NetError::NameCollision {
                    name: name.to_string(),
                });
            }
        }
        let values = self.nodes[driver].values;
        let node = self.create_node(NodeKind::PrimaryOutput, values, name)?;
        let added = self
            .add_fanin(node, driver)
            .and_then(|_| self.add_to_network(node, true));
        if let Err(err) = added {
            if self.nodes[node].is_in_network() {
                self.remove_from_network(node, true, true);
            } else {
                self.destroy_node(node);
            }
            return Err(err);
        }
        Ok(node)
    }

    /// Takes `node` out of the network.
    ///
    /// With `disconnect`, the mirrored fanout pins on its fanins are removed;
    /// with `destroy`, the node and its pins are recycled. A node that is
    /// the input or output of a latch loses that latch.
    ///
    /// # Panics
    ///
    /// Panics if the node is not attached, still drives fanouts when
    /// disconnecting, or is destroyed while its fanins are still connected.
    pub fn remove_from_network(&mut self, node: NodeId, disconnect: bool, destroy: bool) {
        assert!(
            self.nodes[node].is_in_network(),
            "remove_from_network: '{}' is not attached",
            self.node_name(node)
        );
        if disconnect {
            assert!(
                self.nodes[node].fanouts.is_empty(),
                "remove_from_network: '{}' still drives {} fanouts",
                self.node_name(node),
                self.nodes[node].fanouts.len()
            );
            self.disconnect_fanins(node);
        }
        if let Some(latch) = self.nodes[node].latch {
            self.remove_latch(latch);
        }

        trace!("{}: removing '{}'", self.name, self.node_name(node));
        let n = &mut self.nodes[node];
        let id = n.id;
        let kind = n.kind;
        n.id = 0;
        if let Some(name) = &n.name {
            if self.names.get(name) == Some(&node) {
                self.names.remove(name);
            }
        }
        self.ids[id as usize] = None;
        self.kind_list_mut(kind).retain(|&x| x != node);

        if destroy {
            let connected = self.nodes[node]
                .fanins
                .iter()
                .any(|&p| self.pins[p].mirror.is_some());
            assert!(
                !connected,
                "remove_from_network: cannot destroy a node with connected fanins"
            );
            self.destroy_node(node);
        }
    }

    /// Disconnects and destroys an attached node without fanouts.
    pub fn delete_node(&mut self, node: NodeId) {
        self.remove_from_network(node, true, true);
    }

    /// Gives `node` a new name (or removes its name).
    ///
    /// Consumers whose canonical fanin order depends on the name are
    /// reordered.
    pub fn rename_node(&mut self, node: NodeId, name: Option<&str>) -> NetResult<()> {
        if self.nodes[node].name.as_deref() == name {
            return Ok(());
        }
        let attached = self.nodes[node].is_in_network();
        if attached {
            if let Some(name) = name {
                if self.names.contains_key(name) {
                    return Err(NetError::NameCollision {
                        name: name.to_string(),
                    });
                }
            }
            if let Some(old) = self.nodes[node].name.take() {
                self.names.remove(&old);
            }
            if let Some(name) = name {
                self.names.insert(name.to_string(), node);
            }
        }
        self.nodes[node].name = name.map(str::to_string);
        if attached {
            let consumers: Vec<NodeId> = self.fanouts(node).collect();
            for consumer in consumers {
                reorder_fanins(self, consumer);
            }
        }
        Ok(())
    }

    /// Redirects the fanin `old` of `node` to `new`.
    ///
    /// Mirrors are updated and the fanin list is brought back into canonical
    /// order (folding `new` if it already was a fanin).
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a fanin of `node` or the value counts differ.
    pub fn patch_fanin(&mut self, node: NodeId, old: NodeId, new: NodeId) -> NetResult<()> {
        let index = match self.fanin_index(node, old) {
            Some(index) => index,
            None => panic!(
                "patch_fanin: '{}' is not a fanin of '{}'",
                self.node_name(old),
                self.node_name(node)
            ),
        };
        assert_eq!(
            self.nodes[old].values, self.nodes[new].values,
            "patch_fanin: value counts differ"
        );
        let pin = self.nodes[node].fanins[index];
        let was_connected = self.pins[pin].mirror.is_some();
        self.unlink_pin(pin);
        self.pins[pin].node = new;
        if was_connected {
            self.connect_fanins(node)?;
        }
        if self.nodes[node].is_in_network() {
            reorder_fanins(self, node);
        }
        Ok(())
    }

    /// Records a latch from the primary output `input` to the primary input `output`.
    ///
    /// # Panics
    ///
    /// Panics if the kinds are wrong or either node already belongs to a latch.
    pub fn add_latch(
        &mut self,
        input: NodeId,
        output: NodeId,
        reset: LatchReset,
    ) -> NetResult<LatchId> {
        assert!(
            self.nodes[input].is_primary_output() && self.nodes[output].is_primary_input(),
            "add_latch: latches run from a primary output to a primary input"
        );
        assert!(
            self.nodes[input].latch.is_none() && self.nodes[output].latch.is_none(),
            "add_latch: node already belongs to a latch"
        );
        let latch = self.latches.alloc(Latch {
            input,
            output,
            reset,
        })?;
        self.nodes[input].latch = Some(latch);
        self.nodes[output].latch = Some(latch);
        self.latch_list.push(latch);
        debug!(
            "{}: latch {} -> {}",
            self.name,
            self.node_name(input),
            self.node_name(output)
        );
        Ok(latch)
    }

    /// Removes a latch, destroying its reset logic node if it has one.
    ///
    /// The latch's input and output stay in the network as plain outputs
    /// and inputs.
    pub fn remove_latch(&mut self, latch: LatchId) {
        let Some(record) = self.latches.recycle(latch) else {
            return;
        };
        for node in [record.input, record.output] {
            if let Some(n) = self.nodes.get_mut(node) {
                n.latch = None;
            }
        }
        if let LatchReset::Logic(reset) = record.reset {
            if self.nodes.contains(reset) {
                self.destroy_node(reset);
            }
        }
        self.latch_list.retain(|&l| l != latch);
    }
}
