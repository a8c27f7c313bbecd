//! Cutting a set of internal nodes out into a standalone network and
//! putting a (possibly rewritten) version back.
//!
//! The two networks are linked by names only. Every fanin outside the
//! extracted set becomes a primary input named after the host node, and
//! every extracted node feeding something outside the set is exported
//! through a primary output carrying the host node's name. Unnamed host
//! nodes travel under their derived `[id]` name, so IDs must not be
//! reassigned between [`extract`] and [`insert`].

use crate::collapse::{delete_dangling, replace_node};
use log::debug;
use mvnet_ir::{LocalFunction, NetError, NetResult, Network, NodeId, NodeKind};
use std::collections::{HashMap, HashSet};

/// Resolves an explicit name, or a derived `[id]` name of an unnamed node.
fn resolve<F>(host: &Network<F>, name: &str) -> NetResult<NodeId> {
    if let Some(node) = host.lookup(name) {
        return Ok(node);
    }
    name.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|id| id.parse().ok())
        .and_then(|id| host.node_by_id(id))
        .filter(|&node| host.node(node).explicit_name().is_none())
        .ok_or_else(|| NetError::UnknownNode(name.to_string()))
}

fn mapped<F>(net: &Network<F>, map: &HashMap<NodeId, NodeId>, node: NodeId) -> NetResult<NodeId> {
    map.get(&node)
        .copied()
        .ok_or_else(|| NetError::consistency(net.node_name(node), "node was not mapped"))
}

/// Copies the internal nodes `nodes` of `host` into a new network.
///
/// Nodes without an outside consumer keep their explicit names; exported
/// nodes become unnamed and their output takes the name instead. The result
/// has compact IDs and has passed [`Network::check`].
///
/// # Panics
///
/// Panics if one of `nodes` is not an attached internal node.
pub fn extract<F: LocalFunction>(host: &mut Network<F>, nodes: &[NodeId]) -> NetResult<Network<F>> {
    for &node in nodes {
        let n = host.node(node);
        assert!(
            n.is_internal() && n.is_in_network(),
            "extract: '{}' is not an attached internal node",
            host.node_name(node)
        );
    }
    let cone = host.transitive_fanin(nodes);
    host.start_traversal();
    for &node in nodes {
        host.mark_visited(node);
    }
    let inside: Vec<NodeId> = cone.into_iter().filter(|&n| host.is_visited(n)).collect();

    let mut sub = Network::new(format!("{}.sub", host.name()));
    let mut map: HashMap<NodeId, NodeId> = HashMap::new();
    for &node in &inside {
        for fanin in host.fanins(node) {
            if host.is_visited(fanin) || map.contains_key(&fanin) {
                continue;
            }
            let input = sub.add_primary_input(&host.node_name(fanin), host.node(fanin).values())?;
            map.insert(fanin, input);
        }
    }

    for &node in &inside {
        let n = host.node(node);
        let exported = host.fanouts(node).any(|f| !host.is_visited(f));
        let func = n.function().cloned().ok_or_else(|| {
            NetError::consistency(host.node_name(node), "internal node without a function")
        })?;
        let fanins = host
            .fanins(node)
            .map(|f| mapped(host, &map, f))
            .collect::<NetResult<Vec<_>>>()?;
        let name = if exported { None } else { n.explicit_name() };
        let copy = sub.add_internal(name, n.values(), &fanins, func)?;
        map.insert(node, copy);
        if exported {
            sub.add_primary_output(copy, Some(&host.node_name(node)))?;
        }
    }

    sub.reassign_ids();
    sub.check()?;
    debug!(
        "{}: extracted {} nodes with {} inputs and {} outputs",
        host.name(),
        inside.len(),
        sub.primary_inputs().len(),
        sub.primary_outputs().len()
    );
    Ok(sub)
}

/// A host node to be replaced in place, and the subnetwork node whose copy
/// replaces it.
struct Replacement {
    target: NodeId,
    source: NodeId,
}

/// Puts `sub` back into `host`.
///
/// Inputs of `sub` are matched to host nodes by name. Each output names the
/// host node its driver replaces in place, so the host node keeps its
/// identity and consumers. Host nodes left without consumers are deleted,
/// copies take back their explicit names where those became free, IDs are
/// reassigned and the host is checked.
///
/// Everything is validated before `host` is changed: an unknown name fails
/// with [`NetError::UnknownNode`], a rewiring that would close a loop
/// through the host with [`NetError::CycleDetected`], and an insertion
/// that does not fit the host's capacity with [`NetError::Capacity`]. On
/// any error `host` is left untouched.
pub fn insert<F: LocalFunction>(host: &mut Network<F>, sub: &mut Network<F>) -> NetResult<()> {
    sub.check()?;
    let mut map: HashMap<NodeId, NodeId> = HashMap::new();
    for &input in sub.primary_inputs() {
        let node = resolve(host, &sub.node_name(input))?;
        if host.node(node).is_primary_output() {
            return Err(NetError::consistency(
                sub.node_name(input),
                "a primary output cannot feed the subnetwork",
            ));
        }
        if host.node(node).values() != sub.node(input).values() {
            return Err(NetError::consistency(
                sub.node_name(input),
                "value count differs from the matching host node",
            ));
        }
        map.insert(input, node);
    }

    let mut replaced: HashMap<NodeId, NodeId> = HashMap::new();
    let mut replacements = Vec::new();
    let mut buffers = Vec::new();
    for &output in sub.primary_outputs() {
        let target = resolve(host, &sub.node_name(output))?;
        if !host.node(target).is_internal() {
            return Err(NetError::consistency(
                host.node_name(target),
                "only internal nodes can be replaced",
            ));
        }
        if host.node(target).values() != sub.node(output).values() {
            return Err(NetError::consistency(
                sub.node_name(output),
                "value count differs from the replaced host node",
            ));
        }
        let source = sub.fanin(output, 0);
        if sub.node(source).is_internal() && !replaced.contains_key(&source) {
            replaced.insert(source, target);
            replacements.push(Replacement { target, source });
        } else {
            buffers.push(Replacement { target, source });
        }
    }

    let internals = sub.internal_nodes().to_vec();
    let order: Vec<NodeId> = sub
        .transitive_fanin(&internals)
        .into_iter()
        .filter(|&n| sub.node(n).is_internal())
        .collect();

    if let Some(capacity) = host.capacity() {
        let needed = host.allocated_nodes() + order.len() + buffers.len();
        if needed > capacity {
            return Err(NetError::Capacity(format!(
                "inserting '{}' needs {needed} nodes, the limit is {capacity}",
                sub.name()
            )));
        }
    }
    let rewired = rewired_fanins(sub, &map, &replaced, &replacements, &buffers);
    if let Some(path) = find_loop(host, &rewired) {
        let names = path.iter().map(|&n| host.node_name(n)).collect();
        return Err(NetError::CycleDetected { path, names });
    }

    let copies = copy_nodes(host, sub, &order, &mut map, &replaced)?;

    for &source in &order {
        if !replaced.contains_key(&source) {
            host.add_to_network(mapped(sub, &copies, source)?, true)?;
        }
    }

    let mut candidates = Vec::new();
    for r in &replacements {
        candidates.extend(host.fanins(r.target));
        let copy = mapped(sub, &copies, r.source)?;
        replace_node(host, r.target, copy)?;
    }
    for r in &buffers {
        let driver = match replaced.get(&r.source) {
            Some(&target) => target,
            None => mapped(sub, &map, r.source)?,
        };
        if driver == r.target {
            continue;
        }
        let values = host.node(r.target).values();
        let buffer = host.create_node(NodeKind::Internal, values, None)?;
        host.add_fanin(buffer, driver)?;
        host.set_function(buffer, F::identity(values));
        candidates.extend(host.fanins(r.target));
        replace_node(host, r.target, buffer)?;
    }
    let deleted = delete_dangling(host, &candidates);

    for &source in &order {
        if replaced.contains_key(&source) {
            continue;
        }
        if let (Some(name), Some(&copy)) = (sub.node(source).explicit_name(), copies.get(&source)) {
            if host.lookup(name).is_none() {
                host.rename_node(copy, Some(name))?;
            }
        }
    }

    host.reassign_ids();
    host.check()?;
    debug!(
        "{}: inserted {} nodes, replaced {}, deleted {deleted}",
        host.name(),
        copies.len(),
        replacements.len() + buffers.len()
    );
    Ok(())
}

/// The host nodes each replaced target reads once the subnetwork is in
/// place, seen through the copies: subnetwork inputs resolve to their host
/// node and replaced sources to their target.
fn rewired_fanins<F>(
    sub: &Network<F>,
    map: &HashMap<NodeId, NodeId>,
    replaced: &HashMap<NodeId, NodeId>,
    replacements: &[Replacement],
    buffers: &[Replacement],
) -> HashMap<NodeId, Vec<NodeId>> {
    let mut rewired = HashMap::new();
    for r in replacements {
        let mut reads = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = sub.fanins(r.source).collect();
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if let Some(&host_node) = map.get(&node) {
                reads.push(host_node);
            } else if let Some(&target) = replaced.get(&node) {
                reads.push(target);
            } else {
                stack.extend(sub.fanins(node));
            }
        }
        rewired.insert(r.target, reads);
    }
    for r in buffers {
        let driver = replaced.get(&r.source).or_else(|| map.get(&r.source));
        if let Some(&driver) = driver.filter(|&&d| d != r.target) {
            rewired.insert(r.target, vec![driver]);
        }
    }
    rewired
}

/// Searches the host, with the fanins of the nodes in `rewired` replaced,
/// for a loop through one of those nodes. Returns the closed path.
fn find_loop<F>(host: &Network<F>, rewired: &HashMap<NodeId, Vec<NodeId>>) -> Option<Vec<NodeId>> {
    let reads = |node: NodeId| -> Vec<NodeId> {
        match rewired.get(&node) {
            Some(reads) => reads.clone(),
            None => host.fanins(node).collect(),
        }
    };
    // true while on the current path, false once finished
    let mut state: HashMap<NodeId, bool> = HashMap::new();
    for &start in rewired.keys() {
        if state.contains_key(&start) {
            continue;
        }
        state.insert(start, true);
        let mut frames: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(start, reads(start), 0)];
        while let Some(frame) = frames.last_mut() {
            if frame.2 == frame.1.len() {
                let done = frame.0;
                frames.pop();
                state.insert(done, false);
                continue;
            }
            let next = frame.1[frame.2];
            frame.2 += 1;
            match state.get(&next).copied() {
                Some(true) => {
                    let from = frames.iter().position(|f| f.0 == next).unwrap_or(0);
                    let mut path: Vec<NodeId> = frames[from..].iter().map(|f| f.0).collect();
                    path.push(next);
                    return Some(path);
                }
                Some(false) => {}
                None => {
                    state.insert(next, true);
                    frames.push((next, reads(next), 0));
                }
            }
        }
    }
    None
}

/// Creates an unattached host copy of every node in `order`.
///
/// Copies of nodes listed in `replaced` stand in for their host target, so
/// other copies read the target instead. On failure every copy is destroyed.
fn copy_nodes<F: LocalFunction>(
    host: &mut Network<F>,
    sub: &Network<F>,
    order: &[NodeId],
    map: &mut HashMap<NodeId, NodeId>,
    replaced: &HashMap<NodeId, NodeId>,
) -> NetResult<HashMap<NodeId, NodeId>> {
    let mut copies: HashMap<NodeId, NodeId> = HashMap::new();
    let result = order.iter().try_for_each(|&source| -> NetResult<()> {
        let n = sub.node(source);
        let copy = host.create_node(NodeKind::Internal, n.values(), None)?;
        copies.insert(source, copy);
        for fanin in sub.fanins(source) {
            let driver = match replaced.get(&fanin) {
                Some(&target) => target,
                None => mapped(sub, map, fanin)?,
            };
            host.add_fanin(copy, driver)?;
        }
        if let Some(func) = n.function() {
            host.set_function(copy, func.clone());
        }
        if !replaced.contains_key(&source) {
            map.insert(source, copy);
        }
        Ok(())
    });
    if let Err(err) = result {
        for &copy in copies.values() {
            host.destroy_node(copy);
        }
        return Err(err);
    }
    Ok(copies)
}
