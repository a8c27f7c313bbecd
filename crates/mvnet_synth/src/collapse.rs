//! Node substitution: collapsing, support reduction, and in-place replacement.

use log::{debug, trace};
use mvnet_ir::{
    compare_nodes, LocalFunction, NetError, NetResult, Network, NodeId, NodeKind,
};
use std::cmp::Ordering;

/// Result of merging two canonical fanin lists.
struct Merge {
    fanins: Vec<NodeId>,
    /// Merged position of each of the consumer's fanins; `None` for the
    /// fanin being collapsed.
    node_map: Vec<Option<usize>>,
    /// Merged position of each of the collapsed fanin's own fanins.
    fanin_map: Vec<usize>,
}

/// Two-pointer merge of two canonical lists, skipping `outer[skip]`.
fn merge_fanins<F>(net: &Network<F>, outer: &[NodeId], skip: usize, inner: &[NodeId]) -> Merge {
    let mut merge = Merge {
        fanins: Vec::with_capacity(outer.len() + inner.len()),
        node_map: vec![None; outer.len()],
        fanin_map: vec![0; inner.len()],
    };
    let (mut i, mut j) = (0, 0);
    loop {
        if i == skip {
            i += 1;
            continue;
        }
        let step = match (outer.get(i), inner.get(j)) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(&a), Some(&b)) => compare_nodes(net, a, b),
        };
        let pos = merge.fanins.len();
        match step {
            Ordering::Less => {
                merge.fanins.push(outer[i]);
                merge.node_map[i] = Some(pos);
                i += 1;
            }
            Ordering::Greater => {
                merge.fanins.push(inner[j]);
                merge.fanin_map[j] = pos;
                j += 1;
            }
            Ordering::Equal => {
                merge.fanins.push(outer[i]);
                merge.node_map[i] = Some(pos);
                merge.fanin_map[j] = pos;
                i += 1;
                j += 1;
            }
        }
    }
    merge
}

/// Substitutes the function of `fanin` into `node`.
///
/// Returns a new unattached internal node over the union of both fanin
/// lists (minus `fanin`) whose function is the composition. The network is
/// not modified apart from allocating the new node. A constant `fanin` is
/// cofactored in and a deterministic single-input `fanin` is folded in by
/// relabeling before the general path is tried.
///
/// # Panics
///
/// Panics if `node` or `fanin` is not an internal node, or if `fanin` is
/// not a fanin of `node`.
pub fn collapse<F: LocalFunction>(
    net: &mut Network<F>,
    node: NodeId,
    fanin: NodeId,
) -> NetResult<NodeId> {
    assert!(
        net.node(node).is_internal() && net.node(fanin).is_internal(),
        "collapse: '{}' and '{}' must both be internal nodes",
        net.node_name(node),
        net.node_name(fanin)
    );
    let Some(input) = net.fanin_index(node, fanin) else {
        panic!(
            "collapse: '{}' is not a fanin of '{}'",
            net.node_name(fanin),
            net.node_name(node)
        );
    };
    let (Some(outer_func), Some(inner_func)) =
        (net.node(node).function(), net.node(fanin).function())
    else {
        return Err(NetError::consistency(
            net.node_name(node),
            "collapse on a node without a function",
        ));
    };

    let outer: Vec<NodeId> = net.fanins(node).collect();
    let constant = inner_func.constant_value();
    let inner: Vec<NodeId> = match constant {
        Some(_) => Vec::new(),
        None => net.fanins(fanin).collect(),
    };
    let merge = merge_fanins(net, &outer, input, &inner);
    let domains: Vec<u32> = merge.fanins.iter().map(|&f| net.node(f).values()).collect();

    let func = if let Some(value) = constant {
        let positions: Vec<usize> = merge.node_map.iter().flatten().copied().collect();
        outer_func.cofactor(input, value).expand(&positions, &domains)?
    } else if let (Some(map), [_]) = (inner_func.single_input_map(), inner.as_slice()) {
        let source = net.node(inner[0]).values();
        let positions: Vec<usize> = merge
            .node_map
            .iter()
            .map(|p| p.unwrap_or(merge.fanin_map[0]))
            .collect();
        outer_func
            .remap_input(input, source, &map)
            .expand(&positions, &domains)?
    } else {
        outer_func.collapse(input, inner_func, &merge.node_map, &merge.fanin_map, &domains)?
    };

    let values = net.node(node).values();
    let new = net.create_node(NodeKind::Internal, values, None)?;
    for &f in &merge.fanins {
        if let Err(err) = net.add_fanin(new, f) {
            net.destroy_node(new);
            return Err(err);
        }
    }
    net.set_function(new, func);
    trace!(
        "collapsed '{}' into '{}' over {} fanins",
        net.node_name(fanin),
        net.node_name(node),
        merge.fanins.len()
    );
    Ok(new)
}

/// Drops every fanin of `node` outside the true support of its function.
///
/// Returns `true` if any fanin was removed.
pub fn make_minimum_base<F: LocalFunction>(net: &mut Network<F>, node: NodeId) -> bool {
    let Some(func) = net.node(node).function() else {
        return false;
    };
    let (reduced, support) = func.make_minimum_base();
    let count = net.node(node).fanin_count();
    if support.len() == count {
        return false;
    }
    for index in (0..count).rev() {
        if support.binary_search(&index).is_err() {
            net.remove_fanin_pin(node, index);
        }
    }
    net.set_function(node, reduced);
    trace!(
        "'{}' reduced from {count} to {} fanins",
        net.node_name(node),
        support.len()
    );
    true
}

/// Replaces `old` in place by `new`.
///
/// `old` keeps its identity, name and fanout pins, and takes over the fanin
/// pins and function of `new`; `new` is destroyed. Consumers of `old` stay
/// valid.
///
/// # Panics
///
/// Panics if `new` has fanouts, or the nodes differ in kind or value count.
pub fn replace_node<F: LocalFunction>(
    net: &mut Network<F>,
    old: NodeId,
    new: NodeId,
) -> NetResult<()> {
    assert_eq!(
        net.node(new).fanout_count(),
        0,
        "replace_node: replacement '{}' still has fanouts",
        net.node_name(new)
    );
    assert!(
        net.node(old).kind() == net.node(new).kind()
            && net.node(old).values() == net.node(new).values(),
        "replace_node: '{}' and its replacement differ in kind or value count",
        net.node_name(old)
    );
    if net.node(new).is_in_network() {
        net.remove_from_network(new, true, false);
    }
    net.swap_fanins(old, new);
    if let Some(func) = net.take_function(new) {
        if let Some(previous) = net.set_function(old, func) {
            net.set_function(new, previous);
        }
    }
    net.destroy_node(new);
    if net.node(old).is_in_network() {
        net.connect_node(old)?;
    }
    Ok(())
}

/// Collapses `fanin` into `node` and replaces `node` in place by the
/// minimum-base result.
///
/// Returns `false` without touching the network when either node is not
/// an internal node.
pub fn collapse_nodes<F: LocalFunction>(
    net: &mut Network<F>,
    node: NodeId,
    fanin: NodeId,
) -> NetResult<bool> {
    if !net.node(node).is_internal() || !net.node(fanin).is_internal() {
        return Ok(false);
    }
    let new = collapse(net, node, fanin)?;
    make_minimum_base(net, new);
    replace_node(net, node, new)?;
    Ok(true)
}

/// Collapses `node` into every consumer and deletes it.
///
/// Returns `false` if `node` is not internal or drives a primary output.
/// A failing collapse stops the elimination with `node` still driving the
/// consumers not yet processed; the network stays consistent.
pub fn eliminate_node<F: LocalFunction>(net: &mut Network<F>, node: NodeId) -> NetResult<bool> {
    if !net.node(node).is_internal() {
        return Ok(false);
    }
    let consumers: Vec<NodeId> = net.fanouts(node).collect();
    if consumers.iter().any(|&c| !net.node(c).is_internal()) {
        return Ok(false);
    }
    for consumer in consumers {
        collapse_nodes(net, consumer, node)?;
    }
    debug!("eliminated '{}'", net.node_name(node));
    delete_dangling(net, &[node]);
    Ok(true)
}

/// Deletes internal nodes without fanouts, starting from `candidates` and
/// continuing through the fanins of every deleted node.
///
/// Returns the number of deleted nodes.
pub fn delete_dangling<F: LocalFunction>(net: &mut Network<F>, candidates: &[NodeId]) -> usize {
    let mut work: Vec<NodeId> = candidates.to_vec();
    let mut deleted = 0;
    while let Some(node) = work.pop() {
        let dangling = net
            .try_node(node)
            .is_some_and(|n| n.is_in_network() && n.is_internal() && n.fanout_count() == 0);
        if !dangling {
            continue;
        }
        work.extend(net.fanins(node));
        net.delete_node(node);
        deleted += 1;
    }
    if deleted > 0 {
        debug!("deleted {deleted} dangling nodes");
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvnet_common::ValueSet;
    use mvnet_logic::Relation;

    struct Scenario {
        net: Network<Relation>,
        a: NodeId,
        b: NodeId,
        c: NodeId,
        n1: NodeId,
        n2: NodeId,
        o: NodeId,
    }

    fn scenario() -> Scenario {
        let mut net = Network::new("t");
        let a = net.add_primary_input("a", 2).unwrap();
        let b = net.add_primary_input("b", 2).unwrap();
        let c = net.add_primary_input("c", 2).unwrap();
        let n1 = net.add_internal(Some("n1"), 2, &[a, b], Relation::and(2)).unwrap();
        let n2 = net.add_internal(Some("n2"), 2, &[n1, c], Relation::or(2)).unwrap();
        let o = net.add_primary_output(n2, Some("o")).unwrap();
        Scenario {
            net,
            a,
            b,
            c,
            n1,
            n2,
            o,
        }
    }

    fn eval3(f: &Relation, a: u32, b: u32, c: u32) -> ValueSet {
        f.eval(&[a, b, c])
    }

    #[test]
    fn collapse_scenario() {
        let mut s = scenario();
        // n2's canonical fanins are [c, n1]
        assert_eq!(s.net.fanins(s.n2).collect::<Vec<_>>(), vec![s.c, s.n1]);
        let new = collapse(&mut s.net, s.n2, s.n1).unwrap();
        assert!(!s.net.node(new).is_in_network());
        assert_eq!(s.net.fanins(new).collect::<Vec<_>>(), vec![s.a, s.b, s.c]);
        let func = s.net.node(new).function().unwrap().clone();
        for m in 0..8 {
            let (a, b, c) = (m & 1, (m >> 1) & 1, m >> 2);
            assert_eq!(eval3(&func, a, b, c), ValueSet::single((a & b) | c));
        }
        assert!(!make_minimum_base(&mut s.net, new));
        assert_eq!(s.net.node(new).fanin_count(), 3);
        s.net.destroy_node(new);
        s.net.check().unwrap();
    }

    #[test]
    fn collapse_nodes_replaces_in_place() {
        let mut s = scenario();
        assert!(collapse_nodes(&mut s.net, s.n2, s.n1).unwrap());
        assert_eq!(s.net.fanins(s.n2).collect::<Vec<_>>(), vec![s.a, s.b, s.c]);
        assert_eq!(s.net.fanouts(s.n2).collect::<Vec<_>>(), vec![s.o]);
        assert_eq!(s.net.node(s.n1).fanout_count(), 0);
        assert_eq!(s.net.node_name(s.n2), "n2");
        s.net.check().unwrap();
        assert_eq!(delete_dangling(&mut s.net, &[s.n1]), 1);
        assert!(!s.net.contains(s.n1));
        s.net.check().unwrap();
    }

    #[test]
    fn collapse_constant_cofactors() {
        let mut s = scenario();
        let zero = s
            .net
            .add_internal(Some("zero"), 2, &[], Relation::constant(2, 0))
            .unwrap();
        let g = s
            .net
            .add_internal(Some("g"), 2, &[s.a, zero], Relation::or(2))
            .unwrap();
        assert!(collapse_nodes(&mut s.net, g, zero).unwrap());
        assert_eq!(s.net.fanins(g).collect::<Vec<_>>(), vec![s.a]);
        let func = s.net.node(g).function().unwrap();
        assert_eq!(func.single_input_map(), Some(vec![0, 1]));
        s.net.check().unwrap();
    }

    #[test]
    fn collapse_inverter_relabels() {
        let mut s = scenario();
        let inv = s
            .net
            .add_internal(Some("inv"), 2, &[s.b], Relation::inverter())
            .unwrap();
        let g = s
            .net
            .add_internal(Some("g"), 2, &[s.a, inv], Relation::and(2))
            .unwrap();
        assert!(collapse_nodes(&mut s.net, g, inv).unwrap());
        assert_eq!(s.net.fanins(g).collect::<Vec<_>>(), vec![s.a, s.b]);
        let func = s.net.node(g).function().unwrap();
        for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(func.eval(&[a, b]), ValueSet::single(a & (1 - b)));
        }
        s.net.check().unwrap();
    }

    #[test]
    fn collapse_shared_fanin_merges_inputs() {
        // g = AND(a, h) with h = XOR(a, b): merged space [a, b]
        let mut s = scenario();
        let xor = Relation::from_values(&[2, 2], 2, |v| v[0] ^ v[1]).unwrap();
        let h = s.net.add_internal(Some("h"), 2, &[s.a, s.b], xor).unwrap();
        let g = s
            .net
            .add_internal(Some("g"), 2, &[s.a, h], Relation::and(2))
            .unwrap();
        let new = collapse(&mut s.net, g, h).unwrap();
        assert_eq!(s.net.fanins(new).collect::<Vec<_>>(), vec![s.a, s.b]);
        let func = s.net.node(new).function().unwrap();
        for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(func.eval(&[a, b]), ValueSet::single(a & (a ^ b)));
        }
        s.net.destroy_node(new);
    }

    #[test]
    fn minimum_base_drops_dummy_fanins() {
        let mut s = scenario();
        let f = Relation::from_values(&[2, 2, 2], 2, |v| v[0] & v[2]).unwrap();
        let g = s.net.add_internal(Some("g"), 2, &[s.a, s.b, s.c], f).unwrap();
        assert!(make_minimum_base(&mut s.net, g));
        assert_eq!(s.net.fanins(g).collect::<Vec<_>>(), vec![s.a, s.c]);
        assert_eq!(s.net.node(s.b).fanout_count(), 1);
        assert!(!make_minimum_base(&mut s.net, g));
        s.net.check().unwrap();
    }

    #[test]
    fn eliminate_into_all_consumers() {
        let mut s = scenario();
        let m = s
            .net
            .add_internal(Some("m"), 2, &[s.n1, s.c], Relation::and(2))
            .unwrap();
        s.net.add_primary_output(m, Some("p")).unwrap();
        assert!(eliminate_node(&mut s.net, s.n1).unwrap());
        assert!(!s.net.contains(s.n1));
        assert_eq!(s.net.fanins(m).collect::<Vec<_>>(), vec![s.a, s.b, s.c]);
        assert_eq!(s.net.fanins(s.n2).collect::<Vec<_>>(), vec![s.a, s.b, s.c]);
        s.net.check().unwrap();
    }

    #[test]
    fn eliminate_refuses_output_drivers() {
        let mut s = scenario();
        assert!(!eliminate_node(&mut s.net, s.n2).unwrap());
        assert!(!eliminate_node(&mut s.net, s.a).unwrap());
        assert!(s.net.contains(s.n2));
    }

    #[test]
    fn collapse_nodes_rejects_inputs() {
        let mut s = scenario();
        assert!(!collapse_nodes(&mut s.net, s.n1, s.a).unwrap());
        assert_eq!(s.net.node(s.n1).fanin_count(), 2);
    }

    #[test]
    #[should_panic(expected = "is not a fanin of")]
    fn collapse_of_a_non_fanin_panics() {
        let mut s = scenario();
        let other = s.net.add_internal(Some("x"), 2, &[s.c], Relation::buffer(2)).unwrap();
        let _ = collapse(&mut s.net, s.n1, other);
    }
}
