//! Canonical fanin order.
//!
//! Fanins are sorted by name when both nodes carry an explicit name and by
//! network ID when neither does. A named node sorts before an unnamed one,
//! and the pool handle breaks the remaining ties, so the comparison is a
//! total order and only a node compares equal to itself.

use crate::func::LocalFunction;
use crate::ids::NodeId;
use crate::network::Network;
use log::trace;
use std::cmp::Ordering;

/// Compares two nodes in canonical fanin order.
pub fn compare_nodes<F>(net: &Network<F>, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (na, nb) = (net.node(a), net.node(b));
    let by_name = match (na.explicit_name(), nb.explicit_name()) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_name
        .then_with(|| na.id().cmp(&nb.id()))
        .then_with(|| a.cmp(&b))
}

/// Returns `true` if the fanins of `node` are strictly increasing in
/// canonical order (which also rules out duplicates).
pub fn is_canonical<F>(net: &Network<F>, node: NodeId) -> bool {
    let fanins: Vec<NodeId> = net.fanins(node).collect();
    fanins
        .windows(2)
        .all(|w| compare_nodes(net, w[0], w[1]) == Ordering::Less)
}

/// Brings the fanin list of `node` into canonical order.
///
/// Returns `None` if the list already was canonical. Otherwise returns the
/// applied permutation (new position `i` holds old position `perm[i]`),
/// which has also been forwarded to the node's function. Duplicate fanins
/// end up adjacent after sorting and are folded into one input through
/// [`LocalFunction::merge_inputs`]; the dropped pin is unlinked and recycled.
pub fn reorder_fanins<F: LocalFunction>(net: &mut Network<F>, node: NodeId) -> Option<Vec<usize>> {
    if is_canonical(net, node) {
        return None;
    }
    let fanins: Vec<NodeId> = net.fanins(node).collect();
    let mut perm: Vec<usize> = (0..fanins.len()).collect();
    perm.sort_by(|&i, &j| compare_nodes(net, fanins[i], fanins[j]));

    let pins = net.node(node).fanin_pins().to_vec();
    net.node_mut(node).fanins = perm.iter().map(|&i| pins[i]).collect();
    if let Some(func) = net.take_function(node) {
        net.set_function(node, func.permute(&perm));
    }

    let mut k = 0;
    while k + 1 < net.node(node).fanin_count() {
        if net.fanin(node, k) != net.fanin(node, k + 1) {
            k += 1;
            continue;
        }
        if let Some(func) = net.take_function(node) {
            net.set_function(node, func.merge_inputs(k, k + 1));
        }
        net.remove_fanin_pin(node, k + 1);
    }
    trace!("reordered fanins of '{}'", net.node_name(node));
    Some(perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::testing::Labels;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn unconnected(net: &mut Network<Labels>, fanins: &[NodeId]) -> NodeId {
        let n = net.create_node(NodeKind::Internal, 2, Some("n")).unwrap();
        for &f in fanins {
            net.add_fanin(n, f).unwrap();
        }
        let labels: Vec<u32> = (0..fanins.len() as u32).collect();
        net.set_function(n, Labels::binary(&labels));
        net.add_to_network(n, false).unwrap();
        n
    }

    #[test]
    fn names_sort_lexicographically() {
        let mut net: Network<Labels> = Network::new("t");
        let b = net.add_primary_input("b", 2).unwrap();
        let a = net.add_primary_input("a", 2).unwrap();
        assert_eq!(compare_nodes(&net, a, b), Ordering::Less);
        assert_eq!(compare_nodes(&net, b, a), Ordering::Greater);
        assert_eq!(compare_nodes(&net, a, a), Ordering::Equal);
    }

    #[test]
    fn unnamed_nodes_sort_by_id_after_named() {
        let mut net: Network<Labels> = Network::new("t");
        let a = net.add_primary_input("z", 2).unwrap();
        let x = net.add_internal(None, 2, &[a], Labels::binary(&[0])).unwrap();
        let y = net.add_internal(None, 2, &[a], Labels::binary(&[0])).unwrap();
        assert_eq!(compare_nodes(&net, x, y), Ordering::Less);
        assert_eq!(compare_nodes(&net, a, x), Ordering::Less);
        assert_eq!(compare_nodes(&net, y, a), Ordering::Greater);
    }

    #[test]
    fn reorder_sorts_and_permutes_function() {
        let mut net: Network<Labels> = Network::new("t");
        let a = net.add_primary_input("a", 2).unwrap();
        let b = net.add_primary_input("b", 2).unwrap();
        let c = net.add_primary_input("c", 2).unwrap();
        let n = unconnected(&mut net, &[c, a, b]);
        let perm = reorder_fanins(&mut net, n).unwrap();
        assert_eq!(perm, vec![1, 2, 0]);
        assert_eq!(net.fanins(n).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(net.node(n).function().unwrap().labels(), vec![1, 2, 0]);
    }

    #[test]
    fn reorder_is_idempotent() {
        let mut net: Network<Labels> = Network::new("t");
        let a = net.add_primary_input("a", 2).unwrap();
        let b = net.add_primary_input("b", 2).unwrap();
        let n = unconnected(&mut net, &[b, a]);
        assert!(reorder_fanins(&mut net, n).is_some());
        let first: Vec<NodeId> = net.fanins(n).collect();
        let labels = net.node(n).function().unwrap().labels();
        assert_eq!(reorder_fanins(&mut net, n), None);
        assert_eq!(net.fanins(n).collect::<Vec<_>>(), first);
        assert_eq!(net.node(n).function().unwrap().labels(), labels);
    }

    #[test]
    fn duplicates_fold_into_one_input() {
        let mut net: Network<Labels> = Network::new("t");
        let a = net.add_primary_input("a", 2).unwrap();
        let b = net.add_primary_input("b", 2).unwrap();
        let n = unconnected(&mut net, &[b, a, b]);
        net.connect_node(n).unwrap();
        assert_eq!(net.fanins(n).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(net.node(n).function().unwrap().num_inputs(), 2);
        assert_eq!(net.node(b).fanout_count(), 1);
        assert!(is_canonical(&net, n));
    }

    #[test]
    fn random_fanin_orders_reach_the_same_canonical_list() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng = StdRng::seed_from_u64(7);
        let mut net: Network<Labels> = Network::new("t");
        let mut inputs: Vec<NodeId> = (0..8)
            .map(|i| net.add_primary_input(&format!("i{i}"), 2).unwrap())
            .collect();
        let expected = inputs.clone();
        for round in 0..20 {
            inputs.shuffle(&mut rng);
            let n = net.create_node(NodeKind::Internal, 2, None).unwrap();
            for &i in &inputs {
                net.add_fanin(n, i).unwrap();
            }
            let labels: Vec<u32> = (0..inputs.len() as u32).collect();
            net.set_function(n, Labels::binary(&labels));
            net.add_to_network(n, true).unwrap();
            assert_eq!(net.fanins(n).collect::<Vec<_>>(), expected, "round {round}");
            assert_eq!(reorder_fanins(&mut net, n), None);
            // every label now sits in front of the input it was attached to
            let labels = net.node(n).function().unwrap().labels();
            for (pos, label) in labels.iter().enumerate() {
                assert_eq!(inputs[*label as usize], expected[pos]);
            }
        }
    }
}
