//! Priority heap invariants under random operation sequences, checked
//! against a plain map of the expected contents.

use mvnet_conformance::{random_network, RandomShape};
use mvnet_ir::{Network, NodeId};
use mvnet_logic::Relation;
use mvnet_synth::NodeHeap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn handles(count: usize) -> (Network<Relation>, Vec<NodeId>) {
    let mut rng = StdRng::seed_from_u64(0);
    let shape = RandomShape {
        internals: count,
        ..RandomShape::default()
    };
    let net = random_network(&mut rng, shape);
    let nodes = net.internal_nodes().to_vec();
    (net, nodes)
}

#[test]
fn random_sequences_keep_heap_order() {
    let (mut net, nodes) = handles(40);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut heap = NodeHeap::new();
    let mut model: HashMap<NodeId, i64> = HashMap::new();

    for step in 0..5000 {
        let node = nodes[rng.gen_range(0..nodes.len())];
        let weight = rng.gen_range(-1000..1000);
        match rng.gen_range(0..5) {
            0 | 1 => {
                if model.contains_key(&node) {
                    assert!(heap.update(&mut net, node, weight));
                } else {
                    heap.insert(&mut net, node, weight);
                }
                model.insert(node, weight);
            }
            2 => assert_eq!(heap.remove(&mut net, node), model.remove(&node)),
            3 => {
                let popped = heap.pop_max(&mut net);
                let max = model.values().copied().max();
                assert_eq!(popped.map(|(_, w)| w), max, "step {step}");
                if let Some((top, w)) = popped {
                    assert_eq!(model.remove(&top), Some(w));
                }
            }
            _ => {
                let max = model.values().copied().max();
                assert_eq!(heap.peek_max().map(|(_, w)| w), max);
            }
        }
        assert!(heap.check_order(&net), "step {step}");
        assert_eq!(heap.len(), model.len());
    }
    for &node in &nodes {
        assert_eq!(net.node(node).heap_slot().is_some(), model.contains_key(&node));
    }
}

#[test]
fn drains_in_order() {
    let (mut net, nodes) = handles(25);
    let mut rng = StdRng::seed_from_u64(8);
    let mut heap = NodeHeap::new();
    for &node in &nodes {
        heap.insert(&mut net, node, rng.gen_range(0..10));
    }
    let mut last = i64::MAX;
    while let Some((node, weight)) = heap.pop_max(&mut net) {
        assert!(weight <= last);
        assert!(!heap.contains(&net, node));
        last = weight;
    }
    assert!(heap.is_empty());
}
