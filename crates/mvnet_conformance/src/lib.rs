//! Conformance test helpers for the mvnet network IR.
//!
//! Provides the shared network builders (the `a, b, c / n1 / n2 / o`
//! scenario, random acyclic networks, networks built from a configuration)
//! and an exhaustive simulator, so integration tests can compare networks
//! by behavior as well as by structure.

#![warn(missing_docs)]

use mvnet_common::ValueSet;
use mvnet_config::EngineConfig;
use mvnet_ir::{Direction, Network, NodeId};
use mvnet_logic::Relation;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// Initializes test logging once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The three-input AND-OR network used throughout the tests.
pub struct Scenario {
    /// The network.
    pub net: Network<Relation>,
    /// Primary input `a`.
    pub a: NodeId,
    /// Primary input `b`.
    pub b: NodeId,
    /// Primary input `c`.
    pub c: NodeId,
    /// `n1 = AND(a, b)`.
    pub n1: NodeId,
    /// `n2 = OR(n1, c)`.
    pub n2: NodeId,
    /// Primary output `o` driven by `n2`.
    pub o: NodeId,
}

/// Builds inputs `a, b, c` (two values each), `n1 = AND(a, b)`,
/// `n2 = OR(n1, c)` and output `o = n2`.
pub fn scenario() -> Scenario {
    let mut net = Network::new("scenario");
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

/// An empty network named and sized from `config`.
pub fn network_from_config(config: &EngineConfig) -> Network<Relation> {
    Network::with_capacity(config.network.name.as_str(), config.network.max_nodes)
}

/// Shape of a random network.
#[derive(Debug, Clone, Copy)]
pub struct RandomShape {
    /// Number of primary inputs.
    pub inputs: usize,
    /// Number of internal nodes.
    pub internals: usize,
    /// Largest fanin count of an internal node.
    pub max_fanins: usize,
    /// Largest value count of any node.
    pub max_values: u32,
    /// Give every internal node an explicit name.
    pub all_named: bool,
}

impl Default for RandomShape {
    fn default() -> Self {
        Self {
            inputs: 4,
            internals: 12,
            max_fanins: 3,
            max_values: 3,
            all_named: true,
        }
    }
}

/// Builds a random acyclic network of deterministic relations.
///
/// Fanins are drawn from the inputs and the internal nodes created earlier.
/// Every internal node without a consumer drives a primary output, and a
/// few others are exported as well.
pub fn random_network(rng: &mut impl Rng, shape: RandomShape) -> Network<Relation> {
    let mut net = Network::new("random");
    let mut pool: Vec<NodeId> = (0..shape.inputs)
        .map(|i| {
            let values = rng.gen_range(2..=shape.max_values);
            net.add_primary_input(&format!("i{i}"), values).unwrap()
        })
        .collect();

    let mut internals = Vec::with_capacity(shape.internals);
    for k in 0..shape.internals {
        let count = rng.gen_range(1..=shape.max_fanins.min(pool.len()));
        let fanins: Vec<NodeId> = pool.choose_multiple(rng, count).copied().collect();
        let domains: Vec<u32> = fanins.iter().map(|&f| net.node(f).values()).collect();
        let values = rng.gen_range(2..=shape.max_values);
        let size: usize = domains.iter().map(|&d| d as usize).product();
        let table: Vec<u32> = (0..size).map(|_| rng.gen_range(0..values)).collect();
        let func = Relation::from_values(&domains, values, |v| {
            let index = v
                .iter()
                .zip(&domains)
                .rev()
                .fold(0usize, |acc, (&x, &d)| acc * d as usize + x as usize);
            table[index]
        })
        .unwrap();
        let name = (shape.all_named || rng.gen_bool(0.5)).then(|| format!("n{k}"));
        let node = net
            .add_internal(name.as_deref(), values, &fanins, func)
            .unwrap();
        pool.push(node);
        internals.push(node);
    }

    for (k, &node) in internals.iter().enumerate() {
        if net.node(node).fanout_count() == 0 || rng.gen_bool(0.2) {
            net.add_primary_output(node, Some(&format!("o{k}"))).unwrap();
        }
    }
    net
}

/// Output value sets of every primary output, keyed by output name, for
/// one assignment of the primary inputs (given by input name).
pub fn simulate(
    net: &mut Network<Relation>,
    inputs: &HashMap<String, u32>,
) -> BTreeMap<String, ValueSet> {
    let outputs = net.primary_outputs().to_vec();
    let order = net.dfs_from_nodes(&outputs, Direction::Fanin);
    let mut sets: HashMap<NodeId, ValueSet> = HashMap::new();
    for node in order {
        let n = net.node(node);
        let set = if n.is_primary_input() {
            ValueSet::single(inputs[&net.node_name(node)])
        } else if n.is_primary_output() {
            sets[&net.fanin(node, 0)]
        } else {
            let fanin_sets: Vec<ValueSet> = net.fanins(node).map(|f| sets[&f]).collect();
            image(n.function().unwrap(), &fanin_sets)
        };
        sets.insert(node, set);
    }
    outputs
        .iter()
        .map(|&o| (net.node_name(o), sets[&o]))
        .collect()
}

/// Union of the relation's outputs over every combination drawn from `inputs`.
fn image(func: &Relation, inputs: &[ValueSet]) -> ValueSet {
    let mut combos: Vec<Vec<u32>> = vec![Vec::new()];
    for set in inputs {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                set.iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    combos
        .iter()
        .fold(ValueSet::EMPTY, |acc, combo| acc.union(func.eval(combo)))
}

/// Simulates `net` under every assignment of its primary inputs.
///
/// Entry `m` holds the outputs for assignment `m`, decoded in mixed radix
/// with the first primary input as the least significant digit.
pub fn truth_table(net: &mut Network<Relation>) -> Vec<BTreeMap<String, ValueSet>> {
    let inputs: Vec<(String, u32)> = net
        .primary_inputs()
        .iter()
        .map(|&i| (net.node_name(i), net.node(i).values()))
        .collect();
    let total: usize = inputs.iter().map(|(_, v)| *v as usize).product();
    (0..total)
        .map(|mut m| {
            let assignment: HashMap<String, u32> = inputs
                .iter()
                .map(|(name, values)| {
                    let v = (m % *values as usize) as u32;
                    m /= *values as usize;
                    (name.clone(), v)
                })
                .collect();
            simulate(net, &assignment)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scenario_simulates_and_or() {
        let mut s = scenario();
        let table = truth_table(&mut s.net);
        assert_eq!(table.len(), 8);
        for (m, outputs) in table.iter().enumerate() {
            let (a, b, c) = (m & 1, (m >> 1) & 1, m >> 2);
            assert_eq!(outputs["o"], ValueSet::single(((a & b) | c) as u32));
        }
    }

    #[test]
    fn random_networks_are_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let mut net = random_network(&mut rng, RandomShape::default());
            net.check().unwrap();
            assert!(!net.primary_outputs().is_empty());
        }
    }
}
