//! Global composition: every node's function over the primary inputs.
//!
//! Each primary input with `k` values is encoded on `ceil(log2 k)` decision
//! variables. Value `v` is the minterm of code `v`; the unused codes
//! `k..2^bits` fold into value `k - 1`, so the value functions of an input
//! partition the variable space. Internal nodes are composed in topological
//! order and primary outputs share their driver's array.
//!
//! Arrays are owned by [`GlobalRef`] guards that release their references
//! when dropped. With `drop_intermediate`, an internal node's array is
//! dropped as soon as its last consumer inside the composed cone has been
//! processed.

use log::{debug, info, warn};
use mvnet_common::bits_for_values;
use mvnet_config::{GlobalConfig, InputOrder};
use mvnet_ir::{DdManager, LocalFunction, NetError, NetResult, Network, NodeId};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Options of [`compute_global`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Let the manager reorder variables during composition.
    pub reorder: bool,
    /// Wall-clock budget, checked before each node.
    pub timeout: Option<Duration>,
    /// Compose only the cones of latch inputs.
    pub from_latches_only: bool,
    /// Release internal arrays once their last consumer is composed.
    pub drop_intermediate: bool,
    /// Primary-input ordering before variables are created.
    pub input_order: InputOrder,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            reorder: false,
            timeout: None,
            from_latches_only: false,
            drop_intermediate: true,
            input_order: InputOrder::Interleave,
        }
    }
}

impl From<&GlobalConfig> for GlobalOptions {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            reorder: config.reorder,
            timeout: config.timeout_ms.map(Duration::from_millis),
            from_latches_only: config.from_latches_only,
            drop_intermediate: config.drop_intermediate,
            input_order: config.input_order,
        }
    }
}

/// Referenced decision-diagram nodes, released on drop.
pub struct GlobalRef<'m, M: DdManager> {
    manager: &'m M,
    nodes: Vec<M::Ref>,
}

impl<'m, M: DdManager> GlobalRef<'m, M> {
    /// Takes ownership of one reference to each of `nodes`.
    fn adopt(manager: &'m M, nodes: Vec<M::Ref>) -> Self {
        Self { manager, nodes }
    }

    /// A second guard over the same nodes, holding its own references.
    fn share(&self) -> Self {
        for &node in &self.nodes {
            self.manager.ref_node(node);
        }
        Self::adopt(self.manager, self.nodes.clone())
    }

    /// The guarded nodes, one per value.
    pub fn as_slice(&self) -> &[M::Ref] {
        &self.nodes
    }
}

impl<M: DdManager> Drop for GlobalRef<'_, M> {
    fn drop(&mut self) {
        for &node in &self.nodes {
            self.manager.deref_node(node);
        }
    }
}

/// Result of [`compute_global`].
pub struct GlobalFunctions<'m, M: DdManager> {
    manager: &'m M,
    arrays: HashMap<NodeId, GlobalRef<'m, M>>,
    vars: HashMap<NodeId, Vec<usize>>,
    input_order: Vec<NodeId>,
    computed: usize,
}

impl<'m, M: DdManager> GlobalFunctions<'m, M> {
    /// Global array of `node`: entry `v` is true where the node takes value
    /// `v`. `None` for nodes outside the cone and dropped intermediates.
    pub fn get(&self, node: NodeId) -> Option<&[M::Ref]> {
        self.arrays.get(&node).map(GlobalRef::as_slice)
    }

    /// Decision variables encoding primary input `input`, least
    /// significant bit first.
    pub fn var_map(&self, input: NodeId) -> Option<&[usize]> {
        self.vars.get(&input).map(Vec::as_slice)
    }

    /// Primary inputs in the order their variables were created.
    pub fn input_order(&self) -> &[NodeId] {
        &self.input_order
    }

    /// Distinct decision-diagram nodes across every retained array.
    pub fn sharing_size(&self) -> usize {
        let roots: Vec<M::Ref> = self
            .arrays
            .values()
            .flat_map(|array| array.as_slice().iter().copied())
            .collect();
        self.manager.sharing_size(&roots)
    }

    /// Number of internal nodes and outputs composed.
    pub fn computed_count(&self) -> usize {
        self.computed
    }
}

/// Orders the primary inputs of the cones of `roots` by interleaving.
///
/// Inputs are placed in depth-first order from each root. Meeting an input
/// that is already placed moves the insertion point just past it, so inputs
/// feeding the same logic end up close together.
fn interleave<F>(net: &mut Network<F>, roots: &[NodeId]) -> Vec<NodeId> {
    net.start_traversal();
    // placed inputs as a singly linked list; the cursor is the input to
    // insert after, `None` meaning the front
    let mut next: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut head: Option<NodeId> = None;
    let mut tail: Option<NodeId> = None;
    for &root in roots {
        let mut cursor = tail;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if net.node(node).is_primary_input() {
                if !next.contains_key(&node) {
                    let after = match cursor {
                        Some(prev) => next.insert(prev, Some(node)).flatten(),
                        None => head.replace(node),
                    };
                    next.insert(node, after);
                    if after.is_none() {
                        tail = Some(node);
                    }
                }
                cursor = Some(node);
                continue;
            }
            if net.is_visited(node) {
                continue;
            }
            net.mark_visited(node);
            let fanins: Vec<NodeId> = net.fanins(node).collect();
            stack.extend(fanins.into_iter().rev());
        }
    }
    let mut order = Vec::with_capacity(next.len());
    let mut at = head;
    while let Some(node) = at {
        order.push(node);
        at = next.get(&node).copied().flatten();
    }
    order
}

/// Value functions of an input encoded on `vars`, each referenced.
fn encode_input<M: DdManager>(manager: &M, values: u32, vars: &[M::Ref]) -> Vec<M::Ref> {
    let minterm = |code: u32| {
        vars.iter().enumerate().fold(manager.constant(true), |acc, (bit, &var)| {
            let literal = if (code >> bit) & 1 == 1 {
                var
            } else {
                manager.not(var)
            };
            manager.and(acc, literal)
        })
    };
    let codes = 1u32 << vars.len();
    (0..values)
        .map(|value| {
            let mut f = minterm(value);
            if value == values - 1 {
                for code in values..codes {
                    f = manager.or(f, minterm(code));
                }
            }
            manager.ref_node(f);
            f
        })
        .collect()
}

/// Computes global functions for the cone of the primary outputs (or of the
/// latch inputs).
///
/// On timeout every array built so far is released and
/// [`NetError::Timeout`] is returned; the network itself is never modified
/// beyond its traversal stamps.
pub fn compute_global<'m, F, M>(
    net: &mut Network<F>,
    manager: &'m M,
    options: &GlobalOptions,
) -> NetResult<GlobalFunctions<'m, M>>
where
    F: LocalFunction,
    M: DdManager,
{
    let start = Instant::now();
    let roots: Vec<NodeId> = if options.from_latches_only {
        net.latches().iter().map(|&l| net.latch(l).input).collect()
    } else {
        net.primary_outputs().to_vec()
    };
    let order = net.transitive_fanin(&roots);
    let cone: HashSet<NodeId> = order.iter().copied().collect();

    let inputs = match options.input_order {
        InputOrder::Interleave => interleave(net, &roots),
        InputOrder::Natural => net
            .primary_inputs()
            .iter()
            .copied()
            .filter(|pi| cone.contains(pi))
            .collect(),
    };

    let mut global = GlobalFunctions {
        manager,
        arrays: HashMap::with_capacity(order.len()),
        vars: HashMap::with_capacity(inputs.len()),
        input_order: inputs,
        computed: 0,
    };
    for &input in &global.input_order {
        let values = net.node(input).values();
        let first = manager.variable_count();
        let bits: Vec<M::Ref> = (0..bits_for_values(values))
            .map(|_| manager.new_variable())
            .collect();
        let array = encode_input(manager, values, &bits);
        global.vars.insert(input, (first..first + bits.len()).collect());
        global.arrays.insert(input, GlobalRef::adopt(manager, array));
    }

    let mut remaining: HashMap<NodeId, usize> = order
        .iter()
        .map(|&n| (n, net.fanouts(n).filter(|f| cone.contains(f)).count()))
        .collect();

    if options.reorder {
        manager.enable_reordering();
    }
    let total = order.len() - global.input_order.len();
    for &node in &order {
        let n = net.node(node);
        if n.is_primary_input() {
            continue;
        }
        if let Some(budget) = options.timeout {
            let elapsed = start.elapsed();
            if elapsed >= budget {
                warn!(
                    "{}: global composition timed out after {} of {total} nodes",
                    net.name(),
                    global.computed
                );
                manager.disable_reordering();
                return Err(NetError::Timeout {
                    elapsed_ms: elapsed.as_millis(),
                    computed: global.computed,
                    total,
                });
            }
        }

        let fanins: Vec<NodeId> = net.fanins(node).collect();
        let array = if n.is_primary_output() {
            global
                .arrays
                .get(&fanins[0])
                .map(GlobalRef::share)
                .ok_or_else(|| NetError::consistency(net.node_name(node), "driver not composed"))?
        } else {
            let func = n.function().ok_or_else(|| {
                NetError::consistency(net.node_name(node), "internal node without a function")
            })?;
            let inputs = fanins
                .iter()
                .map(|f| {
                    global.get(*f).ok_or_else(|| {
                        NetError::consistency(net.node_name(*f), "fanin not composed")
                    })
                })
                .collect::<NetResult<Vec<&[M::Ref]>>>()?;
            GlobalRef::adopt(manager, manager.compose(func, &inputs))
        };
        global.arrays.insert(node, array);
        global.computed += 1;

        for fanin in fanins {
            let Some(count) = remaining.get_mut(&fanin) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count == 0 && options.drop_intermediate && net.node(fanin).is_internal() {
                global.arrays.remove(&fanin);
            }
        }
    }

    if options.reorder {
        manager.reorder();
        manager.disable_reordering();
    }
    info!(
        "{}: composed {} nodes over {} inputs in {:?}",
        net.name(),
        global.computed,
        global.input_order.len(),
        start.elapsed()
    );
    debug!("{}: {} shared decision nodes", net.name(), global.sharing_size());
    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvnet_dd::BddManager;
    use mvnet_ir::LatchReset;
    use mvnet_logic::Relation;

    fn scenario() -> Network<Relation> {
        let mut net = Network::new("t");
        let a = net.add_primary_input("a", 2).unwrap();
        let b = net.add_primary_input("b", 2).unwrap();
        let c = net.add_primary_input("c", 2).unwrap();
        let n1 = net.add_internal(Some("n1"), 2, &[a, b], Relation::and(2)).unwrap();
        let n2 = net.add_internal(Some("n2"), 2, &[n1, c], Relation::or(2)).unwrap();
        net.add_primary_output(n2, Some("o")).unwrap();
        net
    }

    fn assignments(vars: usize) -> impl Iterator<Item = Vec<bool>> {
        (0..1u32 << vars).map(move |m| (0..vars).map(|i| (m >> i) & 1 == 1).collect())
    }

    #[test]
    fn interleaved_order_follows_the_cone() {
        let mut net = scenario();
        let manager = BddManager::new();
        let global = compute_global(&mut net, &manager, &GlobalOptions::default()).unwrap();
        let names: Vec<String> = global
            .input_order()
            .iter()
            .map(|&n| net.node_name(n))
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        let c = net.find_node("c").unwrap();
        assert_eq!(global.var_map(c), Some(&[0][..]));
    }

    /// Placement by position search, the straightforward form of the order.
    fn interleave_by_search(net: &mut Network<Relation>, roots: &[NodeId]) -> Vec<NodeId> {
        net.start_traversal();
        let mut order: Vec<NodeId> = Vec::new();
        for &root in roots {
            let mut cursor = order.len();
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                if net.node(node).is_primary_input() {
                    match order.iter().position(|&p| p == node) {
                        Some(pos) => cursor = pos + 1,
                        None => {
                            order.insert(cursor, node);
                            cursor += 1;
                        }
                    }
                    continue;
                }
                if net.is_visited(node) {
                    continue;
                }
                net.mark_visited(node);
                let fanins: Vec<NodeId> = net.fanins(node).collect();
                stack.extend(fanins.into_iter().rev());
            }
        }
        order
    }

    #[test]
    fn interleave_scales_over_wide_input_sets() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(5);
        let mut net = Network::new("wide");
        let mut pool: Vec<NodeId> = (0..150)
            .map(|i| net.add_primary_input(&format!("x{i}"), 2).unwrap())
            .collect();
        for k in 0..400 {
            let first = rng.gen_range(0..pool.len());
            let mut second = rng.gen_range(0..pool.len());
            if second == first {
                second = (first + 1) % pool.len();
            }
            let name = format!("g{k}");
            let fanins = [pool[first], pool[second]];
            let g = net
                .add_internal(Some(name.as_str()), 2, &fanins, Relation::and(2))
                .unwrap();
            pool.push(g);
        }
        let roots: Vec<NodeId> = pool[pool.len() - 12..].to_vec();

        let order = interleave(&mut net, &roots);
        let expected = interleave_by_search(&mut net, &roots);
        assert_eq!(order, expected);
        let distinct: HashSet<NodeId> = order.iter().copied().collect();
        assert_eq!(distinct.len(), order.len());
        assert!(order.iter().all(|&n| net.node(n).is_primary_input()));
    }

    #[test]
    fn output_function_is_and_or() {
        let mut net = scenario();
        let manager = BddManager::new();
        let options = GlobalOptions {
            input_order: InputOrder::Natural,
            ..GlobalOptions::default()
        };
        let global = compute_global(&mut net, &manager, &options).unwrap();
        let o = net.find_node("o").unwrap();
        let array = global.get(o).unwrap();
        assert_eq!(array.len(), 2);
        for x in assignments(3) {
            let expected = (x[0] && x[1]) || x[2];
            assert_eq!(manager.eval(array[1], &x), expected);
            assert_eq!(manager.eval(array[0], &x), !expected);
        }
        assert_eq!(global.computed_count(), 3);
        assert!(global.sharing_size() > 2);
    }

    #[test]
    fn intermediates_are_dropped_after_last_consumer() {
        let mut net = scenario();
        let manager = BddManager::new();
        let global = compute_global(&mut net, &manager, &GlobalOptions::default()).unwrap();
        assert!(global.get(net.find_node("n1").unwrap()).is_none());
        assert!(global.get(net.find_node("n2").unwrap()).is_none());
        assert!(global.get(net.find_node("o").unwrap()).is_some());
        assert!(global.get(net.find_node("a").unwrap()).is_some());
        drop(global);
        assert_eq!(manager.referenced_nodes(), 0);

        let options = GlobalOptions {
            drop_intermediate: false,
            ..GlobalOptions::default()
        };
        let global = compute_global(&mut net, &manager, &options).unwrap();
        assert!(global.get(net.find_node("n1").unwrap()).is_some());
    }

    #[test]
    fn multi_valued_inputs_fold_unused_codes() {
        let mut net = Network::new("mv");
        let x = net.add_primary_input("x", 3).unwrap();
        let y = net.add_internal(Some("y"), 3, &[x], Relation::buffer(3)).unwrap();
        let o = net.add_primary_output(y, Some("o")).unwrap();
        let manager = BddManager::new();
        let global = compute_global(&mut net, &manager, &GlobalOptions::default()).unwrap();
        assert_eq!(global.var_map(x), Some(&[0, 1][..]));
        let array = global.get(o).unwrap();
        for bits in assignments(2) {
            let code = u32::from(bits[0]) + 2 * u32::from(bits[1]);
            let value = code.min(2);
            for v in 0..3 {
                assert_eq!(manager.eval(array[v as usize], &bits), v == value);
            }
        }
    }

    #[test]
    fn timeout_releases_partial_results() {
        let mut net = scenario();
        let manager = BddManager::new();
        let options = GlobalOptions {
            timeout: Some(Duration::ZERO),
            reorder: true,
            ..GlobalOptions::default()
        };
        let Err(NetError::Timeout {
            computed, total, ..
        }) = compute_global(&mut net, &manager, &options)
        else {
            panic!("expected a timeout");
        };
        assert_eq!((computed, total), (0, 3));
        assert_eq!(manager.referenced_nodes(), 0);
        assert!(!manager.is_reordering_enabled());
    }

    #[test]
    fn reorder_runs_once_at_the_end() {
        let mut net = scenario();
        let manager = BddManager::new();
        let options = GlobalOptions {
            reorder: true,
            ..GlobalOptions::default()
        };
        let global = compute_global(&mut net, &manager, &options).unwrap();
        assert_eq!(manager.reorder_requests(), 1);
        assert!(!manager.is_reordering_enabled());
        let o = net.find_node("o").unwrap();
        let x = vec![true, true, false];
        assert!(manager.eval(global.get(o).unwrap()[1], &x));
    }

    #[test]
    fn latch_cones_only() {
        let mut net = scenario();
        let n1 = net.find_node("n1").unwrap();
        let d = net.add_primary_output(n1, Some("d")).unwrap();
        let q = net.add_primary_input("q", 2).unwrap();
        net.add_latch(d, q, LatchReset::Value(0)).unwrap();
        let manager = BddManager::new();
        let options = GlobalOptions {
            from_latches_only: true,
            ..GlobalOptions::default()
        };
        let global = compute_global(&mut net, &manager, &options).unwrap();
        assert!(global.get(d).is_some());
        assert!(global.get(net.find_node("o").unwrap()).is_none());
        assert_eq!(global.input_order().len(), 2);
        assert_eq!(global.computed_count(), 2);
    }

    #[test]
    fn options_from_config() {
        let config = GlobalConfig {
            reorder: true,
            timeout_ms: Some(250),
            from_latches_only: false,
            drop_intermediate: false,
            input_order: InputOrder::Natural,
        };
        let options = GlobalOptions::from(&config);
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert!(options.reorder && !options.drop_intermediate);
        assert_eq!(options.input_order, InputOrder::Natural);
    }
}
