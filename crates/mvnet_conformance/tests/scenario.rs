//! The `a, b, c / n1 = AND(a, b) / n2 = OR(n1, c) / o = n2` network,
//! end to end: levels, collapsing, support reduction, global functions and
//! the pass runner.

use mvnet_common::ValueSet;
use mvnet_config::{InputOrder, PassConfig};
use mvnet_conformance::{init_logging, scenario, truth_table};
use mvnet_dd::BddManager;
use mvnet_ir::{DdManager, Direction};
use mvnet_synth::{
    collapse, collapse_nodes, compute_global, delete_dangling, make_minimum_base, run_passes,
    GlobalOptions,
};

// ---------------------------------------------------------------------------
// Walks
// ---------------------------------------------------------------------------

#[test]
fn levels() {
    let mut s = scenario();
    let levels = s.net.levelize();
    for node in [s.a, s.b, s.c] {
        assert_eq!(s.net.node(node).level(), 0);
    }
    assert_eq!(s.net.node(s.n1).level(), 1);
    assert_eq!(s.net.node(s.n2).level(), 2);
    assert_eq!(s.net.node(s.o).level(), 3);
    assert_eq!(levels.depth(), 3);
    assert_eq!(levels.at(0).len(), 3);
    assert_eq!(levels.at(3), &[s.o]);
}

#[test]
fn walks_are_topological() {
    let mut s = scenario();
    let order = s.net.dfs_from_outputs(true);
    let pos = |n| order.iter().position(|&x| x == n).unwrap();
    assert_eq!(order.len(), 6);
    assert!(pos(s.a) < pos(s.n1) && pos(s.n1) < pos(s.n2) && pos(s.n2) < pos(s.o));
    let reach = s.net.dfs_from_nodes(&[s.a], Direction::Fanout);
    assert_eq!(reach, vec![s.o, s.n2, s.n1, s.a]);
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

#[test]
fn collapse_n1_into_n2() {
    init_logging();
    let mut s = scenario();
    let merged = collapse(&mut s.net, s.n2, s.n1).unwrap();
    assert_eq!(s.net.fanins(merged).collect::<Vec<_>>(), vec![s.a, s.b, s.c]);
    let func = s.net.node(merged).function().unwrap();
    for m in 0..8u32 {
        let (a, b, c) = (m & 1, (m >> 1) & 1, m >> 2);
        assert_eq!(func.eval(&[a, b, c]), ValueSet::single((a & b) | c));
    }
    assert!(!make_minimum_base(&mut s.net, merged));
    assert_eq!(s.net.node(merged).fanin_count(), 3);
    s.net.destroy_node(merged);
    s.net.check().unwrap();
}

#[test]
fn collapse_nodes_keeps_behavior() {
    let mut s = scenario();
    let before = truth_table(&mut s.net);
    assert!(collapse_nodes(&mut s.net, s.n2, s.n1).unwrap());
    assert_eq!(delete_dangling(&mut s.net, &[s.n1]), 1);
    s.net.check().unwrap();
    assert_eq!(s.net.node_count(), 5);
    assert_eq!(truth_table(&mut s.net), before);
}

// ---------------------------------------------------------------------------
// Global functions
// ---------------------------------------------------------------------------

#[test]
fn global_functions_match_simulation() {
    let mut s = scenario();
    let table = truth_table(&mut s.net);
    let manager = BddManager::new();
    let options = GlobalOptions {
        input_order: InputOrder::Natural,
        ..GlobalOptions::default()
    };
    let global = compute_global(&mut s.net, &manager, &options).unwrap();
    let array = global.get(s.o).unwrap();
    for (m, outputs) in table.iter().enumerate() {
        let assignment: Vec<bool> = (0..3).map(|i| (m >> i) & 1 == 1).collect();
        let value = outputs["o"].as_single().unwrap();
        for v in 0..2 {
            assert_eq!(manager.eval(array[v], &assignment), v as u32 == value);
        }
    }
    assert_eq!(manager.variable_count(), 3);
    drop(global);
    assert_eq!(manager.referenced_nodes(), 0);
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

#[test]
fn passes_leave_the_scenario_alone() {
    let mut s = scenario();
    let before = s.net.signature();
    assert!(!run_passes(&mut s.net, &PassConfig::default()).unwrap());
    assert_eq!(s.net.signature(), before);
}
