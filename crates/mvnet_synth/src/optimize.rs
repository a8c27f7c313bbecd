//! Optimization pass runner and pass trait.
//!
//! Provides the [`Pass`] trait for network rewrites and [`run_passes`],
//! which runs the passes enabled in a [`PassConfig`] in a fixed order.

use crate::collapse::{delete_dangling, eliminate_node, make_minimum_base};
use log::{debug, info};
use mvnet_config::PassConfig;
use mvnet_ir::{LocalFunction, NetResult, Network};

/// A single optimization pass.
///
/// Each pass inspects and rewrites the network, returning `true` if it
/// changed anything.
pub trait Pass<F: LocalFunction> {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the pass, returning `true` if it made changes.
    fn run(&self, net: &mut Network<F>) -> NetResult<bool>;
}

/// Drops fanins outside each internal node's true support.
pub struct MinimumBasePass;

impl<F: LocalFunction> Pass<F> for MinimumBasePass {
    fn name(&self) -> &'static str {
        "minimum-base"
    }

    fn run(&self, net: &mut Network<F>) -> NetResult<bool> {
        let mut reduced = 0;
        for node in net.internal_nodes().to_vec() {
            if make_minimum_base(net, node) {
                reduced += 1;
            }
        }
        debug!("{}: {reduced} nodes reduced to minimum base", net.name());
        Ok(reduced > 0)
    }
}

/// Collapses constant and single-input nodes into their consumers, then
/// deletes internal nodes nobody reads.
///
/// Nodes driving a primary output are kept.
pub struct SweepPass;

impl<F: LocalFunction> Pass<F> for SweepPass {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn run(&self, net: &mut Network<F>) -> NetResult<bool> {
        let mut eliminated = 0;
        for node in net.internal_nodes().to_vec() {
            if !net.contains(node) {
                continue;
            }
            let n = net.node(node);
            let trivial = n.fanin_count() <= 1
                || n.function().and_then(|f| f.constant_value()).is_some();
            if trivial && n.fanout_count() > 0 && eliminate_node(net, node)? {
                eliminated += 1;
            }
        }
        let candidates = net.internal_nodes().to_vec();
        let deleted = delete_dangling(net, &candidates);
        debug!(
            "{}: swept {eliminated} trivial and {deleted} dangling nodes",
            net.name()
        );
        Ok(eliminated + deleted > 0)
    }
}

/// Runs the passes enabled in `config`: minimum base first, then sweep.
///
/// Returns `true` if any pass changed the network.
pub fn run_passes<F: LocalFunction>(net: &mut Network<F>, config: &PassConfig) -> NetResult<bool> {
    let mut passes: Vec<Box<dyn Pass<F>>> = Vec::new();
    if config.minimum_base {
        passes.push(Box::new(MinimumBasePass));
    }
    if config.sweep {
        passes.push(Box::new(SweepPass));
    }

    let mut changed = false;
    for pass in &passes {
        let before = net.node_count();
        if pass.run(net)? {
            changed = true;
            info!(
                "{}: {} changed the network ({before} -> {} nodes)",
                net.name(),
                pass.name(),
                net.node_count()
            );
        }
    }
    Ok(changed)
}
