//! Graph walks: depth-first orders, levelization, and cycle detection.
//!
//! All walks run on explicit stacks and return their result by value, so
//! any number of orders can be alive at the same time and logic depth is
//! not bounded by the native stack.

use crate::error::{NetError, NetResult};
use crate::ids::NodeId;
use crate::network::Network;
use log::{debug, trace};

/// Which edges a walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From consumers towards producers.
    Fanin,
    /// From producers towards consumers.
    Fanout,
}

/// Nodes grouped by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    /// `buckets[l]` holds the nodes at level `l`, in walk order.
    pub buckets: Vec<Vec<NodeId>>,
}

impl Levels {
    /// The largest level present, or 0 for an empty network.
    pub fn depth(&self) -> u32 {
        self.buckets.len().saturating_sub(1) as u32
    }

    /// Nodes at `level`.
    pub fn at(&self, level: u32) -> &[NodeId] {
        self.buckets
            .get(level as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no node was levelized.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

impl<F> Network<F> {
    fn neighbors(&self, node: NodeId, direction: Direction) -> Vec<NodeId> {
        match direction {
            Direction::Fanin => self.fanins(node).collect(),
            Direction::Fanout => self.fanouts(node).collect(),
        }
    }

    /// Depth-first post-order from `roots`.
    ///
    /// Following [`Direction::Fanin`] every node appears after all of its
    /// fanins (a topological order); following [`Direction::Fanout`] after
    /// all of its fanouts. Each reachable node appears once, roots included.
    pub fn dfs_from_nodes(&mut self, roots: &[NodeId], direction: Direction) -> Vec<NodeId> {
        self.start_traversal();
        let mut order = Vec::new();
        let mut stack: Vec<(NodeId, bool)> = roots.iter().rev().map(|&n| (n, false)).collect();
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            if self.is_visited(node) {
                continue;
            }
            self.mark_visited(node);
            stack.push((node, true));
            for next in self.neighbors(node, direction).into_iter().rev() {
                if !self.is_visited(next) {
                    stack.push((next, false));
                }
            }
        }
        order
    }

    /// Topological order of the cone of the primary outputs.
    ///
    /// Outputs feeding latches are roots only with `include_latch_inputs`.
    pub fn dfs_from_outputs(&mut self, include_latch_inputs: bool) -> Vec<NodeId> {
        let roots: Vec<NodeId> = self
            .primary_outputs()
            .iter()
            .copied()
            .filter(|&o| include_latch_inputs || self.node(o).latch().is_none())
            .collect();
        self.dfs_from_nodes(&roots, Direction::Fanin)
    }

    /// Topological order of the cone of the latch inputs.
    pub fn dfs_from_latches(&mut self) -> Vec<NodeId> {
        let roots: Vec<NodeId> = self
            .latches()
            .iter()
            .map(|&l| self.latch(l).input)
            .collect();
        self.dfs_from_nodes(&roots, Direction::Fanin)
    }

    /// Post-order over fanouts from every primary input: each node appears
    /// after all of its fanouts, so reversing gives a topological order.
    pub fn dfs_from_inputs(&mut self) -> Vec<NodeId> {
        let roots = self.primary_inputs().to_vec();
        self.dfs_from_nodes(&roots, Direction::Fanout)
    }

    /// The transitive fanin cone of `roots`, roots included, in topological order.
    pub fn transitive_fanin(&mut self, roots: &[NodeId]) -> Vec<NodeId> {
        self.dfs_from_nodes(roots, Direction::Fanin)
    }

    /// The transitive fanout cone of `roots`, roots included, consumers first.
    pub fn transitive_fanout(&mut self, roots: &[NodeId]) -> Vec<NodeId> {
        self.dfs_from_nodes(roots, Direction::Fanout)
    }

    /// Assigns every node its level: 0 without fanins, otherwise one more
    /// than its deepest fanin. Stores the level on the nodes.
    pub fn levelize(&mut self) -> Levels {
        let all = self.nodes();
        let order = self.dfs_from_nodes(&all, Direction::Fanin);
        self.assign_levels(&order, Direction::Fanin)
    }

    /// Reverse levels: 0 without fanouts, otherwise one more than the
    /// deepest fanout. Stores the level on the nodes.
    pub fn levelize_from_outputs(&mut self) -> Levels {
        let all = self.nodes();
        let order = self.dfs_from_nodes(&all, Direction::Fanout);
        self.assign_levels(&order, Direction::Fanout)
    }

    fn assign_levels(&mut self, order: &[NodeId], direction: Direction) -> Levels {
        let mut levels = Levels::default();
        for &node in order {
            let level = self
                .neighbors(node, direction)
                .into_iter()
                .map(|n| self.node(n).level() + 1)
                .max()
                .unwrap_or(0);
            self.set_level(node, level);
            let slot = level as usize;
            if levels.buckets.len() <= slot {
                levels.buckets.resize_with(slot + 1, Vec::new);
            }
            levels.buckets[slot].push(node);
        }
        trace!("{}: levelized {} nodes, depth {}", self.name(), order.len(), levels.depth());
        levels
    }

    /// The number of levels on the longest input-to-output path.
    pub fn depth(&mut self) -> u32 {
        self.levelize().depth()
    }

    /// Looks for a cycle in the fanin relation.
    ///
    /// Walks from every primary output and then from every internal node,
    /// marking nodes on the current path and finished nodes with two stamps
    /// reserved for this pass. The reported path starts and ends with the
    /// same node, and each step goes from a node to one of its fanins.
    pub fn detect_cycle(&mut self) -> NetResult<()> {
        let on_path = self.reserve_traversals(2);
        let done = on_path + 1;
        let roots: Vec<NodeId> = self
            .primary_outputs()
            .iter()
            .chain(self.internal_nodes())
            .copied()
            .collect();

        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        for root in roots {
            if self.stamp(root) == done {
                continue;
            }
            self.set_stamp(root, on_path);
            stack.push((root, 0));
            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                top.1 += 1;
                let fanin = self
                    .node(node)
                    .fanin_pins()
                    .get(next)
                    .map(|&p| self.pin(p).node);
                match fanin {
                    Some(f) if self.stamp(f) == on_path => {
                        let start = stack
                            .iter()
                            .position(|&(n, _)| n == f)
                            .unwrap_or(0);
                        let mut path: Vec<NodeId> =
                            stack[start..].iter().map(|&(n, _)| n).collect();
                        path.push(f);
                        let names = path.iter().map(|&n| self.node_name(n)).collect();
                        debug!("{}: cycle through '{}'", self.name(), self.node_name(f));
                        return Err(NetError::CycleDetected { path, names });
                    }
                    Some(f) if self.stamp(f) == done => {}
                    Some(f) => {
                        self.set_stamp(f, on_path);
                        stack.push((f, 0));
                    }
                    None => {
                        self.set_stamp(node, done);
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}
