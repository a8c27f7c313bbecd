//! Structural comparison of networks.
//!
//! Nodes are matched by key: the explicit name when there is one, otherwise
//! a digest of the node's kind, value count and fanin keys. Keys never
//! depend on IDs, so networks that differ only in ID numbering compare
//! equal. Fanin lists compare as sorted key lists, since unnamed fanins are
//! ordered by ID.

use crate::ids::NodeId;
use crate::latch::LatchReset;
use crate::network::Network;
use crate::node::NodeKind;
use mvnet_common::{ContentHash, ContentHasher};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Which network of a comparison something was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The first network.
    Left,
    /// The second network.
    Right,
}

/// One structural difference between two networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    /// A node exists on one side only.
    MissingNode {
        /// Node key.
        key: String,
        /// The side holding the node.
        present: Side,
    },
    /// The node kinds differ.
    Kind {
        /// Node key.
        key: String,
        /// Kind on the left.
        left: NodeKind,
        /// Kind on the right.
        right: NodeKind,
    },
    /// The value counts differ.
    Values {
        /// Node key.
        key: String,
        /// Value count on the left.
        left: u32,
        /// Value count on the right.
        right: u32,
    },
    /// The fanin lists differ.
    Fanins {
        /// Node key.
        key: String,
        /// Fanin keys on the left.
        left: Vec<String>,
        /// Fanin keys on the right.
        right: Vec<String>,
    },
    /// A latch exists on one side only.
    MissingLatch {
        /// Latch description `input -> output (reset)`.
        latch: String,
        /// The side holding the latch.
        present: Side,
    },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::MissingNode { key, present } => {
                write!(f, "node '{key}' only exists on the {present:?} side")
            }
            Difference::Kind { key, left, right } => {
                write!(f, "node '{key}' is {} vs {}", left.tag(), right.tag())
            }
            Difference::Values { key, left, right } => {
                write!(f, "node '{key}' has {left} vs {right} values")
            }
            Difference::Fanins { key, left, right } => write!(
                f,
                "node '{key}' fanins [{}] vs [{}]",
                left.join(", "),
                right.join(", ")
            ),
            Difference::MissingLatch { latch, present } => {
                write!(f, "latch {latch} only exists on the {present:?} side")
            }
        }
    }
}

struct Summary {
    kind: NodeKind,
    values: u32,
    fanins: Vec<String>,
}

/// Key of every node reachable from the node lists.
///
/// Unnamed keys are built bottom-up on an explicit stack. A fanin still on
/// the path (a cycle) contributes a fixed marker instead of its key.
fn node_keys<F>(net: &Network<F>) -> HashMap<NodeId, String> {
    let mut keys: HashMap<NodeId, String> = HashMap::new();
    let mut on_path: HashSet<NodeId> = HashSet::new();
    for root in net.nodes() {
        let mut stack = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if keys.contains_key(&node) {
                continue;
            }
            let n = net.node(node);
            if let Some(name) = n.explicit_name() {
                keys.insert(node, name.to_string());
                continue;
            }
            if !expanded {
                if !on_path.insert(node) {
                    continue;
                }
                stack.push((node, true));
                for fanin in net.fanins(node) {
                    if !keys.contains_key(&fanin) && !on_path.contains(&fanin) {
                        stack.push((fanin, false));
                    }
                }
                continue;
            }
            on_path.remove(&node);
            let mut fanins: Vec<&str> = net
                .fanins(node)
                .map(|f| keys.get(&f).map_or("<cycle>", String::as_str))
                .collect();
            fanins.sort_unstable();
            let mut hasher = ContentHasher::new();
            hasher.write_str(n.kind().tag());
            hasher.write_u64(u64::from(n.values()));
            hasher.write_u64(fanins.len() as u64);
            for fanin in fanins {
                hasher.write_str(fanin);
            }
            let digest = hasher.finish().to_string();
            keys.insert(node, format!("#{}", &digest[..12]));
        }
    }
    keys
}

/// Nodes grouped by key. Structurally identical unnamed nodes share a key,
/// so each key holds a list, sorted by value count and fanins.
type Summaries = BTreeMap<String, Vec<Summary>>;

fn summarize<F>(net: &Network<F>) -> (Summaries, BTreeSet<String>) {
    let keys = node_keys(net);
    let key = |n: NodeId| keys.get(&n).cloned().unwrap_or_else(|| net.node_name(n));
    let mut nodes: Summaries = BTreeMap::new();
    for node in net.nodes() {
        let n = net.node(node);
        let mut fanins: Vec<String> = net.fanins(node).map(key).collect();
        fanins.sort_unstable();
        nodes.entry(key(node)).or_default().push(Summary {
            kind: n.kind(),
            values: n.values(),
            fanins,
        });
    }
    for group in nodes.values_mut() {
        group.sort_by(|a, b| {
            (a.kind.tag(), a.values, &a.fanins).cmp(&(b.kind.tag(), b.values, &b.fanins))
        });
    }
    let latches = net
        .latches()
        .iter()
        .map(|&l| {
            let latch = net.latch(l);
            let reset = match latch.reset {
                LatchReset::Value(v) => v.to_string(),
                LatchReset::Logic(logic) => {
                    let mut fanins: Vec<String> = net.fanins(logic).map(key).collect();
                    fanins.sort_unstable();
                    format!("logic({})", fanins.join(","))
                }
                LatchReset::Undefined => "undefined".to_string(),
            };
            format!("{} -> {} ({reset})", key(latch.input), key(latch.output))
        })
        .collect();
    (nodes, latches)
}

fn compare_summaries(key: &str, l: &Summary, r: &Summary, diffs: &mut Vec<Difference>) {
    if l.kind != r.kind {
        diffs.push(Difference::Kind {
            key: key.to_string(),
            left: l.kind,
            right: r.kind,
        });
    }
    if l.values != r.values {
        diffs.push(Difference::Values {
            key: key.to_string(),
            left: l.values,
            right: r.values,
        });
    }
    if l.fanins != r.fanins {
        diffs.push(Difference::Fanins {
            key: key.to_string(),
            left: l.fanins.clone(),
            right: r.fanins.clone(),
        });
    }
}

/// Lists the structural differences between `left` and `right`.
///
/// Compares node kinds, value counts, fanin lists and latches. Local
/// functions are not compared.
pub fn diff_networks<F, G>(left: &Network<F>, right: &Network<G>) -> Vec<Difference> {
    let (lnodes, llatches) = summarize(left);
    let (rnodes, rlatches) = summarize(right);
    let mut diffs = Vec::new();

    for (key, left_group) in &lnodes {
        let right_group = rnodes.get(key).map_or(&[][..], Vec::as_slice);
        for (l, r) in left_group.iter().zip(right_group) {
            compare_summaries(key, l, r, &mut diffs);
        }
        for _ in right_group.len()..left_group.len() {
            diffs.push(Difference::MissingNode {
                key: key.clone(),
                present: Side::Left,
            });
        }
    }
    for (key, right_group) in &rnodes {
        let shared = lnodes.get(key).map_or(0, Vec::len);
        for _ in shared..right_group.len() {
            diffs.push(Difference::MissingNode {
                key: key.clone(),
                present: Side::Right,
            });
        }
    }
    for latch in llatches.difference(&rlatches) {
        diffs.push(Difference::MissingLatch {
            latch: latch.clone(),
            present: Side::Left,
        });
    }
    for latch in rlatches.difference(&llatches) {
        diffs.push(Difference::MissingLatch {
            latch: latch.clone(),
            present: Side::Right,
        });
    }
    diffs
}

impl<F> Network<F> {
    /// Content hash of the network structure.
    ///
    /// Two networks with no [`Difference`] between them have the same
    /// signature.
    pub fn signature(&self) -> ContentHash {
        let (nodes, latches) = summarize(self);
        let mut hasher = ContentHasher::new();
        hasher.write_u64(nodes.len() as u64);
        for (key, group) in &nodes {
            hasher.write_str(key);
            hasher.write_u64(group.len() as u64);
            for summary in group {
                hasher.write_str(summary.kind.tag());
                hasher.write_u64(u64::from(summary.values));
                hasher.write_u64(summary.fanins.len() as u64);
                for fanin in &summary.fanins {
                    hasher.write_str(fanin);
                }
            }
        }
        hasher.write_u64(latches.len() as u64);
        for latch in &latches {
            hasher.write_str(latch);
        }
        hasher.finish()
    }
}
