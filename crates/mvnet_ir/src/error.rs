//! Error types for network construction, rewriting, and analysis.

use crate::arena::PoolExhausted;
use crate::func::FunctionError;
use crate::ids::NodeId;

/// The standard result type for fallible network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Recoverable failures of network operations.
///
/// None of these leave the network in a corrupted state: an operation that
/// returns an error has either not mutated the network at all or has rolled
/// its partial work back. Precondition violations by a calling pass are not
/// represented here; they panic.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// A node with the same name is already part of the network.
    #[error("a node named '{name}' already exists in the network")]
    NameCollision {
        /// The colliding name.
        name: String,
    },

    /// A name lookup found no node.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// The fanin relation contains a cycle.
    ///
    /// `path` starts and ends with the same node; consecutive entries are
    /// fanout-to-fanin steps.
    #[error("combinational cycle detected: {}", .names.join(" -> "))]
    CycleDetected {
        /// The nodes along the cycle.
        path: Vec<NodeId>,
        /// Names of the nodes along the cycle.
        names: Vec<String>,
    },

    /// The consistency checker found a violated structural invariant.
    #[error("consistency violation at '{node}': {message}")]
    Consistency {
        /// Name of the offending node.
        node: String,
        /// Description of the violated invariant.
        message: String,
    },

    /// The node pool or the ID space is exhausted.
    #[error("capacity exhausted: {0}")]
    Capacity(String),

    /// Global composition ran past its time budget.
    #[error(
        "global composition timed out after {elapsed_ms} ms ({computed} of {total} nodes composed)"
    )]
    Timeout {
        /// Milliseconds spent before the budget tripped.
        elapsed_ms: u128,
        /// Nodes whose global functions were computed.
        computed: usize,
        /// Nodes in the composed cone.
        total: usize,
    },

    /// The local-function collaborator rejected an operation.
    #[error("local function error: {0}")]
    Function(#[from] FunctionError),
}

impl From<PoolExhausted> for NetError {
    fn from(err: PoolExhausted) -> Self {
        NetError::Capacity(err.to_string())
    }
}

impl NetError {
    /// Creates a consistency error for the named node.
    pub fn consistency(node: impl Into<String>, message: impl Into<String>) -> Self {
        NetError::Consistency {
            node: node.into(),
            message: message.into(),
        }
    }
}
