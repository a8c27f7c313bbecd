//! Sequential elements.
//!
//! A [`Latch`] ties a primary output (the value to be stored) to a primary
//! input (the stored value seen by the combinational logic in the next
//! cycle). Cutting latches this way keeps the network combinational.

use crate::ids::NodeId;

/// How a latch is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchReset {
    /// Reset to a constant value.
    Value(u32),
    /// Reset computed by a logic node owned by the latch.
    ///
    /// The node lives in the network's pool but is never added to the
    /// network's lists.
    Logic(NodeId),
    /// No reset value is known.
    Undefined,
}

/// A latch between a primary output and a primary input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Latch {
    /// The primary output driving the latch.
    pub input: NodeId,
    /// The primary input driven by the latch.
    pub output: NodeId,
    /// Initial value.
    pub reset: LatchReset,
}

impl Latch {
    /// The constant reset value, if the reset is a constant.
    pub fn reset_value(&self) -> Option<u32> {
        match self.reset {
            LatchReset::Value(v) => Some(v),
            _ => None,
        }
    }
}
