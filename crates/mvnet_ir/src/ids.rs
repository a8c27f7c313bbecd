//! Opaque handle newtypes for all graph entities.
//!
//! Each handle is a `(slot, generation)` pair that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. Handles are created by
//! [`Pool::alloc`](crate::arena::Pool::alloc) and stop resolving once their
//! entry is recycled.
//!
//! A node's handle is distinct from its network ID: the handle names a pool
//! slot, the ID is the dense positive number assigned when the node joins a
//! network.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl ArenaId for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            fn index(self) -> u32 {
                self.index
            }

            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}.{}", $tag, self.index, self.generation)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable handle for a node.
    NodeId,
    "n"
);

define_id!(
    /// Opaque, copyable handle for a fanin or fanout pin.
    PinId,
    "p"
);

define_id!(
    /// Opaque, copyable handle for a latch.
    LatchId,
    "l"
);
