//! Node identification and the per-body counter record.

use serde::{Deserialize, Serialize};

/// Unique identifier for a compound statement or condition block within a
/// Body. Assigned by the type checker and reused, never regenerated, by the
/// optimizer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a new node ID from a u32.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Get the underlying ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Entry sentinel of every control-flow graph. Statement ids start at 1.
    pub const ENTRY: NodeId = NodeId(0);

    /// Exit sentinel of every control-flow graph.
    pub const EXIT: NodeId = NodeId(u32::MAX);
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == NodeId::ENTRY {
            write!(f, "entry")
        } else if *self == NodeId::EXIT {
            write!(f, "exit")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Mutable id/temporary-name counters owned by each Body.
///
/// Both counters are monotonic and never reused. The record is threaded by
/// `&mut` through every rewrite that allocates — it is part of the Body, not
/// ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    next_id: u32,
    next_temp: u32,
}

impl Counters {
    /// Create a counter record whose next statement id is `next_id`.
    pub fn new(next_id: u32) -> Self {
        Counters {
            next_id,
            next_temp: 0,
        }
    }

    /// Allocate a fresh statement id.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        NodeId::new(id)
    }

    /// Allocate a fresh temporary name of the form `$tN`.
    pub fn fresh_temp_name(&mut self) -> String {
        let n = self.next_temp;
        self.next_temp += 1;
        format!("$t{n}")
    }

    /// Whether `name` matches the generator-owned temporary pattern.
    pub fn is_temp_name(name: &str) -> bool {
        name.strip_prefix("$t")
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}
