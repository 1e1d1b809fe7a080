//! Optimizer error types.
//!
//! Nearly every failure here is a contract violation rather than bad user
//! input: a mis-resolved address, a CFG wired against its invariants, or a
//! revert attempted where no pre-state exists. They are fatal; nothing
//! retries.

use reef_ast::{Address, BodyAddress, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Address resolved to no node: {0}")]
    AddressNotFound(Address),

    #[error("Address transformed {count} nodes, expected exactly one: {address}")]
    AmbiguousAddress { address: Address, count: u32 },

    #[error("Natural predecessor of {node} written twice ({first}, then {second})")]
    DuplicateNaturalPredecessor {
        node: NodeId,
        first: NodeId,
        second: NodeId,
    },

    #[error("Successor edge {from} -> {to} names no node")]
    DanglingSuccessor { from: NodeId, to: NodeId },

    #[error("Unknown body: {0}")]
    UnknownBody(BodyAddress),

    #[error("Command payload does not match the tree at {0}")]
    StaleCommand(Address),

    #[error("No revert available for command at {0}")]
    RevertUnavailable(Address),
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;
