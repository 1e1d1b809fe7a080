//! Optimizing middle-end of the Reef compiler.
//!
//! Consumes a type-checked [`reef_ast::Program`], builds each body's
//! control-flow graph, runs backward liveness, and rewrites bodies to a
//! fixed point with a catalogue of classic optimizations — constant folding,
//! constant/copy propagation, common-subexpression elimination, algebraic
//! simplification, strength reduction, dead-/unreachable-code elimination,
//! and three-address normalization. Every elementary edit is recorded as an
//! addressed, serializable [`Command`] so external tooling can replay
//! optimization step by step or jump to any point.
//!
//! The engine is deterministic, single-threaded, and pure: identical input
//! and configuration always produce the identical program and command
//! sequence.

pub mod analysis;
pub mod cfg;
pub mod command;
pub mod driver;
pub mod error;
pub mod passes;
pub mod replay;
pub mod rewrite;

pub use command::{Command, CounterSnapshot, PassTag};
pub use driver::{
    optimize, CommandSink, NullSink, OptimizeConfig, Optimization, RoundPolicy,
};
pub use error::{OptimizeError, OptimizeResult};
pub use replay::{Region, Replay};
