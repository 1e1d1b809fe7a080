//! The optimizer driver.
//!
//! Orders the passes, sweeps each body in scope, and repeats until a sweep
//! emits zero commands or the round budget runs out. The CFG of a body is
//! recomputed only when a sweep changed its statement shape.

use crate::analysis;
use crate::cfg;
use crate::command::Command;
use crate::error::OptimizeResult;
use crate::passes::{
    algebraic, cse, dead_code, declarations, fold, propagate, strength, three_address,
    unreachable, BlockContext,
};
use crate::rewrite::{rewrite_all_blocks, BlockTransform};
use reef_ast::{
    Address, BasicBlock, BlockAddress, Counters, ExpressionBlock, Program, Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The optimizations a driver run may apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Optimization {
    ConstantFolding,
    Propagation,
    AlgebraicSimplification,
    StrengthReduction,
    CommonSubexpression,
    DeadCode,
    ThreeAddressCode,
}

impl Optimization {
    /// The default optimization set. Three-address normalization is a
    /// lowering preparation and stays opt-in.
    pub fn default_set() -> BTreeSet<Optimization> {
        [
            Optimization::ConstantFolding,
            Optimization::Propagation,
            Optimization::AlgebraicSimplification,
            Optimization::StrengthReduction,
            Optimization::CommonSubexpression,
            Optimization::DeadCode,
        ]
        .into_iter()
        .collect()
    }

    pub fn all() -> BTreeSet<Optimization> {
        let mut set = Self::default_set();
        set.insert(Optimization::ThreeAddressCode);
        set
    }
}

/// How many sweeps the driver may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPolicy {
    /// Exactly one sweep.
    Once,
    /// Sweep until stable, but at most `max_rounds` times.
    ToFixedPoint { max_rounds: u32 },
}

impl Default for RoundPolicy {
    fn default() -> Self {
        RoundPolicy::ToFixedPoint { max_rounds: 32 }
    }
}

/// Driver configuration: the enabled pass set, the round policy, a scoping
/// address restricting where rewrites may happen, and the variables assumed
/// live when a body exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    pub passes: BTreeSet<Optimization>,
    pub rounds: RoundPolicy,
    pub scope: Address,
    pub live_on_exit: BTreeSet<Variable>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        OptimizeConfig {
            passes: Optimization::default_set(),
            rounds: RoundPolicy::default(),
            scope: Address::Program,
            live_on_exit: BTreeSet::new(),
        }
    }
}

/// Receives every command the driver emits, in application order.
pub trait CommandSink {
    fn record(&mut self, command: Command);
}

impl CommandSink for Vec<Command> {
    fn record(&mut self, command: Command) {
        self.push(command);
    }
}

/// Discards the log.
pub struct NullSink;

impl CommandSink for NullSink {
    fn record(&mut self, _command: Command) {}
}

struct SweepTransform<'a> {
    passes: &'a BTreeSet<Optimization>,
    scope: &'a Address,
    counters: &'a mut Counters,
    commands: &'a mut Vec<Command>,
}

impl SweepTransform<'_> {
    fn enabled(&self, pass: Optimization) -> bool {
        self.passes.contains(&pass)
    }

    fn in_scope(&self, address: &BlockAddress) -> bool {
        self.scope.overlaps(&Address::Block(address.clone()))
    }
}

impl BlockTransform for SweepTransform<'_> {
    fn basic(&mut self, block: BasicBlock, address: &BlockAddress) -> BasicBlock {
        if !self.in_scope(address) {
            return block;
        }
        let passes = self.passes;
        let mut ctx = BlockContext {
            address: address.clone(),
            counters: &mut *self.counters,
            commands: &mut *self.commands,
        };
        let mut block = block;
        if passes.contains(&Optimization::Propagation) {
            block = propagate::basic(&block, &mut ctx);
        }
        if passes.contains(&Optimization::ConstantFolding) {
            block = fold::basic(&block, &mut ctx);
        }
        if passes.contains(&Optimization::AlgebraicSimplification) {
            block = algebraic::basic(&block, &mut ctx);
        }
        if passes.contains(&Optimization::StrengthReduction) {
            block = strength::basic(&block, &mut ctx);
        }
        if passes.contains(&Optimization::CommonSubexpression) {
            block = cse::basic(&block, &mut ctx);
        }
        if passes.contains(&Optimization::ThreeAddressCode) {
            block = three_address::basic(&block, &mut ctx);
        }
        block
    }

    fn guard(&mut self, block: ExpressionBlock, address: &BlockAddress) -> ExpressionBlock {
        if !self.in_scope(address) {
            return block;
        }
        let passes = self.passes;
        let mut ctx = BlockContext {
            address: address.clone(),
            counters: &mut *self.counters,
            commands: &mut *self.commands,
        };
        let mut block = block;
        if passes.contains(&Optimization::Propagation) {
            block = propagate::guard(&block, &mut ctx);
        }
        if passes.contains(&Optimization::ConstantFolding) {
            block = fold::guard(&block, &mut ctx);
        }
        if passes.contains(&Optimization::AlgebraicSimplification) {
            block = algebraic::guard(&block, &mut ctx);
        }
        if passes.contains(&Optimization::StrengthReduction) {
            block = strength::guard(&block, &mut ctx);
        }
        if passes.contains(&Optimization::CommonSubexpression) {
            block = cse::guard(&block, &mut ctx);
        }
        if passes.contains(&Optimization::ThreeAddressCode) {
            block = three_address::guard(&block, &mut ctx);
        }
        block
    }
}

struct DeadCodeTransform<'a> {
    liveness: &'a analysis::Liveness,
    scope: &'a Address,
    commands: &'a mut Vec<Command>,
    counters: &'a mut Counters,
}

impl BlockTransform for DeadCodeTransform<'_> {
    fn basic(&mut self, block: BasicBlock, address: &BlockAddress) -> BasicBlock {
        if !self.scope.overlaps(&Address::Block(address.clone())) {
            return block;
        }
        let live_out = self.liveness.live_out(block.id);
        let mut ctx = BlockContext {
            address: address.clone(),
            counters: self.counters,
            commands: self.commands,
        };
        dead_code::basic(&block, &mut ctx, &live_out)
    }

    fn guard(&mut self, block: ExpressionBlock, address: &BlockAddress) -> ExpressionBlock {
        if !self.scope.overlaps(&Address::Block(address.clone())) {
            return block;
        }
        let live_out = self.liveness.live_out(block.id());
        let mut ctx = BlockContext {
            address: address.clone(),
            counters: self.counters,
            commands: self.commands,
        };
        dead_code::guard(&block, &mut ctx, &live_out)
    }
}

fn run_sweep(
    program: &Program,
    config: &OptimizeConfig,
    commands: &mut Vec<Command>,
) -> OptimizeResult<Program> {
    let mut next = program.clone();
    for body_addr in program.body_addresses() {
        if !config.scope.overlaps(&Address::Body(body_addr.clone())) {
            continue;
        }
        let Some(body) = next.body_mut(&body_addr) else {
            continue;
        };
        let root = body_addr.root();

        let mut counters = body.counters;
        let mut sweep = SweepTransform {
            passes: &config.passes,
            scope: &config.scope,
            counters: &mut counters,
            commands,
        };
        body.compound = rewrite_all_blocks(&body.compound, &root, &mut sweep);
        body.counters = counters;

        if config.passes.contains(&Optimization::DeadCode) {
            let liveness = analysis::analyze(&body.compound, &body.cfg, &config.live_on_exit);
            let mut counters = body.counters;
            let mut dead = DeadCodeTransform {
                liveness: &liveness,
                scope: &config.scope,
                commands,
                counters: &mut counters,
            };
            body.compound = rewrite_all_blocks(&body.compound, &root, &mut dead);
            body.counters = counters;

            // The two whole-Compound passes need the whole body in scope.
            if config.scope.contains(&Address::Compound(root.clone())) {
                let (cleaned, shape_changed) =
                    unreachable::run(&body.compound, &root, commands);
                body.compound = cleaned;
                body.compound = declarations::run(&body.compound, &root, commands);
                if shape_changed {
                    cfg::refresh_body(body)?;
                }
            }
        }
    }
    Ok(next)
}

/// Run the configured passes over `program`, recording every command into
/// `sink`. Returns the optimized program.
pub fn optimize(
    program: &Program,
    config: &OptimizeConfig,
    sink: &mut dyn CommandSink,
) -> OptimizeResult<Program> {
    let rounds = match config.rounds {
        RoundPolicy::Once => 1,
        RoundPolicy::ToFixedPoint { max_rounds } => max_rounds,
    };
    let mut current = program.clone();
    for _ in 0..rounds {
        let mut commands = Vec::new();
        current = run_sweep(&current, config, &mut commands)?;
        let emitted = commands.len();
        for command in commands {
            sink.record(command);
        }
        if emitted == 0 {
            break;
        }
    }
    Ok(current)
}
