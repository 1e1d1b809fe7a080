//! The command log: tagged, addressed, invertible edit records.
//!
//! Commands are plain serializable data; [`apply`] and [`revert`] are free
//! functions pattern-matching on the variant. Structural variants
//! (`RemoveCompoundStatement`, `ReplaceCompound`) carry no before-image and
//! have no revert — callers needing full undo replay from the start.

use crate::cfg;
use crate::error::{OptimizeError, OptimizeResult};
use crate::rewrite;
use reef_ast::{
    Address, BasicStatement, BasicStatementAddress, BodyAddress, Body, Compound, CompoundAddress,
    Counters, Expression, ExpressionAddress, Program, StatementAddress,
};
use serde::{Deserialize, Serialize};

/// Which pass produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassTag {
    AlgebraicSimplification,
    ConstantFolding,
    Propagation,
    CommonSubexpression,
    StrengthReduction,
    ThreeAddressCode,
    DeadCode,
    UnreachableCode,
    Declarations,
}

/// Before/after snapshot of a body's counter record, restored on revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub before: Counters,
    pub after: Counters,
}

/// One recorded, addressed, elementary edit to a Program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    ReplaceExpression {
        pass: PassTag,
        address: ExpressionAddress,
        before: Expression,
        after: Expression,
    },
    ReplaceStatement {
        pass: PassTag,
        address: BasicStatementAddress,
        before: BasicStatement,
        after: BasicStatement,
    },
    InsertStatement {
        pass: PassTag,
        address: BasicStatementAddress,
        statement: BasicStatement,
        counters: Option<CounterSnapshot>,
    },
    RemoveStatement {
        pass: PassTag,
        address: BasicStatementAddress,
        statement: BasicStatement,
    },
    /// Structural removal (code after return, emptied blocks); no revert.
    RemoveCompoundStatement {
        pass: PassTag,
        address: StatementAddress,
    },
    /// Structural replacement (branch inlining, block merging); no revert.
    ReplaceCompound {
        pass: PassTag,
        address: CompoundAddress,
        after: Compound,
    },
}

impl Command {
    pub fn pass(&self) -> PassTag {
        match self {
            Command::ReplaceExpression { pass, .. }
            | Command::ReplaceStatement { pass, .. }
            | Command::InsertStatement { pass, .. }
            | Command::RemoveStatement { pass, .. }
            | Command::RemoveCompoundStatement { pass, .. }
            | Command::ReplaceCompound { pass, .. } => *pass,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Command::ReplaceExpression { address, .. } => Address::Expression(address.clone()),
            Command::ReplaceStatement { address, .. }
            | Command::InsertStatement { address, .. }
            | Command::RemoveStatement { address, .. } => Address::Basic(address.clone()),
            Command::RemoveCompoundStatement { address, .. } => {
                Address::Statement(address.clone())
            }
            Command::ReplaceCompound { address, .. } => Address::Compound(address.clone()),
        }
    }

    pub fn body_address(&self) -> &BodyAddress {
        match self {
            Command::ReplaceExpression { address, .. } => {
                &address.statement.block.statement.compound.body
            }
            Command::ReplaceStatement { address, .. }
            | Command::InsertStatement { address, .. }
            | Command::RemoveStatement { address, .. } => &address.block.statement.compound.body,
            Command::RemoveCompoundStatement { address, .. } => &address.compound.body,
            Command::ReplaceCompound { address, .. } => &address.body,
        }
    }

    /// Whether [`revert`] can reconstruct the pre-state.
    pub fn is_revertible(&self) -> bool {
        !matches!(
            self,
            Command::RemoveCompoundStatement { .. } | Command::ReplaceCompound { .. }
        )
    }
}

fn set_counters(program: &Program, address: &BodyAddress, counters: Counters) -> OptimizeResult<Program> {
    rewrite::rewrite_body_at(program, address, |body| Body {
        arguments: body.arguments.clone(),
        compound: body.compound.clone(),
        cfg: body.cfg.clone(),
        counters,
    })
}

fn refresh_cfg(program: &mut Program, address: &BodyAddress) -> OptimizeResult<()> {
    let body = program
        .body_mut(address)
        .ok_or_else(|| OptimizeError::UnknownBody(address.clone()))?;
    cfg::refresh_body(body)
}

/// Apply one command to a program. Shape-changing commands recompute the
/// affected body's CFG.
pub fn apply(command: &Command, program: &Program) -> OptimizeResult<Program> {
    match command {
        Command::ReplaceExpression {
            address,
            before,
            after,
            ..
        } => {
            let mut stale = false;
            let next = rewrite::rewrite_expression_at(program, address, |current| {
                if current != before {
                    stale = true;
                    current.clone()
                } else {
                    after.clone()
                }
            })?;
            if stale {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            Ok(next)
        }
        Command::ReplaceStatement {
            address,
            before,
            after,
            ..
        } => {
            let mut stale = false;
            let next = rewrite::rewrite_basic_statement_at(program, address, |current| {
                if current != before {
                    stale = true;
                    current.clone()
                } else {
                    after.clone()
                }
            })?;
            if stale {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            Ok(next)
        }
        Command::InsertStatement {
            address,
            statement,
            counters,
            ..
        } => {
            let mut next = rewrite::insert_basic_statement(program, address, statement)?;
            if let Some(snapshot) = counters {
                next = set_counters(&next, command.body_address(), snapshot.after)?;
            }
            Ok(next)
        }
        Command::RemoveStatement {
            address, statement, ..
        } => {
            let (next, removed) = rewrite::remove_basic_statement(program, address)?;
            if &removed != statement {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            Ok(next)
        }
        Command::RemoveCompoundStatement { address, .. } => {
            let mut next = rewrite::remove_compound_statement(program, address)?;
            refresh_cfg(&mut next, command.body_address())?;
            Ok(next)
        }
        Command::ReplaceCompound { address, after, .. } => {
            let mut next = rewrite::rewrite_compound_at(program, address, |_| after.clone())?;
            refresh_cfg(&mut next, command.body_address())?;
            Ok(next)
        }
    }
}

/// Revert one command. `Ok(None)` marks the structurally destructive
/// variants whose pre-state is not reconstructible from the result.
pub fn revert(command: &Command, program: &Program) -> OptimizeResult<Option<Program>> {
    match command {
        Command::ReplaceExpression {
            address,
            before,
            after,
            ..
        } => {
            let mut stale = false;
            let next = rewrite::rewrite_expression_at(program, address, |current| {
                if current != after {
                    stale = true;
                    current.clone()
                } else {
                    before.clone()
                }
            })?;
            if stale {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            Ok(Some(next))
        }
        Command::ReplaceStatement {
            address,
            before,
            after,
            ..
        } => {
            let mut stale = false;
            let next = rewrite::rewrite_basic_statement_at(program, address, |current| {
                if current != after {
                    stale = true;
                    current.clone()
                } else {
                    before.clone()
                }
            })?;
            if stale {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            Ok(Some(next))
        }
        Command::InsertStatement {
            address,
            statement,
            counters,
            ..
        } => {
            let (mut next, removed) = rewrite::remove_basic_statement(program, address)?;
            if &removed != statement {
                return Err(OptimizeError::StaleCommand(command.address()));
            }
            if let Some(snapshot) = counters {
                next = set_counters(&next, command.body_address(), snapshot.before)?;
            }
            Ok(Some(next))
        }
        Command::RemoveStatement {
            address, statement, ..
        } => {
            let next = rewrite::insert_basic_statement(program, address, statement)?;
            Ok(Some(next))
        }
        Command::RemoveCompoundStatement { .. } | Command::ReplaceCompound { .. } => Ok(None),
    }
}

/// Revert, failing when no pre-state is reconstructible. Callers that can
/// tolerate the gap should use [`revert`] and fall back to a full replay.
pub fn revert_strict(command: &Command, program: &Program) -> OptimizeResult<Program> {
    revert(command, program)?
        .ok_or_else(|| OptimizeError::RevertUnavailable(command.address()))
}
