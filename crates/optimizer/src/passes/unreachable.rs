//! Unreachable-code elimination (whole-Compound pass).
//!
//! Drops statements after a `return`, resolves literal `if`/`while` guards
//! by inlining the taken branch, removes emptied basic blocks, and merges
//! basic blocks made adjacent by inlining. Plain removals are recorded as
//! `RemoveCompoundStatement`; inlining and merging replace the whole
//! compound in one structural, non-revertible command. A literal guard with
//! a non-empty guard-evaluation block keeps those statements as a plain
//! block reusing the guard's id.

use crate::command::{Command, PassTag};
use reef_ast::{
    BasicBlock, BranchKind, Compound, CompoundAddress, CompoundStatement, IfStatement, Literal,
    WhileStatement,
};

/// Clean `compound` and every nested branch. Returns the cleaned compound
/// and whether the statement shape changed anywhere (the driver recomputes
/// the CFG if so).
pub fn run(
    compound: &Compound,
    address: &CompoundAddress,
    commands: &mut Vec<Command>,
) -> (Compound, bool) {
    clean(compound, address, commands)
}

fn literal_guard(condition: &reef_ast::Expression) -> Option<bool> {
    match condition.as_literal() {
        Some(Literal::Bool(value)) => Some(*value),
        _ => None,
    }
}

fn push_merged(result: &mut Vec<CompoundStatement>, statement: CompoundStatement, merged: &mut bool) {
    if let (Some(CompoundStatement::Basic(previous)), CompoundStatement::Basic(next)) =
        (result.last_mut(), &statement)
    {
        previous.statements.extend(next.statements.iter().cloned());
        *merged = true;
        return;
    }
    result.push(statement);
}

fn clean(
    compound: &Compound,
    address: &CompoundAddress,
    commands: &mut Vec<Command>,
) -> (Compound, bool) {
    let mut changed = false;

    // Nested branches first; their commands address the original positions,
    // which outer edits only touch afterwards.
    let mut statements: Vec<CompoundStatement> = Vec::with_capacity(compound.statements.len());
    for (i, statement) in compound.statements.iter().enumerate() {
        let cleaned = match statement {
            CompoundStatement::If(s) => {
                let (then_branch, c1) =
                    clean(&s.then_branch, &address.enter(i, BranchKind::Then), commands);
                let (else_branch, c2) =
                    clean(&s.else_branch, &address.enter(i, BranchKind::Else), commands);
                changed |= c1 | c2;
                CompoundStatement::If(IfStatement {
                    condition: s.condition.clone(),
                    then_branch,
                    else_branch,
                })
            }
            CompoundStatement::While(s) => {
                let (body, c) = clean(&s.body, &address.enter(i, BranchKind::Loop), commands);
                changed |= c;
                CompoundStatement::While(WhileStatement {
                    condition: s.condition.clone(),
                    body,
                })
            }
            other => other.clone(),
        };
        statements.push(cleaned);
    }

    // Everything after a return never runs.
    if let Some(position) = statements
        .iter()
        .position(|s| matches!(s, CompoundStatement::Return(_)))
    {
        let extra = statements.len() - position - 1;
        for _ in 0..extra {
            commands.push(Command::RemoveCompoundStatement {
                pass: PassTag::UnreachableCode,
                address: address.statement(position + 1),
            });
        }
        statements.truncate(position + 1);
        changed |= extra > 0;
    }

    // Resolve literal guards, drop emptied blocks, merge what inlining makes
    // adjacent.
    let mut result: Vec<CompoundStatement> = Vec::with_capacity(statements.len());
    let mut removals: Vec<usize> = Vec::new();
    let mut structural = false;
    for (index, statement) in statements.iter().enumerate() {
        match statement {
            CompoundStatement::Basic(block) if block.statements.is_empty() => {
                removals.push(index);
            }
            CompoundStatement::If(s) if literal_guard(&s.condition.condition).is_some() => {
                structural = true;
                if !s.condition.block.statements.is_empty() {
                    push_merged(
                        &mut result,
                        CompoundStatement::Basic(BasicBlock::new(
                            s.condition.id(),
                            s.condition.block.statements.clone(),
                        )),
                        &mut structural,
                    );
                }
                let taken = if literal_guard(&s.condition.condition) == Some(true) {
                    &s.then_branch
                } else {
                    &s.else_branch
                };
                for inner in &taken.statements {
                    push_merged(&mut result, inner.clone(), &mut structural);
                }
            }
            CompoundStatement::While(s) if literal_guard(&s.condition.condition) == Some(false) => {
                if s.condition.block.statements.is_empty() {
                    removals.push(index);
                } else {
                    structural = true;
                    push_merged(
                        &mut result,
                        CompoundStatement::Basic(BasicBlock::new(
                            s.condition.id(),
                            s.condition.block.statements.clone(),
                        )),
                        &mut structural,
                    );
                }
            }
            other => push_merged(&mut result, other.clone(), &mut structural),
        }
    }

    if structural {
        let cleaned = Compound::new(result);
        commands.push(Command::ReplaceCompound {
            pass: PassTag::UnreachableCode,
            address: address.clone(),
            after: cleaned.clone(),
        });
        return (cleaned, true);
    }

    if !removals.is_empty() {
        changed = true;
        for (already_removed, index) in removals.iter().enumerate() {
            commands.push(Command::RemoveCompoundStatement {
                pass: PassTag::UnreachableCode,
                address: address.statement(index - already_removed),
            });
        }
    }

    (Compound::new(result), changed)
}
