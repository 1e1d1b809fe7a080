//! Liveness-driven dead-assignment elimination.
//!
//! Walks each block backward from its live-out set, dropping assignments
//! whose target is not live. An assignment whose right-hand side has a side
//! effect degrades to a bare expression statement instead of disappearing.
//! Declarations are left for the narrowing pass.

use super::BlockContext;
use crate::analysis::statement_reads;
use crate::command::{Command, PassTag};
use crate::rewrite::visitor::{has_side_effect, variable_reads};
use reef_ast::{BasicBlock, BasicStatement, ExpressionBlock, Target, Variable};
use std::collections::BTreeSet;

enum Action {
    Keep,
    Remove,
    Degrade,
}

fn plan(block: &BasicBlock, mut live: BTreeSet<Variable>) -> Vec<Action> {
    let mut actions: Vec<Action> = Vec::with_capacity(block.statements.len());
    for statement in block.statements.iter().rev() {
        let action = match statement {
            BasicStatement::Assignment {
                target: Target::Variable(v),
                value,
            } => {
                if live.contains(v) {
                    live.remove(v);
                    live.extend(variable_reads(value));
                    Action::Keep
                } else if has_side_effect(value) {
                    live.extend(variable_reads(value));
                    Action::Degrade
                } else {
                    // Dead and pure: reads stay dead too.
                    Action::Remove
                }
            }
            other => {
                live.extend(statement_reads(other));
                Action::Keep
            }
        };
        actions.push(action);
    }
    actions.reverse();
    actions
}

fn rewrite(block: &BasicBlock, ctx: &mut BlockContext<'_>, live_out: BTreeSet<Variable>) -> BasicBlock {
    let actions = plan(block, live_out);

    // Emit in application order: descending indices keep earlier addresses
    // stable.
    for (index, action) in actions.iter().enumerate().rev() {
        let statement = &block.statements[index];
        match action {
            Action::Keep => {}
            Action::Remove => ctx.commands.push(Command::RemoveStatement {
                pass: PassTag::DeadCode,
                address: ctx.address.at(index),
                statement: statement.clone(),
            }),
            Action::Degrade => {
                if let BasicStatement::Assignment { value, .. } = statement {
                    ctx.commands.push(Command::ReplaceStatement {
                        pass: PassTag::DeadCode,
                        address: ctx.address.at(index),
                        before: statement.clone(),
                        after: BasicStatement::Expression {
                            value: value.clone(),
                        },
                    });
                }
            }
        }
    }

    let statements = block
        .statements
        .iter()
        .zip(actions.iter())
        .filter_map(|(statement, action)| match action {
            Action::Keep => Some(statement.clone()),
            Action::Remove => None,
            Action::Degrade => match statement {
                BasicStatement::Assignment { value, .. } => Some(BasicStatement::Expression {
                    value: value.clone(),
                }),
                other => Some(other.clone()),
            },
        })
        .collect();
    BasicBlock::new(block.id, statements)
}

pub fn basic(
    block: &BasicBlock,
    ctx: &mut BlockContext<'_>,
    live_out: &BTreeSet<Variable>,
) -> BasicBlock {
    rewrite(block, ctx, live_out.clone())
}

pub fn guard(
    block: &ExpressionBlock,
    ctx: &mut BlockContext<'_>,
    live_out: &BTreeSet<Variable>,
) -> ExpressionBlock {
    // The condition evaluates after every block statement.
    let mut live = live_out.clone();
    live.extend(variable_reads(&block.condition));
    ExpressionBlock {
        block: rewrite(&block.block, ctx, live),
        condition: block.condition.clone(),
    }
}
