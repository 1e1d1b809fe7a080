//! Block-local common-subexpression elimination.
//!
//! Tracks side-effect-free compound expressions seen within one block. On a
//! structurally identical repeat, a temporary is introduced lazily: an
//! assignment is hoisted before the first occurrence's statement and both
//! occurrences read the temporary instead. Tracking for an expression dies
//! the instant any variable it reads is reassigned; member-reading entries
//! die on any member store or side-effecting statement.

use super::BlockContext;
use crate::command::{Command, CounterSnapshot, PassTag};
use crate::rewrite::visitor::{has_side_effect, reads_member, variable_reads};
use indexmap::IndexMap;
use reef_ast::{
    BasicBlock, BasicStatement, BasicStatementAddress, ExprPath, Expression, ExpressionBlock,
    Target, Variable,
};
use std::collections::BTreeSet;

/// Where an expression was first seen.
#[derive(Clone, PartialEq)]
enum FirstAt {
    /// An already-rebuilt statement at this output index.
    Statement(usize),
    /// Inside the statement currently being rebuilt.
    Current,
    /// Inside the guard condition (always the last thing evaluated).
    Condition,
}

#[derive(Clone)]
struct Occurrence {
    first: FirstAt,
    path: ExprPath,
    temp: Option<Variable>,
    reads: BTreeSet<Variable>,
    uses_member: bool,
}

struct Cse<'a, 'c> {
    ctx: &'a mut BlockContext<'c>,
    seen: IndexMap<Expression, Occurrence>,
    out: Vec<BasicStatement>,
    /// Patches against the statement currently being rebuilt.
    pending: Vec<(ExprPath, Expression)>,
    in_condition: bool,
}

impl Cse<'_, '_> {
    fn current_address(&self) -> BasicStatementAddress {
        if self.in_condition {
            self.ctx.address.condition()
        } else {
            self.ctx.address.at(self.out.len())
        }
    }

    /// Introduce the temporary for `key` and rewrite its first occurrence.
    fn materialize(&mut self, key: &Expression, occurrence: Occurrence) -> Variable {
        let insert_index = match occurrence.first {
            FirstAt::Statement(index) => index,
            FirstAt::Current | FirstAt::Condition => self.out.len(),
        };

        let before = *self.ctx.counters;
        let name = self.ctx.counters.fresh_temp_name();
        let after = *self.ctx.counters;
        let temp = Variable::new(name, 0, key.ty());
        let hoisted = BasicStatement::Assignment {
            target: Target::Variable(temp.clone()),
            value: key.clone(),
        };
        self.ctx.commands.push(Command::InsertStatement {
            pass: PassTag::CommonSubexpression,
            address: self.ctx.address.at(insert_index),
            statement: hoisted.clone(),
            counters: Some(CounterSnapshot { before, after }),
        });
        self.out.insert(insert_index, hoisted);

        for tracked in self.seen.values_mut() {
            if let FirstAt::Statement(index) = &mut tracked.first {
                if *index >= insert_index {
                    *index += 1;
                }
            }
        }

        // Rewrite the first occurrence to read the temporary.
        let temp_read = Expression::variable(temp.clone());
        let first = match occurrence.first {
            FirstAt::Statement(index) => {
                let shifted = index + 1;
                self.ctx.commands.push(Command::ReplaceExpression {
                    pass: PassTag::CommonSubexpression,
                    address: self.ctx.address.at(shifted).expression(occurrence.path.clone()),
                    before: key.clone(),
                    after: temp_read.clone(),
                });
                self.out[shifted] =
                    patch_statement(&self.out[shifted], &occurrence.path, &temp_read);
                FirstAt::Statement(shifted)
            }
            FirstAt::Current => {
                self.ctx.commands.push(Command::ReplaceExpression {
                    pass: PassTag::CommonSubexpression,
                    address: self
                        .ctx
                        .address
                        .at(self.out.len())
                        .expression(occurrence.path.clone()),
                    before: key.clone(),
                    after: temp_read.clone(),
                });
                self.pending
                    .push((occurrence.path.clone(), temp_read.clone()));
                FirstAt::Current
            }
            FirstAt::Condition => {
                self.ctx.commands.push(Command::ReplaceExpression {
                    pass: PassTag::CommonSubexpression,
                    address: self
                        .ctx
                        .address
                        .condition()
                        .expression(occurrence.path.clone()),
                    before: key.clone(),
                    after: temp_read.clone(),
                });
                self.pending
                    .push((occurrence.path.clone(), temp_read.clone()));
                FirstAt::Condition
            }
        };

        // Tracked expressions containing the key now contain the temporary.
        let old = std::mem::take(&mut self.seen);
        for (tracked_key, mut tracked) in old {
            if tracked_key == *key {
                tracked.temp = Some(temp.clone());
                tracked.first = first.clone();
                self.seen.insert(tracked_key, tracked);
            } else {
                let substituted = substitute(&tracked_key, key, &temp_read);
                if substituted != tracked_key {
                    tracked.reads = variable_reads(&substituted);
                    tracked.uses_member = reads_member(&substituted);
                }
                self.seen.insert(substituted, tracked);
            }
        }

        temp
    }

    /// Post-order handler: children of `rebuilt` are already processed.
    fn handle(&mut self, rebuilt: Expression, path: &ExprPath) -> Expression {
        if rebuilt.is_atomic() || has_side_effect(&rebuilt) {
            return rebuilt;
        }
        if let Some(occurrence) = self.seen.get(&rebuilt).cloned() {
            let temp = match occurrence.temp.clone() {
                Some(temp) => temp,
                None => self.materialize(&rebuilt, occurrence),
            };
            let temp_read = Expression::variable(temp);
            self.ctx.commands.push(Command::ReplaceExpression {
                pass: PassTag::CommonSubexpression,
                address: self.current_address().expression(path.clone()),
                before: rebuilt,
                after: temp_read.clone(),
            });
            return temp_read;
        }
        self.seen.insert(
            rebuilt.clone(),
            Occurrence {
                first: if self.in_condition {
                    FirstAt::Condition
                } else {
                    FirstAt::Current
                },
                path: path.clone(),
                temp: None,
                reads: variable_reads(&rebuilt),
                uses_member: reads_member(&rebuilt),
            },
        );
        rebuilt
    }

    fn rewrite(&mut self, expr: &Expression, path: &mut ExprPath) -> Expression {
        let mut rebuilt = expr.clone();
        for index in 0..expr.child_count() {
            let Some(child) = rebuilt.child(index).cloned() else {
                continue;
            };
            path.push(index as u32);
            let replaced = self.rewrite(&child, path);
            path.pop();
            if let Some(next) = rebuilt.replace_child(index, replaced) {
                rebuilt = next;
            }
        }
        self.handle(rebuilt, path)
    }

    fn rewrite_slot(&mut self, expr: &Expression, slot: u32) -> Expression {
        let mut path = ExprPath::root(slot);
        self.rewrite(expr, &mut path)
    }

    fn finish_statement(&mut self, statement: BasicStatement) {
        let mut statement = statement;
        for (path, replacement) in std::mem::take(&mut self.pending) {
            statement = patch_statement(&statement, &path, &replacement);
        }
        let index = self.out.len();
        for tracked in self.seen.values_mut() {
            if tracked.first == FirstAt::Current {
                tracked.first = FirstAt::Statement(index);
            }
        }
        self.invalidate_after(&statement);
        self.out.push(statement);
    }

    /// Kill tracking invalidated by this (already rebuilt) statement.
    fn invalidate_after(&mut self, statement: &BasicStatement) {
        match statement {
            BasicStatement::Assignment {
                target: Target::Variable(v),
                value,
            } => {
                let assigned = v.clone();
                self.seen
                    .retain(|_, occ| !occ.reads.contains(&assigned));
                if has_side_effect(value) {
                    self.seen.retain(|_, occ| !occ.uses_member);
                }
            }
            BasicStatement::Assignment {
                target: Target::Member { .. },
                ..
            } => {
                self.seen.retain(|_, occ| !occ.uses_member);
            }
            BasicStatement::Declaration { variables } => {
                for variable in variables {
                    self.seen.retain(|_, occ| !occ.reads.contains(variable));
                }
            }
            BasicStatement::Expression { value } => {
                if has_side_effect(value) {
                    self.seen.retain(|_, occ| !occ.uses_member);
                }
            }
        }
    }

    fn process(&mut self, statement: &BasicStatement) {
        let rebuilt = match statement {
            BasicStatement::Assignment { target, value } => {
                let value = self.rewrite_slot(value, 0);
                let target = match target {
                    Target::Member { object, member, ty } => Target::Member {
                        object: self.rewrite_slot(object, 1),
                        member: member.clone(),
                        ty: ty.clone(),
                    },
                    Target::Variable(v) => Target::Variable(v.clone()),
                };
                BasicStatement::Assignment { target, value }
            }
            BasicStatement::Declaration { variables } => BasicStatement::Declaration {
                variables: variables.clone(),
            },
            BasicStatement::Expression { value } => BasicStatement::Expression {
                value: self.rewrite_slot(value, 0),
            },
        };
        self.finish_statement(rebuilt);
    }
}

/// Replace the node at `path` (root slot plus child indices).
fn patch_statement(
    statement: &BasicStatement,
    path: &ExprPath,
    replacement: &Expression,
) -> BasicStatement {
    let Some(slot) = path.head() else {
        return statement.clone();
    };
    let rest = path.tail();
    match (statement, slot) {
        (BasicStatement::Assignment { target, value }, 0) => BasicStatement::Assignment {
            target: target.clone(),
            value: patch_expression(value, rest, replacement),
        },
        (
            BasicStatement::Assignment {
                target: Target::Member { object, member, ty },
                value,
            },
            1,
        ) => BasicStatement::Assignment {
            target: Target::Member {
                object: patch_expression(object, rest, replacement),
                member: member.clone(),
                ty: ty.clone(),
            },
            value: value.clone(),
        },
        (BasicStatement::Expression { value }, 0) => BasicStatement::Expression {
            value: patch_expression(value, rest, replacement),
        },
        _ => statement.clone(),
    }
}

fn patch_expression(expr: &Expression, path: &[u32], replacement: &Expression) -> Expression {
    let Some((&index, rest)) = path.split_first() else {
        return replacement.clone();
    };
    match expr.child(index as usize) {
        Some(child) => {
            let patched = patch_expression(child, rest, replacement);
            expr.replace_child(index as usize, patched)
                .unwrap_or_else(|| expr.clone())
        }
        None => expr.clone(),
    }
}

/// Replace every subtree equal to `needle` with `replacement`.
fn substitute(expr: &Expression, needle: &Expression, replacement: &Expression) -> Expression {
    if expr == needle {
        return replacement.clone();
    }
    let mut rebuilt = expr.clone();
    for index in 0..expr.child_count() {
        if let Some(child) = rebuilt.child(index).cloned() {
            let replaced = substitute(&child, needle, replacement);
            if let Some(next) = rebuilt.replace_child(index, replaced) {
                rebuilt = next;
            }
        }
    }
    rebuilt
}

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    let mut cse = Cse {
        ctx,
        seen: IndexMap::new(),
        out: Vec::new(),
        pending: Vec::new(),
        in_condition: false,
    };
    for statement in &block.statements {
        cse.process(statement);
    }
    BasicBlock::new(block.id, cse.out)
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    let mut cse = Cse {
        ctx,
        seen: IndexMap::new(),
        out: Vec::new(),
        pending: Vec::new(),
        in_condition: false,
    };
    for statement in &block.block.statements {
        cse.process(statement);
    }
    cse.in_condition = true;
    let mut condition = cse.rewrite_slot(&block.condition, 0);
    for (path, replacement) in std::mem::take(&mut cse.pending) {
        if let Some(slot) = path.head() {
            if slot == 0 {
                condition = patch_expression(&condition, path.tail(), &replacement);
            }
        }
    }
    ExpressionBlock {
        block: BasicBlock::new(block.block.id, cse.out),
        condition,
    }
}
