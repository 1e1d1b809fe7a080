//! Addressed rewriting over the program tree.
//!
//! The descent functions here consume one address component per recursion
//! level and rebuild the spine of the tree around the replaced node, leaving
//! siblings untouched. Every addressed entry point wraps its transform in a
//! [`TransformGuard`]: resolving to zero nodes or transforming more than one
//! is a contract violation and fails loudly.

pub mod visitor;

use crate::error::{OptimizeError, OptimizeResult};
use reef_ast::{
    Address, BasicBlock, BasicStatement, BasicStatementAddress, BlockAddress, BlockKind, Body,
    BodyAddress, BodyKind, BranchKind, BranchStep, Compound, CompoundAddress, CompoundStatement,
    Expression, ExpressionAddress, ExpressionBlock, IfStatement, Program, ReturnStatement,
    StatementAddress, StatementPlace, Target, WhileStatement,
};

/// Invocation-counting wrapper around a transform callback. One address must
/// transform exactly one node; anything else surfaces an addressing bug.
pub struct TransformGuard<'a, T> {
    transform: Box<dyn FnMut(&T) -> T + 'a>,
    calls: u32,
}

impl<'a, T> TransformGuard<'a, T> {
    pub fn new(transform: impl FnMut(&T) -> T + 'a) -> Self {
        TransformGuard {
            transform: Box::new(transform),
            calls: 0,
        }
    }

    pub fn apply(&mut self, node: &T) -> T {
        self.calls += 1;
        (self.transform)(node)
    }

    /// Check that the transform ran exactly once.
    pub fn finish(self, address: &Address) -> OptimizeResult<()> {
        match self.calls {
            1 => Ok(()),
            0 => Err(OptimizeError::AddressNotFound(address.clone())),
            count => Err(OptimizeError::AmbiguousAddress {
                address: address.clone(),
                count,
            }),
        }
    }
}

/// Rewrite the body named by `address`, leaving every other body untouched.
pub fn rewrite_body_at(
    program: &Program,
    address: &BodyAddress,
    f: impl FnOnce(&Body) -> Body,
) -> OptimizeResult<Program> {
    let mut next = program.clone();
    let class = next
        .classes
        .iter_mut()
        .find(|c| c.id == address.class)
        .ok_or_else(|| OptimizeError::UnknownBody(address.clone()))?;
    let body = match &address.kind {
        BodyKind::Constructor(index) => class.constructors.get_mut(*index),
        BodyKind::Method(name) => class
            .methods
            .iter_mut()
            .find(|m| &m.name == name)
            .map(|m| &mut m.body),
    }
    .ok_or_else(|| OptimizeError::UnknownBody(address.clone()))?;
    *body = f(body);
    Ok(next)
}

/// Descend a branch-step path, rebuilding the spine around the replaced
/// nested compound. `None` when a step names a missing statement or a
/// branch the statement does not have.
fn descend_compound(
    compound: &Compound,
    branches: &[BranchStep],
    g: &mut dyn FnMut(&Compound) -> Option<Compound>,
) -> Option<Compound> {
    let Some((step, rest)) = branches.split_first() else {
        return g(compound);
    };
    let statement = compound.statements.get(step.statement)?;
    let replaced = match (statement, step.branch) {
        (CompoundStatement::If(s), BranchKind::Then) => CompoundStatement::If(IfStatement {
            condition: s.condition.clone(),
            then_branch: descend_compound(&s.then_branch, rest, g)?,
            else_branch: s.else_branch.clone(),
        }),
        (CompoundStatement::If(s), BranchKind::Else) => CompoundStatement::If(IfStatement {
            condition: s.condition.clone(),
            then_branch: s.then_branch.clone(),
            else_branch: descend_compound(&s.else_branch, rest, g)?,
        }),
        (CompoundStatement::While(s), BranchKind::Loop) => {
            CompoundStatement::While(WhileStatement {
                condition: s.condition.clone(),
                body: descend_compound(&s.body, rest, g)?,
            })
        }
        _ => return None,
    };
    let mut statements = compound.statements.clone();
    statements[step.statement] = replaced;
    Some(Compound::new(statements))
}

fn with_compound(
    program: &Program,
    address: &CompoundAddress,
    err_addr: &Address,
    g: &mut dyn FnMut(&Compound) -> Option<Compound>,
) -> OptimizeResult<Program> {
    let mut missing = false;
    let next = rewrite_body_at(program, &address.body, |body| {
        match descend_compound(&body.compound, &address.branches, g) {
            Some(compound) => Body {
                arguments: body.arguments.clone(),
                compound,
                cfg: body.cfg.clone(),
                counters: body.counters,
            },
            None => {
                missing = true;
                body.clone()
            }
        }
    })?;
    if missing {
        return Err(OptimizeError::AddressNotFound(err_addr.clone()));
    }
    Ok(next)
}

fn with_statement(
    program: &Program,
    address: &StatementAddress,
    err_addr: &Address,
    g: &mut dyn FnMut(&CompoundStatement) -> Option<CompoundStatement>,
) -> OptimizeResult<Program> {
    with_compound(program, &address.compound, err_addr, &mut |compound| {
        let statement = compound.statements.get(address.index)?;
        let replaced = g(statement)?;
        let mut statements = compound.statements.clone();
        statements[address.index] = replaced;
        Some(Compound::new(statements))
    })
}

/// Rebuild a guard-bearing statement around a transformed condition block.
fn map_guard(
    statement: &CompoundStatement,
    g: impl FnOnce(&ExpressionBlock) -> Option<ExpressionBlock>,
) -> Option<CompoundStatement> {
    match statement {
        CompoundStatement::If(s) => Some(CompoundStatement::If(IfStatement {
            condition: g(&s.condition)?,
            then_branch: s.then_branch.clone(),
            else_branch: s.else_branch.clone(),
        })),
        CompoundStatement::While(s) => Some(CompoundStatement::While(WhileStatement {
            condition: g(&s.condition)?,
            body: s.body.clone(),
        })),
        CompoundStatement::Return(s) => Some(CompoundStatement::Return(ReturnStatement {
            value: g(&s.value)?,
        })),
        CompoundStatement::Basic(_) => None,
    }
}

/// Rewrite the plain `BasicBlock` beneath a block address — the block itself
/// for `Basic`, the guard-evaluation block for `Guard`.
pub fn rewrite_inner_block_at(
    program: &Program,
    address: &BlockAddress,
    f: impl FnMut(&BasicBlock) -> BasicBlock,
) -> OptimizeResult<Program> {
    let err_addr = Address::Block(address.clone());
    let mut guard = TransformGuard::new(f);
    let next = with_statement(program, &address.statement, &err_addr, &mut |statement| {
        match (statement, address.kind) {
            (CompoundStatement::Basic(block), BlockKind::Basic) => {
                Some(CompoundStatement::Basic(guard.apply(block)))
            }
            (_, BlockKind::Guard) => map_guard(statement, |eb| {
                Some(ExpressionBlock {
                    block: guard.apply(&eb.block),
                    condition: eb.condition.clone(),
                })
            }),
            (_, BlockKind::Basic) => None,
        }
    })?;
    guard.finish(&err_addr)?;
    Ok(next)
}

/// Rewrite one basic statement. The place must be `At(_)`; the condition
/// slot is an expression, not a statement.
pub fn rewrite_basic_statement_at(
    program: &Program,
    address: &BasicStatementAddress,
    f: impl FnMut(&BasicStatement) -> BasicStatement,
) -> OptimizeResult<Program> {
    let err_addr = Address::Basic(address.clone());
    let StatementPlace::At(index) = address.place else {
        return Err(OptimizeError::AddressNotFound(err_addr));
    };
    let mut guard = TransformGuard::new(f);
    let next = {
        let guard = &mut guard;
        rewrite_inner_block_at(program, &address.block, move |block| {
            let mut statements = block.statements.clone();
            if let Some(statement) = block.statements.get(index) {
                statements[index] = guard.apply(statement);
            }
            BasicBlock::new(block.id, statements)
        })?
    };
    guard.finish(&err_addr)?;
    Ok(next)
}

/// Insert a basic statement at the addressed place (index == len appends).
pub fn insert_basic_statement(
    program: &Program,
    address: &BasicStatementAddress,
    statement: &BasicStatement,
) -> OptimizeResult<Program> {
    let err_addr = Address::Basic(address.clone());
    let StatementPlace::At(index) = address.place else {
        return Err(OptimizeError::AddressNotFound(err_addr));
    };
    let mut out_of_range = false;
    let next = rewrite_inner_block_at(program, &address.block, |block| {
        if index > block.statements.len() {
            out_of_range = true;
            return block.clone();
        }
        let mut statements = block.statements.clone();
        statements.insert(index, statement.clone());
        BasicBlock::new(block.id, statements)
    })?;
    if out_of_range {
        return Err(OptimizeError::AddressNotFound(err_addr));
    }
    Ok(next)
}

/// Remove the addressed basic statement, returning it alongside the new
/// program.
pub fn remove_basic_statement(
    program: &Program,
    address: &BasicStatementAddress,
) -> OptimizeResult<(Program, BasicStatement)> {
    let err_addr = Address::Basic(address.clone());
    let StatementPlace::At(index) = address.place else {
        return Err(OptimizeError::AddressNotFound(err_addr));
    };
    let mut removed = None;
    let next = rewrite_inner_block_at(program, &address.block, |block| {
        if index >= block.statements.len() {
            return block.clone();
        }
        let mut statements = block.statements.clone();
        removed = Some(statements.remove(index));
        BasicBlock::new(block.id, statements)
    })?;
    match removed {
        Some(statement) => Ok((next, statement)),
        None => Err(OptimizeError::AddressNotFound(err_addr)),
    }
}

/// Rewrite a whole (possibly nested) compound.
pub fn rewrite_compound_at(
    program: &Program,
    address: &CompoundAddress,
    f: impl FnMut(&Compound) -> Compound,
) -> OptimizeResult<Program> {
    let err_addr = Address::Compound(address.clone());
    let mut guard = TransformGuard::new(f);
    let next = with_compound(program, address, &err_addr, &mut |compound| {
        Some(guard.apply(compound))
    })?;
    guard.finish(&err_addr)?;
    Ok(next)
}

/// Remove the addressed compound statement from its compound.
pub fn remove_compound_statement(
    program: &Program,
    address: &StatementAddress,
) -> OptimizeResult<Program> {
    let err_addr = Address::Statement(address.clone());
    let mut found = false;
    let next = with_compound(program, &address.compound, &err_addr, &mut |compound| {
        if address.index >= compound.statements.len() {
            return None;
        }
        found = true;
        let mut statements = compound.statements.clone();
        statements.remove(address.index);
        Some(Compound::new(statements))
    })?;
    if !found {
        return Err(OptimizeError::AddressNotFound(err_addr));
    }
    Ok(next)
}

/// Descend an expression child path, rebuilding the spine.
fn descend_expression(
    expr: &Expression,
    path: &[u32],
    guard: &mut TransformGuard<Expression>,
) -> Option<Expression> {
    let Some((&index, rest)) = path.split_first() else {
        return Some(guard.apply(expr));
    };
    let child = expr.child(index as usize)?;
    let replaced = descend_expression(child, rest, guard)?;
    expr.replace_child(index as usize, replaced)
}

/// Rewrite a root slot of a basic statement: slot 0 is the value, slot 1 the
/// member-target object of an assignment.
fn rewrite_slot(
    statement: &BasicStatement,
    slot: u32,
    rest: &[u32],
    guard: &mut TransformGuard<Expression>,
) -> Option<BasicStatement> {
    match (statement, slot) {
        (BasicStatement::Assignment { target, value }, 0) => Some(BasicStatement::Assignment {
            target: target.clone(),
            value: descend_expression(value, rest, guard)?,
        }),
        (
            BasicStatement::Assignment {
                target: Target::Member { object, member, ty },
                value,
            },
            1,
        ) => Some(BasicStatement::Assignment {
            target: Target::Member {
                object: descend_expression(object, rest, guard)?,
                member: member.clone(),
                ty: ty.clone(),
            },
            value: value.clone(),
        }),
        (BasicStatement::Expression { value }, 0) => Some(BasicStatement::Expression {
            value: descend_expression(value, rest, guard)?,
        }),
        _ => None,
    }
}

/// Rewrite the expression node named by `address`.
pub fn rewrite_expression_at(
    program: &Program,
    address: &ExpressionAddress,
    f: impl FnMut(&Expression) -> Expression,
) -> OptimizeResult<Program> {
    let err_addr = Address::Expression(address.clone());
    let Some(slot) = address.path.head() else {
        return Err(OptimizeError::AddressNotFound(err_addr));
    };
    let rest = address.path.tail();
    let place = address.statement.place;
    let block_addr = &address.statement.block;
    let mut guard = TransformGuard::new(f);

    let next = with_statement(
        program,
        &block_addr.statement,
        &err_addr,
        &mut |statement| match (statement, block_addr.kind, place) {
            (CompoundStatement::Basic(block), BlockKind::Basic, StatementPlace::At(index)) => {
                let basic = block.statements.get(index)?;
                let replaced = rewrite_slot(basic, slot, rest, &mut guard)?;
                let mut statements = block.statements.clone();
                statements[index] = replaced;
                Some(CompoundStatement::Basic(BasicBlock::new(
                    block.id, statements,
                )))
            }
            (_, BlockKind::Guard, StatementPlace::At(index)) => map_guard(statement, |eb| {
                let basic = eb.block.statements.get(index)?;
                let replaced = rewrite_slot(basic, slot, rest, &mut guard)?;
                let mut statements = eb.block.statements.clone();
                statements[index] = replaced;
                Some(ExpressionBlock {
                    block: BasicBlock::new(eb.block.id, statements),
                    condition: eb.condition.clone(),
                })
            }),
            (_, BlockKind::Guard, StatementPlace::Condition) => {
                if slot != 0 {
                    return None;
                }
                map_guard(statement, |eb| {
                    Some(ExpressionBlock {
                        block: eb.block.clone(),
                        condition: descend_expression(&eb.condition, rest, &mut guard)?,
                    })
                })
            }
            _ => None,
        },
    )?;
    guard.finish(&err_addr)?;
    Ok(next)
}

/// Tree-order walker rebuilding every block of a compound, used by the
/// sweep. Each callback sees the block together with its address.
pub trait BlockTransform {
    fn basic(&mut self, block: BasicBlock, address: &BlockAddress) -> BasicBlock;
    fn guard(&mut self, block: ExpressionBlock, address: &BlockAddress) -> ExpressionBlock;
}

/// Rebuild `compound` by pushing every block (basic and guard alike) through
/// `transform`, descending into nested branches.
pub fn rewrite_all_blocks(
    compound: &Compound,
    address: &CompoundAddress,
    transform: &mut dyn BlockTransform,
) -> Compound {
    let statements = compound
        .statements
        .iter()
        .enumerate()
        .map(|(i, statement)| {
            let stmt_addr = address.statement(i);
            match statement {
                CompoundStatement::Basic(block) => {
                    CompoundStatement::Basic(transform.basic(block.clone(), &stmt_addr.basic()))
                }
                CompoundStatement::If(s) => CompoundStatement::If(IfStatement {
                    condition: transform.guard(s.condition.clone(), &stmt_addr.guard()),
                    then_branch: rewrite_all_blocks(
                        &s.then_branch,
                        &address.enter(i, BranchKind::Then),
                        transform,
                    ),
                    else_branch: rewrite_all_blocks(
                        &s.else_branch,
                        &address.enter(i, BranchKind::Else),
                        transform,
                    ),
                }),
                CompoundStatement::While(s) => CompoundStatement::While(WhileStatement {
                    condition: transform.guard(s.condition.clone(), &stmt_addr.guard()),
                    body: rewrite_all_blocks(
                        &s.body,
                        &address.enter(i, BranchKind::Loop),
                        transform,
                    ),
                }),
                CompoundStatement::Return(s) => CompoundStatement::Return(ReturnStatement {
                    value: transform.guard(s.value.clone(), &stmt_addr.guard()),
                }),
            }
        })
        .collect();
    Compound::new(statements)
}

/// A borrowed block, for read-only folds.
pub enum BlockRef<'a> {
    Basic(&'a BasicBlock),
    Guard(&'a ExpressionBlock),
}

/// Fold every block of a compound in tree order.
pub fn fold_blocks<'a>(
    compound: &'a Compound,
    address: &CompoundAddress,
    f: &mut dyn FnMut(BlockRef<'a>, &BlockAddress),
) {
    for (i, statement) in compound.statements.iter().enumerate() {
        let stmt_addr = address.statement(i);
        match statement {
            CompoundStatement::Basic(block) => f(BlockRef::Basic(block), &stmt_addr.basic()),
            CompoundStatement::If(s) => {
                f(BlockRef::Guard(&s.condition), &stmt_addr.guard());
                fold_blocks(&s.then_branch, &address.enter(i, BranchKind::Then), f);
                fold_blocks(&s.else_branch, &address.enter(i, BranchKind::Else), f);
            }
            CompoundStatement::While(s) => {
                f(BlockRef::Guard(&s.condition), &stmt_addr.guard());
                fold_blocks(&s.body, &address.enter(i, BranchKind::Loop), f);
            }
            CompoundStatement::Return(s) => f(BlockRef::Guard(&s.value), &stmt_addr.guard()),
        }
    }
}
