//! Block-local constant and copy propagation.
//!
//! Tracks, per block, each variable's last-known literal or copied variable
//! and substitutes on read. A binding dies on any assignment to its variable
//! or, for copies, to the variable it copies. Bindings reset at each block
//! boundary: propagation is deliberately block-local, not flow-global.

use super::{rewrite_slot_with_rule, BlockContext};
use crate::command::PassTag;
use reef_ast::{
    BasicBlock, BasicStatement, Expression, ExpressionBlock, Literal, Target, Variable,
};
use indexmap::IndexMap;

#[derive(Clone)]
enum Binding {
    Const(Literal),
    Copy(Variable),
}

struct Propagator<'a, 'c> {
    bindings: IndexMap<Variable, Binding>,
    ctx: &'a mut BlockContext<'c>,
}

impl Propagator<'_, '_> {
    fn substitute(&mut self, expr: &Expression, slot: u32, index: usize) -> Expression {
        let base = self.ctx.address.at(index);
        let bindings = &self.bindings;
        rewrite_slot_with_rule(
            expr,
            slot,
            &base,
            PassTag::Propagation,
            &mut |node| match node {
                Expression::Variable(v) => match bindings.get(&v.variable) {
                    Some(Binding::Const(lit)) => Some(Expression::literal(*lit)),
                    Some(Binding::Copy(var)) => Some(Expression::variable(var.clone())),
                    None => None,
                },
                _ => None,
            },
            self.ctx.commands,
        )
    }

    fn substitute_condition(&mut self, condition: &Expression) -> Expression {
        let base = self.ctx.address.condition();
        let bindings = &self.bindings;
        rewrite_slot_with_rule(
            condition,
            0,
            &base,
            PassTag::Propagation,
            &mut |node| match node {
                Expression::Variable(v) => match bindings.get(&v.variable) {
                    Some(Binding::Const(lit)) => Some(Expression::literal(*lit)),
                    Some(Binding::Copy(var)) => Some(Expression::variable(var.clone())),
                    None => None,
                },
                _ => None,
            },
            self.ctx.commands,
        )
    }

    /// Drop the binding of `variable` and every copy reading it.
    fn invalidate(&mut self, variable: &Variable) {
        self.bindings.shift_remove(variable);
        self.bindings
            .retain(|_, binding| !matches!(binding, Binding::Copy(v) if v == variable));
    }

    fn process(&mut self, statement: &BasicStatement, index: usize) -> BasicStatement {
        match statement {
            BasicStatement::Assignment { target, value } => {
                let value = self.substitute(value, 0, index);
                let target = match target {
                    Target::Member { object, member, ty } => Target::Member {
                        object: self.substitute(object, 1, index),
                        member: member.clone(),
                        ty: ty.clone(),
                    },
                    Target::Variable(v) => Target::Variable(v.clone()),
                };
                if let Target::Variable(v) = &target {
                    self.invalidate(v);
                    match &value {
                        Expression::Literal(lit) => {
                            self.bindings.insert(v.clone(), Binding::Const(lit.value));
                        }
                        Expression::Variable(source) if &source.variable != v => {
                            self.bindings
                                .insert(v.clone(), Binding::Copy(source.variable.clone()));
                        }
                        _ => {}
                    }
                }
                BasicStatement::Assignment { target, value }
            }
            BasicStatement::Declaration { variables } => {
                for variable in variables {
                    self.invalidate(variable);
                }
                BasicStatement::Declaration {
                    variables: variables.clone(),
                }
            }
            BasicStatement::Expression { value } => BasicStatement::Expression {
                value: self.substitute(value, 0, index),
            },
        }
    }
}

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    let mut propagator = Propagator {
        bindings: IndexMap::new(),
        ctx,
    };
    let statements = block
        .statements
        .iter()
        .enumerate()
        .map(|(i, s)| propagator.process(s, i))
        .collect();
    BasicBlock::new(block.id, statements)
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    let mut propagator = Propagator {
        bindings: IndexMap::new(),
        ctx,
    };
    let statements = block
        .block
        .statements
        .iter()
        .enumerate()
        .map(|(i, s)| propagator.process(s, i))
        .collect();
    let condition = propagator.substitute_condition(&block.condition);
    ExpressionBlock {
        block: BasicBlock::new(block.block.id, statements),
        condition,
    }
}
