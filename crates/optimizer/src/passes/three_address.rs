//! Three-address-code normalization.
//!
//! Hoists every non-root compound expression into a fresh-temporary
//! assignment placed before its statement (or appended to the guard block
//! for condition operands), leaving only atomic operands behind. The root
//! expression of each statement stays in place, so the pass is a no-op at
//! statement root.

use super::BlockContext;
use crate::command::{Command, CounterSnapshot, PassTag};
use reef_ast::{
    BasicBlock, BasicStatement, ExprPath, Expression, ExpressionBlock, Target, Variable,
};

struct Normalizer<'a, 'c> {
    ctx: &'a mut BlockContext<'c>,
    out: Vec<BasicStatement>,
}

impl Normalizer<'_, '_> {
    /// Hoist `expr` itself if compound, after normalizing its children.
    fn hoist(&mut self, expr: &Expression, path: &mut ExprPath, in_condition: bool) -> Expression {
        let rebuilt = self.normalize_children(expr, path, in_condition);
        if rebuilt.is_atomic() {
            return rebuilt;
        }

        let before = *self.ctx.counters;
        let name = self.ctx.counters.fresh_temp_name();
        let after = *self.ctx.counters;
        let temp = Variable::new(name, 0, rebuilt.ty());
        let hoisted = BasicStatement::Assignment {
            target: Target::Variable(temp.clone()),
            value: rebuilt.clone(),
        };
        self.ctx.commands.push(Command::InsertStatement {
            pass: PassTag::ThreeAddressCode,
            address: self.ctx.address.at(self.out.len()),
            statement: hoisted.clone(),
            counters: Some(CounterSnapshot { before, after }),
        });
        self.out.push(hoisted);

        let temp_read = Expression::variable(temp);
        let statement_address = if in_condition {
            self.ctx.address.condition()
        } else {
            self.ctx.address.at(self.out.len())
        };
        self.ctx.commands.push(Command::ReplaceExpression {
            pass: PassTag::ThreeAddressCode,
            address: statement_address.expression(path.clone()),
            before: rebuilt,
            after: temp_read.clone(),
        });
        temp_read
    }

    /// Keep `expr` in place but hoist each compound child.
    fn normalize_children(
        &mut self,
        expr: &Expression,
        path: &mut ExprPath,
        in_condition: bool,
    ) -> Expression {
        let mut rebuilt = expr.clone();
        for index in 0..expr.child_count() {
            let Some(child) = rebuilt.child(index).cloned() else {
                continue;
            };
            path.push(index as u32);
            let replaced = self.hoist(&child, path, in_condition);
            path.pop();
            if let Some(next) = rebuilt.replace_child(index, replaced) {
                rebuilt = next;
            }
        }
        rebuilt
    }

    fn process(&mut self, statement: &BasicStatement) {
        let rebuilt = match statement {
            BasicStatement::Assignment { target, value } => {
                let mut path = ExprPath::root(0);
                let value = self.normalize_children(value, &mut path, false);
                let target = match target {
                    Target::Member { object, member, ty } => {
                        // A member store needs an atomic object operand.
                        let mut path = ExprPath::root(1);
                        Target::Member {
                            object: self.hoist(object, &mut path, false),
                            member: member.clone(),
                            ty: ty.clone(),
                        }
                    }
                    Target::Variable(v) => Target::Variable(v.clone()),
                };
                BasicStatement::Assignment { target, value }
            }
            BasicStatement::Declaration { variables } => BasicStatement::Declaration {
                variables: variables.clone(),
            },
            BasicStatement::Expression { value } => {
                let mut path = ExprPath::root(0);
                BasicStatement::Expression {
                    value: self.normalize_children(value, &mut path, false),
                }
            }
        };
        self.out.push(rebuilt);
    }
}

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    let mut normalizer = Normalizer {
        ctx,
        out: Vec::new(),
    };
    for statement in &block.statements {
        normalizer.process(statement);
    }
    BasicBlock::new(block.id, normalizer.out)
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    let mut normalizer = Normalizer {
        ctx,
        out: Vec::new(),
    };
    for statement in &block.block.statements {
        normalizer.process(statement);
    }
    let mut path = ExprPath::root(0);
    let condition = normalizer.normalize_children(&block.condition, &mut path, true);
    ExpressionBlock {
        block: BasicBlock::new(block.block.id, normalizer.out),
        condition,
    }
}
