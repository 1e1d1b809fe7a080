//! Optimization passes.
//!
//! Every pass is a function from a block-granularity context to a
//! replacement block, emitting one [`Command`] per elementary edit. Within a
//! sweep the driver composes them per block, so later passes see earlier
//! passes' output on the same node. Commands are emitted in application
//! order: sequentially applying a sweep's commands to its input reproduces
//! its output.

pub mod algebraic;
pub mod cse;
pub mod dead_code;
pub mod declarations;
pub mod fold;
pub mod propagate;
pub mod strength;
pub mod three_address;
pub mod unreachable;

use crate::command::{Command, PassTag};
use crate::rewrite::visitor::{rewrite_expression, ExprRewriter};
use reef_ast::{
    AllocationExpr, BasicBlock, BasicStatement, BasicStatementAddress, BinaryExpr, BlockAddress,
    CoercionExpr, Counters, ExprPath, Expression, ExpressionBlock, InvocationExpr, LiteralExpr,
    MemberExpr, Target, TernaryExpr, UnaryExpr, VariableExpr,
};

/// Shared per-block pass context: the block's address, the owning body's
/// counter record, and the command sink for this sweep.
pub struct BlockContext<'a> {
    pub address: BlockAddress,
    pub counters: &'a mut Counters,
    pub commands: &'a mut Vec<Command>,
}

/// Post-order rule application over one expression slot. Each hit emits a
/// `ReplaceExpression` command addressed at the rewritten node.
struct RuleRewriter<'a> {
    pass: PassTag,
    base: &'a BasicStatementAddress,
    rule: &'a mut dyn FnMut(&Expression) -> Option<Expression>,
    commands: &'a mut Vec<Command>,
}

impl RuleRewriter<'_> {
    fn finish(&mut self, rebuilt: Expression, path: &ExprPath) -> Expression {
        match (self.rule)(&rebuilt) {
            Some(after) => {
                self.commands.push(Command::ReplaceExpression {
                    pass: self.pass,
                    address: self.base.expression(path.clone()),
                    before: rebuilt,
                    after: after.clone(),
                });
                after
            }
            None => rebuilt,
        }
    }
}

impl ExprRewriter for RuleRewriter<'_> {
    fn rewrite_literal(&mut self, expr: LiteralExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Literal(expr), path)
    }
    fn rewrite_variable(&mut self, expr: VariableExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Variable(expr), path)
    }
    fn rewrite_member(&mut self, expr: MemberExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Member(expr), path)
    }
    fn rewrite_unary(&mut self, expr: UnaryExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Unary(expr), path)
    }
    fn rewrite_binary(&mut self, expr: BinaryExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Binary(expr), path)
    }
    fn rewrite_ternary(&mut self, expr: TernaryExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Ternary(expr), path)
    }
    fn rewrite_coercion(&mut self, expr: CoercionExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Coercion(expr), path)
    }
    fn rewrite_invocation(&mut self, expr: InvocationExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Invocation(expr), path)
    }
    fn rewrite_allocation(&mut self, expr: AllocationExpr, path: &ExprPath) -> Expression {
        self.finish(Expression::Allocation(expr), path)
    }
}

/// Rewrite one expression slot of a basic statement through `rule`.
pub(crate) fn rewrite_slot_with_rule(
    expr: &Expression,
    slot: u32,
    base: &BasicStatementAddress,
    pass: PassTag,
    rule: &mut dyn FnMut(&Expression) -> Option<Expression>,
    commands: &mut Vec<Command>,
) -> Expression {
    let mut rewriter = RuleRewriter {
        pass,
        base,
        rule,
        commands,
    };
    let mut path = ExprPath::root(slot);
    rewrite_expression(&mut rewriter, expr, &mut path)
}

/// Rewrite every expression slot of a statement through `rule`.
pub(crate) fn rewrite_statement_with_rule(
    statement: &BasicStatement,
    base: &BasicStatementAddress,
    pass: PassTag,
    rule: &mut dyn FnMut(&Expression) -> Option<Expression>,
    commands: &mut Vec<Command>,
) -> BasicStatement {
    match statement {
        BasicStatement::Assignment { target, value } => {
            let value = rewrite_slot_with_rule(value, 0, base, pass, rule, commands);
            let target = match target {
                Target::Member { object, member, ty } => Target::Member {
                    object: rewrite_slot_with_rule(object, 1, base, pass, rule, commands),
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
            value: rewrite_slot_with_rule(value, 0, base, pass, rule, commands),
        },
    }
}

/// Apply a stateless expression rule to every slot of a basic block.
pub(crate) fn apply_rule_to_basic(
    block: &BasicBlock,
    ctx: &mut BlockContext<'_>,
    pass: PassTag,
    rule: &mut dyn FnMut(&Expression) -> Option<Expression>,
) -> BasicBlock {
    let statements = block
        .statements
        .iter()
        .enumerate()
        .map(|(i, statement)| {
            let base = ctx.address.at(i);
            rewrite_statement_with_rule(statement, &base, pass, rule, ctx.commands)
        })
        .collect();
    BasicBlock::new(block.id, statements)
}

/// Apply a stateless expression rule to a guard block and its condition.
pub(crate) fn apply_rule_to_guard(
    block: &ExpressionBlock,
    ctx: &mut BlockContext<'_>,
    pass: PassTag,
    rule: &mut dyn FnMut(&Expression) -> Option<Expression>,
) -> ExpressionBlock {
    let inner = apply_rule_to_basic(&block.block, ctx, pass, rule);
    let base = ctx.address.condition();
    let condition = rewrite_slot_with_rule(&block.condition, 0, &base, pass, rule, ctx.commands);
    ExpressionBlock {
        block: inner,
        condition,
    }
}
