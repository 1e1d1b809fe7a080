//! Expression visitors.
//!
//! Two instantiations of the same per-kind interface: [`ExprVisitor`] walks
//! read-only (use collection, side-effect detection), [`ExprRewriter`]
//! produces post-order replacements — every method receives its node with
//! the children already rewritten, plus the node's path from the statement
//! root.

use reef_ast::{
    AllocationExpr, BinaryExpr, CoercionExpr, ExprPath, Expression, InvocationExpr, LiteralExpr,
    MemberExpr, TernaryExpr, UnaryExpr, Variable, VariableExpr,
};
use std::collections::BTreeSet;

/// Read-only visitor with one method per expression kind.
pub trait ExprVisitor {
    fn visit_literal(&mut self, expr: &LiteralExpr) {
        let _ = expr;
    }
    fn visit_variable(&mut self, expr: &VariableExpr) {
        let _ = expr;
    }
    fn visit_member(&mut self, expr: &MemberExpr) {
        let _ = expr;
    }
    fn visit_unary(&mut self, expr: &UnaryExpr) {
        let _ = expr;
    }
    fn visit_binary(&mut self, expr: &BinaryExpr) {
        let _ = expr;
    }
    fn visit_ternary(&mut self, expr: &TernaryExpr) {
        let _ = expr;
    }
    fn visit_coercion(&mut self, expr: &CoercionExpr) {
        let _ = expr;
    }
    fn visit_invocation(&mut self, expr: &InvocationExpr) {
        let _ = expr;
    }
    fn visit_allocation(&mut self, expr: &AllocationExpr) {
        let _ = expr;
    }
}

/// Walk `expr` post-order, children before their parent.
pub fn walk_expression<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal(e) => visitor.visit_literal(e),
        Expression::Variable(e) => visitor.visit_variable(e),
        Expression::Member(e) => {
            walk_expression(visitor, &e.object);
            visitor.visit_member(e);
        }
        Expression::Unary(e) => {
            walk_expression(visitor, &e.operand);
            visitor.visit_unary(e);
        }
        Expression::Binary(e) => {
            walk_expression(visitor, &e.left);
            walk_expression(visitor, &e.right);
            visitor.visit_binary(e);
        }
        Expression::Ternary(e) => {
            walk_expression(visitor, &e.condition);
            walk_expression(visitor, &e.then_value);
            walk_expression(visitor, &e.else_value);
            visitor.visit_ternary(e);
        }
        Expression::Coercion(e) => {
            walk_expression(visitor, &e.value);
            visitor.visit_coercion(e);
        }
        Expression::Invocation(e) => {
            walk_expression(visitor, &e.target);
            for arg in &e.arguments {
                walk_expression(visitor, arg);
            }
            visitor.visit_invocation(e);
        }
        Expression::Allocation(e) => {
            for arg in &e.arguments {
                walk_expression(visitor, arg);
            }
            visitor.visit_allocation(e);
        }
    }
}

/// Post-order rewriter over expressions.
pub trait ExprRewriter {
    fn rewrite_literal(&mut self, expr: LiteralExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Literal(expr)
    }
    fn rewrite_variable(&mut self, expr: VariableExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Variable(expr)
    }
    fn rewrite_member(&mut self, expr: MemberExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Member(expr)
    }
    fn rewrite_unary(&mut self, expr: UnaryExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Unary(expr)
    }
    fn rewrite_binary(&mut self, expr: BinaryExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Binary(expr)
    }
    fn rewrite_ternary(&mut self, expr: TernaryExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Ternary(expr)
    }
    fn rewrite_coercion(&mut self, expr: CoercionExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Coercion(expr)
    }
    fn rewrite_invocation(&mut self, expr: InvocationExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Invocation(expr)
    }
    fn rewrite_allocation(&mut self, expr: AllocationExpr, path: &ExprPath) -> Expression {
        let _ = path;
        Expression::Allocation(expr)
    }
}

/// Rebuild `expr` bottom-up through `rewriter`. `path` names the current
/// node and grows by one element per descent.
pub fn rewrite_expression<R: ExprRewriter + ?Sized>(
    rewriter: &mut R,
    expr: &Expression,
    path: &mut ExprPath,
) -> Expression {
    match expr {
        Expression::Literal(e) => rewriter.rewrite_literal(e.clone(), path),
        Expression::Variable(e) => rewriter.rewrite_variable(e.clone(), path),
        Expression::Member(e) => {
            path.push(0);
            let object = rewrite_expression(rewriter, &e.object, path);
            path.pop();
            rewriter.rewrite_member(
                MemberExpr {
                    object: Box::new(object),
                    member: e.member.clone(),
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Unary(e) => {
            path.push(0);
            let operand = rewrite_expression(rewriter, &e.operand, path);
            path.pop();
            rewriter.rewrite_unary(
                UnaryExpr {
                    op: e.op,
                    operand: Box::new(operand),
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Binary(e) => {
            path.push(0);
            let left = rewrite_expression(rewriter, &e.left, path);
            path.pop();
            path.push(1);
            let right = rewrite_expression(rewriter, &e.right, path);
            path.pop();
            rewriter.rewrite_binary(
                BinaryExpr {
                    op: e.op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Ternary(e) => {
            path.push(0);
            let condition = rewrite_expression(rewriter, &e.condition, path);
            path.pop();
            path.push(1);
            let then_value = rewrite_expression(rewriter, &e.then_value, path);
            path.pop();
            path.push(2);
            let else_value = rewrite_expression(rewriter, &e.else_value, path);
            path.pop();
            rewriter.rewrite_ternary(
                TernaryExpr {
                    condition: Box::new(condition),
                    then_value: Box::new(then_value),
                    else_value: Box::new(else_value),
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Coercion(e) => {
            path.push(0);
            let value = rewrite_expression(rewriter, &e.value, path);
            path.pop();
            rewriter.rewrite_coercion(
                CoercionExpr {
                    value: Box::new(value),
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Invocation(e) => {
            path.push(0);
            let target = rewrite_expression(rewriter, &e.target, path);
            path.pop();
            let mut arguments = Vec::with_capacity(e.arguments.len());
            for (i, arg) in e.arguments.iter().enumerate() {
                path.push(i as u32 + 1);
                arguments.push(rewrite_expression(rewriter, arg, path));
                path.pop();
            }
            rewriter.rewrite_invocation(
                InvocationExpr {
                    target: Box::new(target),
                    method: e.method.clone(),
                    arguments,
                    ty: e.ty.clone(),
                },
                path,
            )
        }
        Expression::Allocation(e) => {
            let mut arguments = Vec::with_capacity(e.arguments.len());
            for (i, arg) in e.arguments.iter().enumerate() {
                path.push(i as u32);
                arguments.push(rewrite_expression(rewriter, arg, path));
                path.pop();
            }
            rewriter.rewrite_allocation(
                AllocationExpr {
                    class: e.class.clone(),
                    arguments,
                    ty: e.ty.clone(),
                },
                path,
            )
        }
    }
}

struct ReadCollector {
    reads: BTreeSet<Variable>,
}

impl ExprVisitor for ReadCollector {
    fn visit_variable(&mut self, expr: &VariableExpr) {
        self.reads.insert(expr.variable.clone());
    }
}

/// Every variable read anywhere in `expr`.
pub fn variable_reads(expr: &Expression) -> BTreeSet<Variable> {
    let mut collector = ReadCollector {
        reads: BTreeSet::new(),
    };
    walk_expression(&mut collector, expr);
    collector.reads
}

struct EffectDetector {
    found: bool,
}

impl ExprVisitor for EffectDetector {
    fn visit_invocation(&mut self, _expr: &InvocationExpr) {
        self.found = true;
    }
    fn visit_allocation(&mut self, _expr: &AllocationExpr) {
        self.found = true;
    }
}

/// Whether evaluating `expr` can have a side effect. Only invocations and
/// allocations can; a trapping division counts as dead-code-preserved, not
/// as an effect.
pub fn has_side_effect(expr: &Expression) -> bool {
    let mut detector = EffectDetector { found: false };
    walk_expression(&mut detector, expr);
    detector.found
}

struct MemberDetector {
    found: bool,
}

impl ExprVisitor for MemberDetector {
    fn visit_member(&mut self, _expr: &MemberExpr) {
        self.found = true;
    }
}

/// Whether `expr` reads any object member.
pub fn reads_member(expr: &Expression) -> bool {
    let mut detector = MemberDetector { found: false };
    walk_expression(&mut detector, expr);
    detector.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_ast::{BinaryOp, Type};

    fn var(name: &str) -> Expression {
        Expression::variable(Variable::new(name, 0, Type::Int))
    }

    #[test]
    fn test_variable_reads() {
        let expr = Expression::binary(
            BinaryOp::Add,
            var("a"),
            Expression::binary(BinaryOp::Mul, var("b"), var("a"), Type::Int),
            Type::Int,
        );
        let reads = variable_reads(&expr);
        assert_eq!(reads.len(), 2);
        assert!(reads.iter().any(|v| v.id == "a"));
        assert!(reads.iter().any(|v| v.id == "b"));
    }

    #[test]
    fn test_side_effect_detection() {
        assert!(!has_side_effect(&var("a")));
        let call = Expression::Invocation(InvocationExpr {
            target: Box::new(var("o")),
            method: "get".to_string(),
            arguments: vec![],
            ty: Type::Int,
        });
        assert!(has_side_effect(&call));
        let nested = Expression::binary(BinaryOp::Add, var("a"), call, Type::Int);
        assert!(has_side_effect(&nested));
    }

    #[test]
    fn test_rewriter_paths_are_post_order() {
        struct PathLog {
            paths: Vec<Vec<u32>>,
        }
        impl ExprRewriter for PathLog {
            fn rewrite_literal(&mut self, expr: LiteralExpr, path: &ExprPath) -> Expression {
                self.paths.push(path.as_slice().to_vec());
                Expression::Literal(expr)
            }
            fn rewrite_binary(&mut self, expr: BinaryExpr, path: &ExprPath) -> Expression {
                self.paths.push(path.as_slice().to_vec());
                Expression::Binary(expr)
            }
        }

        let expr = Expression::binary(
            BinaryOp::Add,
            Expression::int(1),
            Expression::binary(BinaryOp::Mul, Expression::int(2), Expression::int(3), Type::Int),
            Type::Int,
        );
        let mut log = PathLog { paths: Vec::new() };
        let mut path = ExprPath::root(0);
        rewrite_expression(&mut log, &expr, &mut path);
        assert_eq!(
            log.paths,
            vec![
                vec![0, 0],
                vec![0, 1, 0],
                vec![0, 1, 1],
                vec![0, 1],
                vec![0],
            ]
        );
    }
}
