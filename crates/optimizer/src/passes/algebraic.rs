//! Algebraic simplification.
//!
//! Identity and annihilator rules triggered only by literal `0`, `1`, `-1`,
//! `true`, `false` operands, plus the boolean-ternary rules
//! `c ? x : false` → `c && x` and `c ? true : x` → `c || x`. Rules that
//! discard an operand require it to be side-effect free, except where
//! short-circuit evaluation already discards it.

use super::{apply_rule_to_basic, apply_rule_to_guard, BlockContext};
use crate::command::PassTag;
use crate::rewrite::visitor::has_side_effect;
use reef_ast::{BasicBlock, BinaryOp, Expression, ExpressionBlock, Literal, UnaryOp};

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    apply_rule_to_basic(block, ctx, PassTag::AlgebraicSimplification, &mut |e| {
        simplify_rule(e)
    })
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    apply_rule_to_guard(block, ctx, PassTag::AlgebraicSimplification, &mut |e| {
        simplify_rule(e)
    })
}

fn is_int(expr: &Expression, value: i64) -> bool {
    matches!(expr.as_literal(), Some(Literal::Int(v)) if *v == value)
}

fn is_bool(expr: &Expression, value: bool) -> bool {
    matches!(expr.as_literal(), Some(Literal::Bool(v)) if *v == value)
}

fn negate(expr: &Expression) -> Expression {
    Expression::unary(UnaryOp::Minus, expr.clone(), expr.ty())
}

pub(crate) fn simplify_rule(expr: &Expression) -> Option<Expression> {
    match expr {
        Expression::Unary(e) => match e.op {
            UnaryOp::Plus => e.operand.as_literal().map(|lit| Expression::literal(*lit)),
            UnaryOp::Minus if is_int(&e.operand, 0) => Some(Expression::int(0)),
            _ => None,
        },
        Expression::Binary(e) => {
            let (l, r) = (e.left.as_ref(), e.right.as_ref());
            match e.op {
                BinaryOp::Add => {
                    if is_int(l, 0) {
                        Some(r.clone())
                    } else if is_int(r, 0) {
                        Some(l.clone())
                    } else {
                        None
                    }
                }
                BinaryOp::Sub => {
                    if is_int(r, 0) {
                        Some(l.clone())
                    } else if is_int(l, 0) {
                        Some(negate(r))
                    } else {
                        None
                    }
                }
                BinaryOp::Mul => {
                    if is_int(l, 1) {
                        Some(r.clone())
                    } else if is_int(r, 1) {
                        Some(l.clone())
                    } else if is_int(l, -1) {
                        Some(negate(r))
                    } else if is_int(r, -1) {
                        Some(negate(l))
                    } else if (is_int(l, 0) && !has_side_effect(r))
                        || (is_int(r, 0) && !has_side_effect(l))
                    {
                        Some(Expression::int(0))
                    } else {
                        None
                    }
                }
                BinaryOp::Div => {
                    if is_int(r, 1) {
                        Some(l.clone())
                    } else if is_int(r, -1) {
                        Some(negate(l))
                    } else {
                        None
                    }
                }
                BinaryOp::Mod => {
                    if is_int(r, 1) && !has_side_effect(l) {
                        Some(Expression::int(0))
                    } else {
                        None
                    }
                }
                BinaryOp::And => {
                    if is_bool(l, true) {
                        Some(r.clone())
                    } else if is_bool(r, true) {
                        Some(l.clone())
                    } else if is_bool(l, false) {
                        // Short-circuit: the right operand never runs.
                        Some(Expression::boolean(false))
                    } else if is_bool(r, false) && !has_side_effect(l) {
                        Some(Expression::boolean(false))
                    } else {
                        None
                    }
                }
                BinaryOp::Or => {
                    if is_bool(l, false) {
                        Some(r.clone())
                    } else if is_bool(r, false) {
                        Some(l.clone())
                    } else if is_bool(l, true) {
                        Some(Expression::boolean(true))
                    } else if is_bool(r, true) && !has_side_effect(l) {
                        Some(Expression::boolean(true))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        Expression::Ternary(e) => {
            if is_bool(&e.else_value, false) {
                Some(Expression::binary(
                    BinaryOp::And,
                    (*e.condition).clone(),
                    (*e.then_value).clone(),
                    e.ty.clone(),
                ))
            } else if is_bool(&e.then_value, true) {
                Some(Expression::binary(
                    BinaryOp::Or,
                    (*e.condition).clone(),
                    (*e.else_value).clone(),
                    e.ty.clone(),
                ))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_ast::{Type, Variable};

    fn x() -> Expression {
        Expression::variable(Variable::new("x", 0, Type::Int))
    }

    fn b() -> Expression {
        Expression::variable(Variable::new("b", 0, Type::Bool))
    }

    #[test]
    fn test_additive_identity() {
        let expr = Expression::binary(BinaryOp::Add, x(), Expression::int(0), Type::Int);
        assert_eq!(simplify_rule(&expr), Some(x()));
        let expr = Expression::binary(BinaryOp::Add, Expression::int(0), x(), Type::Int);
        assert_eq!(simplify_rule(&expr), Some(x()));
    }

    #[test]
    fn test_multiplicative_annihilator() {
        let expr = Expression::binary(BinaryOp::Mul, x(), Expression::int(0), Type::Int);
        assert_eq!(simplify_rule(&expr), Some(Expression::int(0)));
    }

    #[test]
    fn test_negation_through_minus_one() {
        let expr = Expression::binary(BinaryOp::Mul, x(), Expression::int(-1), Type::Int);
        assert_eq!(simplify_rule(&expr), Some(negate(&x())));
    }

    #[test]
    fn test_boolean_ternary_rules() {
        let and = Expression::ternary(b(), x_bool(), Expression::boolean(false), Type::Bool);
        assert_eq!(
            simplify_rule(&and),
            Some(Expression::binary(BinaryOp::And, b(), x_bool(), Type::Bool))
        );

        let or = Expression::ternary(b(), Expression::boolean(true), x_bool(), Type::Bool);
        assert_eq!(
            simplify_rule(&or),
            Some(Expression::binary(BinaryOp::Or, b(), x_bool(), Type::Bool))
        );
    }

    fn x_bool() -> Expression {
        Expression::variable(Variable::new("p", 0, Type::Bool))
    }

    #[test]
    fn test_no_trigger_without_literal() {
        let expr = Expression::binary(BinaryOp::Add, x(), x(), Type::Int);
        assert_eq!(simplify_rule(&expr), None);
    }
}
