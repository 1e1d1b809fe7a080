//! Strength reduction.
//!
//! `2 * x` → `x + x`, and multiplication/division by a literal power of two
//! (up to 2³⁰) → a shift.

use super::{apply_rule_to_basic, apply_rule_to_guard, BlockContext};
use crate::command::PassTag;
use crate::rewrite::visitor::has_side_effect;
use reef_ast::{BasicBlock, BinaryOp, Expression, ExpressionBlock, Literal};

/// Largest multiplier/divisor the shift table covers.
const MAX_POWER: i64 = 1 << 30;

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    apply_rule_to_basic(block, ctx, PassTag::StrengthReduction, &mut |e| reduce_rule(e))
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    apply_rule_to_guard(block, ctx, PassTag::StrengthReduction, &mut |e| reduce_rule(e))
}

fn literal_int(expr: &Expression) -> Option<i64> {
    match expr.as_literal() {
        Some(Literal::Int(v)) => Some(*v),
        _ => None,
    }
}

fn shift_amount(value: i64) -> Option<i64> {
    (value > 1 && value <= MAX_POWER && value & (value - 1) == 0)
        .then(|| i64::from(value.trailing_zeros()))
}

pub(crate) fn reduce_rule(expr: &Expression) -> Option<Expression> {
    let Expression::Binary(e) = expr else {
        return None;
    };
    match e.op {
        BinaryOp::Mul => {
            let (factor, other) = match (literal_int(&e.left), literal_int(&e.right)) {
                (Some(v), _) => (v, e.right.as_ref()),
                (_, Some(v)) => (v, e.left.as_ref()),
                _ => return None,
            };
            if other.as_literal().is_some() {
                // Folding territory.
                return None;
            }
            if factor == 2 && !has_side_effect(other) {
                return Some(Expression::binary(
                    BinaryOp::Add,
                    other.clone(),
                    other.clone(),
                    e.ty.clone(),
                ));
            }
            let shift = shift_amount(factor)?;
            Some(Expression::binary(
                BinaryOp::Shl,
                other.clone(),
                Expression::int(shift),
                e.ty.clone(),
            ))
        }
        BinaryOp::Div => {
            let divisor = literal_int(&e.right)?;
            if e.left.as_literal().is_some() {
                return None;
            }
            let shift = shift_amount(divisor)?;
            Some(Expression::binary(
                BinaryOp::Shr,
                (*e.left).clone(),
                Expression::int(shift),
                e.ty.clone(),
            ))
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

    #[test]
    fn test_double_becomes_add() {
        let expr = Expression::binary(BinaryOp::Mul, Expression::int(2), x(), Type::Int);
        assert_eq!(
            reduce_rule(&expr),
            Some(Expression::binary(BinaryOp::Add, x(), x(), Type::Int))
        );
    }

    #[test]
    fn test_multiply_by_power_of_two_becomes_shift() {
        let expr = Expression::binary(BinaryOp::Mul, x(), Expression::int(8), Type::Int);
        assert_eq!(
            reduce_rule(&expr),
            Some(Expression::binary(
                BinaryOp::Shl,
                x(),
                Expression::int(3),
                Type::Int
            ))
        );
    }

    #[test]
    fn test_divide_by_power_of_two_becomes_shift() {
        let expr = Expression::binary(BinaryOp::Div, x(), Expression::int(4), Type::Int);
        assert_eq!(
            reduce_rule(&expr),
            Some(Expression::binary(
                BinaryOp::Shr,
                x(),
                Expression::int(2),
                Type::Int
            ))
        );
    }

    #[test]
    fn test_non_power_untouched() {
        let expr = Expression::binary(BinaryOp::Mul, x(), Expression::int(6), Type::Int);
        assert_eq!(reduce_rule(&expr), None);
        let too_big = Expression::binary(
            BinaryOp::Mul,
            x(),
            Expression::int(1 << 31),
            Type::Int,
        );
        assert_eq!(reduce_rule(&too_big), None);
    }

    #[test]
    fn test_literal_pairs_left_to_folding() {
        let expr = Expression::binary(
            BinaryOp::Mul,
            Expression::int(2),
            Expression::int(4),
            Type::Int,
        );
        assert_eq!(reduce_rule(&expr), None);
    }
}
