//! Constant folding.
//!
//! Folds unary/binary operators, coercions, and literal-guarded ternaries
//! when every evaluated operand is a literal. Division and modulo by a
//! literal zero stay unfolded — the source language permits them to remain
//! inside dead code, so they are not an error here.

use super::{apply_rule_to_basic, apply_rule_to_guard, BlockContext};
use crate::command::PassTag;
use reef_ast::{BasicBlock, BinaryOp, Expression, ExpressionBlock, Literal, Type, UnaryOp};

pub fn basic(block: &BasicBlock, ctx: &mut BlockContext<'_>) -> BasicBlock {
    apply_rule_to_basic(block, ctx, PassTag::ConstantFolding, &mut |e| fold_rule(e))
}

pub fn guard(block: &ExpressionBlock, ctx: &mut BlockContext<'_>) -> ExpressionBlock {
    apply_rule_to_guard(block, ctx, PassTag::ConstantFolding, &mut |e| fold_rule(e))
}

pub(crate) fn fold_rule(expr: &Expression) -> Option<Expression> {
    match expr {
        Expression::Unary(e) => {
            let operand = e.operand.as_literal()?;
            match (e.op, operand) {
                (UnaryOp::Plus, lit) => Some(Expression::literal(*lit)),
                (UnaryOp::Minus, Literal::Int(v)) => v.checked_neg().map(Expression::int),
                (UnaryOp::Not, Literal::Bool(b)) => Some(Expression::boolean(!b)),
                _ => None,
            }
        }
        Expression::Binary(e) => {
            let left = e.left.as_literal()?;
            let right = e.right.as_literal()?;
            fold_binary(e.op, left, right)
        }
        Expression::Ternary(e) => {
            // Only the taken arm is ever evaluated, so the other needs no
            // side-effect check.
            let condition = e.condition.as_literal()?.as_bool()?;
            Some(if condition {
                (*e.then_value).clone()
            } else {
                (*e.else_value).clone()
            })
        }
        Expression::Coercion(e) => {
            let value = e.value.as_literal()?;
            match (&e.ty, value) {
                (Type::Int, Literal::Char(c)) => Some(Expression::int(*c as i64)),
                (Type::Int, Literal::Int(v)) => Some(Expression::int(*v)),
                (Type::Char, Literal::Int(v)) => u32::try_from(*v)
                    .ok()
                    .and_then(char::from_u32)
                    .map(Expression::character),
                (Type::Char, Literal::Char(c)) => Some(Expression::character(*c)),
                (Type::Bool, Literal::Bool(b)) => Some(Expression::boolean(*b)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, left: &Literal, right: &Literal) -> Option<Expression> {
    match (left, right) {
        (Literal::Int(a), Literal::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => a.checked_add(b).map(Expression::int),
                BinaryOp::Sub => a.checked_sub(b).map(Expression::int),
                BinaryOp::Mul => a.checked_mul(b).map(Expression::int),
                // Division and modulo by a literal zero may be dead code;
                // leave them alone.
                BinaryOp::Div => a.checked_div(b).map(Expression::int),
                BinaryOp::Mod => a.checked_rem(b).map(Expression::int),
                BinaryOp::Shl => u32::try_from(b)
                    .ok()
                    .and_then(|s| a.checked_shl(s))
                    .map(Expression::int),
                BinaryOp::Shr => u32::try_from(b)
                    .ok()
                    .and_then(|s| a.checked_shr(s))
                    .map(Expression::int),
                BinaryOp::Eq => Some(Expression::boolean(a == b)),
                BinaryOp::NotEq => Some(Expression::boolean(a != b)),
                BinaryOp::Lt => Some(Expression::boolean(a < b)),
                BinaryOp::LtE => Some(Expression::boolean(a <= b)),
                BinaryOp::Gt => Some(Expression::boolean(a > b)),
                BinaryOp::GtE => Some(Expression::boolean(a >= b)),
                BinaryOp::And | BinaryOp::Or => None,
            }
        }
        (Literal::Bool(a), Literal::Bool(b)) => match op {
            BinaryOp::And => Some(Expression::boolean(*a && *b)),
            BinaryOp::Or => Some(Expression::boolean(*a || *b)),
            BinaryOp::Eq => Some(Expression::boolean(a == b)),
            BinaryOp::NotEq => Some(Expression::boolean(a != b)),
            _ => None,
        },
        (Literal::Char(a), Literal::Char(b)) => match op {
            BinaryOp::Eq => Some(Expression::boolean(a == b)),
            BinaryOp::NotEq => Some(Expression::boolean(a != b)),
            BinaryOp::Lt => Some(Expression::boolean(a < b)),
            BinaryOp::LtE => Some(Expression::boolean(a <= b)),
            BinaryOp::Gt => Some(Expression::boolean(a > b)),
            BinaryOp::GtE => Some(Expression::boolean(a >= b)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_ast::{Type, Variable};

    #[test]
    fn test_folds_integer_multiply() {
        let expr = Expression::binary(
            BinaryOp::Mul,
            Expression::int(2),
            Expression::int(4),
            Type::Int,
        );
        assert_eq!(fold_rule(&expr), Some(Expression::int(8)));
    }

    #[test]
    fn test_division_by_literal_zero_stays() {
        let x = Expression::variable(Variable::new("x", 0, Type::Int));
        let expr = Expression::binary(BinaryOp::Div, x, Expression::int(0), Type::Int);
        assert_eq!(fold_rule(&expr), None);

        let both_literal =
            Expression::binary(BinaryOp::Div, Expression::int(1), Expression::int(0), Type::Int);
        assert_eq!(fold_rule(&both_literal), None);
    }

    #[test]
    fn test_folds_comparison_and_not() {
        let cmp = Expression::binary(
            BinaryOp::Lt,
            Expression::int(1),
            Expression::int(2),
            Type::Bool,
        );
        assert_eq!(fold_rule(&cmp), Some(Expression::boolean(true)));

        let not = Expression::unary(UnaryOp::Not, Expression::boolean(true), Type::Bool);
        assert_eq!(fold_rule(&not), Some(Expression::boolean(false)));
    }

    #[test]
    fn test_folds_coercions() {
        let coerce = Expression::coercion(Expression::character('a'), Type::Int);
        assert_eq!(fold_rule(&coerce), Some(Expression::int(97)));

        let back = Expression::coercion(Expression::int(97), Type::Char);
        assert_eq!(fold_rule(&back), Some(Expression::character('a')));
    }

    #[test]
    fn test_folds_literal_ternary() {
        let x = Expression::variable(Variable::new("x", 0, Type::Int));
        let pick = Expression::ternary(
            Expression::boolean(false),
            Expression::int(1),
            x.clone(),
            Type::Int,
        );
        assert_eq!(fold_rule(&pick), Some(x));
    }
}
