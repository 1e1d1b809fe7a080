//! Optimization Pass Tests
//!
//! Driver-level checks for folding, algebraic simplification, strength
//! reduction, propagation, CSE, and three-address normalization.

mod common;

use common::*;
use reef_ast::{BasicStatement, BinaryOp, Counters, Expression, Target, Type, UnaryOp};
use reef_optimizer::{optimize, NullSink, OptimizeConfig, Optimization};

fn config_with(passes: &[Optimization]) -> OptimizeConfig {
    OptimizeConfig {
        passes: passes.iter().copied().collect(),
        ..OptimizeConfig::default()
    }
}

fn value_of(statement: &BasicStatement) -> &Expression {
    match statement {
        BasicStatement::Assignment { value, .. } => value,
        BasicStatement::Expression { value } => value,
        other => panic!("expected an expression-carrying statement, got {other:?}"),
    }
}

#[test]
fn test_folding_two_times_four() {
    let program = method_program(
        vec![block(
            1,
            vec![assign(
                "a",
                Expression::binary(BinaryOp::Mul, Expression::int(2), Expression::int(4), Type::Int),
            )],
        )],
        2,
    );
    let config = config_with(&[Optimization::ConstantFolding]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    assert_eq!(value_of(&first_block_statements(&optimized)[0]), &Expression::int(8));
}

#[test]
fn test_division_by_literal_zero_survives() {
    let program = method_program(
        vec![block(
            1,
            vec![assign(
                "a",
                Expression::binary(BinaryOp::Div, read("x"), Expression::int(0), Type::Int),
            )],
        )],
        2,
    );
    let config = config_with(&[Optimization::ConstantFolding]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    assert_eq!(
        value_of(&first_block_statements(&optimized)[0]),
        &Expression::binary(BinaryOp::Div, read("x"), Expression::int(0), Type::Int)
    );
}

#[test]
fn test_strength_reduction_double_and_shift() {
    let program = method_program(
        vec![block(
            1,
            vec![
                assign(
                    "y",
                    Expression::binary(BinaryOp::Mul, Expression::int(2), read("x"), Type::Int),
                ),
                assign(
                    "z",
                    Expression::binary(BinaryOp::Mul, read("x"), Expression::int(8), Type::Int),
                ),
            ],
        )],
        2,
    );
    let config = config_with(&[Optimization::StrengthReduction]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(
        value_of(&statements[0]),
        &Expression::binary(BinaryOp::Add, read("x"), read("x"), Type::Int)
    );
    assert_eq!(
        value_of(&statements[1]),
        &Expression::binary(BinaryOp::Shl, read("x"), Expression::int(3), Type::Int)
    );
}

#[test]
fn test_propagation_is_block_local() {
    // #1: a = 5; b = a;   #2 (new block after the if): c = a;
    let program = method_program(
        vec![
            block(
                1,
                vec![assign("a", Expression::int(5)), assign("b", read("a"))],
            ),
            if_stmt(2, Expression::variable(bool_var("p")), vec![], vec![]),
            block(3, vec![assign("c", read("a"))]),
        ],
        4,
    );
    let config = config_with(&[Optimization::Propagation]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    // Inside the first block the constant reaches the read...
    assert_eq!(value_of(&first_block_statements(&optimized)[1]), &Expression::int(5));
    // ...but the mapping resets at the block boundary.
    let last = match &main_body(&optimized).compound.statements[2] {
        reef_ast::CompoundStatement::Basic(b) => &b.statements[0],
        other => panic!("expected block, got {other:?}"),
    };
    assert_eq!(value_of(last), &read("a"));
}

#[test]
fn test_propagation_invalidates_on_reassignment() {
    // a = 5; a = x; b = a;  -- the constant must not survive `a = x`.
    let program = method_program(
        vec![block(
            1,
            vec![
                assign("a", Expression::int(5)),
                assign("a", read("x")),
                assign("b", read("a")),
            ],
        )],
        2,
    );
    let config = config_with(&[Optimization::Propagation]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    // `b = a` picks up the copy of x, not the stale 5.
    assert_eq!(value_of(&first_block_statements(&optimized)[2]), &read("x"));
}

#[test]
fn test_algebraic_identities() {
    let program = method_program(
        vec![block(
            1,
            vec![
                assign(
                    "a",
                    Expression::binary(BinaryOp::Add, read("x"), Expression::int(0), Type::Int),
                ),
                assign(
                    "b",
                    Expression::binary(BinaryOp::Mul, read("x"), Expression::int(1), Type::Int),
                ),
                assign(
                    "c",
                    Expression::binary(BinaryOp::Sub, Expression::int(0), read("x"), Type::Int),
                ),
            ],
        )],
        2,
    );
    let config = config_with(&[Optimization::AlgebraicSimplification]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(value_of(&statements[0]), &read("x"));
    assert_eq!(value_of(&statements[1]), &read("x"));
    assert_eq!(
        value_of(&statements[2]),
        &Expression::unary(UnaryOp::Minus, read("x"), Type::Int)
    );
}

#[test]
fn test_boolean_ternary_becomes_short_circuit() {
    let program = method_program(
        vec![block(
            1,
            vec![BasicStatement::Assignment {
                target: Target::Variable(bool_var("r")),
                value: Expression::ternary(
                    Expression::variable(bool_var("c")),
                    Expression::variable(bool_var("x")),
                    Expression::boolean(false),
                    Type::Bool,
                ),
            }],
        )],
        2,
    );
    let config = config_with(&[Optimization::AlgebraicSimplification]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    assert_eq!(
        value_of(&first_block_statements(&optimized)[0]),
        &Expression::binary(
            BinaryOp::And,
            Expression::variable(bool_var("c")),
            Expression::variable(bool_var("x")),
            Type::Bool
        )
    );
}

#[test]
fn test_cse_introduces_two_temporaries() {
    // result = (50 + 5 + a) * (50 + 5 + a);
    let operand = || {
        Expression::binary(
            BinaryOp::Add,
            Expression::binary(BinaryOp::Add, Expression::int(50), Expression::int(5), Type::Int),
            read("a"),
            Type::Int,
        )
    };
    let program = method_program(
        vec![block(
            1,
            vec![assign(
                "result",
                Expression::binary(BinaryOp::Mul, operand(), operand(), Type::Int),
            )],
        )],
        2,
    );
    let config = config_with(&[Optimization::CommonSubexpression]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(statements.len(), 3);

    // First temporary takes 50 + 5.
    let BasicStatement::Assignment {
        target: Target::Variable(t0),
        value: v0,
    } = &statements[0]
    else {
        panic!("expected hoisted assignment");
    };
    assert!(Counters::is_temp_name(&t0.id));
    assert_eq!(
        v0,
        &Expression::binary(BinaryOp::Add, Expression::int(50), Expression::int(5), Type::Int)
    );

    // Second temporary adds `a` on top of the first.
    let BasicStatement::Assignment {
        target: Target::Variable(t1),
        value: v1,
    } = &statements[1]
    else {
        panic!("expected hoisted assignment");
    };
    assert!(Counters::is_temp_name(&t1.id));
    assert_eq!(
        v1,
        &Expression::binary(
            BinaryOp::Add,
            Expression::variable(t0.clone()),
            read("a"),
            Type::Int
        )
    );

    // Both multiplication operands read the second temporary.
    assert_eq!(
        value_of(&statements[2]),
        &Expression::binary(
            BinaryOp::Mul,
            Expression::variable(t1.clone()),
            Expression::variable(t1.clone()),
            Type::Int
        )
    );
}

#[test]
fn test_cse_invalidated_by_reassignment() {
    // b = x + y; x = 0; c = x + y;  -- no temp may bridge the store to x.
    let sum = || Expression::binary(BinaryOp::Add, read("x"), read("y"), Type::Int);
    let program = method_program(
        vec![block(
            1,
            vec![
                assign("b", sum()),
                assign("x", Expression::int(0)),
                assign("c", sum()),
            ],
        )],
        2,
    );
    let config = config_with(&[Optimization::CommonSubexpression]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(statements.len(), 3);
    assert_eq!(value_of(&statements[0]), &sum());
    assert_eq!(value_of(&statements[2]), &sum());
}

#[test]
fn test_three_address_normalization() {
    // a = (b + c) * d;  ->  $t = b + c; a = $t * d;
    let program = method_program(
        vec![block(
            1,
            vec![assign(
                "a",
                Expression::binary(
                    BinaryOp::Mul,
                    Expression::binary(BinaryOp::Add, read("b"), read("c"), Type::Int),
                    read("d"),
                    Type::Int,
                ),
            )],
        )],
        2,
    );
    let config = config_with(&[Optimization::ThreeAddressCode]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(statements.len(), 2);

    let BasicStatement::Assignment {
        target: Target::Variable(temp),
        value,
    } = &statements[0]
    else {
        panic!("expected hoisted assignment");
    };
    assert!(Counters::is_temp_name(&temp.id));
    assert_eq!(
        value,
        &Expression::binary(BinaryOp::Add, read("b"), read("c"), Type::Int)
    );
    assert_eq!(
        value_of(&statements[1]),
        &Expression::binary(
            BinaryOp::Mul,
            Expression::variable(temp.clone()),
            read("d"),
            Type::Int
        )
    );
}

#[test]
fn test_passes_compose_within_one_sweep() {
    // a = 2 * 4; b = a + 0;  with fold+propagate+algebraic enabled the
    // second statement collapses to the literal within two rounds.
    let program = method_program(
        vec![block(
            1,
            vec![
                assign(
                    "a",
                    Expression::binary(BinaryOp::Mul, Expression::int(2), Expression::int(4), Type::Int),
                ),
                assign(
                    "b",
                    Expression::binary(BinaryOp::Add, read("a"), Expression::int(0), Type::Int),
                ),
            ],
        )],
        2,
    );
    let config = config_with(&[
        Optimization::ConstantFolding,
        Optimization::Propagation,
        Optimization::AlgebraicSimplification,
    ]);
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();
    let statements = first_block_statements(&optimized);
    assert_eq!(value_of(&statements[0]), &Expression::int(8));
    assert_eq!(value_of(&statements[1]), &Expression::int(8));
}
