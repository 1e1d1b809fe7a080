//! Driver Tests
//!
//! Round policies, fixed-point behavior, scoping, and determinism.

mod common;

use common::*;
use reef_ast::{Address, BinaryOp, BodyAddress, Expression, Method, Type};
use reef_optimizer::{optimize, Command, NullSink, OptimizeConfig, Optimization, RoundPolicy};

fn folding_chain_program() -> reef_ast::Program {
    // Needs one round per step: fold 2*4, then propagate, then fold again.
    method_program(
        vec![
            block(
                1,
                vec![
                    assign(
                        "a",
                        Expression::binary(BinaryOp::Mul, Expression::int(2), Expression::int(4), Type::Int),
                    ),
                    assign(
                        "b",
                        Expression::binary(BinaryOp::Mul, read("a"), Expression::int(2), Type::Int),
                    ),
                ],
            ),
            ret(2, read("b")),
        ],
        3,
    )
}

#[test]
fn test_once_policy_runs_a_single_sweep() {
    let program = folding_chain_program();
    let config = OptimizeConfig {
        rounds: RoundPolicy::Once,
        passes: [Optimization::ConstantFolding, Optimization::Propagation]
            .into_iter()
            .collect(),
        ..OptimizeConfig::default()
    };
    let mut once_log: Vec<Command> = Vec::new();
    let once = optimize(&program, &config, &mut once_log).unwrap();

    let fixed_config = OptimizeConfig {
        rounds: RoundPolicy::default(),
        ..config
    };
    let mut fixed_log: Vec<Command> = Vec::new();
    let fixed = optimize(&program, &fixed_config, &mut fixed_log).unwrap();

    assert!(once_log.len() < fixed_log.len());
    assert_ne!(once, fixed);
}

#[test]
fn test_fixed_point_emits_nothing_on_rerun() {
    let program = folding_chain_program();
    let config = OptimizeConfig::default();
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();

    let mut log: Vec<Command> = Vec::new();
    let again = optimize(&optimized, &config, &mut log).unwrap();
    assert_eq!(log.len(), 0, "unexpected commands: {log:?}");
    assert_eq!(again, optimized);
}

#[test]
fn test_round_budget_bounds_fixed_point() {
    let program = folding_chain_program();
    let config = OptimizeConfig {
        rounds: RoundPolicy::ToFixedPoint { max_rounds: 1 },
        ..OptimizeConfig::default()
    };
    let mut log: Vec<Command> = Vec::new();
    let bounded = optimize(&program, &config, &mut log).unwrap();
    // One round cannot finish the chain.
    let full = optimize(&program, &OptimizeConfig::default(), &mut NullSink).unwrap();
    assert_ne!(bounded, full);
}

#[test]
fn test_scope_address_limits_rewrites() {
    // Two identical methods; only the scoped one changes.
    let mut program = folding_chain_program();
    let second = Method {
        name: "other".to_string(),
        return_type: Type::Int,
        body: main_body(&program).clone(),
    };
    program.classes[0].methods.push(second);

    let config = OptimizeConfig {
        scope: Address::Body(body_address()),
        ..OptimizeConfig::default()
    };
    let optimized = optimize(&program, &config, &mut NullSink).unwrap();

    let untouched = optimized
        .body(&BodyAddress::method("Main", "other"))
        .unwrap();
    assert_eq!(untouched, program.body(&BodyAddress::method("Main", "other")).unwrap());
    assert_ne!(main_body(&optimized), main_body(&program));
}

#[test]
fn test_identical_runs_emit_identical_logs() {
    let program = folding_chain_program();
    let config = OptimizeConfig::default();

    let mut first: Vec<Command> = Vec::new();
    let a = optimize(&program, &config, &mut first).unwrap();
    let mut second: Vec<Command> = Vec::new();
    let b = optimize(&program, &config, &mut second).unwrap();

    assert_eq!(a, b);
    assert_eq!(first, second);
}
