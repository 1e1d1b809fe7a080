//! Control-Flow Graph Tests
//!
//! Edge wiring for structured control constructs, sentinel handling, and the
//! predecessor/successor inversion property.

mod common;

use common::*;
use reef_ast::{Cfg, Compound, Expression, NodeId};
use reef_optimizer::cfg;

/// Predecessor slots must be exactly the inverse of successor edges, and
/// every non-exit node needs at least one way out.
fn assert_well_formed(graph: &Cfg) {
    for node in graph.nodes.values() {
        if node.id != NodeId::EXIT {
            assert!(
                !node.successors().is_empty(),
                "{} has no outgoing edge",
                node.id
            );
        }
        if let Some(succ) = node.natural_successor {
            assert_eq!(
                graph.nodes[&succ].natural_predecessor,
                Some(node.id),
                "natural edge {} -> {succ} not inverted",
                node.id
            );
        }
        if let Some(succ) = node.complex_successor {
            assert!(
                graph.nodes[&succ].complex_predecessors.contains(&node.id),
                "complex edge {} -> {succ} not inverted",
                node.id
            );
        }
        if node.self_successor {
            assert!(node.complex_predecessors.contains(&node.id));
        }
        if let Some(pred) = node.natural_predecessor {
            assert_eq!(graph.nodes[&pred].natural_successor, Some(node.id));
        }
        for pred in &node.complex_predecessors {
            let source = &graph.nodes[pred];
            let points_back = source.complex_successor == Some(node.id)
                || (*pred == node.id && source.self_successor);
            assert!(points_back, "complex predecessor {pred} of {} stale", node.id);
        }
    }
}

#[test]
fn test_empty_compound_is_entry_then_exit() {
    let graph = cfg::build(&Compound::empty()).unwrap();
    assert_eq!(graph.len(), 2);
    let entry = graph.entry().unwrap();
    assert_eq!(entry.natural_successor, Some(NodeId::EXIT));
    assert_eq!(entry.complex_successor, None);
    assert!(!entry.self_successor);
    assert_well_formed(&graph);
}

#[test]
fn test_if_else_wiring() {
    // if (c) { #2 } else { #3 }  then  #4
    let program = method_program(
        vec![
            if_stmt(
                1,
                Expression::variable(bool_var("c")),
                vec![block(2, vec![assign("a", Expression::int(1))])],
                vec![block(3, vec![assign("a", Expression::int(2))])],
            ),
            block(4, vec![assign("b", read("a"))]),
        ],
        5,
    );
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);

    let cond = &graph.nodes[&NodeId::new(1)];
    assert_eq!(cond.natural_successor, Some(NodeId::new(2)));
    assert_eq!(cond.complex_successor, Some(NodeId::new(3)));
    assert!(!cond.inverted);

    // The then-branch jumps over the else-branch on a complex edge; the
    // else-branch falls through naturally.
    let then_block = &graph.nodes[&NodeId::new(2)];
    assert_eq!(then_block.complex_successor, Some(NodeId::new(4)));
    assert_eq!(then_block.natural_successor, None);
    let else_block = &graph.nodes[&NodeId::new(3)];
    assert_eq!(else_block.natural_successor, Some(NodeId::new(4)));
}

#[test]
fn test_while_with_body_loops_complex_back() {
    // while (c) { #2 }  then  #3
    let program = method_program(
        vec![
            while_stmt(
                1,
                Expression::variable(bool_var("c")),
                vec![block(2, vec![assign("a", Expression::int(1))])],
            ),
            block(3, vec![assign("b", Expression::int(0))]),
        ],
        4,
    );
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);

    let header = &graph.nodes[&NodeId::new(1)];
    assert_eq!(header.natural_successor, Some(NodeId::new(2)));
    assert_eq!(header.complex_successor, Some(NodeId::new(3)));

    let body = &graph.nodes[&NodeId::new(2)];
    assert_eq!(body.complex_successor, Some(NodeId::new(1)));
    assert!(header.complex_predecessors.contains(&NodeId::new(2)));
}

#[test]
fn test_empty_while_self_loops_inverted() {
    let program = method_program(
        vec![
            while_stmt(1, Expression::variable(bool_var("c")), vec![]),
            block(2, vec![assign("a", Expression::int(0))]),
        ],
        3,
    );
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);

    let header = &graph.nodes[&NodeId::new(1)];
    assert!(header.self_successor);
    assert!(header.inverted);
    assert_eq!(header.natural_successor, Some(NodeId::new(2)));
    assert!(header.complex_predecessors.contains(&NodeId::new(1)));
}

#[test]
fn test_final_return_is_natural_to_exit() {
    let program = method_program(vec![ret(1, Expression::int(0))], 2);
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);
    let node = &graph.nodes[&NodeId::new(1)];
    assert_eq!(node.natural_successor, Some(NodeId::EXIT));
    assert_eq!(node.complex_successor, None);
}

#[test]
fn test_return_inside_branch_is_complex_to_exit() {
    let program = method_program(
        vec![
            if_stmt(
                1,
                Expression::variable(bool_var("c")),
                vec![ret(2, Expression::int(1))],
                vec![],
            ),
            ret(3, Expression::int(0)),
        ],
        4,
    );
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);
    let inner = &graph.nodes[&NodeId::new(2)];
    assert_eq!(inner.complex_successor, Some(NodeId::EXIT));
    assert_eq!(inner.natural_successor, None);
}

#[test]
fn test_if_with_both_branches_empty_acts_like_block() {
    let program = method_program(
        vec![
            if_stmt(1, Expression::variable(bool_var("c")), vec![], vec![]),
            block(2, vec![assign("a", Expression::int(0))]),
        ],
        3,
    );
    let graph = &main_body(&program).cfg;
    assert_well_formed(graph);
    let node = &graph.nodes[&NodeId::new(1)];
    assert_eq!(node.natural_successor, Some(NodeId::new(2)));
    assert_eq!(node.complex_successor, None);
    assert!(!node.inverted);
}

#[test]
fn test_empty_branches_consume_no_ids() {
    let program = method_program(
        vec![
            if_stmt(1, Expression::variable(bool_var("c")), vec![], vec![]),
            ret(2, Expression::int(0)),
        ],
        3,
    );
    let graph = &main_body(&program).cfg;
    // Exactly: entry, the two statements, exit.
    assert_eq!(graph.len(), 4);
}

#[test]
fn test_nested_structures_stay_well_formed() {
    let program = method_program(
        vec![
            block(1, vec![assign("i", Expression::int(0))]),
            while_stmt(
                2,
                Expression::variable(bool_var("c")),
                vec![
                    if_stmt(
                        3,
                        Expression::variable(bool_var("d")),
                        vec![block(4, vec![assign("i", read("j"))])],
                        vec![ret(5, Expression::int(1))],
                    ),
                    block(6, vec![assign("j", read("i"))]),
                ],
            ),
            ret(7, Expression::int(0)),
        ],
        8,
    );
    assert_well_formed(&main_body(&program).cfg);
}
