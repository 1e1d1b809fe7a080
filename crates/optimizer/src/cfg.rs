//! Control-flow graph construction.
//!
//! One forward pass walks the compound, assigning each top-level statement
//! and condition its existing id and wiring natural (fallthrough) and
//! complex (branching) successor edges; a second pass inverts every
//! successor edge into the predecessor slots. Empty nested branches and
//! bodies never consume an id.

use crate::error::{OptimizeError, OptimizeResult};
use reef_ast::{Body, Cfg, CfgNode, Compound, CompoundStatement, NodeId, Program};

/// Build the control-flow graph of one body's compound.
pub fn build(compound: &Compound) -> OptimizeResult<Cfg> {
    let mut cfg = Cfg::default();

    let mut entry = CfgNode::new(NodeId::ENTRY);
    entry.natural_successor = Some(compound.first_id().unwrap_or(NodeId::EXIT));
    cfg.nodes.insert(NodeId::ENTRY, entry);

    visit_compound(&mut cfg, compound, NodeId::EXIT, false);
    cfg.nodes.insert(NodeId::EXIT, CfgNode::new(NodeId::EXIT));

    link_predecessors(&mut cfg)?;
    Ok(cfg)
}

/// Recompute a body's graph after its compound changed shape.
pub fn refresh_body(body: &mut Body) -> OptimizeResult<()> {
    body.cfg = build(&body.compound)?;
    Ok(())
}

/// Recompute every body's graph; used when ingesting a program whose graphs
/// were not shipped alongside the tree.
pub fn refresh_program(program: &mut Program) -> OptimizeResult<()> {
    for class in &mut program.classes {
        for body in &mut class.constructors {
            refresh_body(body)?;
        }
        for method in &mut class.methods {
            refresh_body(&mut method.body)?;
        }
    }
    Ok(())
}

/// Wire successor edges for every statement of `compound`.
///
/// `continuation` is the inherited continuation id (the exit sentinel at the
/// outermost level). `complex` marks a branch whose fallthrough, if any,
/// must leave on a complex edge.
fn visit_compound(cfg: &mut Cfg, compound: &Compound, continuation: NodeId, complex: bool) {
    let statements = &compound.statements;
    for (i, statement) in statements.iter().enumerate() {
        let local = statements.get(i + 1).map(CompoundStatement::id);
        let cont = local.unwrap_or(continuation);
        let stmt_complex = complex && local.is_none();

        match statement {
            CompoundStatement::Basic(block) => {
                let mut node = CfgNode::new(block.id);
                if stmt_complex {
                    node.complex_successor = Some(cont);
                } else {
                    node.natural_successor = Some(cont);
                }
                cfg.nodes.insert(node.id, node);
            }
            CompoundStatement::If(s) => {
                let mut node = CfgNode::new(s.condition.id());
                match (s.then_branch.first_id(), s.else_branch.first_id()) {
                    // Both branches empty: behaves like a plain block.
                    (None, None) => {
                        if stmt_complex {
                            node.complex_successor = Some(cont);
                        } else {
                            node.natural_successor = Some(cont);
                        }
                    }
                    (Some(then_first), None) => {
                        node.natural_successor = Some(then_first);
                        node.complex_successor = Some(cont);
                        cfg.nodes.insert(node.id, node);
                        visit_compound(cfg, &s.then_branch, cont, stmt_complex);
                        continue;
                    }
                    (None, Some(else_first)) => {
                        node.natural_successor = Some(else_first);
                        node.complex_successor = Some(cont);
                        node.inverted = true;
                        cfg.nodes.insert(node.id, node);
                        visit_compound(cfg, &s.else_branch, cont, stmt_complex);
                        continue;
                    }
                    (Some(then_first), Some(else_first)) => {
                        node.natural_successor = Some(then_first);
                        node.complex_successor = Some(else_first);
                        cfg.nodes.insert(node.id, node);
                        // The then-branch must jump over the else-branch;
                        // the else-branch inherits our complexity.
                        visit_compound(cfg, &s.then_branch, cont, true);
                        visit_compound(cfg, &s.else_branch, cont, stmt_complex);
                        continue;
                    }
                }
                cfg.nodes.insert(node.id, node);
            }
            CompoundStatement::While(s) => {
                let mut node = CfgNode::new(s.condition.id());
                match s.body.first_id() {
                    None => {
                        node.natural_successor = Some(cont);
                        node.self_successor = true;
                        if !stmt_complex {
                            node.inverted = true;
                        }
                        cfg.nodes.insert(node.id, node);
                    }
                    Some(body_first) => {
                        node.natural_successor = Some(body_first);
                        node.complex_successor = Some(cont);
                        let header = node.id;
                        cfg.nodes.insert(node.id, node);
                        visit_compound(cfg, &s.body, header, true);
                    }
                }
            }
            CompoundStatement::Return(s) => {
                let mut node = CfgNode::new(s.value.id());
                if cont == NodeId::EXIT {
                    node.natural_successor = Some(NodeId::EXIT);
                } else {
                    node.complex_successor = Some(NodeId::EXIT);
                }
                cfg.nodes.insert(node.id, node);
            }
        }
    }
}

/// Invert successor edges into predecessor slots.
///
/// At most one writer may claim a node's natural predecessor; complex
/// predecessors accumulate. A node with `self_successor` becomes its own
/// complex predecessor.
fn link_predecessors(cfg: &mut Cfg) -> OptimizeResult<()> {
    let ids: Vec<NodeId> = cfg.nodes.keys().copied().collect();
    for id in ids {
        let Some(node) = cfg.nodes.get(&id) else {
            continue;
        };
        let natural = node.natural_successor;
        let complex = node.complex_successor;
        let own_loop = node.self_successor;

        if let Some(succ) = natural {
            let target = cfg
                .nodes
                .get_mut(&succ)
                .ok_or(OptimizeError::DanglingSuccessor { from: id, to: succ })?;
            if let Some(first) = target.natural_predecessor {
                return Err(OptimizeError::DuplicateNaturalPredecessor {
                    node: succ,
                    first,
                    second: id,
                });
            }
            target.natural_predecessor = Some(id);
        }
        if let Some(succ) = complex {
            let target = cfg
                .nodes
                .get_mut(&succ)
                .ok_or(OptimizeError::DanglingSuccessor { from: id, to: succ })?;
            target.complex_predecessors.insert(id);
        }
        if own_loop {
            if let Some(target) = cfg.nodes.get_mut(&id) {
                target.complex_predecessors.insert(id);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_ast::{BasicBlock, Expression, ExpressionBlock, IfStatement, ReturnStatement};

    fn block(id: u32) -> CompoundStatement {
        CompoundStatement::Basic(BasicBlock::new(
            NodeId::new(id),
            vec![reef_ast::BasicStatement::Expression {
                value: Expression::int(0),
            }],
        ))
    }

    #[test]
    fn test_empty_compound_wires_entry_to_exit() {
        let cfg = build(&Compound::empty()).unwrap();
        assert_eq!(cfg.len(), 2);
        let entry = cfg.entry().unwrap();
        assert_eq!(entry.natural_successor, Some(NodeId::EXIT));
        assert_eq!(entry.complex_successor, None);
        let exit = cfg.exit().unwrap();
        assert_eq!(exit.natural_predecessor, Some(NodeId::ENTRY));
        assert!(exit.complex_predecessors.is_empty());
    }

    #[test]
    fn test_straight_line_fallthrough() {
        let cfg = build(&Compound::new(vec![block(1), block(2)])).unwrap();
        assert_eq!(
            cfg.node(NodeId::new(1)).unwrap().natural_successor,
            Some(NodeId::new(2))
        );
        assert_eq!(
            cfg.node(NodeId::new(2)).unwrap().natural_successor,
            Some(NodeId::EXIT)
        );
        assert_eq!(
            cfg.node(NodeId::new(2)).unwrap().natural_predecessor,
            Some(NodeId::new(1))
        );
    }

    #[test]
    fn test_if_with_empty_else_is_not_inverted() {
        let cond = ExpressionBlock::new(NodeId::new(1), Expression::boolean(true));
        let statement = CompoundStatement::If(IfStatement {
            condition: cond,
            then_branch: Compound::new(vec![block(2)]),
            else_branch: Compound::empty(),
        });
        let cfg = build(&Compound::new(vec![statement, block(3)])).unwrap();
        let node = cfg.node(NodeId::new(1)).unwrap();
        assert_eq!(node.natural_successor, Some(NodeId::new(2)));
        assert_eq!(node.complex_successor, Some(NodeId::new(3)));
        assert!(!node.inverted);
    }

    #[test]
    fn test_if_with_empty_then_is_inverted() {
        let cond = ExpressionBlock::new(NodeId::new(1), Expression::boolean(true));
        let statement = CompoundStatement::If(IfStatement {
            condition: cond,
            then_branch: Compound::empty(),
            else_branch: Compound::new(vec![block(2)]),
        });
        let cfg = build(&Compound::new(vec![statement, block(3)])).unwrap();
        let node = cfg.node(NodeId::new(1)).unwrap();
        assert_eq!(node.natural_successor, Some(NodeId::new(2)));
        assert_eq!(node.complex_successor, Some(NodeId::new(3)));
        assert!(node.inverted);
    }

    #[test]
    fn test_return_mid_compound_edges_complex_to_exit() {
        let ret = CompoundStatement::Return(ReturnStatement {
            value: ExpressionBlock::new(NodeId::new(1), Expression::int(0)),
        });
        let cfg = build(&Compound::new(vec![ret, block(2)])).unwrap();
        let node = cfg.node(NodeId::new(1)).unwrap();
        assert_eq!(node.natural_successor, None);
        assert_eq!(node.complex_successor, Some(NodeId::EXIT));
    }
}
