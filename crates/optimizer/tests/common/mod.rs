//! Shared program builders for the integration suites.

#![allow(dead_code)]

use reef_ast::{
    BasicBlock, BasicStatement, Body, BodyAddress, Clazz, Compound, CompoundStatement, Counters,
    Expression, ExpressionBlock, IfStatement, Method, NodeId, Program, ReturnStatement, Target,
    Type, Variable, WhileStatement,
};
use reef_optimizer::cfg;

pub fn int_var(name: &str) -> Variable {
    Variable::new(name, 0, Type::Int)
}

pub fn bool_var(name: &str) -> Variable {
    Variable::new(name, 0, Type::Bool)
}

pub fn read(name: &str) -> Expression {
    Expression::variable(int_var(name))
}

pub fn assign(name: &str, value: Expression) -> BasicStatement {
    BasicStatement::Assignment {
        target: Target::Variable(int_var(name)),
        value,
    }
}

pub fn declare(names: &[&str]) -> BasicStatement {
    BasicStatement::Declaration {
        variables: names.iter().map(|n| int_var(n)).collect(),
    }
}

pub fn block(id: u32, statements: Vec<BasicStatement>) -> CompoundStatement {
    CompoundStatement::Basic(BasicBlock::new(NodeId::new(id), statements))
}

pub fn ret(id: u32, value: Expression) -> CompoundStatement {
    CompoundStatement::Return(ReturnStatement {
        value: ExpressionBlock::new(NodeId::new(id), value),
    })
}

pub fn if_stmt(
    id: u32,
    condition: Expression,
    then_branch: Vec<CompoundStatement>,
    else_branch: Vec<CompoundStatement>,
) -> CompoundStatement {
    CompoundStatement::If(IfStatement {
        condition: ExpressionBlock::new(NodeId::new(id), condition),
        then_branch: Compound::new(then_branch),
        else_branch: Compound::new(else_branch),
    })
}

pub fn while_stmt(
    id: u32,
    condition: Expression,
    body: Vec<CompoundStatement>,
) -> CompoundStatement {
    CompoundStatement::While(WhileStatement {
        condition: ExpressionBlock::new(NodeId::new(id), condition),
        body: Compound::new(body),
    })
}

/// Wrap a compound into a one-class, one-method program with its CFG built,
/// the way the type checker hands bodies over. `next_id` seeds the counter
/// record past the ids used in the compound.
pub fn method_program(statements: Vec<CompoundStatement>, next_id: u32) -> Program {
    let body = Body::new(
        Vec::new(),
        Compound::new(statements),
        Counters::new(next_id),
    );
    let mut program = Program {
        classes: vec![Clazz {
            id: "Main".to_string(),
            members: Vec::new(),
            constructors: Vec::new(),
            methods: vec![Method {
                name: "run".to_string(),
                return_type: Type::Int,
                body,
            }],
        }],
    };
    cfg::refresh_program(&mut program).expect("cfg builds");
    program
}

pub fn body_address() -> BodyAddress {
    BodyAddress::method("Main", "run")
}

pub fn main_body(program: &Program) -> &Body {
    program.body(&body_address()).expect("body exists")
}

/// The statements of the first basic block of the body.
pub fn first_block_statements(program: &Program) -> &[BasicStatement] {
    match &main_body(program).compound.statements[0] {
        CompoundStatement::Basic(b) => &b.statements,
        other => panic!("expected basic block, got {other:?}"),
    }
}
