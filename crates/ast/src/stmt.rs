//! Statement AST nodes: basic statements, blocks, and structured control.

use crate::expr::Expression;
use crate::node_id::NodeId;
use crate::types::{Type, Variable};
use serde::{Deserialize, Serialize};

/// Assignment destination: a local variable or an object member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Variable(Variable),
    Member {
        object: Expression,
        member: String,
        ty: Type,
    },
}

impl Target {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Target::Variable(v) => Some(v),
            Target::Member { .. } => None,
        }
    }
}

/// Straight-line statements carried by a [`BasicBlock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicStatement {
    Assignment { target: Target, value: Expression },
    Declaration { variables: Vec<Variable> },
    Expression { value: Expression },
}

/// A maximal straight-line run of basic statements; the CFG's atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: NodeId,
    pub statements: Vec<BasicStatement>,
}

impl BasicBlock {
    pub fn new(id: NodeId, statements: Vec<BasicStatement>) -> Self {
        BasicBlock { id, statements }
    }
}

/// Guard-evaluation block plus the condition it computes, identified by the
/// block's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionBlock {
    pub block: BasicBlock,
    pub condition: Expression,
}

impl ExpressionBlock {
    pub fn new(id: NodeId, condition: Expression) -> Self {
        ExpressionBlock {
            block: BasicBlock::new(id, Vec::new()),
            condition,
        }
    }

    pub fn id(&self) -> NodeId {
        self.block.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: ExpressionBlock,
    pub then_branch: Compound,
    pub else_branch: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: ExpressionBlock,
    pub body: Compound,
}

/// Return with its value-evaluation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnStatement {
    pub value: ExpressionBlock,
}

/// Statement forms a [`Compound`] is made of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundStatement {
    Basic(BasicBlock),
    If(IfStatement),
    While(WhileStatement),
    Return(ReturnStatement),
}

impl CompoundStatement {
    /// The id that names this statement in the CFG.
    pub fn id(&self) -> NodeId {
        match self {
            CompoundStatement::Basic(b) => b.id,
            CompoundStatement::If(s) => s.condition.id(),
            CompoundStatement::While(s) => s.condition.id(),
            CompoundStatement::Return(s) => s.value.id(),
        }
    }
}

/// Ordered sequence of compound statements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Compound {
    pub statements: Vec<CompoundStatement>,
}

impl Compound {
    pub fn new(statements: Vec<CompoundStatement>) -> Self {
        Compound { statements }
    }

    pub fn empty() -> Self {
        Compound {
            statements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Id of the first statement, if any.
    pub fn first_id(&self) -> Option<NodeId> {
        self.statements.first().map(CompoundStatement::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;

    #[test]
    fn test_statement_ids() {
        let block = CompoundStatement::Basic(BasicBlock::new(NodeId::new(3), Vec::new()));
        assert_eq!(block.id(), NodeId::new(3));

        let ret = CompoundStatement::Return(ReturnStatement {
            value: ExpressionBlock::new(NodeId::new(5), Expression::int(0)),
        });
        assert_eq!(ret.id(), NodeId::new(5));
    }

    #[test]
    fn test_first_id() {
        assert_eq!(Compound::empty().first_id(), None);
        let compound = Compound::new(vec![CompoundStatement::Basic(BasicBlock::new(
            NodeId::new(9),
            Vec::new(),
        ))]);
        assert_eq!(compound.first_id(), Some(NodeId::new(9)));
    }
}
