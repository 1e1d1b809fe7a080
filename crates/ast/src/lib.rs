//! Typed AST model for the Reef optimizing middle-end.
//!
//! This crate holds the data the optimizer transforms: the program tree
//! produced by the type checker, the control-flow graph model derived from
//! it, the per-body counter record, and the structural addressing scheme
//! that names any node in the tree. Everything here is plain data with serde
//! derives; behavior lives in `reef-optimizer`.

pub mod address;
pub mod cfg;
pub mod display;
pub mod expr;
pub mod node_id;
pub mod nodes;
pub mod ops;
pub mod stmt;
pub mod types;

pub use address::{
    Address, BasicStatementAddress, BlockAddress, BlockKind, BodyAddress, BodyKind, BranchKind,
    BranchStep, CompoundAddress, ExprPath, ExpressionAddress, StatementAddress, StatementPlace,
};
pub use cfg::{Cfg, CfgNode};
pub use expr::{
    AllocationExpr, BinaryExpr, CoercionExpr, Expression, InvocationExpr, Literal, LiteralExpr,
    MemberExpr, TernaryExpr, UnaryExpr, VariableExpr,
};
pub use node_id::{Counters, NodeId};
pub use nodes::{Body, Clazz, Member, Method, Program};
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::{
    BasicBlock, BasicStatement, Compound, CompoundStatement, ExpressionBlock, IfStatement,
    ReturnStatement, Target, WhileStatement,
};
pub use types::{Type, Variable};
