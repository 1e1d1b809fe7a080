//! Structural addresses into the program tree.
//!
//! Seven address kinds form a strict containment chain:
//!
//! ```text
//! Program ⊃ Body ⊃ Compound ⊃ CompoundStatement ⊃ Block ⊃ BasicStatement ⊃ Expression
//! ```
//!
//! Each kind chains its parent address with a local discriminator: the body
//! selector, the branch-step list for compound nesting, the statement index,
//! the block kind, the basic-statement place, and the expression child path.
//! Containment is decided purely on the address values — the tree is never
//! consulted — and is stable under serialization round-trips.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which body of a class an address points into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Constructor(usize),
    Method(String),
}

/// Address of a method or constructor body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyAddress {
    pub class: String,
    pub kind: BodyKind,
}

impl BodyAddress {
    pub fn method(class: impl Into<String>, name: impl Into<String>) -> Self {
        BodyAddress {
            class: class.into(),
            kind: BodyKind::Method(name.into()),
        }
    }

    pub fn constructor(class: impl Into<String>, index: usize) -> Self {
        BodyAddress {
            class: class.into(),
            kind: BodyKind::Constructor(index),
        }
    }

    /// Address of this body's outermost compound.
    pub fn root(&self) -> CompoundAddress {
        CompoundAddress {
            body: self.clone(),
            branches: Vec::new(),
        }
    }
}

/// Which nested compound a compound statement owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchKind {
    Then,
    Else,
    Loop,
}

/// One step from a compound statement down into one of its branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchStep {
    pub statement: usize,
    pub branch: BranchKind,
}

/// Address of a (possibly nested) compound: the owning body plus the branch
/// steps leading down from its root compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundAddress {
    pub body: BodyAddress,
    pub branches: Vec<BranchStep>,
}

impl CompoundAddress {
    /// Descend into the branch of the statement at `statement`.
    pub fn enter(&self, statement: usize, branch: BranchKind) -> CompoundAddress {
        let mut branches = self.branches.clone();
        branches.push(BranchStep { statement, branch });
        CompoundAddress {
            body: self.body.clone(),
            branches,
        }
    }

    pub fn statement(&self, index: usize) -> StatementAddress {
        StatementAddress {
            compound: self.clone(),
            index,
        }
    }

    /// First branch step of the nesting path.
    pub fn head(&self) -> Option<&BranchStep> {
        self.branches.first()
    }

    /// Remaining branch steps after [`head`](Self::head).
    pub fn tail(&self) -> &[BranchStep] {
        if self.branches.is_empty() {
            &[]
        } else {
            &self.branches[1..]
        }
    }

    fn contains(&self, other: &Address) -> bool {
        let Some(oc) = other.compound_address() else {
            return false;
        };
        if oc.body != self.body || !oc.branches.starts_with(&self.branches) {
            return false;
        }
        // A longer branch list means `other` sits in a nested compound under
        // one of our statements.
        if oc.branches.len() > self.branches.len() {
            return true;
        }
        // Equal branch lists: `other` is this compound or something in it.
        true
    }
}

/// Address of a compound statement: its compound plus a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementAddress {
    pub compound: CompoundAddress,
    pub index: usize,
}

impl StatementAddress {
    /// The block of a `BasicBlock` statement.
    pub fn basic(&self) -> BlockAddress {
        BlockAddress {
            statement: self.clone(),
            kind: BlockKind::Basic,
        }
    }

    /// The guard-evaluation block of an if/while/return statement.
    pub fn guard(&self) -> BlockAddress {
        BlockAddress {
            statement: self.clone(),
            kind: BlockKind::Guard,
        }
    }

    fn contains(&self, other: &Address) -> bool {
        let Some(oc) = other.compound_address() else {
            return false;
        };
        if oc.body != self.compound.body || !oc.branches.starts_with(&self.compound.branches) {
            return false;
        }
        if oc.branches.len() > self.compound.branches.len() {
            // Nested under us only if the first extra step passes through
            // this statement.
            return oc.branches[self.compound.branches.len()].statement == self.index;
        }
        // Same compound: compare statement positions.
        match other {
            Address::Compound(_) => false,
            _ => other
                .statement_address()
                .is_some_and(|s| s.index == self.index),
        }
    }
}

/// Which block a compound statement exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// The `BasicBlock` statement itself.
    Basic,
    /// The guard-evaluation `ExpressionBlock` of an if/while/return.
    Guard,
}

/// Address of a `BasicBlock` or `ExpressionBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockAddress {
    pub statement: StatementAddress,
    pub kind: BlockKind,
}

impl BlockAddress {
    /// The basic statement at `index`.
    pub fn at(&self, index: usize) -> BasicStatementAddress {
        BasicStatementAddress {
            block: self.clone(),
            place: StatementPlace::At(index),
        }
    }

    /// The condition slot of a guard block.
    pub fn condition(&self) -> BasicStatementAddress {
        BasicStatementAddress {
            block: self.clone(),
            place: StatementPlace::Condition,
        }
    }

    fn contains(&self, other: &Address) -> bool {
        other.block_address() == Some(self)
    }
}

/// Position of a basic statement inside a block. `Condition` addresses the
/// guard-expression slot of an `ExpressionBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementPlace {
    At(usize),
    Condition,
}

/// Address of a basic statement (or the condition slot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicStatementAddress {
    pub block: BlockAddress,
    pub place: StatementPlace,
}

impl BasicStatementAddress {
    pub fn expression(&self, path: ExprPath) -> ExpressionAddress {
        ExpressionAddress {
            statement: self.clone(),
            path,
        }
    }

    fn contains(&self, other: &Address) -> bool {
        other.basic_address() == Some(self)
    }
}

/// Child-index path from a basic statement's expression roots down to one
/// node. The first element selects the root slot (0 = value/condition,
/// 1 = the member-target object of an assignment); the rest are child
/// indices in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprPath(pub SmallVec<[u32; 8]>);

impl ExprPath {
    pub fn root(slot: u32) -> Self {
        let mut path = SmallVec::new();
        path.push(slot);
        ExprPath(path)
    }

    pub fn from_slice(indices: &[u32]) -> Self {
        ExprPath(SmallVec::from_slice(indices))
    }

    pub fn push(&mut self, index: u32) {
        self.0.push(index);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn head(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn tail(&self) -> &[u32] {
        if self.0.is_empty() {
            &[]
        } else {
            &self.0[1..]
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn is_prefix_of(&self, other: &ExprPath) -> bool {
        other.0.starts_with(&self.0)
    }
}

/// Address of one expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpressionAddress {
    pub statement: BasicStatementAddress,
    pub path: ExprPath,
}

impl ExpressionAddress {
    fn contains(&self, other: &Address) -> bool {
        match other {
            Address::Expression(e) => {
                e.statement == self.statement && self.path.is_prefix_of(&e.path)
            }
            _ => false,
        }
    }
}

/// Any address, as carried by commands and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    Program,
    Body(BodyAddress),
    Compound(CompoundAddress),
    Statement(StatementAddress),
    Block(BlockAddress),
    Basic(BasicStatementAddress),
    Expression(ExpressionAddress),
}

impl Address {
    /// The body this address points into, if it is finer than `Program`.
    pub fn body_address(&self) -> Option<&BodyAddress> {
        match self {
            Address::Program => None,
            Address::Body(b) => Some(b),
            Address::Compound(c) => Some(&c.body),
            Address::Statement(s) => Some(&s.compound.body),
            Address::Block(b) => Some(&b.statement.compound.body),
            Address::Basic(b) => Some(&b.block.statement.compound.body),
            Address::Expression(e) => Some(&e.statement.block.statement.compound.body),
        }
    }

    /// The innermost compound this address passes through.
    pub fn compound_address(&self) -> Option<&CompoundAddress> {
        match self {
            Address::Program | Address::Body(_) => None,
            Address::Compound(c) => Some(c),
            Address::Statement(s) => Some(&s.compound),
            Address::Block(b) => Some(&b.statement.compound),
            Address::Basic(b) => Some(&b.block.statement.compound),
            Address::Expression(e) => Some(&e.statement.block.statement.compound),
        }
    }

    pub fn statement_address(&self) -> Option<&StatementAddress> {
        match self {
            Address::Statement(s) => Some(s),
            Address::Block(b) => Some(&b.statement),
            Address::Basic(b) => Some(&b.block.statement),
            Address::Expression(e) => Some(&e.statement.block.statement),
            _ => None,
        }
    }

    pub fn block_address(&self) -> Option<&BlockAddress> {
        match self {
            Address::Block(b) => Some(b),
            Address::Basic(b) => Some(&b.block),
            Address::Expression(e) => Some(&e.statement.block),
            _ => None,
        }
    }

    pub fn basic_address(&self) -> Option<&BasicStatementAddress> {
        match self {
            Address::Basic(b) => Some(b),
            Address::Expression(e) => Some(&e.statement),
            _ => None,
        }
    }

    /// Whether `other` is this address or nested anywhere under it.
    pub fn contains(&self, other: &Address) -> bool {
        match self {
            Address::Program => true,
            Address::Body(b) => other.body_address() == Some(b),
            Address::Compound(c) => c.contains(other),
            Address::Statement(s) => s.contains(other),
            Address::Block(b) => b.contains(other),
            Address::Basic(b) => b.contains(other),
            Address::Expression(e) => e.contains(other),
        }
    }

    /// Whether this address and `other` overlap (either contains the other).
    pub fn overlaps(&self, other: &Address) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl From<BodyAddress> for Address {
    fn from(a: BodyAddress) -> Self {
        Address::Body(a)
    }
}

impl From<CompoundAddress> for Address {
    fn from(a: CompoundAddress) -> Self {
        Address::Compound(a)
    }
}

impl From<StatementAddress> for Address {
    fn from(a: StatementAddress) -> Self {
        Address::Statement(a)
    }
}

impl From<BlockAddress> for Address {
    fn from(a: BlockAddress) -> Self {
        Address::Block(a)
    }
}

impl From<BasicStatementAddress> for Address {
    fn from(a: BasicStatementAddress) -> Self {
        Address::Basic(a)
    }
}

impl From<ExpressionAddress> for Address {
    fn from(a: ExpressionAddress) -> Self {
        Address::Expression(a)
    }
}

impl std::fmt::Display for BodyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            BodyKind::Constructor(index) => write!(f, "{}.<init#{index}>", self.class),
            BodyKind::Method(name) => write!(f, "{}.{name}", self.class),
        }
    }
}

impl std::fmt::Display for CompoundAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.body)?;
        for step in &self.branches {
            let branch = match step.branch {
                BranchKind::Then => "then",
                BranchKind::Else => "else",
                BranchKind::Loop => "loop",
            };
            write!(f, "/{}:{branch}", step.statement)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Program => write!(f, "<program>"),
            Address::Body(b) => write!(f, "{b}"),
            Address::Compound(c) => write!(f, "{c}"),
            Address::Statement(s) => write!(f, "{}/{}", s.compound, s.index),
            Address::Block(b) => {
                let kind = match b.kind {
                    BlockKind::Basic => "basic",
                    BlockKind::Guard => "guard",
                };
                write!(f, "{}/{}/{kind}", b.statement.compound, b.statement.index)
            }
            Address::Basic(b) => {
                write!(f, "{}", Address::Block(b.block.clone()))?;
                match b.place {
                    StatementPlace::At(index) => write!(f, "/{index}"),
                    StatementPlace::Condition => write!(f, "/cond"),
                }
            }
            Address::Expression(e) => {
                write!(f, "{}", Address::Basic(e.statement.clone()))?;
                write!(f, "/")?;
                for (i, step) in e.path.as_slice().iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{step}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_expression_address() -> ExpressionAddress {
        BodyAddress::method("Main", "run")
            .root()
            .enter(2, BranchKind::Then)
            .statement(0)
            .basic()
            .at(1)
            .expression(ExprPath::from_slice(&[0, 1]))
    }

    #[test]
    fn test_chain_containment() {
        let expr = Address::Expression(sample_expression_address());
        let body = Address::Body(BodyAddress::method("Main", "run"));
        let root = Address::Compound(BodyAddress::method("Main", "run").root());
        let nested = Address::Compound(
            BodyAddress::method("Main", "run")
                .root()
                .enter(2, BranchKind::Then),
        );
        let stmt = Address::Statement(BodyAddress::method("Main", "run").root().statement(2));

        assert!(Address::Program.contains(&expr));
        assert!(body.contains(&expr));
        assert!(root.contains(&expr));
        assert!(nested.contains(&expr));
        assert!(stmt.contains(&nested));
        assert!(stmt.contains(&expr));
        assert!(!expr.contains(&stmt));
        assert!(!body.contains(&Address::Body(BodyAddress::method("Main", "main"))));
    }

    #[test]
    fn test_containment_is_reflexive() {
        let addr = Address::Expression(sample_expression_address());
        assert!(addr.contains(&addr));
    }

    #[test]
    fn test_sibling_statements_disjoint() {
        let root = BodyAddress::method("Main", "run").root();
        let first = Address::Statement(root.statement(0));
        let second = Address::Statement(root.statement(1));
        assert!(!first.contains(&second));
        assert!(!second.contains(&first));
        assert!(!first.overlaps(&second));
    }

    #[test]
    fn test_branch_steps_disambiguate() {
        let root = BodyAddress::method("Main", "run").root();
        let then_branch = Address::Compound(root.enter(0, BranchKind::Then));
        let else_branch = Address::Compound(root.enter(0, BranchKind::Else));
        let stmt = Address::Statement(root.statement(0));
        assert!(stmt.contains(&then_branch));
        assert!(stmt.contains(&else_branch));
        assert!(!then_branch.contains(&else_branch));
    }

    #[test]
    fn test_expression_path_prefix() {
        let basic = BodyAddress::method("Main", "run").root().statement(0).basic().at(0);
        let parent = Address::Expression(basic.expression(ExprPath::root(0)));
        let child = Address::Expression(basic.expression(ExprPath::from_slice(&[0, 1, 0])));
        let other_slot = Address::Expression(basic.expression(ExprPath::root(1)));
        assert!(parent.contains(&child));
        assert!(!child.contains(&parent));
        assert!(!parent.contains(&other_slot));
    }

    #[test]
    fn test_head_tail() {
        let nested = BodyAddress::method("Main", "run")
            .root()
            .enter(1, BranchKind::Loop)
            .enter(0, BranchKind::Else);
        let head = nested.head().unwrap();
        assert_eq!(head.statement, 1);
        assert_eq!(head.branch, BranchKind::Loop);
        assert_eq!(nested.tail().len(), 1);

        let path = ExprPath::from_slice(&[0, 2, 1]);
        assert_eq!(path.head(), Some(0));
        assert_eq!(path.tail(), &[2, 1]);
    }

    #[test]
    fn test_serde_round_trip_preserves_containment() {
        let outer = Address::Statement(BodyAddress::method("Main", "run").root().statement(2));
        let inner = Address::Expression(sample_expression_address());
        let outer_json = serde_json::to_string(&outer).unwrap();
        let inner_json = serde_json::to_string(&inner).unwrap();
        let outer2: Address = serde_json::from_str(&outer_json).unwrap();
        let inner2: Address = serde_json::from_str(&inner_json).unwrap();
        assert_eq!(outer, outer2);
        assert_eq!(inner, inner2);
        assert!(outer2.contains(&inner2));
        assert!(!inner2.contains(&outer2));
    }
}
