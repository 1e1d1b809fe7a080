//! Control-flow graph model.
//!
//! A `Cfg` names the compound statements of one Body by id and wires them
//! with natural (fallthrough) and complex (branching) edges. The graph is
//! data only; the builder lives in the optimizer crate.

use crate::node_id::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One node of a control-flow graph.
///
/// `self_successor` records a complex edge from the node to itself (the
/// empty-while self-loop); `complex_successor` only ever points at other
/// nodes. `inverted` marks conditions whose natural edge is taken when the
/// condition is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgNode {
    pub id: NodeId,
    pub natural_predecessor: Option<NodeId>,
    pub complex_predecessors: BTreeSet<NodeId>,
    pub natural_successor: Option<NodeId>,
    pub complex_successor: Option<NodeId>,
    pub self_successor: bool,
    pub inverted: bool,
}

impl CfgNode {
    pub fn new(id: NodeId) -> Self {
        CfgNode {
            id,
            natural_predecessor: None,
            complex_predecessors: BTreeSet::new(),
            natural_successor: None,
            complex_successor: None,
            self_successor: false,
            inverted: false,
        }
    }

    /// All successor ids: natural, complex, and self.
    pub fn successors(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(3);
        if let Some(n) = self.natural_successor {
            out.push(n);
        }
        if let Some(c) = self.complex_successor {
            out.push(c);
        }
        if self.self_successor {
            out.push(self.id);
        }
        out
    }

    /// All predecessor ids: natural and complex.
    pub fn predecessors(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(n) = self.natural_predecessor {
            out.push(n);
        }
        out.extend(self.complex_predecessors.iter().copied());
        out
    }
}

/// Control-flow graph over the statements of one Body.
///
/// Always carries exactly one entry and one exit sentinel; every other node
/// id equals some statement's id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cfg {
    pub nodes: IndexMap<NodeId, CfgNode>,
}

impl Cfg {
    pub fn node(&self, id: NodeId) -> Option<&CfgNode> {
        self.nodes.get(&id)
    }

    pub fn entry(&self) -> Option<&CfgNode> {
        self.nodes.get(&NodeId::ENTRY)
    }

    pub fn exit(&self) -> Option<&CfgNode> {
        self.nodes.get(&NodeId::EXIT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::fmt::Display for Cfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self.nodes.values() {
            write!(f, "{}:", node.id)?;
            if let Some(n) = node.natural_successor {
                write!(f, " nat->{n}")?;
            }
            if let Some(c) = node.complex_successor {
                write!(f, " cmp->{c}")?;
            }
            if node.self_successor {
                write!(f, " cmp->{}", node.id)?;
            }
            if node.inverted {
                write!(f, " [inverted]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
