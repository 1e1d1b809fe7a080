//! Program structure: classes, members, and bodies.

use crate::address::{BodyAddress, BodyKind};
use crate::cfg::Cfg;
use crate::node_id::Counters;
use crate::stmt::Compound;
use crate::types::{Type, Variable};
use serde::{Deserialize, Serialize};

/// A type-checked program (root node).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<Clazz>,
}

/// A class: fields, constructors, and methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clazz {
    pub id: String,
    pub members: Vec<Member>,
    pub constructors: Vec<Body>,
    pub methods: Vec<Method>,
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub return_type: Type,
    pub body: Body,
}

/// A method or constructor body: arguments, statements, the derived
/// control-flow graph, and the per-body counter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub arguments: Vec<Variable>,
    pub compound: Compound,
    pub cfg: Cfg,
    pub counters: Counters,
}

impl Body {
    /// The graph starts empty; the optimizer's CFG builder derives it.
    pub fn new(arguments: Vec<Variable>, compound: Compound, counters: Counters) -> Self {
        Body {
            arguments,
            compound,
            cfg: Cfg::default(),
            counters,
        }
    }
}

impl Program {
    pub fn class(&self, id: &str) -> Option<&Clazz> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Resolve a body address.
    pub fn body(&self, address: &BodyAddress) -> Option<&Body> {
        let class = self.class(&address.class)?;
        match &address.kind {
            BodyKind::Constructor(index) => class.constructors.get(*index),
            BodyKind::Method(name) => class
                .methods
                .iter()
                .find(|m| &m.name == name)
                .map(|m| &m.body),
        }
    }

    pub fn body_mut(&mut self, address: &BodyAddress) -> Option<&mut Body> {
        let class = self.classes.iter_mut().find(|c| c.id == address.class)?;
        match &address.kind {
            BodyKind::Constructor(index) => class.constructors.get_mut(*index),
            BodyKind::Method(name) => class
                .methods
                .iter_mut()
                .find(|m| &m.name == name)
                .map(|m| &mut m.body),
        }
    }

    /// Addresses of every body, classes in order, constructors before methods.
    pub fn body_addresses(&self) -> Vec<BodyAddress> {
        let mut out = Vec::new();
        for class in &self.classes {
            for index in 0..class.constructors.len() {
                out.push(BodyAddress {
                    class: class.id.clone(),
                    kind: BodyKind::Constructor(index),
                });
            }
            for method in &class.methods {
                out.push(BodyAddress {
                    class: class.id.clone(),
                    kind: BodyKind::Method(method.name.clone()),
                });
            }
        }
        out
    }
}
