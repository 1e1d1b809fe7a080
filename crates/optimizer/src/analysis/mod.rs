//! Dataflow analyses over the control-flow graph.

pub mod liveness;

pub use liveness::{analyze, Liveness};

use crate::rewrite::visitor::variable_reads;
use reef_ast::{BasicStatement, Target, Variable};
use std::collections::BTreeSet;

/// Variables read by one basic statement (value and member-target object).
pub fn statement_reads(statement: &BasicStatement) -> BTreeSet<Variable> {
    match statement {
        BasicStatement::Assignment { target, value } => {
            let mut reads = variable_reads(value);
            if let Target::Member { object, .. } = target {
                reads.extend(variable_reads(object));
            }
            reads
        }
        BasicStatement::Declaration { .. } => BTreeSet::new(),
        BasicStatement::Expression { value } => variable_reads(value),
    }
}

/// The variable a basic statement defines, if any. Member stores define no
/// variable; declarations introduce names without defining values.
pub fn statement_def(statement: &BasicStatement) -> Option<&Variable> {
    match statement {
        BasicStatement::Assignment {
            target: Target::Variable(v),
            ..
        } => Some(v),
        _ => None,
    }
}
