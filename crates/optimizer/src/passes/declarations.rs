//! Unused-declaration narrowing (whole-Compound pass).
//!
//! Collects every variable referenced anywhere in the body — read or
//! assigned — and narrows declaration statements down to the referenced
//! names, removing declarations left empty. Runs after dead-assignment
//! elimination so freshly orphaned declarations disappear in the same
//! sweep.

use crate::analysis::{statement_def, statement_reads};
use crate::command::{Command, PassTag};
use crate::rewrite::visitor::variable_reads;
use crate::rewrite::{fold_blocks, rewrite_all_blocks, BlockRef, BlockTransform};
use reef_ast::{
    BasicBlock, BasicStatement, BlockAddress, Compound, CompoundAddress, ExpressionBlock, Variable,
};
use std::collections::BTreeSet;

fn referenced_variables(compound: &Compound, address: &CompoundAddress) -> BTreeSet<Variable> {
    let mut used = BTreeSet::new();
    fold_blocks(compound, address, &mut |block, _| {
        let (statements, condition) = match block {
            BlockRef::Basic(b) => (&b.statements, None),
            BlockRef::Guard(eb) => (&eb.block.statements, Some(&eb.condition)),
        };
        for statement in statements {
            used.extend(statement_reads(statement));
            if let Some(def) = statement_def(statement) {
                used.insert(def.clone());
            }
        }
        if let Some(condition) = condition {
            used.extend(variable_reads(condition));
        }
    });
    used
}

struct Narrow<'a> {
    used: &'a BTreeSet<Variable>,
    commands: &'a mut Vec<Command>,
}

impl Narrow<'_> {
    fn narrow_block(&mut self, block: BasicBlock, address: &BlockAddress) -> BasicBlock {
        let mut out: Vec<BasicStatement> = Vec::with_capacity(block.statements.len());
        for statement in &block.statements {
            let BasicStatement::Declaration { variables } = statement else {
                out.push(statement.clone());
                continue;
            };
            let retained: Vec<Variable> = variables
                .iter()
                .filter(|v| self.used.contains(v))
                .cloned()
                .collect();
            if retained.len() == variables.len() {
                out.push(statement.clone());
            } else if retained.is_empty() {
                self.commands.push(Command::RemoveStatement {
                    pass: PassTag::Declarations,
                    address: address.at(out.len()),
                    statement: statement.clone(),
                });
            } else {
                let narrowed = BasicStatement::Declaration {
                    variables: retained,
                };
                self.commands.push(Command::ReplaceStatement {
                    pass: PassTag::Declarations,
                    address: address.at(out.len()),
                    before: statement.clone(),
                    after: narrowed.clone(),
                });
                out.push(narrowed);
            }
        }
        BasicBlock::new(block.id, out)
    }
}

impl BlockTransform for Narrow<'_> {
    fn basic(&mut self, block: BasicBlock, address: &BlockAddress) -> BasicBlock {
        self.narrow_block(block, address)
    }

    fn guard(&mut self, block: ExpressionBlock, address: &BlockAddress) -> ExpressionBlock {
        ExpressionBlock {
            block: self.narrow_block(block.block, address),
            condition: block.condition,
        }
    }
}

/// Narrow every declaration in the body's compound.
pub fn run(
    compound: &Compound,
    address: &CompoundAddress,
    commands: &mut Vec<Command>,
) -> Compound {
    let used = referenced_variables(compound, address);
    let mut narrow = Narrow {
        used: &used,
        commands,
    };
    rewrite_all_blocks(compound, address, &mut narrow)
}
