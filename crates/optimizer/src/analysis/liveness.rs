//! Liveness analysis over a body's control-flow graph.
//!
//! Backward may-be-live dataflow: `out[n] = ⋃ in[s]` over successors,
//! `in[n] = use[n] ∪ (out[n] \ def[n])`, iterated to a full-sweep fixed
//! point. The exit sentinel is seeded with an externally supplied
//! live-on-exit set; a condition node's own guard expression contributes to
//! its use set before predecessor propagation. Feeds dead-code elimination
//! and interactive tooling.

use super::{statement_def, statement_reads};
use crate::rewrite::visitor::variable_reads;
use crate::rewrite::{fold_blocks, BlockRef};
use indexmap::IndexMap;
use reef_ast::{BasicStatement, BodyAddress, Cfg, Compound, Expression, NodeId, Variable};
use std::collections::BTreeSet;

/// Per-node def/use/in/out variable sets.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    pub defs: IndexMap<NodeId, BTreeSet<Variable>>,
    pub uses: IndexMap<NodeId, BTreeSet<Variable>>,
    pub live_in: IndexMap<NodeId, BTreeSet<Variable>>,
    pub live_out: IndexMap<NodeId, BTreeSet<Variable>>,
}

impl Liveness {
    pub fn live_in(&self, id: NodeId) -> BTreeSet<Variable> {
        self.live_in.get(&id).cloned().unwrap_or_default()
    }

    pub fn live_out(&self, id: NodeId) -> BTreeSet<Variable> {
        self.live_out.get(&id).cloned().unwrap_or_default()
    }
}

/// Block-local use/def: `use` collects reads not preceded by a local def,
/// `def` collects assigned variables. The guard condition, when present,
/// reads after every block statement.
fn block_use_def(
    statements: &[BasicStatement],
    condition: Option<&Expression>,
) -> (BTreeSet<Variable>, BTreeSet<Variable>) {
    let mut uses = BTreeSet::new();
    let mut defs: BTreeSet<Variable> = BTreeSet::new();
    for statement in statements {
        for read in statement_reads(statement) {
            if !defs.contains(&read) {
                uses.insert(read);
            }
        }
        if let Some(def) = statement_def(statement) {
            defs.insert(def.clone());
        }
    }
    if let Some(condition) = condition {
        for read in variable_reads(condition) {
            if !defs.contains(&read) {
                uses.insert(read);
            }
        }
    }
    (uses, defs)
}

/// Run liveness for one body. `compound` and `cfg` must describe the same
/// statement shape.
pub fn analyze(compound: &Compound, cfg: &Cfg, live_on_exit: &BTreeSet<Variable>) -> Liveness {
    let mut result = Liveness::default();

    for id in cfg.nodes.keys() {
        result.defs.insert(*id, BTreeSet::new());
        result.uses.insert(*id, BTreeSet::new());
        result.live_in.insert(*id, BTreeSet::new());
        result.live_out.insert(*id, BTreeSet::new());
    }
    result.uses.insert(NodeId::EXIT, live_on_exit.clone());

    // Any body address works here; fold_blocks only threads it through.
    let root = BodyAddress::method("", "").root();
    fold_blocks(compound, &root, &mut |block, _| {
        let (id, uses, defs) = match block {
            BlockRef::Basic(b) => {
                let (uses, defs) = block_use_def(&b.statements, None);
                (b.id, uses, defs)
            }
            BlockRef::Guard(eb) => {
                let (uses, defs) = block_use_def(&eb.block.statements, Some(&eb.condition));
                (eb.id(), uses, defs)
            }
        };
        result.uses.insert(id, uses);
        result.defs.insert(id, defs);
    });

    // Full sweeps until nothing changes; order does not affect the result.
    let ids: Vec<NodeId> = cfg.nodes.keys().copied().collect();
    let mut changed = true;
    while changed {
        changed = false;
        for id in ids.iter().rev() {
            let node = &cfg.nodes[id];
            let mut out = BTreeSet::new();
            for succ in node.successors() {
                if let Some(succ_in) = result.live_in.get(&succ) {
                    out.extend(succ_in.iter().cloned());
                }
            }
            let uses = &result.uses[id];
            let defs = &result.defs[id];
            let mut live_in: BTreeSet<Variable> = uses.clone();
            live_in.extend(out.difference(defs).cloned());

            if result.live_out[id] != out {
                result.live_out.insert(*id, out);
                changed = true;
            }
            if result.live_in[id] != live_in {
                result.live_in.insert(*id, live_in);
                changed = true;
            }
        }
    }

    result
}
