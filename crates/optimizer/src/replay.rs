//! Step-by-step replay over a recorded command log.
//!
//! A session owns the initial program and the log. Seeking forward applies
//! commands incrementally; seeking backward reverts them where a revert is
//! defined and otherwise falls back to a full replay from position zero —
//! always correct, never concurrent.

use crate::command::{self, Command};
use crate::error::OptimizeResult;
use reef_ast::{Address, Program};

/// Where a log entry sits relative to a scoping address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Before,
    Active,
    After,
}

pub struct Replay {
    initial: Program,
    log: Vec<Command>,
    position: usize,
    current: Program,
}

impl Replay {
    pub fn new(initial: Program, log: Vec<Command>) -> Self {
        Replay {
            current: initial.clone(),
            initial,
            log,
            position: 0,
        }
    }

    /// Number of commands in the log.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Commands applied so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn log(&self) -> &[Command] {
        &self.log
    }

    /// The program with the first `position()` commands applied.
    pub fn current(&self) -> &Program {
        &self.current
    }

    /// Move to `position` (clamped to the log length) and return the program
    /// at that point.
    pub fn seek(&mut self, position: usize) -> OptimizeResult<&Program> {
        let target = position.min(self.log.len());
        if target >= self.position {
            for cmd in &self.log[self.position..target] {
                self.current = command::apply(cmd, &self.current)?;
            }
        } else if let Some(reverted) = self.try_revert_to(target)? {
            self.current = reverted;
        } else {
            // A structural command blocks the backward path; replay from the
            // start instead.
            let mut current = self.initial.clone();
            for cmd in &self.log[..target] {
                current = command::apply(cmd, &current)?;
            }
            self.current = current;
        }
        self.position = target;
        Ok(&self.current)
    }

    fn try_revert_to(&self, target: usize) -> OptimizeResult<Option<Program>> {
        let mut current = self.current.clone();
        for cmd in self.log[target..self.position].iter().rev() {
            match command::revert(cmd, &current)? {
                Some(previous) => current = previous,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Classify every log entry relative to a scoping address: entries whose
    /// address the scope contains are active; the rest fall before or after
    /// the first active entry.
    pub fn partition(&self, scope: &Address) -> Vec<Region> {
        let first_active = self
            .log
            .iter()
            .position(|cmd| scope.contains(&cmd.address()));
        self.log
            .iter()
            .enumerate()
            .map(|(index, cmd)| {
                if scope.contains(&cmd.address()) {
                    Region::Active
                } else {
                    match first_active {
                        Some(first) if index < first => Region::Before,
                        Some(_) => Region::After,
                        None => Region::Before,
                    }
                }
            })
            .collect()
    }
}
