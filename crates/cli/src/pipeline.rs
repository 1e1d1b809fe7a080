//! Pipeline for processing serialized Reef programs.
//!
//! The optimizer core is silent and does no I/O; everything file- and
//! format-shaped lives here. Programs and command logs cross this boundary
//! as JSON, and the embedded control-flow graphs are recomputed on ingest so
//! a program shipped without them is still usable.

use reef_ast::{BodyAddress, Program};
use reef_optimizer::{
    cfg, command::Command, optimize, OptimizeConfig, OptimizeError, Optimization, Replay,
    RoundPolicy,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline error type
#[derive(Debug)]
pub enum PipelineError {
    /// File I/O error
    IoError(std::io::Error),
    /// Malformed program or log JSON
    JsonError(PathBuf, serde_json::Error),
    /// Optimizer contract violation
    OptimizeError(OptimizeError),
    /// Bad command-line input (unknown pass or body)
    BadInput(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::IoError(e) => write!(f, "I/O error: {}", e),
            PipelineError::JsonError(path, e) => {
                write!(f, "{}: invalid JSON: {}", path.display(), e)
            }
            PipelineError::OptimizeError(e) => write!(f, "optimizer error: {}", e),
            PipelineError::BadInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::IoError(error)
    }
}

impl From<OptimizeError> for PipelineError {
    fn from(error: OptimizeError) -> Self {
        PipelineError::OptimizeError(error)
    }
}

fn read_program(path: &Path) -> PipelineResult<Program> {
    let text = fs::read_to_string(path)?;
    let mut program: Program = serde_json::from_str(&text)
        .map_err(|e| PipelineError::JsonError(path.to_path_buf(), e))?;
    cfg::refresh_program(&mut program)?;
    Ok(program)
}

fn read_log(path: &Path) -> PipelineResult<Vec<Command>> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| PipelineError::JsonError(path.to_path_buf(), e))
}

fn parse_pass(name: &str) -> PipelineResult<Optimization> {
    match name {
        "fold" => Ok(Optimization::ConstantFolding),
        "propagate" => Ok(Optimization::Propagation),
        "algebraic" => Ok(Optimization::AlgebraicSimplification),
        "strength" => Ok(Optimization::StrengthReduction),
        "cse" => Ok(Optimization::CommonSubexpression),
        "dead-code" => Ok(Optimization::DeadCode),
        "three-address" => Ok(Optimization::ThreeAddressCode),
        other => Err(PipelineError::BadInput(format!("unknown pass: {}", other))),
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> PipelineResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::JsonError(PathBuf::from("<output>"), e))?;
    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{}", text),
    }
    Ok(())
}

fn print_bodies(program: &Program) {
    for class in &program.classes {
        eprintln!("class {} {{", class.id);
        for method in &class.methods {
            eprintln!("  {} {}() {{", method.return_type.as_str(), method.name);
            for line in method.body.compound.to_string().lines() {
                eprintln!("    {}", line);
            }
            eprintln!("  }}");
        }
        eprintln!("}}");
    }
}

#[allow(clippy::too_many_arguments)]
pub fn optimize_file(
    file: &Path,
    output: Option<&Path>,
    log: Option<&Path>,
    once: bool,
    max_rounds: Option<u32>,
    passes: &[String],
    print: bool,
) -> PipelineResult<()> {
    let program = read_program(file)?;

    let enabled: BTreeSet<Optimization> = if passes.is_empty() {
        Optimization::default_set()
    } else {
        passes
            .iter()
            .map(|name| parse_pass(name))
            .collect::<PipelineResult<_>>()?
    };
    let rounds = if once {
        RoundPolicy::Once
    } else {
        RoundPolicy::ToFixedPoint {
            max_rounds: max_rounds.unwrap_or(32),
        }
    };
    let config = OptimizeConfig {
        passes: enabled,
        rounds,
        ..OptimizeConfig::default()
    };

    let mut commands: Vec<Command> = Vec::new();
    let optimized = optimize(&program, &config, &mut commands)?;

    eprintln!("{} commands emitted", commands.len());
    if print {
        print_bodies(&optimized);
    }
    if let Some(log_path) = log {
        write_json(&commands, Some(log_path))?;
    }
    write_json(&optimized, output)
}

pub fn replay_file(file: &Path, log: &Path, position: Option<usize>) -> PipelineResult<()> {
    let program = read_program(file)?;
    let commands = read_log(log)?;
    let target = position.unwrap_or(commands.len());

    let mut replay = Replay::new(program, commands);
    replay.seek(target)?;
    eprintln!("replayed {} of {} commands", replay.position(), replay.len());
    write_json(replay.current(), None)
}

pub fn dump_cfg(file: &Path, class: &str, method: &str) -> PipelineResult<()> {
    let program = read_program(file)?;
    let address = BodyAddress::method(class, method);
    let body = program.body(&address).ok_or_else(|| {
        PipelineError::BadInput(format!("no such body: {}.{}", class, method))
    })?;
    print!("{}", body.cfg);
    Ok(())
}
