//! Command-line interface for the Reef optimizer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// reef-opt - optimizing middle-end of the Reef compiler
#[derive(Parser)]
#[command(name = "reef-opt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Optimize a type-checked program (JSON in, JSON out)
    Optimize {
        /// Path to the serialized program
        file: PathBuf,

        /// Where to write the optimized program (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the command log
        #[arg(long)]
        log: Option<PathBuf>,

        /// Run a single sweep instead of iterating to a fixed point
        #[arg(long)]
        once: bool,

        /// Cap the number of fixed-point rounds
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Comma-separated pass names (fold, propagate, algebraic,
        /// strength, cse, dead-code, three-address); all but three-address
        /// when omitted
        #[arg(long, value_delimiter = ',')]
        passes: Vec<String>,

        /// Print the optimized bodies as pseudo-source to stderr
        #[arg(long)]
        print: bool,
    },

    /// Re-apply a recorded command log up to a position
    Replay {
        /// Path to the serialized initial program
        file: PathBuf,

        /// Path to the command log
        log: PathBuf,

        /// Log position to stop at (end of log if omitted)
        #[arg(short, long)]
        position: Option<usize>,
    },

    /// Dump a method body's control-flow graph
    Cfg {
        /// Path to the serialized program
        file: PathBuf,

        /// Class name
        class: String,

        /// Method name
        method: String,
    },
}
