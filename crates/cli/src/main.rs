mod cli;
mod pipeline;

use clap::Parser;
use cli::{Cli, Commands};
use pipeline::{dump_cfg, optimize_file, replay_file};
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Optimize {
            file,
            output,
            log,
            once,
            max_rounds,
            passes,
            print,
        } => optimize_file(
            file,
            output.as_deref(),
            log.as_deref(),
            *once,
            *max_rounds,
            passes,
            *print,
        ),
        Commands::Replay {
            file,
            log,
            position,
        } => replay_file(file, log, *position),
        Commands::Cfg {
            file,
            class,
            method,
        } => dump_cfg(file, class, method),
    };

    if let Err(error) = result {
        eprintln!("{}", error);
        process::exit(1);
    }
}
