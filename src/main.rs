//! CLI entry point and command dispatch for govgate.

mod cli;
mod cmd;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};

fn main() {
    // Same 8 MB stack on every platform; Windows defaults to 1 MB.
    const STACK_SIZE: usize = 8 * 1024 * 1024;

    let thread = std::thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(run);

    let code = match thread {
        Ok(handle) => match handle.join() {
            Ok(Ok(code)) => code,
            Ok(Err(err)) => {
                eprintln!("{} {:#}", "Error:".red(), err);
                2
            }
            Err(payload) => std::panic::resume_unwind(payload),
        },
        Err(err) => {
            eprintln!("{} failed to spawn main thread: {}", "Error:".red(), err);
            2
        }
    };

    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.quiet {
        std::env::set_var("GOVGATE_QUIET", "1");
    }
    govgate::logging::init(cli.verbose);

    match cli.command {
        Commands::Validate(args) => cmd::validate::cmd_validate(&args),
        Commands::Graph { dir, topological } => cmd::graph::cmd_graph(dir.as_deref(), topological),
        Commands::Registry { dir, module } => {
            cmd::registry::cmd_registry(dir.as_deref(), module.as_deref())
        }
        Commands::Rules { dir } => cmd::rules::cmd_rules(dir.as_deref()),
        Commands::Completion { shell } => cmd::docs::cmd_completion(shell).map(|()| 0),
        Commands::Man { out_dir } => cmd::docs::cmd_man(&out_dir).map(|()| 0),
    }
}
