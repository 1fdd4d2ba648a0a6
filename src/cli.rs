//! CLI argument definitions for govgate.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// `--version` output: the release plus the commit and date it was built from.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("GIT_SHA"),
    "\nbuilt: ",
    env!("BUILD_DATE"),
);

#[derive(Parser)]
#[command(name = "govgate")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Governance gate for declarative registries and configuration", long_about = None)]
#[command(
    after_help = "GETTING STARTED:\n    govgate validate            Validate the current directory\n    govgate graph               Show the module build order\n\n    Configuration lives in .govgate/config.md; rules in .govgate/rules.yaml."
)]
pub struct Cli {
    /// Suppress all non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show debug logging on stderr (GOVGATE_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate sources against the registry and rules, then gate on the result
    ///
    /// Exit codes: 0 pass, 1 validation failures, 2 aborted or misconfigured.
    Validate(ValidateArgs),
    /// Print the module build order, or the dependency cycles
    Graph {
        /// Project directory
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Print dependents before their dependencies
        #[arg(long)]
        topological: bool,
    },
    /// List registered modules and their URNs
    Registry {
        /// Project directory
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Show a single module
        #[arg(long, value_name = "NAME")]
        module: Option<String>,
    },
    /// List the configured rules by family
    Rules {
        /// Project directory
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Generate man pages for govgate and each subcommand
    Man {
        /// Output directory for the man pages
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Project directory
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,
    /// Run everything but do not write the report artifact
    #[arg(long)]
    pub dry_run: bool,
    /// Fail the gate on warnings too
    #[arg(long)]
    pub strict: bool,
    /// Report artifact path (.json or .md)
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<String>,
    /// Overall run timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
    /// Loader worker pool size
    #[arg(long, short, value_name = "N")]
    pub jobs: Option<usize>,
    /// Stdout format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
