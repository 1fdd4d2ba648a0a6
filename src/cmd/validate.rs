//! The `validate` command: run the engine and gate on the report.

use anyhow::Result;
use colored::Colorize;

use govgate::config::ConfigOverrides;
use govgate::engine::Engine;
use govgate::formatters;
use govgate::ui::{self, colors};

use super::Project;
use crate::cli::{OutputFormat, ValidateArgs};

/// Run a validation and return the process exit code.
pub fn cmd_validate(args: &ValidateArgs) -> Result<i32> {
    let mut project = Project::open(args.dir.as_deref())?;
    project.config.apply_overrides(&ConfigOverrides {
        timeout_ms: args.timeout_ms,
        max_concurrent: args.jobs,
        output: args.output.clone(),
        strict: args.strict,
    })?;

    let rules = project.rules()?;
    tracing::info!(rules = rules.len(), root = %project.root.display(), "starting validation");

    let outcome = Engine::new(project.repository()?, rules, project.config.engine_options()).run();
    let report = &outcome.report;

    let artifact = project.config.report_path(&project.root);
    if !args.dry_run {
        report.write_artifact(&artifact)?;
    }

    match args.format {
        OutputFormat::Json => print!("{}", report.to_json()?),
        OutputFormat::Text if ui::is_quiet() => {}
        OutputFormat::Text => {
            println!("{}", formatters::format_report(report));
            if args.dry_run {
                println!("{}", "Dry run: report not written".dimmed());
            } else {
                println!("{} Report written to {}", colors::success("✓"), artifact.display());
            }
        }
    }

    Ok(report.decision().exit_code())
}
