//! The `rules` command: configured rules grouped by family.

use anyhow::Result;
use std::path::Path;

use govgate::finding::Severity;
use govgate::rules::Family;
use govgate::ui::{self, colors};

use super::Project;

pub fn cmd_rules(dir: Option<&Path>) -> Result<i32> {
    let project = Project::open(dir)?;
    let rules = project.rules()?;

    if rules.is_empty() {
        if !ui::is_quiet() {
            println!("No rules configured in {}", project.config.rules);
        }
        return Ok(0);
    }

    for family in Family::ALL {
        let mut in_family = rules.by_family(family).peekable();
        if in_family.peek().is_none() {
            continue;
        }
        println!("{}", colors::heading(&family.to_string()));
        for rule in in_family {
            let severity = match rule.severity {
                Severity::Error => colors::error("error"),
                Severity::Warning => colors::warning("warn"),
            };
            println!(
                "  {} {:<5} {}",
                colors::identifier(&rule.id),
                severity,
                rule.describe()
            );
        }
    }
    Ok(0)
}
