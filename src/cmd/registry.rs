//! The `registry` command: modules and the URNs they own.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use govgate::registry::{ModuleEntry, RegistryStore};
use govgate::ui::{self, colors};

use super::Project;

pub fn cmd_registry(dir: Option<&Path>, module: Option<&str>) -> Result<i32> {
    let project = Project::open(dir)?;
    let outcome = project.load_registry()?;

    let Some(registry) = outcome.registry.as_ref() else {
        if let Some(abort) = &outcome.report.abort {
            eprintln!("{} {}", "Error:".red(), abort.cause);
        }
        return Ok(2);
    };

    if let Some(name) = module {
        let Some(entry) = registry.resolve(name) else {
            eprintln!("{} Module '{}' is not registered", "Error:".red(), name);
            return Ok(1);
        };
        print_module(registry, entry);
        return Ok(0);
    }

    for entry in registry.modules() {
        print_module(registry, entry);
    }
    if !ui::is_quiet() {
        println!(
            "{}",
            colors::secondary(&format!(
                "{}, {}",
                ui::format::count(registry.module_count(), "module"),
                ui::format::count(registry.urn_count(), "URN")
            ))
        );
    }
    Ok(0)
}

fn print_module(registry: &RegistryStore, entry: &ModuleEntry) {
    let mut line = colors::identifier(&entry.name).bold().to_string();
    if let Some(label) = &entry.label {
        line.push_str(&format!(" {}", label));
    }
    if let Some(owner) = &entry.owner {
        line.push_str(&format!(" {}", colors::secondary(&format!("({})", owner))));
    }
    println!("{}", line);

    if !entry.dependencies.is_empty() {
        println!("  {} {}", "depends on:".dimmed(), entry.dependencies.join(", "));
    }
    for urn in registry.urns_of(&entry.name) {
        println!("  {} {}", "•".dimmed(), urn.urn);
    }
}
