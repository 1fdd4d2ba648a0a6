//! The `graph` command: build order or dependency cycles.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use govgate::graph::DependencyGraph;
use govgate::ui::{self, colors};

use super::Project;

pub fn cmd_graph(dir: Option<&Path>, topological: bool) -> Result<i32> {
    let project = Project::open(dir)?;
    let outcome = project.load_registry()?;

    let Some(registry) = outcome.registry.as_ref() else {
        if let Some(abort) = &outcome.report.abort {
            eprintln!("{} {}", "Error:".red(), abort.cause);
        }
        return Ok(2);
    };

    let graph = DependencyGraph::new(registry);
    let order = if topological {
        graph.topological_order()
    } else {
        graph.build_order()
    };

    match order {
        Ok(order) => {
            if ui::is_quiet() {
                for module in &order {
                    println!("{}", module);
                }
                return Ok(0);
            }
            let title = if topological {
                "Topological order (dependents first)"
            } else {
                "Build order (dependencies first)"
            };
            println!("{}", colors::heading(title));
            println!("{}", ui::format::separator(title.chars().count()));
            for (index, module) in order.iter().enumerate() {
                println!("{:>4}. {}", index + 1, colors::identifier(module));
            }
            println!();
            println!(
                "{} {} {}",
                ui::format::count(graph.node_count(), "module"),
                colors::secondary(&format!("{} edges,", graph.edge_count())),
                colors::secondary(&format!(
                    "roots: {}, leaves: {}",
                    graph.roots().join(", "),
                    graph.leaves().join(", ")
                )),
            );
            Ok(0)
        }
        Err(err) => {
            eprintln!("{} {}", colors::error("✗"), err);
            for cycle in &err.cycles {
                eprintln!("  {}", cycle);
            }
            Ok(1)
        }
    }
}
