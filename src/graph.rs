//! Dependency graph over registry modules.
//!
//! One node per module, one edge per declared dependency that resolves to a
//! registered module. Cycle detection is a depth-first traversal with
//! three-color marking that keeps going after the first cycle so every
//! independent cycle is reported.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use thiserror::Error;

use crate::finding::{Category, Finding, Location, Severity};
use crate::registry::RegistryStore;

pub const CYCLE: &str = "graph.cycle";

/// A dependency cycle.
///
/// `path` starts at the node where the cycle was closed and ends with that
/// same node, e.g. `[a, b, a]`. A module depending on itself is `[a, a]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub path: Vec<String>,
}

impl Cycle {
    /// Distinct modules in the cycle, in path order.
    pub fn members(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    pub fn is_self_loop(&self) -> bool {
        self.path.len() == 2
    }

    /// Rotation-independent identity of the cycle.
    fn canonical(&self) -> Vec<String> {
        let members = self.members();
        let start = members
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(0);
        members[start..]
            .iter()
            .chain(&members[..start])
            .cloned()
            .collect()
    }

    pub fn to_finding(&self, location: Location) -> Finding {
        let message = if self.is_self_loop() {
            format!("module '{}' depends on itself", self.path[0])
        } else {
            format!("dependency cycle: {}", self)
        };
        Finding::new(CYCLE, Category::Cycle, Severity::Error, location, message)
            .with_hint("break the cycle by removing one of the dependencies")
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" -> "))
    }
}

/// The graph has at least one cycle, so it has no topological order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency graph has {} cycle(s)", .cycles.len())]
pub struct CycleError {
    pub cycles: Vec<Cycle>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

struct Traversal {
    postorder: Vec<usize>,
    cycles: Vec<Cycle>,
}

/// Directed graph borrowing module names from the registry.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    /// Node names in sorted order; a node's index is its position here
    nodes: Vec<&'a str>,
    /// Outgoing edges per node, deduplicated, in declaration order
    edges: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(store: &'a RegistryStore) -> Self {
        Self::build(store.modules().map(|module| {
            (
                module.name.as_str(),
                module.dependencies.iter().map(String::as_str),
            )
        }))
    }

    /// Build from `(module, dependencies)` pairs.
    ///
    /// Dependencies naming an unknown module are left out of the graph.
    pub fn build<I, D>(modules: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut declared: Vec<(&'a str, Vec<&'a str>)> = modules
            .into_iter()
            .map(|(name, dependencies)| (name, dependencies.into_iter().collect()))
            .collect();
        declared.sort_by(|a, b| a.0.cmp(b.0));
        declared.dedup_by(|a, b| a.0 == b.0);

        let index: HashMap<&str, usize> = declared
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (*name, i))
            .collect();

        let edges = declared
            .iter()
            .map(|(_, dependencies)| {
                let mut targets: Vec<usize> = Vec::new();
                for dependency in dependencies {
                    if let Some(&target) = index.get(dependency) {
                        if !targets.contains(&target) {
                            targets.push(target);
                        }
                    }
                }
                targets
            })
            .collect();

        Self {
            nodes: declared.into_iter().map(|(name, _)| name).collect(),
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Modules ordered so that every module comes before its dependencies.
    pub fn topological_order(&self) -> Result<Vec<&'a str>, CycleError> {
        let mut order = self.build_order()?;
        order.reverse();
        Ok(order)
    }

    /// Modules ordered so that every dependency comes before its dependents.
    pub fn build_order(&self) -> Result<Vec<&'a str>, CycleError> {
        let traversal = self.traverse();
        if !traversal.cycles.is_empty() {
            return Err(CycleError {
                cycles: traversal.cycles,
            });
        }
        Ok(traversal
            .postorder
            .into_iter()
            .map(|node| self.nodes[node])
            .collect())
    }

    /// Every independent cycle, each reported once.
    pub fn cycles(&self) -> Vec<Cycle> {
        self.traverse().cycles
    }

    /// Modules no other module depends on.
    pub fn roots(&self) -> Vec<&'a str> {
        let mut depended_on = vec![false; self.nodes.len()];
        for targets in &self.edges {
            for &target in targets {
                depended_on[target] = true;
            }
        }
        self.nodes
            .iter()
            .zip(depended_on)
            .filter(|(_, depended_on)| !depended_on)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Modules without resolvable dependencies.
    pub fn leaves(&self) -> Vec<&'a str> {
        self.nodes
            .iter()
            .zip(&self.edges)
            .filter(|(_, targets)| targets.is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    fn traverse(&self) -> Traversal {
        let mut colors = vec![Color::Unvisited; self.nodes.len()];
        let mut stack = Vec::new();
        let mut traversal = Traversal {
            postorder: Vec::with_capacity(self.nodes.len()),
            cycles: Vec::new(),
        };
        let mut seen = BTreeSet::new();

        for node in 0..self.nodes.len() {
            if colors[node] == Color::Unvisited {
                self.visit(node, &mut colors, &mut stack, &mut traversal, &mut seen);
            }
        }
        traversal
    }

    fn visit(
        &self,
        node: usize,
        colors: &mut [Color],
        stack: &mut Vec<usize>,
        traversal: &mut Traversal,
        seen: &mut BTreeSet<Vec<String>>,
    ) {
        colors[node] = Color::InProgress;
        stack.push(node);

        for &target in &self.edges[node] {
            match colors[target] {
                Color::Unvisited => self.visit(target, colors, stack, traversal, seen),
                Color::InProgress => {
                    if let Some(start) = stack.iter().position(|&n| n == target) {
                        let path = stack[start..]
                            .iter()
                            .chain(std::iter::once(&target))
                            .map(|&n| self.nodes[n].to_string())
                            .collect();
                        let cycle = Cycle { path };
                        if seen.insert(cycle.canonical()) {
                            tracing::debug!(cycle = %cycle, "dependency cycle found");
                            traversal.cycles.push(cycle);
                        }
                    }
                }
                Color::Done => {}
            }
        }

        stack.pop();
        colors[node] = Color::Done;
        traversal.postorder.push(node);
    }
}
