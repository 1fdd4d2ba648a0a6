//! Reference rules: names used by documents must resolve in the registry,
//! or, with `resolve: files`, name a file that exists.
//!
//! File references are tried relative to the referencing source's directory
//! first, then relative to the project root. A leading `/` means the root.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use super::path::{walk, FieldPath};
use super::{compile_path, compile_regex, EvalContext, Rule, Scope};
use crate::error::ConfigError;
use crate::finding::Finding;

/// Where a reference must resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveTarget {
    Modules,
    Urns,
    /// A file in the source repository
    Files,
}

impl fmt::Display for ResolveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveTarget::Modules => write!(f, "module"),
            ResolveTarget::Urns => write!(f, "URN"),
            ResolveTarget::Files => write!(f, "file"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReferencesConfig {
    resolve: Option<ResolveTarget>,
    field: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
}

impl ReferencesConfig {
    pub(crate) fn compile(self, id: &str) -> Result<ReferencesRule, ConfigError> {
        let resolve = self.resolve.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "resolve",
        })?;
        if self.field.is_none() && self.pattern.is_none() {
            return Err(ConfigError::MissingField {
                rule: id.to_string(),
                field: "field",
            });
        }

        Ok(ReferencesRule {
            resolve,
            field: self.field.map(|f| compile_path(id, &f)).transpose()?,
            pattern: self.pattern.map(|p| compile_regex(id, &p)).transpose()?,
            scope: Scope::compile(id, &self.sources)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReferencesRule {
    pub resolve: ResolveTarget,
    /// Field whose string (or list of strings) values are references
    pub field: Option<FieldPath>,
    /// Finds references embedded in any string; capture group 1 if present
    pub pattern: Option<Regex>,
    pub scope: Scope,
}

impl ReferencesRule {
    fn resolves(&self, ctx: &EvalContext<'_>, source: &str, reference: &str) -> bool {
        match self.resolve {
            ResolveTarget::Modules => ctx.registry.resolve(reference).is_some(),
            ResolveTarget::Urns => ctx.registry.resolve_urn(reference).is_some(),
            ResolveTarget::Files => file_candidates(source, reference)
                .iter()
                .any(|id| ctx.files.contains(id)),
        }
    }

    fn unresolved(&self, reference: &str) -> String {
        match self.resolve {
            ResolveTarget::Files => format!("referenced file '{}' does not exist", reference),
            target => format!("reference to unknown {} '{}'", target, reference),
        }
    }

    /// `(path, reference)` pairs found in one document, without repeats.
    fn references(&self, tree: &serde_yaml::Mapping) -> BTreeSet<(String, String)> {
        let mut found = BTreeSet::new();

        if let Some(field) = &self.field {
            for matched in field.lookup(tree) {
                match matched.value {
                    Value::String(reference) => {
                        found.insert((matched.path, reference.clone()));
                    }
                    Value::Sequence(items) => {
                        for (index, item) in items.iter().enumerate() {
                            if let Some(reference) = item.as_str() {
                                found.insert((
                                    format!("{}[{}]", matched.path, index),
                                    reference.to_string(),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(pattern) = &self.pattern {
            for node in walk(tree) {
                let Some(text) = node.value.as_str() else { continue };
                for captures in pattern.captures_iter(text) {
                    let matched = captures.get(1).or_else(|| captures.get(0));
                    if let Some(matched) = matched {
                        found.insert((node.path.clone(), matched.as_str().to_string()));
                    }
                }
            }
        }

        found
    }

    pub(crate) fn evaluate(&self, rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for document in ctx.documents_in(&self.scope) {
            if ctx.is_registry_source(&document.source) {
                continue;
            }
            for (path, reference) in self.references(&document.tree) {
                if !self.resolves(ctx, &document.source, &reference) {
                    findings.push(rule.finding(
                        document.location().with_path(path),
                        self.unresolved(&reference),
                    ));
                }
            }
        }

        findings
    }
}

/// Source ids a file reference may name, nearest first.
fn file_candidates(source: &str, reference: &str) -> Vec<String> {
    if let Some(rooted) = reference.strip_prefix('/') {
        return join_path("", rooted).into_iter().collect();
    }
    let dir = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut candidates: Vec<String> = join_path(dir, reference).into_iter().collect();
    if let Some(from_root) = join_path("", reference) {
        if !candidates.contains(&from_root) {
            candidates.push(from_root);
        }
    }
    candidates
}

/// Resolve `relative` against directory `base`; `None` when it climbs above the root.
fn join_path(base: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            part => parts.push(part),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

impl fmt::Display for ReferencesRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut origins = Vec::new();
        if let Some(field) = &self.field {
            origins.push(format!("`{}`", field));
        }
        if let Some(pattern) = &self.pattern {
            origins.push(format!("matches of `{}`", pattern.as_str()));
        }
        match self.resolve {
            ResolveTarget::Files => write!(f, "{} must name existing files", origins.join(" and ")),
            target => write!(
                f,
                "{} must resolve to a registered {}",
                origins.join(" and "),
                target
            ),
        }
    }
}
