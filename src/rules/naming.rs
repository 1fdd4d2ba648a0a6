//! Naming rules: identifiers must match an allow pattern.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::Deserialize;

use super::{compile_regex, EvalContext, Rule, Scope};
use crate::error::ConfigError;
use crate::finding::{Finding, Location};

/// Which identifiers a naming rule checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingTarget {
    /// Names of registered modules
    #[default]
    ModuleNames,
    /// Every mapping key of every document in scope
    FieldKeys,
    /// The identifier segment of registered URNs
    UrnIdentifiers,
    /// File names (last path segment) of the sources in scope
    SourceNames,
}

impl fmt::Display for NamingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingTarget::ModuleNames => write!(f, "module names"),
            NamingTarget::FieldKeys => write!(f, "field keys"),
            NamingTarget::UrnIdentifiers => write!(f, "URN identifiers"),
            NamingTarget::SourceNames => write!(f, "source file names"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamingConfig {
    pattern: Option<String>,
    #[serde(default)]
    target: NamingTarget,
    #[serde(default)]
    exceptions: Vec<String>,
    #[serde(default)]
    sources: Vec<String>,
}

impl NamingConfig {
    pub(crate) fn compile(self, id: &str) -> Result<NamingRule, ConfigError> {
        let pattern = self.pattern.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "pattern",
        })?;

        Ok(NamingRule {
            pattern: compile_regex(id, &pattern)?,
            target: self.target,
            exceptions: self.exceptions.into_iter().collect(),
            scope: Scope::compile(id, &self.sources)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NamingRule {
    pub pattern: Regex,
    pub target: NamingTarget,
    /// Names allowed to break the pattern
    pub exceptions: BTreeSet<String>,
    pub scope: Scope,
}

impl NamingRule {
    fn allows(&self, name: &str) -> bool {
        self.exceptions.contains(name) || self.pattern.is_match(name)
    }

    fn violation(&self, what: &str, name: &str) -> String {
        format!(
            "{} '{}' does not match pattern `{}`",
            what,
            name,
            self.pattern.as_str()
        )
    }

    pub(crate) fn evaluate(&self, rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        match self.target {
            NamingTarget::ModuleNames => {
                for module in ctx.registry.modules() {
                    if !self.allows(&module.name) {
                        let path = match &module.origin.path {
                            Some(path) => format!("{}.name", path),
                            None => "name".to_string(),
                        };
                        findings.push(rule.finding(
                            module.origin.clone().with_path(path),
                            self.violation("module name", &module.name),
                        ));
                    }
                }
            }
            NamingTarget::FieldKeys => {
                for document in ctx.documents_in(&self.scope) {
                    for node in super::path::walk(&document.tree) {
                        let Some(key) = node.key else { continue };
                        if !self.allows(&key) {
                            findings.push(rule.finding(
                                document.location().with_path(node.path),
                                self.violation("field key", &key),
                            ));
                        }
                    }
                }
            }
            NamingTarget::UrnIdentifiers => {
                for entry in ctx.registry.urns() {
                    let Some(parsed) = &entry.parsed else { continue };
                    if self.exceptions.contains(&entry.urn) {
                        continue;
                    }
                    if !self.allows(&parsed.identifier) {
                        findings.push(rule.finding(
                            entry.origin.clone(),
                            self.violation(
                                &format!("URN '{}' identifier", entry.urn),
                                &parsed.identifier,
                            ),
                        ));
                    }
                }
            }
            NamingTarget::SourceNames => {
                for id in ctx.sources_in(&self.scope) {
                    let name = id.rsplit('/').next().unwrap_or(id);
                    if self.exceptions.contains(id) {
                        continue;
                    }
                    if !self.allows(name) {
                        findings.push(rule.finding(
                            Location::source(id),
                            self.violation("file name", name),
                        ));
                    }
                }
            }
        }

        findings
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} must match `{}`", self.target, self.pattern.as_str())?;
        match self.exceptions.len() {
            0 => Ok(()),
            1 => write!(f, " (1 exception)"),
            n => write!(f, " ({} exceptions)", n),
        }
    }
}
