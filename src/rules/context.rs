//! Context rules: metadata must stay coherent across the documents of a source.
//!
//! With `scope: sources` the documents of every source in scope form one
//! sequence, ordered by source id, so e.g. `uniform` keeps a version field
//! consistent across files.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_yaml::Value;

use super::path::FieldPath;
use super::{compile_path, EvalContext, Rule, Scope};
use crate::document::{scalar_text, Document};
use crate::finding::Finding;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCheck {
    /// Versions increase document by document
    VersionSequence,
    /// Effective dates never go backwards
    EffectiveDates,
    /// Every document declares the same value as the first
    Uniform,
}

/// How far a context check reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSpan {
    /// Each source on its own
    #[default]
    Source,
    /// All sources in scope together
    Sources,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContextConfig {
    check: Option<ContextCheck>,
    field: Option<String>,
    #[serde(default, rename = "scope")]
    span: ContextSpan,
    #[serde(default = "default_strict")]
    strict: bool,
    #[serde(default)]
    sources: Vec<String>,
}

fn default_strict() -> bool {
    true
}

impl ContextConfig {
    pub(crate) fn compile(self, id: &str) -> Result<ContextRule, ConfigError> {
        let check = self.check.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "check",
        })?;
        let field = self.field.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "field",
        })?;

        Ok(ContextRule {
            check,
            field: compile_path(id, &field)?,
            strict: self.strict,
            span: self.span,
            scope: Scope::compile(id, &self.sources)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContextRule {
    pub check: ContextCheck,
    pub field: FieldPath,
    /// Versions must strictly increase rather than merely not decrease
    pub strict: bool,
    pub span: ContextSpan,
    pub scope: Scope,
}

/// A dotted numeric version such as `v1.2.10`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Version(Vec<u64>);

impl Version {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);
        let parts = text
            .split('.')
            .map(|part| part.parse().ok())
            .collect::<Option<Vec<u64>>>()?;
        Some(Self(parts))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// A declared value in one document.
struct Declared<'d> {
    document: &'d Document,
    path: String,
    text: String,
    /// Written as an unquoted decimal, so the YAML parser already turned
    /// `1.10` into `1.1`
    float: bool,
}

impl ContextRule {
    /// Declared values grouped by source (or all in one group), in document order.
    fn declarations<'d>(&self, ctx: &EvalContext<'d>) -> Vec<Vec<Declared<'d>>> {
        let mut groups: Vec<Vec<Declared<'d>>> = Vec::new();

        for document in ctx.documents_in(&self.scope) {
            let Some(found) = self.field.first(&document.tree) else { continue };
            let text = scalar_text(found.value).unwrap_or_default();
            let float = matches!(found.value, Value::Number(n) if n.is_f64());
            let declared = Declared {
                document,
                path: found.path,
                text,
                float,
            };
            match groups.last_mut() {
                Some(group)
                    if self.span == ContextSpan::Sources
                        || group[0].document.source == document.source =>
                {
                    group.push(declared)
                }
                _ => groups.push(vec![declared]),
            }
        }

        groups
    }

    fn check_versions(&self, rule: &Rule, group: &[Declared<'_>], findings: &mut Vec<Finding>) {
        let mut previous: Option<(Version, &Declared<'_>)> = None;
        for declared in group {
            if declared.float {
                findings.push(rule.finding(
                    declared.document.location().with_path(declared.path.clone()),
                    format!(
                        "version {} is an unquoted number; quote it so trailing zeros survive",
                        declared.text
                    ),
                ));
                continue;
            }
            let Some(version) = Version::parse(&declared.text) else {
                findings.push(rule.finding(
                    declared.document.location().with_path(declared.path.clone()),
                    format!("'{}' is not a dotted numeric version", declared.text),
                ));
                continue;
            };
            if let Some((last, last_declared)) = &previous {
                let in_sequence = if self.strict {
                    version > *last
                } else {
                    version >= *last
                };
                if !in_sequence {
                    findings.push(rule.finding(
                        declared.document.location().with_path(declared.path.clone()),
                        format!(
                            "version '{}' of document {} does not follow '{}' of document {}",
                            declared.text,
                            declared.document.index,
                            last_declared.text,
                            last_declared.document.index
                        ),
                    ));
                }
            }
            previous = Some((version, declared));
        }
    }

    fn check_dates(&self, rule: &Rule, group: &[Declared<'_>], findings: &mut Vec<Finding>) {
        let mut previous: Option<(NaiveDate, &Declared<'_>)> = None;
        for declared in group {
            let Some(date) = parse_date(&declared.text) else {
                findings.push(rule.finding(
                    declared.document.location().with_path(declared.path.clone()),
                    format!("'{}' is not a date (YYYY-MM-DD)", declared.text),
                ));
                continue;
            };
            if let Some((last, last_declared)) = &previous {
                if date < *last {
                    findings.push(rule.finding(
                        declared.document.location().with_path(declared.path.clone()),
                        format!(
                            "effective date {} of document {} is before {} of document {}",
                            date,
                            declared.document.index,
                            last,
                            last_declared.document.index
                        ),
                    ));
                }
            }
            previous = Some((date, declared));
        }
    }

    fn check_uniform(&self, rule: &Rule, group: &[Declared<'_>], findings: &mut Vec<Finding>) {
        let Some((first, rest)) = group.split_first() else { return };
        for declared in rest {
            if declared.text == first.text {
                continue;
            }
            let origin = if declared.document.source == first.document.source {
                "the first document of the source".to_string()
            } else {
                format!("{} (document {})", first.document.source, first.document.index)
            };
            findings.push(rule.finding(
                declared.document.location().with_path(declared.path.clone()),
                format!(
                    "`{}` is '{}' but {} declares '{}'",
                    self.field, declared.text, origin, first.text
                ),
            ));
        }
    }

    pub(crate) fn evaluate(&self, rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for group in self.declarations(ctx) {
            match self.check {
                ContextCheck::VersionSequence => self.check_versions(rule, &group, &mut findings),
                ContextCheck::EffectiveDates => self.check_dates(rule, &group, &mut findings),
                ContextCheck::Uniform => self.check_uniform(rule, &group, &mut findings),
            }
        }
        findings
    }
}

impl fmt::Display for ContextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reach = match self.span {
            ContextSpan::Source => "within a source",
            ContextSpan::Sources => "across sources",
        };
        match self.check {
            ContextCheck::VersionSequence if self.strict => {
                write!(f, "`{}` must strictly increase {}", self.field, reach)
            }
            ContextCheck::VersionSequence => {
                write!(f, "`{}` must not decrease {}", self.field, reach)
            }
            ContextCheck::EffectiveDates => {
                write!(f, "`{}` dates must be in order {}", self.field, reach)
            }
            ContextCheck::Uniform => write!(f, "`{}` must be the same {}", self.field, reach),
        }
    }
}
