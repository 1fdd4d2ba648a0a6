//! Mapping rules: a declared table may not map one key to two values.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_yaml::Value;

use super::path::FieldPath;
use super::{compile_path, EvalContext, Rule, Scope};
use crate::document::scalar_text;
use crate::error::ConfigError;
use crate::finding::{Finding, Location};

#[derive(Debug, Deserialize)]
pub(crate) struct MappingConfig {
    path: Option<String>,
    key: Option<String>,
    value: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
}

impl MappingConfig {
    pub(crate) fn compile(self, id: &str) -> Result<MappingRule, ConfigError> {
        let path = self.path.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "path",
        })?;

        Ok(MappingRule {
            path: compile_path(id, &path)?,
            key: self.key.unwrap_or_else(|| "key".to_string()),
            value: self.value.unwrap_or_else(|| "value".to_string()),
            scope: Scope::compile(id, &self.sources)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MappingRule {
    /// Where the table lives in each document
    pub path: FieldPath,
    /// Key field of each entry when the table is a list
    pub key: String,
    /// Value field of each entry when the table is a list
    pub value: String,
    pub scope: Scope,
}

/// One `key -> value` claim found in a table.
struct Claim {
    key: String,
    value: String,
    location: Location,
}

/// Comparable rendering of a mapped value.
fn render(value: &Value) -> String {
    match scalar_text(value) {
        Some(text) => text,
        None => serde_yaml::to_string(value)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl MappingRule {
    fn claims(&self, ctx: &EvalContext<'_>) -> Vec<Claim> {
        let mut claims = Vec::new();

        for document in ctx.documents_in(&self.scope) {
            for table in self.path.lookup(&document.tree) {
                match table.value {
                    Value::Mapping(entries) => {
                        for (key, value) in entries {
                            let Some(key) = scalar_text(key) else { continue };
                            claims.push(Claim {
                                location: document
                                    .location()
                                    .with_path(format!("{}.{}", table.path, key)),
                                key,
                                value: render(value),
                            });
                        }
                    }
                    Value::Sequence(entries) => {
                        for (index, entry) in entries.iter().enumerate() {
                            let Some(key) = entry.get(self.key.as_str()).and_then(scalar_text)
                            else {
                                continue;
                            };
                            let value = entry
                                .get(self.value.as_str())
                                .map(render)
                                .unwrap_or_else(|| "null".to_string());
                            claims.push(Claim {
                                key,
                                value,
                                location: document
                                    .location()
                                    .with_path(format!("{}[{}]", table.path, index)),
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        claims
    }

    pub(crate) fn evaluate(&self, rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
        let mut first_claims: BTreeMap<String, Claim> = BTreeMap::new();
        let mut findings = Vec::new();

        for claim in self.claims(ctx) {
            match first_claims.get(&claim.key) {
                None => {
                    first_claims.insert(claim.key.clone(), claim);
                }
                Some(first) if first.value == claim.value => {}
                Some(first) => findings.push(rule.finding(
                    claim.location,
                    format!(
                        "'{}' is mapped to '{}' here but to '{}' at {}",
                        claim.key, claim.value, first.value, first.location
                    ),
                )),
            }
        }

        findings
    }
}

impl fmt::Display for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` must map each key to one value", self.path)
    }
}
