//! Logic rules: cross-field predicates evaluated per document.
//!
//! ```yaml
//! - id: secure-boot-keys
//!   family: logic
//!   when: { field: boot.mode, equals: secure }
//!   require: { field: boot.required_files, contains: keys.pem }
//! ```
//!
//! Without `when` a rule is a plain schema check, e.g.
//! `require: { field: metadata.owner, non_empty: true }` or
//! `require: { field: version, type: string }`.

use std::fmt;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::path::FieldPath;
use super::{compile_path, compile_regex, EvalContext, Rule, Scope};
use crate::document::scalar_text;
use crate::error::ConfigError;
use crate::finding::Finding;

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionConfig {
    field: Option<String>,
    equals: Option<Value>,
    contains: Option<Value>,
    one_of: Option<Vec<Value>>,
    matches: Option<String>,
    present: Option<bool>,
    #[serde(rename = "type")]
    kind: Option<ValueType>,
    non_empty: Option<bool>,
}

/// Shape a field's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[serde(alias = "str")]
    String,
    /// Any number, integer or not
    #[serde(alias = "float")]
    Number,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "sequence")]
    List,
    #[serde(alias = "dict", alias = "map")]
    Mapping,
}

impl ValueType {
    fn admits(self, value: &Value) -> bool {
        let value = match value {
            Value::Tagged(tagged) => &tagged.value,
            other => other,
        };
        match self {
            ValueType::String => value.is_string(),
            ValueType::Number => value.is_number(),
            ValueType::Integer => value.is_i64() || value.is_u64(),
            ValueType::Boolean => value.is_bool(),
            ValueType::List => value.is_sequence(),
            ValueType::Mapping => value.is_mapping(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "a string",
            ValueType::Number => "a number",
            ValueType::Integer => "an integer",
            ValueType::Boolean => "a boolean",
            ValueType::List => "a list",
            ValueType::Mapping => "a mapping",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogicConfig {
    when: Option<ConditionConfig>,
    require: Option<ConditionConfig>,
    /// Violation message overriding the generated one
    message: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
}

impl ConditionConfig {
    fn compile(self, id: &str) -> Result<Condition, ConfigError> {
        let field = self.field.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "field",
        })?;

        let mut tests = Vec::new();
        if let Some(value) = self.equals {
            tests.push(Test::Equals(value));
        }
        if let Some(value) = self.contains {
            tests.push(Test::Contains(value));
        }
        if let Some(values) = self.one_of {
            tests.push(Test::OneOf(values));
        }
        if let Some(pattern) = self.matches {
            tests.push(Test::Matches(compile_regex(id, &pattern)?));
        }
        if let Some(present) = self.present {
            tests.push(Test::Present(present));
        }
        if let Some(kind) = self.kind {
            tests.push(Test::Type(kind));
        }
        if let Some(non_empty) = self.non_empty {
            tests.push(Test::NonEmpty(non_empty));
        }
        if tests.len() > 1 {
            return Err(ConfigError::Invalid {
                rule: id.to_string(),
                message: format!(
                    "condition on `{}` must use only one of equals, contains, one_of, matches, present, type or non_empty",
                    field
                ),
            });
        }

        Ok(Condition {
            path: compile_path(id, &field)?,
            test: tests.pop().unwrap_or(Test::Present(true)),
        })
    }
}

impl LogicConfig {
    pub(crate) fn compile(self, id: &str) -> Result<LogicRule, ConfigError> {
        let require = self.require.ok_or_else(|| ConfigError::MissingField {
            rule: id.to_string(),
            field: "require",
        })?;

        Ok(LogicRule {
            when: self.when.map(|c| c.compile(id)).transpose()?,
            require: require.compile(id)?,
            message: self.message,
            scope: Scope::compile(id, &self.sources)?,
        })
    }
}

#[derive(Debug, Clone)]
enum Test {
    Equals(Value),
    Contains(Value),
    OneOf(Vec<Value>),
    Matches(Regex),
    Present(bool),
    /// Holds when every declared value has the type; an absent field passes
    Type(ValueType),
    NonEmpty(bool),
}

/// A predicate over one field of a document.
#[derive(Debug, Clone)]
pub struct Condition {
    path: FieldPath,
    test: Test,
}

fn same(a: &Value, b: &Value) -> bool {
    match (scalar_text(a), scalar_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

/// Null, blank strings and empty collections carry no value.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(entries) => entries.is_empty(),
        Value::Tagged(tagged) => is_empty(&tagged.value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn quoted(value: &Value) -> String {
    match scalar_text(value) {
        Some(text) => format!("'{}'", text),
        None => format!("{:?}", value),
    }
}

impl Condition {
    /// Whether the condition holds for a document tree.
    ///
    /// A path matching several values holds if any of them satisfies the test.
    pub fn holds(&self, tree: &Mapping) -> bool {
        let values: Vec<&Value> = self
            .path
            .lookup(tree)
            .into_iter()
            .map(|m| m.value)
            .filter(|value| !value.is_null())
            .collect();

        match &self.test {
            Test::Present(expected) => values.is_empty() != *expected,
            Test::Type(kind) => values.iter().all(|value| kind.admits(value)),
            Test::NonEmpty(expected) => values.iter().any(|value| !is_empty(value)) == *expected,
            Test::Equals(expected) => values.iter().any(|value| same(value, expected)),
            Test::OneOf(allowed) => values
                .iter()
                .any(|value| allowed.iter().any(|candidate| same(value, candidate))),
            Test::Matches(pattern) => values
                .iter()
                .filter_map(|value| scalar_text(value))
                .any(|text| pattern.is_match(&text)),
            Test::Contains(item) => values.iter().any(|value| match value {
                Value::Sequence(items) => items.iter().any(|candidate| same(candidate, item)),
                Value::String(text) => scalar_text(item).is_some_and(|needle| text.contains(&needle)),
                _ => false,
            }),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test {
            Test::Present(true) => write!(f, "`{}` is present", self.path),
            Test::Present(false) => write!(f, "`{}` is absent", self.path),
            Test::Type(kind) => write!(f, "`{}` is {}", self.path, kind),
            Test::NonEmpty(true) => write!(f, "`{}` is not empty", self.path),
            Test::NonEmpty(false) => write!(f, "`{}` is empty", self.path),
            Test::Equals(value) => write!(f, "`{}` equals {}", self.path, quoted(value)),
            Test::Contains(value) => write!(f, "`{}` contains {}", self.path, quoted(value)),
            Test::OneOf(values) => {
                let values: Vec<String> = values.iter().map(quoted).collect();
                write!(f, "`{}` is one of {}", self.path, values.join(", "))
            }
            Test::Matches(pattern) => {
                write!(f, "`{}` matches `{}`", self.path, pattern.as_str())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogicRule {
    /// Documents where this does not hold are skipped
    pub when: Option<Condition>,
    pub require: Condition,
    pub message: Option<String>,
    pub scope: Scope,
}

impl LogicRule {
    pub(crate) fn evaluate(&self, rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
        ctx.documents_in(&self.scope)
            .filter(|document| {
                self.when
                    .as_ref()
                    .map_or(true, |when| when.holds(&document.tree))
            })
            .filter(|document| !self.require.holds(&document.tree))
            .map(|document| {
                let message = self.message.clone().unwrap_or_else(|| match &self.when {
                    Some(when) => format!("expected {} because {}", self.require, when),
                    None => format!("expected {}", self.require),
                });
                rule.finding(document.location(), message)
            })
            .collect()
    }
}

impl fmt::Display for LogicRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.when {
            Some(when) => write!(f, "if {} then {}", when, self.require),
            None => write!(f, "{}", self.require),
        }
    }
}
