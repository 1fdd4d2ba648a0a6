//! Error taxonomy for validation runs.
//!
//! Only [`EngineError`] aborts a run. Every other problem the engine detects
//! is reported as a [`Finding`](crate::finding::Finding) so one invocation
//! surfaces as many actionable problems as possible.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::engine::Stage;
use crate::finding::Location;

fn display_position(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(":{}:{}", line, column),
        (Some(line), None) => format!(":{}", line),
        _ => String::new(),
    }
}

fn display_millis(limit: &Duration) -> u128 {
    limit.as_millis()
}

/// A source could not be parsed into documents.
///
/// Localized to one source: other sources keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_id}{}: {message}", display_position(.line, .column))]
pub struct ParseError {
    /// Logical id of the malformed source
    pub source_id: String,
    /// Best-effort 1-based line within the source
    pub line: Option<usize>,
    /// Best-effort 1-based column
    pub column: Option<usize>,
    pub message: String,
}

impl ParseError {
    pub fn new(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, line: usize, column: Option<usize>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }
}

/// Registry table in which a duplicate identity was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Modules,
    Urns,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Modules => write!(f, "module"),
            Table::Urns => write!(f, "URN"),
        }
    }
}

/// The same identity was declared twice; the registry is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate {table} '{key}': declared at {first} and again at {second}")]
pub struct DuplicateKeyError {
    pub table: Table,
    pub key: String,
    pub first: Location,
    pub second: Location,
}

/// The run exceeded its configured time budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run exceeded its {}ms timeout during {stage}", display_millis(.limit))]
pub struct TimeoutError {
    pub stage: Stage,
    pub limit: Duration,
}

/// Invalid rule configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule configuration could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("rule '{rule}': invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("rule '{rule}': invalid source glob `{glob}`: {source}")]
    InvalidGlob {
        rule: String,
        glob: String,
        source: glob::PatternError,
    },

    #[error("rule '{rule}': missing required field `{field}`")]
    MissingField { rule: String, field: &'static str },

    #[error("rule id '{0}' is declared more than once")]
    DuplicateRule(String),

    #[error("rule '{rule}': {message}")]
    Invalid { rule: String, message: String },

    #[error("rule configuration '{source_id}' could not be read")]
    Unreadable {
        source_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Conditions that abort a run and transition the engine to `ABORTED`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("required source '{0}' does not exist")]
    MissingSource(String),

    #[error("source '{source_id}' could not be read: {message}")]
    Unreadable { source_id: String, message: String },
}

impl EngineError {
    /// Short machine-readable name of the abort cause.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Parse(_) => "parse_error",
            EngineError::DuplicateKey(_) => "duplicate_key",
            EngineError::Timeout(_) => "timeout",
            EngineError::MissingSource(_) => "missing_source",
            EngineError::Unreadable { .. } => "unreadable_source",
        }
    }
}
