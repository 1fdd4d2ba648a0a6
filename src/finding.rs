//! Findings: the unit of everything a validation run reports.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Should be addressed; fails the gate only in strict mode
    #[serde(alias = "warn")]
    Warning,
    /// Must be fixed; fails the gate
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// What kind of problem a finding describes.
///
/// Declaration order is the report sort order within one severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A non-required source could not be parsed
    Parse,
    Naming,
    References,
    Mapping,
    Logic,
    Context,
    /// A dependency cycle in the module graph
    Cycle,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse",
            Self::Naming => "naming",
            Self::References => "references",
            Self::Mapping => "mapping",
            Self::Logic => "logic",
            Self::Context => "context",
            Self::Cycle => "cycle",
        };
        f.write_str(name)
    }
}

/// Where a finding was observed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    /// Logical source id, or `<registry>` for whole-registry findings
    pub source: String,
    /// Zero-based document index within the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<usize>,
    /// 1-based line where the document starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Field path inside the document, e.g. `modules[2].dependencies[0]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Location {
    /// A location naming a whole source.
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            document: None,
            line: None,
            path: None,
        }
    }

    /// A location naming one document of a source.
    pub fn document(source: impl Into<String>, index: usize, line: usize) -> Self {
        Self {
            source: source.into(),
            document: Some(index),
            line: Some(line),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(document) = self.document {
            write!(f, "#{}", document)?;
        }
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        Ok(())
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Id of the rule (or built-in check) that produced the finding
    pub rule: String,
    pub category: Category,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    /// Remediation guidance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Finding {
    pub fn new(
        rule: impl Into<String>,
        category: Category,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            category,
            severity,
            location,
            message: message.into(),
            hint: None,
        }
    }

    /// Add remediation guidance to this finding
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_optional_hint(mut self, hint: Option<&str>) -> Self {
        self.hint = hint.map(str::to_string);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Report order: severity descending, then category, source and message.
    ///
    /// The remaining fields only break ties so the order is total.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.category.cmp(&other.category))
            .then_with(|| self.location.source.cmp(&other.location.source))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.location.cmp(&other.location))
            .then_with(|| self.rule.cmp(&other.rule))
            .then_with(|| self.hint.cmp(&other.hint))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.location, self.rule, self.message
        )
    }
}
