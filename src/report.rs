//! Validation report and gate decision.
//!
//! The report is rebuilt on every run and carries no timestamps, so
//! identical inputs always serialize to byte-identical artifacts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::engine::Stage;
use crate::error::EngineError;
use crate::finding::{Finding, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Aborted,
}

/// Sizes of what a run looked at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub modules: usize,
    pub urns: usize,
    pub sources: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub modules: usize,
    pub urns: usize,
    pub sources: usize,
    pub documents: usize,
}

impl Summary {
    fn new(findings: &[Finding], counts: Counts) -> Self {
        let errors = findings.iter().filter(|f| f.is_error()).count();
        Self {
            errors,
            warnings: findings.len() - errors,
            modules: counts.modules,
            urns: counts.urns,
            sources: counts.sources,
            documents: counts.documents,
        }
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortReport {
    /// Stage the engine was in when it aborted
    pub stage: Stage,
    /// Machine-readable cause, e.g. `duplicate_key`
    pub kind: String,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub status: RunStatus,
    pub pass: bool,
    pub summary: Summary,
    pub findings: Vec<Finding>,
    /// Topological module order; empty when the graph has cycles
    pub order: Vec<String>,
    pub abort: Option<AbortReport>,
}

/// Binary gate outcome plus why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    /// Validation completed with failing findings
    Fail,
    /// The validator itself could not complete
    Aborted,
}

impl GateDecision {
    pub fn exit_code(self) -> i32 {
        match self {
            GateDecision::Pass => 0,
            GateDecision::Fail => 1,
            GateDecision::Aborted => 2,
        }
    }
}

impl ValidationReport {
    /// Report for a run that reached `DONE`.
    ///
    /// In strict mode warnings fail the gate too.
    pub fn completed(mut findings: Vec<Finding>, counts: Counts, order: Vec<String>, strict: bool) -> Self {
        findings.sort_by(Finding::report_order);
        let summary = Summary::new(&findings, counts);
        let pass = summary.errors == 0 && (!strict || summary.warnings == 0);

        Self {
            status: RunStatus::Completed,
            pass,
            summary,
            findings,
            order,
            abort: None,
        }
    }

    /// Report for a run that ended in `ABORTED`, keeping the findings
    /// collected before the abort.
    pub fn aborted(stage: Stage, error: &EngineError, mut findings: Vec<Finding>, counts: Counts) -> Self {
        findings.sort_by(Finding::report_order);
        Self {
            status: RunStatus::Aborted,
            pass: false,
            summary: Summary::new(&findings, counts),
            findings,
            order: Vec::new(),
            abort: Some(AbortReport {
                stage,
                kind: error.kind().to_string(),
                cause: error.to_string(),
            }),
        }
    }

    pub fn decision(&self) -> GateDecision {
        match (self.status, self.pass) {
            (RunStatus::Aborted, _) => GateDecision::Aborted,
            (RunStatus::Completed, true) => GateDecision::Pass,
            (RunStatus::Completed, false) => GateDecision::Fail,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }

    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        json.push('\n');
        Ok(json)
    }

    /// Write the artifact; a `.md` path gets Markdown, anything else JSON.
    pub fn write_artifact(&self, path: &Path) -> Result<()> {
        let content = if path.extension().is_some_and(|ext| ext == "md") {
            crate::formatters::format_markdown_report(self)
        } else {
            self.to_json()?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        tracing::debug!(path = %path.display(), "report artifact written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DuplicateKeyError, Table};
    use crate::finding::{Category, Location};
    use tempfile::TempDir;

    fn finding(severity: Severity, category: Category, source: &str, message: &str) -> Finding {
        Finding::new("r", category, severity, Location::source(source), message)
    }

    fn counts() -> Counts {
        Counts {
            modules: 3,
            urns: 2,
            sources: 4,
            documents: 5,
        }
    }

    #[test]
    fn test_pass_when_no_errors() {
        let report = ValidationReport::completed(
            vec![finding(Severity::Warning, Category::Naming, "a.yaml", "w")],
            counts(),
            vec![],
            false,
        );
        assert!(report.pass);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.decision(), GateDecision::Pass);
        assert_eq!(report.decision().exit_code(), 0);
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        let report = ValidationReport::completed(
            vec![finding(Severity::Warning, Category::Naming, "a.yaml", "w")],
            counts(),
            vec![],
            true,
        );
        assert!(!report.pass);
        assert_eq!(report.decision().exit_code(), 1);
    }

    #[test]
    fn test_findings_are_sorted() {
        let report = ValidationReport::completed(
            vec![
                finding(Severity::Warning, Category::Parse, "a.yaml", "w"),
                finding(Severity::Error, Category::Cycle, "a.yaml", "c"),
                finding(Severity::Error, Category::Naming, "b.yaml", "n"),
            ],
            counts(),
            vec![],
            false,
        );
        let messages: Vec<&str> = report.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["n", "c", "w"]);
        assert_eq!(report.summary.errors, 2);
        assert_eq!(report.decision(), GateDecision::Fail);
    }

    #[test]
    fn test_aborted_report() {
        let error = EngineError::from(DuplicateKeyError {
            table: Table::Modules,
            key: "A".to_string(),
            first: Location::document("m.yaml", 0, 1),
            second: Location::document("m.yaml", 1, 4),
        });
        let report = ValidationReport::aborted(Stage::Registering, &error, vec![], counts());
        assert!(!report.pass);
        assert!(report.is_aborted());
        assert_eq!(report.decision(), GateDecision::Aborted);
        assert_eq!(report.decision().exit_code(), 2);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["abort"]["stage"], "REGISTERING");
        assert_eq!(json["abort"]["kind"], "duplicate_key");
    }

    #[test]
    fn test_json_shape() {
        let report = ValidationReport::completed(
            vec![finding(Severity::Error, Category::References, "a.yaml", "broken")
                .with_hint("fix it")],
            counts(),
            vec!["A".to_string(), "B".to_string()],
            false,
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["pass"], false);
        assert_eq!(json["summary"]["errors"], 1);
        assert_eq!(json["summary"]["documents"], 5);
        assert_eq!(json["findings"][0]["category"], "references");
        assert_eq!(json["findings"][0]["severity"], "error");
        assert_eq!(json["findings"][0]["hint"], "fix it");
        assert_eq!(json["order"][1], "B");
        assert!(json["abort"].is_null());
    }

    #[test]
    fn test_write_artifact_json_and_markdown() {
        let tmp = TempDir::new().unwrap();
        let report = ValidationReport::completed(vec![], counts(), vec![], false);

        let json_path = tmp.path().join("out/report.json");
        report.write_artifact(&json_path).unwrap();
        let written = fs::read_to_string(&json_path).unwrap();
        assert_eq!(written, report.to_json().unwrap());

        let md_path = tmp.path().join("report.md");
        report.write_artifact(&md_path).unwrap();
        let markdown = fs::read_to_string(&md_path).unwrap();
        assert!(markdown.starts_with("# Governance Validation Report"));
    }
}
