//! Output formatters for validation reports
//!
//! Provides formatters that turn a ValidationReport into terminal text or a
//! Markdown artifact.

use colored::Colorize;

use crate::finding::{Finding, Severity};
use crate::report::{GateDecision, ValidationReport};
use crate::ui::{self, colors};

/// Format one finding as a terminal line, with its hint underneath
pub fn format_finding(finding: &Finding) -> String {
    let mut line = format!(
        "  {} {} {} {}",
        ui::severity_icon(finding.severity),
        colors::secondary(&finding.location.to_string()),
        colors::identifier(&format!("[{}]", finding.rule)),
        finding.message
    );
    if let Some(hint) = &finding.hint {
        line.push_str(&format!("\n      {} {}", "hint:".dimmed(), hint));
    }
    line
}

/// Format a report as multi-section terminal output
pub fn format_report(report: &ValidationReport) -> String {
    let mut output = vec![
        colors::heading("Governance Validation").to_string(),
        ui::format::separator(21),
    ];

    if let Some(abort) = &report.abort {
        output.push(format!(
            "{} run aborted during {}: {}",
            colors::error("✗"),
            abort.stage,
            abort.cause
        ));
        output.push(String::new());
    }

    for severity in [Severity::Error, Severity::Warning] {
        let findings: Vec<&Finding> = report.findings_with(severity).collect();
        if findings.is_empty() {
            continue;
        }
        let title = match severity {
            Severity::Error => format!("Errors ({})", findings.len()),
            Severity::Warning => format!("Warnings ({})", findings.len()),
        };
        output.push(title.bold().to_string());
        for finding in findings {
            output.push(format_finding(finding));
        }
        output.push(String::new());
    }

    output.push(format_summary(report));
    output.join("\n")
}

/// Format the one-line summary with the gate decision
pub fn format_summary(report: &ValidationReport) -> String {
    let summary = &report.summary;
    let errors = ui::format::count(summary.errors, "error");
    let warnings = ui::format::count(summary.warnings, "warning");
    let errors = if summary.errors > 0 {
        colors::error(&errors).to_string()
    } else {
        errors
    };
    let warnings = if summary.warnings > 0 {
        colors::warning(&warnings).to_string()
    } else {
        warnings
    };

    format!(
        "{} {}, {} ({}, {}, {} in {})",
        ui::gate_label(report.decision()),
        errors,
        warnings,
        ui::format::count(summary.modules, "module"),
        ui::format::count(summary.urns, "URN"),
        ui::format::count(summary.documents, "document"),
        ui::format::count(summary.sources, "source"),
    )
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Format a report as a Markdown artifact (no colors)
pub fn format_markdown_report(report: &ValidationReport) -> String {
    let decision = match report.decision() {
        GateDecision::Pass => "PASS",
        GateDecision::Fail => "FAIL",
        GateDecision::Aborted => "ABORTED",
    };
    let summary = &report.summary;

    let mut output = vec![
        "# Governance Validation Report".to_string(),
        String::new(),
        format!("**Gate:** {}", decision),
        String::new(),
    ];

    if let Some(abort) = &report.abort {
        output.push(format!(
            "> Run aborted during `{}` ({}): {}",
            abort.stage, abort.kind, abort.cause
        ));
        output.push(String::new());
    }

    output.extend([
        "## Summary".to_string(),
        String::new(),
        "| Errors | Warnings | Modules | URNs | Sources | Documents |".to_string(),
        "|---|---|---|---|---|---|".to_string(),
        format!(
            "| {} | {} | {} | {} | {} | {} |",
            summary.errors,
            summary.warnings,
            summary.modules,
            summary.urns,
            summary.sources,
            summary.documents
        ),
        String::new(),
    ]);

    for (severity, title) in [(Severity::Error, "Errors"), (Severity::Warning, "Warnings")] {
        let findings: Vec<&Finding> = report.findings_with(severity).collect();
        if findings.is_empty() {
            continue;
        }
        output.push(format!("## {}", title));
        output.push(String::new());
        output.push("| Rule | Location | Message | Hint |".to_string());
        output.push("|---|---|---|---|".to_string());
        for finding in findings {
            output.push(format!(
                "| `{}` | `{}` | {} | {} |",
                finding.rule,
                finding.location,
                markdown_cell(&finding.message),
                markdown_cell(finding.hint.as_deref().unwrap_or(""))
            ));
        }
        output.push(String::new());
    }

    if !report.order.is_empty() {
        output.push("## Topological Order".to_string());
        output.push(String::new());
        for (index, module) in report.order.iter().enumerate() {
            output.push(format!("{}. `{}`", index + 1, module));
        }
        output.push(String::new());
    }

    output.join("\n")
}
