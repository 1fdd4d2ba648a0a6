//! Centralized UI formatting and color utilities
//!
//! This module provides a unified interface for severity colors, icons, and
//! formatting patterns used throughout the govgate CLI.

use colored::{ColoredString, Colorize};

use crate::finding::Severity;
use crate::report::GateDecision;

/// Check if quiet mode is enabled via environment variable or --quiet flag
pub fn is_quiet() -> bool {
    std::env::var("GOVGATE_QUIET")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Returns a colored icon for a finding severity.
///
/// Icons:
/// - Error: ✗ (red)
/// - Warning: ⚠ (yellow)
pub fn severity_icon(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✗".red(),
        Severity::Warning => "⚠".yellow(),
    }
}

/// Returns a colored label for the gate decision.
pub fn gate_label(decision: GateDecision) -> ColoredString {
    match decision {
        GateDecision::Pass => "PASS".green().bold(),
        GateDecision::Fail => "FAIL".red().bold(),
        GateDecision::Aborted => "ABORTED".magenta().bold(),
    }
}

/// Color scheme for report text output
pub mod colors {
    use colored::{ColoredString, Colorize};

    /// Green for success
    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    /// Yellow for warnings
    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    /// Red for errors/failures
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// Cyan for identifiers (module names, rule ids, etc.)
    pub fn identifier(text: &str) -> ColoredString {
        text.cyan()
    }

    /// Dimmed for secondary text
    pub fn secondary(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Bold for headings
    pub fn heading(text: &str) -> ColoredString {
        text.bold()
    }
}

/// Common text formatting patterns
pub mod format {
    /// Format a separator line for sections
    pub fn separator(width: usize) -> String {
        "─".repeat(width)
    }

    /// `1 error`, `2 errors`
    pub fn count(n: usize, noun: &str) -> String {
        if n == 1 {
            format!("{} {}", n, noun)
        } else {
            format!("{} {}s", n, noun)
        }
    }
}
