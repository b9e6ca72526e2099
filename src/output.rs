//! Simple Output and Reporting
//!
//! This module provides output formatting for validation results.

use std::path::Path;

use serde::Serialize;
use tracing::error;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::validator::{Severity, ValidationResult};

/// Result formatter for human-readable or JSON output
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Disable or force ANSI colors
    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Report for one file, `None` when nothing should be printed
    pub fn format_result(&self, path: &Path, result: &ValidationResult) -> Option<String> {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(&FileReport { path, result }) {
                Ok(line) => Some(line),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to serialize report");
                    None
                }
            },
            OutputFormat::Human => {
                if self.verbosity == VerbosityLevel::Quiet && result.valid {
                    return None;
                }
                Some(self.format_human(path, result))
            }
        }
    }

    fn format_human(&self, path: &Path, result: &ValidationResult) -> String {
        let status = if result.valid {
            self.colorize("✓ VALID", "32")
        } else {
            self.colorize("✗ INVALID", "31")
        };
        let mut output = format!(
            "{}  {} ({} errors, {} warnings)",
            status,
            path.display(),
            result.errors().count(),
            result.warnings().count()
        );

        let show_all = self.verbosity >= VerbosityLevel::Verbose;
        for diagnostic in &result.diagnostics {
            if !show_all && (result.valid || diagnostic.severity == Severity::Warning) {
                continue;
            }
            let label = match diagnostic.severity {
                Severity::Error => self.colorize("error", "31"),
                Severity::Warning => self.colorize("warning", "33"),
            };
            output.push_str(&format!(
                "\n    {}:{}:{}: {}: {}",
                path.display(),
                diagnostic.line,
                diagnostic.column,
                label,
                diagnostic.message
            ));
        }

        if show_all {
            output.push_str(&format!(
                "\n    checked by {} at {}",
                result.checked_by,
                result.checked_at.to_rfc3339()
            ));
        }
        output
    }

    /// Closing summary line (human format only)
    pub fn format_summary(&self, total: usize, invalid: usize) -> Option<String> {
        if self.format == OutputFormat::Json || self.verbosity == VerbosityLevel::Quiet {
            return None;
        }
        Some(format!(
            "{} files checked: {} valid, {} invalid",
            total,
            total - invalid,
            invalid
        ))
    }
}
