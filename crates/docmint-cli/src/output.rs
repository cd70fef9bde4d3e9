//! Output formatting for the CLI.

use colored::*;
use docmint_extractor::RunReport;
use std::collections::BTreeMap;
use std::path::Path;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Format the end-of-run report.
    ///
    /// Clean runs get a success line, runs that lost segments a warning.
    pub fn run_report(&self, report: &RunReport, output: &Path) -> String {
        let lost = report.segments_failed + report.transport_failures + report.sink_errors;
        let headline = format!(
            "{} records written to {}",
            report.records_written,
            output.display()
        );

        let headline = if report.cancelled || report.aborted {
            self.warning(&format!("{} (run stopped early)", headline))
        } else if lost > 0 {
            self.warning(&format!("{} ({} segment(s) lost)", headline, lost))
        } else {
            self.success(&headline)
        };

        format!("{}\n{}", report.summary(), headline)
    }

    /// Format per-label segment counts from a chunking pass.
    pub fn segment_counts(&self, counts: &BTreeMap<String, usize>, documents: usize) -> String {
        if counts.is_empty() {
            return self.warning("No segments produced.");
        }

        let width = counts.keys().map(|label| label.len()).max().unwrap_or(0).max(6);
        let mut lines = vec![self.colorize(&format!("{:<width$}  Segments", "Source"), "cyan")];
        for (label, count) in counts {
            lines.push(format!("{:<width$}  {:>8}", label, count));
        }

        let total: usize = counts.values().sum();
        lines.push(self.info(&format!(
            "{} segment(s) from {} document(s)",
            total, documents
        )));
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}
