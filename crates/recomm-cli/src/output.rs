//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use recomm_domain::Recommendation;
use recomm_pipeline::PipelineReport;
use std::path::{Path, PathBuf};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format recommendations output.
    pub fn format_recommendations(&self, recommendations: &[Recommendation]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(recommendations)?),
            OutputFormat::Table => Ok(self.format_recommendations_table(recommendations)),
            OutputFormat::Quiet => Ok(recommendations
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_recommendations_table(&self, recommendations: &[Recommendation]) -> String {
        if recommendations.is_empty() {
            return self.colorize("No recommendations found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "ID",
            "Violations",
            "Status",
            "Rank",
            "Style",
            "Confidence",
            "Description",
        ]);

        for rec in recommendations {
            let id = rec.id.to_string();
            let violations = rec
                .violation_ids
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            builder.push_record([
                id.chars().take(8).collect::<String>(),
                violations,
                rec.status.to_string(),
                rec.rank.to_string(),
                rec.style.to_string(),
                format!("{:.2}", rec.confidence),
                rec.description.clone(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a pipeline run report.
    pub fn format_report(&self, report: &PipelineReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .outcomes
                .iter()
                .map(|(id, outcome)| format!("{}\t{}", id, outcome.kind()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if report.outcomes.is_empty() {
                    return Ok(self.colorize("No open violations matched.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Violation", "Outcome", "Review"]);
                for (id, outcome) in &report.outcomes {
                    let review = if outcome.needs_manual_review() { "yes" } else { "" };
                    builder.push_record([id.to_string(), outcome.kind().to_string(), review.to_string()]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(format!("{}\n\n{}", table, report.metrics.summary()))
            }
        }
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
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// First free path among `path`, `stem_1.ext`, `stem_2.ext`, ...
pub fn next_available_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{}_{}.{}", stem, n, ext),
                None => format!("{}_{}", stem, n),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
