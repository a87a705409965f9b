use crate::errors::Result;
use crate::match_parser::MatchRecord;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;

/// Printed instead of a report when the search found nothing.
pub const NO_MATCHES_NOTICE: &str = "No matches found for the keyword.";

const SEPARATOR_WIDTH: usize = 80;

/// Defines the possible output formats for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Annotated, human-readable blocks separated by a dashed rule.
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values format.
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

/// Renders match records. Formatting never alters a preview.
pub struct OutputFormatter {
    format: OutputFormat,
    include_summary: bool,
    color: bool,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    /// Creates a new `OutputFormatter` without terminal colors.
    ///
    /// # Arguments
    ///
    /// * `format` - The `OutputFormat` to use.
    /// * `include_summary` - Whether to append match totals (only for `Text`).
    pub fn new(format: OutputFormat, include_summary: bool) -> Self {
        Self {
            format,
            include_summary,
            color: false,
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Enables ANSI colors in the `Text` layout.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Writes the formatted records to a given writer.
    pub fn write_output<W: Write>(&self, writer: &mut W, records: &[MatchRecord]) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.format_text(records),
            OutputFormat::Json => self.format_json(records)?,
            OutputFormat::Csv => self.format_csv(records)?,
        };

        writer.write_all(output.as_bytes())?;

        if self.include_summary && self.format == OutputFormat::Text && !records.is_empty() {
            writer.write_all(self.format_summary(records).as_bytes())?;
        }

        Ok(())
    }

    /// One `File` / `Line` / `Preview` block per record, or the no-matches notice.
    fn format_text(&self, records: &[MatchRecord]) -> String {
        if records.is_empty() {
            return format!("{NO_MATCHES_NOTICE}\n");
        }

        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut output = String::new();

        for r in records {
            let path = r.file_path.display().to_string();
            let line = r.line_number.to_string();
            if self.color {
                output.push_str(&format!("File: {}\n", path.green()));
                output.push_str(&format!("Line: {}\n", line.yellow()));
                output.push_str(&format!("Preview: {}\n", r.preview.blue()));
            } else {
                output.push_str(&format!("File: {path}\n"));
                output.push_str(&format!("Line: {line}\n"));
                output.push_str(&format!("Preview: {}\n", r.preview));
            }
            output.push_str(&separator);
            output.push('\n');
        }

        output
    }

    fn format_json(&self, records: &[MatchRecord]) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            tool: ToolInfo<'a>,
            scan_time: DateTime<Utc>,
            total_matches: usize,
            matches: Vec<JsonMatch<'a>>,
        }

        #[derive(Serialize)]
        struct ToolInfo<'a> {
            name: &'a str,
            version: &'a str,
        }

        #[derive(Serialize)]
        struct JsonMatch<'a> {
            file: String,
            line: usize,
            preview: &'a str,
        }

        let output = JsonOutput {
            tool: ToolInfo {
                name: &self.tool_name,
                version: &self.tool_version,
            },
            scan_time: Utc::now(),
            total_matches: records.len(),
            matches: records
                .iter()
                .map(|r| JsonMatch {
                    file: r.file_path.display().to_string(),
                    line: r.line_number,
                    preview: &r.preview,
                })
                .collect(),
        };

        let mut json = serde_json::to_string_pretty(&output)?;
        json.push('\n');
        Ok(json)
    }

    fn format_csv(&self, records: &[MatchRecord]) -> Result<String> {
        use csv::Writer;

        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record(["File", "Line", "Preview"])?;

        for r in records {
            wtr.write_record([
                r.file_path.display().to_string().as_str(),
                r.line_number.to_string().as_str(),
                r.preview.as_str(),
            ])?;
        }

        let data = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn format_summary(&self, records: &[MatchRecord]) -> String {
        let files: HashSet<_> = records.iter().map(|r| &r.file_path).collect();

        let mut summary = String::new();
        summary.push_str(&format!("\n{} Summary {}\n", "=".repeat(20), "=".repeat(20)));
        summary.push_str(&format!("Total matches: {}\n", records.len()));
        summary.push_str(&format!("Files with matches: {}\n", files.len()));
        summary
    }
}
