//! Wires the scanner, parser, formatter and replacer into one search run.

use crate::config::SearchRequest;
use crate::errors::Result;
use crate::match_parser::{MatchParser, MatchRecord};
use crate::output_formatter::{OutputFormat, OutputFormatter};
use crate::replacer::{ProcessOptions, ReplaceReport, Replacer};
use crate::scanner::Scanner;
use std::io::Write;
use tracing::info;

/// Presentation and safety switches that don't change what is searched.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub format: OutputFormat,
    pub include_summary: bool,
    pub color: bool,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            include_summary: false,
            color: false,
            dry_run: false,
        }
    }
}

/// What a run found and, if a replacement was requested, what it changed.
#[derive(Debug)]
pub struct SearchOutcome {
    pub records: Vec<MatchRecord>,
    pub replacement: Option<ReplaceReport>,
}

impl SearchOutcome {
    pub fn has_matches(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Runs one search and, when `request.replacement` is set, the replacement.
///
/// The report goes to `out`. Replacement notices go to `notices`, which lets
/// the caller keep machine-readable output clean. Finding nothing is a normal
/// outcome; only problems that stop the scan itself are returned as errors.
pub fn run_search<W, N>(
    request: &SearchRequest,
    options: &RunOptions,
    out: &mut W,
    notices: &mut N,
) -> Result<SearchOutcome>
where
    W: Write,
    N: Write,
{
    request.validate()?;

    let scanner = Scanner::from_request(request)?;
    let raw_lines = scanner.scan(&request.root)?;
    let records = MatchParser::new()?.parse_all(&raw_lines);
    drop(raw_lines);

    OutputFormatter::new(options.format, options.include_summary)
        .with_color(options.color)
        .write_output(out, &records)?;
    out.flush()?;

    let replacement = match request.replacement.as_deref() {
        Some(replacement) if !records.is_empty() => {
            let replacer = Replacer::new(
                &request.keyword,
                replacement,
                ProcessOptions {
                    dry_run: options.dry_run,
                },
            )?;
            let report = replacer.replace_in_files(&records);
            report.write_notices(notices)?;
            info!(
                "Replacement finished: {} rewritten, {} skipped",
                report.rewritten(),
                report.skipped()
            );
            Some(report)
        }
        _ => None,
    };

    Ok(SearchOutcome {
        records,
        replacement,
    })
}
