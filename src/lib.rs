//! `keysweep` is a library for finding a literal keyword across a project tree
//! and optionally replacing it in every file that contains it.
//!
//! It provides the core logic for the `keysweep` command-line tool but can also
//! be used on its own. A run flows through four stages:
//!
//! - `Scanner`: walks the tree and emits `<path>:<line>:<content>` lines for
//!   every line containing the keyword, skipping `vendor` and `storage`
//!   directories unless asked not to.
//! - `MatchParser`: turns those lines into `MatchRecord`s.
//! - `OutputFormatter`: renders the records as text, JSON or CSV.
//! - `Replacer`: rewrites each matched file once, replacing every occurrence.
//!
//! `pipeline::run_search` drives all four for a `SearchRequest`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod match_parser;
pub mod output_formatter;
pub mod pipeline;
pub mod replacer;
pub mod scanner;

// Re-export main types for easier access by library users.
pub use config::SearchRequest;
pub use errors::{Error, Result};
pub use match_parser::{MatchParser, MatchRecord};
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use pipeline::{run_search, RunOptions, SearchOutcome};
pub use replacer::{ReplaceReport, Replacer};
pub use scanner::{RawMatchLine, Scanner};
