use crate::config::{normalize_extensions, ConfigLoader, SearchRequest, SweepConfig};
use crate::errors::Result;
use crate::output_formatter::OutputFormat;
use crate::pipeline::RunOptions;
use clap::Parser;
use std::path::PathBuf;

/// Find a keyword across a project and optionally replace it everywhere.
///
/// `keysweep` walks the project tree, prints every line that contains the
/// keyword, and with `--replace` rewrites each matching file in place.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Search a project for a literal keyword, optionally replacing it",
    long_about = "keysweep - search a project tree for a literal keyword and optionally replace it.

The keyword is matched as plain text: characters like '$', '(' or '*' have no
special meaning. `vendor` and `storage` directories are skipped unless
--vendor or --storage is given.

QUICK EXAMPLES:
  keysweep OldName                          # Search the current project
  keysweep OldName --replace NewName        # Rename everywhere
  keysweep 'dd(' --replace= -d ~/app        # Delete every occurrence
  keysweep Helper --vendor -x php,inc       # Include vendor, scan .php and .inc

Settings can also live in .keysweep.yaml at the project root:
  extensions: [php]
  exclude: [node_modules]
  format: text"
)]
pub struct Args {
    /// The literal text to search for.
    #[arg(allow_hyphen_values = true)]
    pub keyword: String,

    /// The project root to scan.
    #[arg(short = 'd', long = "root", default_value = ".", env = "KEYSWEEP_ROOT")]
    pub root: PathBuf,

    /// Also search inside `vendor` directories.
    #[arg(long)]
    pub vendor: bool,

    /// Also search inside `storage` directories.
    #[arg(long)]
    pub storage: bool,

    /// Replace every occurrence of the keyword with this value. An empty value deletes it.
    #[arg(short, long, value_name = "VALUE", allow_hyphen_values = true)]
    pub replace: Option<String>,

    /// A comma-separated list of file extensions to include (default: php).
    #[arg(short = 'x', long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// A comma-separated list of additional directory names to skip.
    #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// The output format for the results (`text`, `json` or `csv`).
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,

    /// Append match totals to text output.
    #[arg(long = "summary")]
    pub include_summary: bool,

    /// Report what --replace would change without writing any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a YAML settings file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Log debug diagnostics to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Merges command-line values over the settings file and the defaults.
    pub fn resolve(self, settings: Option<SweepConfig>) -> (SearchRequest, RunOptions) {
        let settings = settings.unwrap_or_default();

        let mut request = SearchRequest::new(self.root, self.keyword)
            .include_vendor(self.vendor)
            .include_storage(self.storage);

        if !self.extensions.is_empty() {
            request.extensions = normalize_extensions(&self.extensions);
        } else if let Some(exts) = settings.extensions {
            request.extensions = normalize_extensions(&exts);
        }

        request.exclude = if self.exclude.is_empty() {
            settings.exclude.unwrap_or_default()
        } else {
            self.exclude
        };
        request.replacement = self.replace;

        let format = self
            .format
            .or(settings.format)
            .map(|f| OutputFormat::from(f.as_str()))
            .unwrap_or(OutputFormat::Text);

        let options = RunOptions {
            format,
            include_summary: self.include_summary,
            color: !self.no_color,
            dry_run: self.dry_run,
        };

        (request, options)
    }

    /// Loads the settings file named by `--config`, or the one in the project root.
    pub fn load_settings(&self) -> Result<Option<SweepConfig>> {
        match &self.config {
            Some(path) => {
                let resolved = ConfigLoader::find_config(path, &self.root)?;
                tracing::debug!("Using config file: {}", resolved.display());
                ConfigLoader::load(&resolved).map(Some)
            }
            None => ConfigLoader::discover(&self.root),
        }
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
