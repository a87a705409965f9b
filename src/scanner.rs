use crate::config::{self, SearchRequest};
use crate::errors::{Error, Result};
use ignore::{DirEntry, WalkBuilder};
use regex::bytes::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Files with a NUL byte in this many leading bytes are treated as binary.
const BINARY_SNIFF_LEN: usize = 1024;

/// One line of scanner output in `<path>:<lineNumber>:<content>` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatchLine {
    pub text: String,
}

impl RawMatchLine {
    pub fn new(path: &Path, line_number: usize, content: &str) -> Self {
        Self {
            text: format!("{}:{}:{}", path.display(), line_number, content),
        }
    }
}

impl From<&str> for RawMatchLine {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Walks a directory tree looking for lines that contain a literal keyword.
///
/// The keyword is escaped before compilation, so characters such as `$`, `(`
/// or `*` only ever match themselves. Matching works on raw bytes, which keeps
/// files with invalid UTF-8 searchable.
pub struct Scanner {
    needle: Regex,
    extensions: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl Scanner {
    /// Creates a new `Scanner`.
    ///
    /// # Arguments
    ///
    /// * `keyword` - The literal text to search for. Must not be empty.
    /// * `extensions` - Normalized extensions (no dot, lowercase). Empty selects every file.
    /// * `excluded_dirs` - Directory names whose subtrees are skipped wherever they occur.
    pub fn new(keyword: &str, extensions: Vec<String>, excluded_dirs: Vec<String>) -> Result<Self> {
        if keyword.is_empty() {
            return Err(Error::Config("keyword must not be empty".to_string()));
        }
        Ok(Self {
            needle: Regex::new(&regex::escape(keyword))?,
            extensions,
            excluded_dirs,
        })
    }

    /// Builds a scanner from the keyword and filters of a `SearchRequest`.
    pub fn from_request(request: &SearchRequest) -> Result<Self> {
        Self::new(
            &request.keyword,
            request.extensions.clone(),
            request.excluded_dirs(),
        )
    }

    /// Scans a single file and returns one raw line per matching line.
    ///
    /// Binary files (a NUL byte within the first 1 KiB) yield no matches.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<RawMatchLine>> {
        let mut matches = Vec::new();
        let file_content = fs::read(path)?;

        if file_content.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0) {
            debug!("Skipping binary file {}", path.display());
            return Ok(matches);
        }

        for (idx, line_bytes) in file_content.split(|&b| b == b'\n').enumerate() {
            if self.needle.is_match(line_bytes) {
                let line_str = String::from_utf8_lossy(line_bytes);
                matches.push(RawMatchLine::new(
                    path,
                    idx + 1,
                    line_str.trim_end_matches('\r'),
                ));
            }
        }
        Ok(matches)
    }

    /// Recursively scans `root`, in file-name order within each directory.
    ///
    /// Entries below the root that cannot be read are logged and skipped. A
    /// root that is missing or cannot be listed fails the scan.
    pub fn scan(&self, root: &Path) -> Result<Vec<RawMatchLine>> {
        config::inspect_root(root)?;
        if let Err(e) = fs::read_dir(root) {
            return Err(Error::ScanExecution {
                root: root.to_path_buf(),
                source: Box::new(e),
            });
        }

        debug!("Scanning directory: {}", root.display());
        let excluded = self.excluded_dirs.clone();
        let mut walker = WalkBuilder::new(root);
        walker
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !is_excluded_dir(entry, &excluded));

        let mut all_matches = Vec::new();
        let mut files_scanned = 0usize;

        for entry in walker.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
            if !is_file || !should_process_file(entry.path(), &self.extensions) {
                continue;
            }

            match self.scan_file(entry.path()) {
                Ok(matches) => {
                    files_scanned += 1;
                    all_matches.extend(matches);
                }
                Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        info!(
            "Scanned {} files, {} matching lines",
            files_scanned,
            all_matches.len()
        );
        Ok(all_matches)
    }
}

/// `true` for a directory below the root whose name is in `excluded`.
///
/// The root itself is never excluded, even if it is called `vendor`.
fn is_excluded_dir(entry: &DirEntry, excluded: &[String]) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
    is_dir
        && entry
            .file_name()
            .to_str()
            .map(|name| excluded.iter().any(|ex| ex == name))
            .unwrap_or(false)
}

/// Determines if a file should be scanned based on its name.
///
/// Matches on the full suffix so multi-part extensions like `blade.php` work.
fn should_process_file(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }

    path.file_name()
        .and_then(|os| os.to_str())
        .map(|name| {
            let name = name.to_lowercase();
            extensions
                .iter()
                .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{ext}")))
        })
        .unwrap_or(false)
}
