use crate::errors::{Error, Result};
use crate::match_parser::MatchRecord;
use regex::bytes::{NoExpand, Regex};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Rewrites files, swapping every literal occurrence of a keyword.
///
/// The whole file content is rewritten, not only the lines the scanner
/// reported. Each file is handled on its own: a failure leaves the other
/// files untouched and earlier rewrites in place.
pub struct Replacer {
    keyword: String,
    replacement: String,
    needle: Regex,
    options: ProcessOptions,
}

/// Options for processing a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// If `true`, occurrences are counted but nothing is written to disk.
    pub dry_run: bool,
}

/// Why a file was left alone.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("file no longer exists")]
    NotFound,
    #[error("file is read-only")]
    ReadOnly,
    #[error("could not read file: {0}")]
    ReadFailed(std::io::Error),
    #[error("could not write file: {0}")]
    WriteFailed(std::io::Error),
}

/// What happened to a single file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The keyword was replaced (or would be, in a dry run) this many times.
    Rewritten { path: PathBuf, replacements: usize },
    /// The file no longer contains the keyword; it was not written.
    Unchanged { path: PathBuf },
    /// The file could not be processed.
    Skipped { path: PathBuf, reason: SkipReason },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Rewritten { path, .. }
            | FileOutcome::Unchanged { path }
            | FileOutcome::Skipped { path, .. } => path,
        }
    }
}

/// The per-file results of one replacement pass, in first-seen order.
#[derive(Debug)]
pub struct ReplaceReport {
    pub keyword: String,
    pub replacement: String,
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
}

impl ReplaceReport {
    pub fn rewritten(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Rewritten { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unchanged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    /// Total occurrences replaced across all files.
    pub fn total_replacements(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Rewritten { replacements, .. } => *replacements,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    /// Writes one notice per rewritten or skipped file, then a tally line.
    ///
    /// Files that no longer contain the keyword are only logged.
    pub fn write_notices<W: Write>(&self, writer: &mut W) -> Result<()> {
        let action = if self.dry_run { "Would replace" } else { "Replaced" };
        for outcome in &self.outcomes {
            match outcome {
                FileOutcome::Rewritten { path, replacements } => writeln!(
                    writer,
                    "{} '{}' with '{}' in file: {} ({} occurrences)",
                    action,
                    self.keyword,
                    self.replacement,
                    path.display(),
                    replacements
                )?,
                FileOutcome::Skipped { path, reason } => {
                    writeln!(writer, "Skipped file {}: {}", path.display(), reason)?
                }
                FileOutcome::Unchanged { path } => {
                    debug!("No occurrences left in file: {}", path.display())
                }
            }
        }

        let verb = if self.dry_run { "to rewrite" } else { "rewritten" };
        writeln!(
            writer,
            "Files {}: {}, unchanged: {}, skipped: {}",
            verb,
            self.rewritten(),
            self.unchanged(),
            self.skipped()
        )?;
        Ok(())
    }
}

impl Replacer {
    /// Creates a new `Replacer`.
    ///
    /// An empty `replacement` is valid and deletes the keyword.
    pub fn new(keyword: &str, replacement: &str, options: ProcessOptions) -> Result<Self> {
        if keyword.is_empty() {
            return Err(Error::Config("keyword must not be empty".to_string()));
        }
        Ok(Self {
            keyword: keyword.to_string(),
            replacement: replacement.to_string(),
            needle: Regex::new(&regex::escape(keyword))?,
            options,
        })
    }

    /// Rewrites each distinct file named by `records`, once.
    pub fn replace_in_files(&self, records: &[MatchRecord]) -> ReplaceReport {
        let mut seen = HashSet::new();
        let mut outcomes = Vec::new();

        for record in records {
            if !seen.insert(record.file_path.as_path()) {
                continue;
            }
            outcomes.push(self.process_path(&record.file_path));
        }

        ReplaceReport {
            keyword: self.keyword.clone(),
            replacement: self.replacement.clone(),
            dry_run: self.options.dry_run,
            outcomes,
        }
    }

    fn process_path(&self, path: &Path) -> FileOutcome {
        let path_buf = path.to_path_buf();
        match self.process_file(path) {
            Ok(0) => {
                debug!("No occurrences left in {}", path.display());
                FileOutcome::Unchanged { path: path_buf }
            }
            Ok(replacements) => {
                info!("Replaced {} occurrences in {}", replacements, path.display());
                FileOutcome::Rewritten {
                    path: path_buf,
                    replacements,
                }
            }
            Err(reason) => {
                warn!("Skipping {}: {}", path.display(), reason);
                FileOutcome::Skipped {
                    path: path_buf,
                    reason,
                }
            }
        }
    }

    /// Replaces every occurrence in one file and returns how many there were.
    ///
    /// The new content is written to a temporary file in the same directory
    /// and persisted over the original, keeping its permissions.
    pub fn process_file(&self, path: &Path) -> std::result::Result<usize, SkipReason> {
        let content = fs::read(path).map_err(classify_read_error)?;

        let changes = self.needle.find_iter(&content).count();
        if changes == 0 || self.options.dry_run {
            return Ok(changes);
        }

        let perms = fs::metadata(path).map_err(classify_read_error)?.permissions();
        if perms.readonly() {
            return Err(SkipReason::ReadOnly);
        }

        let new_content = self
            .needle
            .replace_all(&content, NoExpand(self.replacement.as_bytes()));

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent).map_err(SkipReason::WriteFailed)?;
        temp_file
            .write_all(&new_content)
            .map_err(SkipReason::WriteFailed)?;
        fs::set_permissions(temp_file.path(), perms).map_err(SkipReason::WriteFailed)?;
        temp_file
            .persist(path)
            .map_err(|e| SkipReason::WriteFailed(e.error))?;

        Ok(changes)
    }
}

/// A file that disappeared is `NotFound`; anything else is a read failure.
fn classify_read_error(e: std::io::Error) -> SkipReason {
    match e.kind() {
        ErrorKind::NotFound => SkipReason::NotFound,
        _ => SkipReason::ReadFailed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(path: &Path, line_number: usize) -> MatchRecord {
        MatchRecord {
            file_path: path.to_path_buf(),
            line_number,
            preview: String::new(),
        }
    }

    fn replacer(keyword: &str, replacement: &str) -> Replacer {
        Replacer::new(keyword, replacement, ProcessOptions::default()).unwrap()
    }

    #[test]
    fn test_replaces_every_occurrence_in_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Foo.php");
        fs::write(&path, "OldName OldName\nnone\nxOldNamex\n").unwrap();

        let report = replacer("OldName", "NewName").replace_in_files(&[record(&path, 1)]);

        assert_eq!(report.rewritten(), 1);
        assert_eq!(report.total_replacements(), 3);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "NewName NewName\nnone\nxNewNamex\n"
        );
    }

    #[test]
    fn test_each_file_rewritten_once() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.php");
        let b = temp_dir.path().join("b.php");
        fs::write(&a, "k\nk\nk").unwrap();
        fs::write(&b, "k").unwrap();

        let records = vec![record(&a, 1), record(&a, 2), record(&b, 1), record(&a, 3)];
        let report = replacer("k", "kk").replace_in_files(&records);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].path(), a.as_path());
        assert_eq!(report.outcomes[1].path(), b.as_path());
        assert_eq!(fs::read_to_string(&a).unwrap(), "kk\nkk\nkk");
        assert_eq!(fs::read_to_string(&b).unwrap(), "kk");
    }

    #[test]
    fn test_empty_replacement_deletes_keyword() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "debug(); keep(); debug();").unwrap();

        replacer("debug();", "").replace_in_files(&[record(&path, 1)]);
        assert_eq!(fs::read_to_string(&path).unwrap(), " keep(); ");
    }

    #[test]
    fn test_replacement_text_is_not_expanded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "price = cost;").unwrap();

        replacer("cost", "$1 + $tax").replace_in_files(&[record(&path, 1)]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "price = $1 + $tax;");
    }

    #[test]
    fn test_second_pass_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "Old Old").unwrap();
        let records = vec![record(&path, 1)];
        let r = replacer("Old", "New");

        assert_eq!(r.replace_in_files(&records).rewritten(), 1);
        let second = r.replace_in_files(&records);
        assert_eq!(second.rewritten(), 0);
        assert_eq!(second.unchanged(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "New New");
    }

    #[test]
    fn test_replacement_containing_keyword_is_single_pass() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "Foo and Foo").unwrap();

        replacer("Foo", "FooBar").replace_in_files(&[record(&path, 1)]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "FooBar and FooBar");
    }

    #[test]
    fn test_missing_file_skipped_and_batch_continues() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("gone.php");
        let kept = temp_dir.path().join("kept.php");
        fs::write(&kept, "Old").unwrap();

        let report = replacer("Old", "New").replace_in_files(&[record(&gone, 1), record(&kept, 1)]);

        assert!(matches!(
            &report.outcomes[0],
            FileOutcome::Skipped { reason: SkipReason::NotFound, .. }
        ));
        assert_eq!(report.rewritten(), 1);
        assert_eq!(fs::read_to_string(&kept).unwrap(), "New");
    }

    #[test]
    fn test_read_only_file_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("locked.php");
        fs::write(&path, "Old").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let report = replacer("Old", "New").replace_in_files(&[record(&path, 1)]);

        assert!(matches!(
            &report.outcomes[0],
            FileOutcome::Skipped { reason: SkipReason::ReadOnly, .. }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Old");

        let mut perms = fs::metadata(&path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "Old Old").unwrap();

        let r = Replacer::new("Old", "New", ProcessOptions { dry_run: true }).unwrap();
        let report = r.replace_in_files(&[record(&path, 1)]);

        assert_eq!(report.total_replacements(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Old Old");

        let mut out = Vec::new();
        report.write_notices(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Would replace 'Old' with 'New'"));
        assert!(out.contains("Files to rewrite: 1"));
    }

    #[test]
    fn test_notices() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        let gone = temp_dir.path().join("gone.php");
        fs::write(&path, "Old").unwrap();

        let report = replacer("Old", "New").replace_in_files(&[record(&path, 1), record(&gone, 4)]);
        let mut out = Vec::new();
        report.write_notices(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(&format!(
            "Replaced 'Old' with 'New' in file: {} (1 occurrences)",
            path.display()
        )));
        assert!(out.contains(&format!(
            "Skipped file {}: file no longer exists",
            gone.display()
        )));
        assert!(out.contains("Files rewritten: 1, unchanged: 0, skipped: 1"));
    }

    #[test]
    fn test_unchanged_files_are_not_announced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.php");
        fs::write(&path, "already New").unwrap();

        let report = replacer("Old", "New").replace_in_files(&[record(&path, 1)]);
        let mut out = Vec::new();
        report.write_notices(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Files rewritten: 0, unchanged: 1, skipped: 0\n"
        );
    }

    #[test]
    fn test_vanished_file_errors_map_to_not_found() {
        let missing = std::io::Error::from(ErrorKind::NotFound);
        assert!(matches!(classify_read_error(missing), SkipReason::NotFound));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(classify_read_error(denied), SkipReason::ReadFailed(_)));
    }

    #[test]
    fn test_non_utf8_content_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.php");
        fs::write(&path, b"caf\xe9 Old\n").unwrap();

        replacer("Old", "New").replace_in_files(&[record(&path, 1)]);
        assert_eq!(fs::read(&path).unwrap(), b"caf\xe9 New\n");
    }
}
