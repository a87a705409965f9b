use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `keysweep`.
///
/// Only failures that stop a search from running at all are represented here.
/// Per-file problems met while rewriting files are reported as
/// [`FileOutcome::Skipped`](crate::replacer::FileOutcome) values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// An invalid request or configuration. The scan never starts.
    #[error("Config error: {0}")]
    Config(String),

    /// The requested search root does not exist.
    #[error("Search root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The directory walk could not be started for the given root.
    #[error("Scan could not run in {}: {source}", root.display())]
    ScanExecution {
        root: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, keysweep::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The process exit code for this error.
    ///
    /// Configuration problems exit with `2` so callers can tell "bad input"
    /// apart from "the scan itself failed" (`1`).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::RootNotFound(_) | Error::Yaml(_) => 2,
            _ => 1,
        }
    }

    /// `true` for errors raised while validating inputs, before any file is read.
    pub fn is_configuration(&self) -> bool {
        self.exit_code() == 2
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_exit_with_two() {
        assert_eq!(Error::from("keyword must not be empty").exit_code(), 2);
        assert_eq!(Error::RootNotFound(PathBuf::from("/nope")).exit_code(), 2);
        assert!(Error::RootNotFound(PathBuf::from("/nope")).is_configuration());
    }

    #[test]
    fn test_runtime_errors_exit_with_one() {
        let io = Error::from(std::io::Error::other("disk gone"));
        assert_eq!(io.exit_code(), 1);
        assert!(!io.is_configuration());

        let scan = Error::ScanExecution {
            root: PathBuf::from("/srv"),
            source: "walker refused to start".into(),
        };
        assert_eq!(scan.exit_code(), 1);
        assert!(scan.to_string().contains("/srv"));
    }
}
