use crate::errors::{Error, Result};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extensions scanned when neither the command line nor a config file names any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["php"];

/// Name of the settings file picked up automatically from the search root.
pub const LOCAL_CONFIG_FILE: &str = ".keysweep.yaml";

const VENDOR_DIR: &str = "vendor";
const STORAGE_DIR: &str = "storage";

/// Everything the engine needs for one invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Directory the scan starts from.
    pub root: PathBuf,
    /// Literal text to look for. Never interpreted as a pattern.
    pub keyword: String,
    /// Scan `vendor` directories instead of skipping them.
    pub include_vendor: bool,
    /// Scan `storage` directories instead of skipping them.
    pub include_storage: bool,
    /// When present, every matched file is rewritten with this text in place of
    /// the keyword. An empty string deletes the keyword.
    pub replacement: Option<String>,
    /// Lowercase extensions without a leading dot. Empty means every file.
    pub extensions: Vec<String>,
    /// Additional directory names to skip wherever they appear.
    pub exclude: Vec<String>,
}

impl SearchRequest {
    /// Creates a request with the default extension list and no replacement.
    pub fn new(root: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            keyword: keyword.into(),
            include_vendor: false,
            include_storage: false,
            replacement: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn include_vendor(mut self, include: bool) -> Self {
        self.include_vendor = include;
        self
    }

    pub fn include_storage(mut self, include: bool) -> Self {
        self.include_storage = include;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the request before any file is touched.
    ///
    /// An empty keyword and a missing or non-directory root are rejected here so
    /// that a bad invocation never starts walking the tree.
    pub fn validate(&self) -> Result<()> {
        if self.keyword.is_empty() {
            return Err(Error::Config("keyword must not be empty".to_string()));
        }
        inspect_root(&self.root)
    }

    /// Directory names the scanner must not descend into.
    ///
    /// `vendor` and `storage` are excluded independently of each other; each
    /// flag only lifts its own exclusion.
    pub fn excluded_dirs(&self) -> Vec<String> {
        let mut dirs = Vec::new();
        if !self.include_vendor {
            dirs.push(VENDOR_DIR.to_string());
        }
        if !self.include_storage {
            dirs.push(STORAGE_DIR.to_string());
        }
        for name in &self.exclude {
            if !dirs.contains(name) {
                dirs.push(name.clone());
            }
        }
        dirs
    }
}

/// Checks that `root` is an existing directory.
///
/// A missing root is `RootNotFound`; any other metadata failure (a parent
/// without search permission, for instance) means the scan cannot run.
pub fn inspect_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::Config(format!(
            "search root '{}' is not a directory",
            root.display()
        ))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::RootNotFound(root.to_path_buf())),
        Err(e) => Err(Error::ScanExecution {
            root: root.to_path_buf(),
            source: Box::new(e),
        }),
    }
}

/// Trims, strips a leading dot and lowercases each extension.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Settings that may be stored in a YAML file next to the project.
///
/// ```yaml
/// extensions: [php, blade.php]
/// exclude: [node_modules, .git]
/// format: text
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SweepConfig {
    /// File extensions to include in the scan.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Directory names to skip in addition to `vendor` and `storage`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    /// Default output format (`text`, `json` or `csv`).
    #[serde(default)]
    pub format: Option<String>,
}

/// A utility for locating and loading `SweepConfig` files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds an explicitly requested configuration file.
    ///
    /// The search order is:
    /// 1. The path as given (absolute, or relative to the current directory).
    /// 2. A path relative to the search root.
    /// 3. Inside the `~/.keysweep` directory.
    pub fn find_config(config_path: &Path, root: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_root = root.join(config_path);
        if in_root.exists() {
            return Ok(in_root);
        }

        let home_config = dirs::home_dir().map(|home| home.join(".keysweep").join(config_path));
        if let Some(ref candidate) = home_config {
            if candidate.exists() {
                return Ok(candidate.clone());
            }
        }

        let mut tried_locations = vec![
            config_path.display().to_string(),
            in_root.display().to_string(),
        ];
        if let Some(candidate) = home_config {
            tried_locations.push(candidate.display().to_string());
        }

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried_locations.join("\n  - ")
        )
        .into())
    }

    /// Loads a `SweepConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<SweepConfig> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Loads `<root>/.keysweep.yaml` when it exists.
    pub fn discover(root: &Path) -> Result<Option<SweepConfig>> {
        let candidate = root.join(LOCAL_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Loading settings from {}", candidate.display());
            Self::load(&candidate).map(Some)
        } else {
            Ok(None)
        }
    }
}
