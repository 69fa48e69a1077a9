//! `unexport.toml` loading.
//!
//! Every key is optional; a project without the file runs on defaults.
//!
//! ```toml
//! skip = ["src/main\\.ts$"]
//! include_d_ts = false
//! delete_files = false
//! cleanup = false
//! recursive = false
//! max_rounds = 10
//! skip_marker = "unexport-skip"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::syntax::is_declaration_file;
use crate::prune::{PruneOptions, DEFAULT_SKIP_MARKER};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE: &str = "unexport.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid TOML or has keys of the wrong type.
    #[error("Invalid config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `skip` entry is not a valid regular expression.
    #[error("Invalid skip pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Contents of `unexport.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Regexes on root-relative paths; matching files are not targets.
    pub skip: Vec<String>,

    /// Treat `.d.ts` files as targets.
    pub include_d_ts: bool,

    /// Delete files whose exports all become unused.
    pub delete_files: bool,

    /// Run the unused-declaration/unused-import fixes after pruning.
    pub cleanup: bool,

    /// Repeat the run until nothing changes.
    pub recursive: bool,

    /// Cap for `recursive`.
    pub max_rounds: usize,

    /// Comment marker protecting an export.
    pub skip_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            include_d_ts: false,
            delete_files: false,
            cleanup: false,
            recursive: false,
            max_rounds: 10,
            skip_marker: DEFAULT_SKIP_MARKER.to_string(),
        }
    }
}

/// Command-line values layered over the file.
///
/// Flags can only switch behaviour on; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub skip: Vec<String>,
    pub include_d_ts: bool,
    pub delete_files: bool,
    pub cleanup: bool,
    pub recursive: bool,
    pub max_rounds: Option<usize>,
}

impl Config {
    /// Parse configuration from TOML text. `path` only labels errors.
    pub fn from_toml(path: &Path, text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, which must exist.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(path, &text)
    }

    /// Load `explicit` if given, else `unexport.toml` under `root` if present,
    /// else defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Layer command-line values on top.
    pub fn apply(&mut self, overrides: Overrides) {
        self.skip.extend(overrides.skip);
        self.include_d_ts |= overrides.include_d_ts;
        self.delete_files |= overrides.delete_files;
        self.cleanup |= overrides.cleanup;
        self.recursive |= overrides.recursive;
        if let Some(max_rounds) = overrides.max_rounds {
            self.max_rounds = max_rounds;
        }
    }

    pub fn prune_options(&self) -> PruneOptions {
        PruneOptions {
            delete_files: self.delete_files,
            cleanup: self.cleanup,
            recursive: self.recursive,
            max_rounds: self.max_rounds,
            skip_marker: self.skip_marker.clone(),
        }
    }

    /// Compile the `skip` patterns into a target filter.
    pub fn target_filter(&self) -> ConfigResult<TargetFilter> {
        let skip = self
            .skip
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(TargetFilter {
            skip,
            include_d_ts: self.include_d_ts,
        })
    }
}

/// Decides which discovered files are pruning targets.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    skip: Vec<Regex>,
    include_d_ts: bool,
}

impl TargetFilter {
    /// Whether `path` (under `root`) should be pruned.
    pub fn is_target(&self, root: &Path, path: &Path) -> bool {
        if !self.include_d_ts && is_declaration_file(path) {
            return false;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        !self.skip.iter().any(|re| re.is_match(&relative))
    }

    /// Keep the targets among `files`, preserving order.
    pub fn targets(&self, root: &Path, files: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
        files
            .into_iter()
            .filter(|path| self.is_target(root, path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.prune_options(), PruneOptions::default());
    }

    #[test]
    fn test_loads_root_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "skip = ['^legacy/']\ndelete_files = true\nmax_rounds = 3\n",
        )
        .unwrap();

        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.skip, vec!["^legacy/".to_string()]);
        assert!(config.delete_files);
        assert!(!config.cleanup);
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.skip_marker, DEFAULT_SKIP_MARKER);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("other.toml");
        let err = Config::load(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let err = Config::from_toml(Path::new("/app/unexport.toml"), "cleanup = 'yes'\n").unwrap_err();
        match err {
            ConfigError::Toml { path, .. } => assert_eq!(path, Path::new("/app/unexport.toml")),
            other => panic!("unexpected error: {other}"),
        }

        let err = Config::from_toml(Path::new("/app/unexport.toml"), "colour = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config {
            skip: vec!["a".to_string()],
            max_rounds: 4,
            ..Config::default()
        };
        config.apply(Overrides {
            skip: vec!["b".to_string()],
            cleanup: true,
            ..Overrides::default()
        });

        assert_eq!(config.skip, vec!["a".to_string(), "b".to_string()]);
        assert!(config.cleanup);
        assert!(!config.recursive);
        assert_eq!(config.max_rounds, 4);

        config.apply(Overrides {
            max_rounds: Some(1),
            ..Overrides::default()
        });
        assert_eq!(config.max_rounds, 1);
        assert!(config.cleanup);
    }

    #[test]
    fn test_invalid_pattern() {
        let config = Config {
            skip: vec!["(".to_string()],
            ..Config::default()
        };
        let err = config.target_filter().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { pattern, .. } if pattern == "("));
    }

    #[test]
    fn test_target_filter() {
        let root = Path::new("/app");
        let config = Config {
            skip: vec![r"^src/main\.ts$".to_string(), "generated".to_string()],
            ..Config::default()
        };
        let filter = config.target_filter().unwrap();

        let files = vec![
            PathBuf::from("/app/src/main.ts"),
            PathBuf::from("/app/src/util.ts"),
            PathBuf::from("/app/src/generated/api.ts"),
            PathBuf::from("/app/src/types.d.ts"),
        ];
        assert_eq!(
            filter.targets(root, files.clone()),
            vec![PathBuf::from("/app/src/util.ts")]
        );

        let with_d_ts = Config {
            include_d_ts: true,
            ..Config::default()
        }
        .target_filter()
        .unwrap();
        assert_eq!(with_d_ts.targets(root, files).len(), 4);
    }
}
