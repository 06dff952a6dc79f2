//! Configuration for package analysis and rule generation
//!
//! All values are read-only inputs shared by every directory analysis. The
//! defaults can be overridden through environment variables:
//!
//! - `RULESMITH_GO_PREFIX`: import path of the repository root - default: ""
//! - `RULESMITH_REPO_ROOT`: repository root directory - default: current directory
//! - `RULESMITH_IGNORE_EXTENSIONS`: comma-separated extensions (with the leading
//!   dot) that are skipped instead of reported as unsupported - default: none
//!
//! # Example
//!
//! ```
//! use rulesmith::Config;
//!
//! let config = Config::new("example.com/repo", "/src/repo").with_ignored_extensions([".m"]);
//! config.validate().expect("valid configuration");
//! ```

use crate::platform::PlatformTable;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PLATFORM_LABEL_PREFIX: &str = "@io_bazel_rules_go//go/platform:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Platform table is empty")]
    NoPlatforms,

    #[error("Invalid go prefix {0:?}: must not start or end with '/'")]
    InvalidPrefix(String),

    #[error("Repository root must be an absolute path: {0}")]
    RelativeRoot(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Import path corresponding to `repo_root`. Imports under it are local.
    pub go_prefix: String,

    /// Directory that relative package paths are computed from.
    pub repo_root: PathBuf,

    /// Platforms that constrained files and flags are evaluated against.
    pub platforms: PlatformTable,

    /// Unsupported extensions that are skipped silently.
    pub ignored_extensions: Vec<String>,

    /// Prepended to platform names to form conditional expression keys.
    pub platform_label_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let go_prefix = env::var("RULESMITH_GO_PREFIX").unwrap_or_default();

        let repo_root = env::var("RULESMITH_REPO_ROOT")
            .ok()
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        let ignored_extensions = env::var("RULESMITH_IGNORE_EXTENSIONS")
            .map(|v| parse_extension_list(&v))
            .unwrap_or_default();

        Self {
            go_prefix,
            repo_root,
            platforms: PlatformTable::default_platforms(),
            ignored_extensions,
            platform_label_prefix: DEFAULT_PLATFORM_LABEL_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Builds a configuration without consulting the environment.
    pub fn new(go_prefix: impl Into<String>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            go_prefix: go_prefix.into(),
            repo_root: repo_root.into(),
            platforms: PlatformTable::default_platforms(),
            ignored_extensions: Vec::new(),
            platform_label_prefix: DEFAULT_PLATFORM_LABEL_PREFIX.to_string(),
        }
    }

    pub fn with_platforms(mut self, platforms: PlatformTable) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_ignored_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.platform_label_prefix = prefix.into();
        self
    }

    pub fn is_ignored_extension(&self, ext: &str) -> bool {
        self.ignored_extensions.iter().any(|e| e == ext)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platforms.is_empty() {
            return Err(ConfigError::NoPlatforms);
        }
        if self.go_prefix.starts_with('/') || self.go_prefix.ends_with('/') {
            return Err(ConfigError::InvalidPrefix(self.go_prefix.clone()));
        }
        if !self.repo_root.is_absolute() {
            return Err(ConfigError::RelativeRoot(self.repo_root.clone()));
        }
        Ok(())
    }
}

fn parse_extension_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('.') {
                s.to_string()
            } else {
                format!(".{}", s)
            }
        })
        .collect()
}
