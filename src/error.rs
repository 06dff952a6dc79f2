use crate::preamble::PreambleError;
use crate::source::ParseError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single file could not be used.
#[derive(Debug, Error)]
pub enum FileErrorKind {
    #[error("failed to read file: {0:#}")]
    Read(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Preamble(#[from] PreambleError),

    #[error("use of cgo in test not supported")]
    CgoInTest,

    #[error("file extension not yet supported")]
    UnsupportedExtension,

    #[error("found package {found}, expected {expected}")]
    PackageMismatch { found: String, expected: String },
}

/// A per-file failure. The file is left out of every target; sibling files are
/// unaffected.
#[derive(Debug, Error)]
#[error("{}: {kind}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub kind: FileErrorKind,
}

impl FileError {
    pub fn new(path: impl AsRef<Path>, kind: impl Into<FileErrorKind>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: kind.into(),
        }
    }

    /// The human readable reason, without the path.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

/// Failures that abort the analysis of a whole directory.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("failed to list directory {}: {source:#}", .path.display())]
    ReadDir {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("found packages {} in {}", .names.join(", "), .path.display())]
    MultiplePackages { path: PathBuf, names: Vec<String> },
}
