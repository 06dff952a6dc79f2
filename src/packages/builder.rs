use super::Package;
use crate::config::Config;
use crate::error::{FileError, FileErrorKind, PackageError};
use crate::fileinfo::{extension, go_file_info, other_file_info, FileCategory, FileRecord};
use crate::fs::{DirEntry, FileSystem};
use crate::source::{HeaderScanner, SourceParser};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

const TESTDATA_DIR: &str = "testdata";
const DOCUMENTATION_PACKAGE: &str = "documentation";

/// Outcome of analyzing one directory.
///
/// `package` is `None` when the directory holds no usable Go source. `errors`
/// lists every file that was left out, in the order it was encountered.
#[derive(Debug, Default)]
pub struct DirectoryAnalysis {
    pub package: Option<Package>,
    pub errors: Vec<FileError>,
}

/// Analyzes `dir` with the default source scanner.
pub fn build_package(
    fs: &dyn FileSystem,
    config: &Config,
    dir: &Path,
) -> Result<DirectoryAnalysis, PackageError> {
    PackageBuilder::new(fs, config).build(dir)
}

/// Reads a directory and folds its files into a [`Package`].
pub struct PackageBuilder<'a> {
    fs: &'a dyn FileSystem,
    config: &'a Config,
    parser: &'a dyn SourceParser,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a Config) -> Self {
        Self {
            fs,
            config,
            parser: &HeaderScanner,
        }
    }

    pub fn with_parser(mut self, parser: &'a dyn SourceParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn build(&self, dir: &Path) -> Result<DirectoryAnalysis, PackageError> {
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|source| PackageError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut errors = Vec::new();
        let has_testdata = entries
            .iter()
            .any(|e| e.is_dir() && e.file_name() == TESTDATA_DIR);

        let (go_entries, other_entries): (Vec<&DirEntry>, Vec<&DirEntry>) = entries
            .iter()
            .filter(|e| e.is_file())
            .partition(|e| e.file_name().ends_with(".go"));

        let mut go_files = Vec::new();
        for entry in go_entries {
            match self.go_file(dir, entry) {
                Ok(record) => go_files.push(record),
                Err(e) => report(&mut errors, e),
            }
        }

        let Some(name) = self.select_package_name(dir, &go_files)? else {
            debug!(path = %dir.display(), "No Go package in directory");
            return Ok(DirectoryAnalysis {
                package: None,
                errors,
            });
        };

        let cgo = go_files.iter().any(|f| f.is_cgo);
        let mut package = Package::new(name, dir, rel_path(&self.config.repo_root, dir));
        package.has_testdata = has_testdata;

        for record in &go_files {
            if record.package_name == DOCUMENTATION_PACKAGE {
                debug!(path = %record.path.display(), "Skipping documentation file");
                continue;
            }
            if record.package_name != package.name {
                report(
                    &mut errors,
                    FileError::new(
                        &record.path,
                        FileErrorKind::PackageMismatch {
                            found: record.package_name.clone(),
                            expected: package.name.clone(),
                        },
                    ),
                );
                continue;
            }
            if let Err(e) = package.add_file(&self.config.platforms, record, cgo) {
                report(&mut errors, e);
            }
        }

        for entry in other_entries {
            let added = self
                .other_file(dir, entry)
                .and_then(|record| package.add_file(&self.config.platforms, &record, cgo));
            if let Err(e) = added {
                report(&mut errors, e);
            }
        }

        package.clean();

        if !package.has_go() {
            debug!(path = %dir.display(), "Package has no buildable Go files");
            return Ok(DirectoryAnalysis {
                package: None,
                errors,
            });
        }

        info!(
            path = %dir.display(),
            package = %package.name,
            cgo,
            errors = errors.len(),
            "Package analyzed"
        );

        Ok(DirectoryAnalysis {
            package: Some(package),
            errors,
        })
    }

    fn go_file(&self, dir: &Path, entry: &DirEntry) -> Result<FileRecord, FileError> {
        let content = self
            .fs
            .read_to_string(entry.path())
            .map_err(|e| FileError::new(entry.path(), FileErrorKind::Read(e)))?;
        go_file_info(self.config, self.parser, dir, entry.file_name(), &content)
    }

    fn other_file(&self, dir: &Path, entry: &DirEntry) -> Result<FileRecord, FileError> {
        let category = FileCategory::from_extension(extension(entry.file_name()));
        let content = if category.has_comment_metadata() {
            // Tag lines are ASCII; the rest of a C or assembly file may not be UTF-8.
            let bytes = self
                .fs
                .read(entry.path())
                .map_err(|e| FileError::new(entry.path(), FileErrorKind::Read(e)))?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        let record = other_file_info(self.config, dir, entry.file_name(), content.as_deref())?;
        if record.category == FileCategory::Ignored {
            debug!(path = %record.path.display(), "Ignoring file");
        }
        Ok(record)
    }

    /// Picks the package name among the names declared by `files`.
    ///
    /// Files declaring the `documentation` package never count. A single name wins
    /// outright. Among several, the one matching the directory name (with `-` read
    /// as `_`) wins; otherwise the directory is ambiguous.
    fn select_package_name(
        &self,
        dir: &Path,
        files: &[FileRecord],
    ) -> Result<Option<String>, PackageError> {
        let names: BTreeSet<&str> = files
            .iter()
            .map(|f| f.package_name.as_str())
            .filter(|name| *name != DOCUMENTATION_PACKAGE)
            .collect();

        if names.len() <= 1 {
            return Ok(names.into_iter().next().map(String::from));
        }

        let default_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().replace('-', "_"))
            .unwrap_or_default();
        if names.contains(default_name.as_str()) {
            return Ok(Some(default_name));
        }

        Err(PackageError::MultiplePackages {
            path: dir.to_path_buf(),
            names: names.into_iter().map(String::from).collect(),
        })
    }
}

fn report(errors: &mut Vec<FileError>, error: FileError) {
    warn!(path = %error.path.display(), reason = %error.kind, "Skipping file");
    errors.push(error);
}

/// Slash-separated path of `dir` relative to `root`, or the full path when `dir`
/// lies outside of it.
fn rel_path(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| c != "/")
        .collect::<Vec<_>>()
        .join("/")
}
