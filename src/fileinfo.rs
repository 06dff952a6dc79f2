//! Per-file metadata extraction
//!
//! Every file in a package directory is turned into one immutable [`FileRecord`]:
//! its category (from the extension), its test role (from the name and package
//! clause), its platform constraints, and for Go sources its imports and `#cgo`
//! flags.

use crate::config::Config;
use crate::constraints::{read_tags, split_file_name, Constraints};
use crate::error::{FileError, FileErrorKind};
use crate::preamble::{parse_directives, TaggedOpt};
use crate::source::SourceParser;
use std::path::{Path, PathBuf};

const CGO_IMPORT: &str = "C";
const TEST_PACKAGE_SUFFIX: &str = "_test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// `.go`
    Go,
    /// `.s`, Go assembly
    Asm,
    /// `.h` and C++ header variants
    Header,
    /// `.c` and C++ source variants
    C,
    /// `.S`, C preprocessed assembly
    CAsm,
    /// `.proto`
    Proto,
    /// Not part of any build; skipped silently.
    Ignored,
    /// Buildable by the go tool but not by the generated rules.
    Unsupported,
}

impl FileCategory {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".go" => FileCategory::Go,
            ".c" | ".cc" | ".cpp" | ".cxx" => FileCategory::C,
            ".h" | ".hh" | ".hpp" | ".hxx" => FileCategory::Header,
            ".s" => FileCategory::Asm,
            ".S" => FileCategory::CAsm,
            ".proto" => FileCategory::Proto,
            ".m" | ".f" | ".F" | ".for" | ".f90" | ".swig" | ".swigcxx" | ".syso" => {
                FileCategory::Unsupported
            }
            _ => FileCategory::Ignored,
        }
    }

    /// Categories whose files carry `+build` comments worth reading.
    pub fn has_comment_metadata(self) -> bool {
        matches!(
            self,
            FileCategory::Go
                | FileCategory::Asm
                | FileCategory::Header
                | FileCategory::C
                | FileCategory::CAsm
                | FileCategory::Proto
        )
    }
}

/// Everything known about one file. Built once by the functions in this module
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub dir: PathBuf,
    pub path: PathBuf,
    /// Extension including the leading dot, or empty.
    pub ext: String,
    pub category: FileCategory,
    pub is_test: bool,
    pub is_xtest: bool,
    pub is_cgo: bool,
    /// Declared package, without the `_test` suffix of external tests.
    pub package_name: String,
    /// Non-standard imports, in source order.
    pub imports: Vec<String>,
    pub constraints: Constraints,
    pub copts: Vec<TaggedOpt>,
    pub clinkopts: Vec<TaggedOpt>,
}

impl FileRecord {
    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }
}

/// Metadata derivable from the file name alone.
pub fn file_name_info(dir: &Path, name: &str) -> FileRecord {
    let ext = extension(name);
    let category = FileCategory::from_extension(ext);
    let parts = split_file_name(&name[..name.len() - ext.len()]);

    FileRecord {
        name: name.to_string(),
        dir: dir.to_path_buf(),
        path: dir.join(name),
        ext: ext.to_string(),
        category,
        is_test: parts.has_test_suffix && category == FileCategory::Go,
        is_xtest: false,
        is_cgo: false,
        package_name: String::new(),
        imports: Vec::new(),
        constraints: Constraints {
            goos: parts.goos,
            goarch: parts.goarch,
            tags: Vec::new(),
        },
        copts: Vec::new(),
        clinkopts: Vec::new(),
    }
}

/// Builds the record for a `.go` file from its content.
///
/// Fails on a malformed header or `#cgo` directive, and on any `import "C"` in a
/// test file.
pub fn go_file_info(
    config: &Config,
    parser: &dyn SourceParser,
    dir: &Path,
    name: &str,
    content: &str,
) -> Result<FileRecord, FileError> {
    let mut info = file_name_info(dir, name);
    let header = parser
        .parse_header(content)
        .map_err(|e| FileError::new(&info.path, e))?;

    info.package_name = header.package_name;
    if info.is_test {
        if let Some(stripped) = info.package_name.strip_suffix(TEST_PACKAGE_SUFFIX) {
            info.is_xtest = true;
            info.package_name = stripped.to_string();
        }
    }

    let src_dir = dir.to_string_lossy();
    for spec in header.imports {
        if spec.path == CGO_IMPORT {
            if info.is_test {
                return Err(FileError::new(&info.path, FileErrorKind::CgoInTest));
            }
            info.is_cgo = true;
            if let Some(doc) = &spec.doc {
                let flags =
                    parse_directives(doc, &src_dir).map_err(|e| FileError::new(&info.path, e))?;
                info.copts.extend(flags.copts);
                info.clinkopts.extend(flags.clinkopts);
            }
            continue;
        }
        if is_standard(&config.go_prefix, &spec.path) {
            continue;
        }
        info.imports.push(spec.path);
    }

    info.constraints.tags = read_tags(content);
    Ok(info)
}

/// Builds the record for a non-Go file.
///
/// `content` is only consulted for categories that carry `+build` comments.
/// Unsupported extensions fail unless listed in the configuration's ignore list.
pub fn other_file_info(
    config: &Config,
    dir: &Path,
    name: &str,
    content: Option<&str>,
) -> Result<FileRecord, FileError> {
    let mut info = file_name_info(dir, name);
    match info.category {
        FileCategory::Ignored => return Ok(info),
        FileCategory::Unsupported if config.is_ignored_extension(&info.ext) => {
            info.category = FileCategory::Ignored;
            return Ok(info);
        }
        FileCategory::Unsupported => {
            return Err(FileError::new(
                &info.path,
                FileErrorKind::UnsupportedExtension,
            ))
        }
        _ => {}
    }

    if let Some(content) = content {
        info.constraints.tags = read_tags(content);
    }
    Ok(info)
}

/// Reports whether `import_path` belongs to the standard library.
///
/// Standard packages have no dot in their first path element; anything under
/// `go_prefix/` is local even when it looks standard.
pub fn is_standard(go_prefix: &str, import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or_default();
    if first.contains('.') {
        return false;
    }
    if !go_prefix.is_empty() && import_path.starts_with(&format!("{}/", go_prefix)) {
        return false;
    }
    true
}

/// The extension of `name` including its dot, or "" when there is none.
pub(crate) fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preamble::PreambleError;
    use crate::source::HeaderScanner;
    use yare::parameterized;

    fn config() -> Config {
        Config::new("", "/repo")
    }

    fn go_info(name: &str, source: &str) -> Result<FileRecord, FileError> {
        go_file_info(&config(), &HeaderScanner, Path::new("."), name, source)
    }

    #[parameterized(
        simple_go = { "simple.go", ".go", FileCategory::Go, false, None, None },
        go_test = { "foo_test.go", ".go", FileCategory::Go, true, None, None },
        test_source = { "test.go", ".go", FileCategory::Go, false, None, None },
        underscore_test = { "_test.go", ".go", FileCategory::Go, true, None, None },
        goos = { "foo_linux.go", ".go", FileCategory::Go, false, Some("linux"), None },
        goarch = { "foo_amd64.go", ".go", FileCategory::Go, false, None, Some("amd64") },
        goos_goarch_test = { "foo_linux_amd64_test.go", ".go", FileCategory::Go, true, Some("linux"), Some("amd64") },
        goos_test = { "linux_test.go", ".go", FileCategory::Go, true, None, None },
        c_file = { "foo_test.cxx", ".cxx", FileCategory::C, false, None, None },
        c_os_test_file = { "foo_linux_test.c", ".c", FileCategory::C, false, Some("linux"), None },
        h_file = { "foo_linux.h", ".h", FileCategory::Header, false, Some("linux"), None },
        go_asm = { "foo_amd64.s", ".s", FileCategory::Asm, false, None, Some("amd64") },
        c_asm = { "foo.S", ".S", FileCategory::CAsm, false, None, None },
        proto = { "foo.proto", ".proto", FileCategory::Proto, false, None, None },
        unsupported = { "foo.m", ".m", FileCategory::Unsupported, false, None, None },
        ignored_test = { "foo_test.py", ".py", FileCategory::Ignored, false, None, None },
        ignored = { "foo.txt", ".txt", FileCategory::Ignored, false, None, None },
        no_extension = { "Makefile", "", FileCategory::Ignored, false, None, None },
    )]
    fn test_file_name_info(
        name: &str,
        ext: &str,
        category: FileCategory,
        is_test: bool,
        goos: Option<&str>,
        goarch: Option<&str>,
    ) {
        let info = file_name_info(Path::new("dir"), name);
        assert_eq!(info.name, name);
        assert_eq!(info.path, Path::new("dir").join(name));
        assert_eq!(info.ext, ext);
        assert_eq!(info.category, category);
        assert_eq!(info.is_test, is_test);
        assert!(!info.is_xtest);
        assert_eq!(info.constraints.goos.as_deref(), goos);
        assert_eq!(info.constraints.goarch.as_deref(), goarch);
    }

    #[test]
    fn test_go_file_info_empty_file() {
        let info = go_info("foo.go", "package foo\n").unwrap();
        assert_eq!(info.package_name, "foo");
        assert!(!info.is_test && !info.is_xtest && !info.is_cgo);
        assert!(info.imports.is_empty());
        assert!(!info.has_constraints());
    }

    #[test]
    fn test_go_file_info_xtest() {
        let info = go_info("foo_test.go", "package foo_test\n").unwrap();
        assert_eq!(info.package_name, "foo");
        assert!(info.is_test);
        assert!(info.is_xtest);
    }

    #[test]
    fn test_go_file_info_xtest_package_on_non_test_file() {
        let info = go_info("foo_xtest.go", "package foo_test\n").unwrap();
        assert_eq!(info.package_name, "foo_test");
        assert!(!info.is_test);
        assert!(!info.is_xtest);
    }

    #[test]
    fn test_go_file_info_imports() {
        let source = "package foo\n\nimport (\n\t\"fmt\"\n\t\"github.com/foo/bar\"\n\tx \"github.com/local/project/y\"\n)\n";
        let info = go_info("foo.go", source).unwrap();
        assert_eq!(
            info.imports,
            vec!["github.com/foo/bar", "github.com/local/project/y"]
        );
    }

    #[test]
    fn test_go_file_info_local_imports_kept() {
        let config = Config::new("example/repo", "/repo");
        let source = "package foo\n\nimport (\n\t\"example/repo/lib\"\n\t\"strings\"\n)\n";
        let info = go_file_info(&config, &HeaderScanner, Path::new("."), "foo.go", source).unwrap();
        assert_eq!(info.imports, vec!["example/repo/lib"]);
    }

    #[test]
    fn test_go_file_info_cgo() {
        let source = "package foo\n\n/*\n#cgo CFLAGS: -O0\n\t#cgo CPPFLAGS: -O1\n#cgo   CXXFLAGS:   -O2\n#cgo LDFLAGS: -O3 -O4\n*/\nimport \"C\"\n";
        let info = go_info("foo.go", source).unwrap();
        assert!(info.is_cgo);
        assert_eq!(
            info.copts,
            vec![
                TaggedOpt::new("", "-O0"),
                TaggedOpt::new("", "-O1"),
                TaggedOpt::new("", "-O2"),
            ]
        );
        assert_eq!(info.clinkopts, vec![TaggedOpt::new("", "-O3 -O4")]);
        assert!(info.imports.is_empty());
    }

    #[test]
    fn test_go_file_info_cgo_without_preamble() {
        let info = go_info("foo.go", "package foo\n\nimport \"C\"\n").unwrap();
        assert!(info.is_cgo);
        assert!(info.copts.is_empty());
    }

    #[test]
    fn test_go_file_info_cgo_with_conditions() {
        let source = "package foo\n\n// #cgo foo bar,!baz CFLAGS: -O0\nimport \"C\"\n";
        let info = go_info("foo.go", source).unwrap();
        assert_eq!(info.copts, vec![TaggedOpt::new("foo bar,!baz", "-O0")]);
    }

    #[test]
    fn test_go_file_info_build_tags() {
        let source = "// +build linux darwin\n\n// +build !ignore\n\npackage foo\n";
        let info = go_info("foo.go", source).unwrap();
        assert_eq!(info.constraints.tags, vec!["linux darwin", "!ignore"]);
        assert!(info.has_constraints());
    }

    #[test]
    fn test_go_file_info_build_tags_after_copyright() {
        let source = "// Copyright 2017\n\n// +build darwin dragonfly freebsd netbsd openbsd\n\n// Package route provides basic functions.\npackage route\n";
        let info = go_info("route.go", source).unwrap();
        assert_eq!(info.package_name, "route");
        assert_eq!(
            info.constraints.tags,
            vec!["darwin dragonfly freebsd netbsd openbsd"]
        );
    }

    #[test]
    fn test_go_file_info_src_dir_expansion() {
        let source = "package foo\n\n// #cgo LDFLAGS: -L${SRCDIR}/libs -ladd\nimport \"C\"\n";
        let info = go_file_info(
            &config(),
            &HeaderScanner,
            Path::new("/projects/src/add"),
            "add.go",
            source,
        )
        .unwrap();
        assert_eq!(
            info.clinkopts,
            vec![TaggedOpt::new("", "-L/projects/src/add/libs -ladd")]
        );
    }

    #[parameterized(
        parse_error = { "foo.go", "pakcage foo", "expected 'package'" },
        cgo_error = { "foo.go", "package foo\n\n// #cgo !\nimport \"C\"\n", "invalid #cgo line" },
        cgo_in_test = { "foo_test.go", "package foo\n\nimport \"C\"\n", "use of cgo in test not supported" },
        cgo_in_tagged_test = { "foo_linux_test.go", "// +build ignore\n\npackage foo\n\nimport \"C\"\n", "use of cgo in test not supported" },
        unknown_verb = { "foo.go", "package foo\n\n// #cgo FFLAGS: -O0\nimport \"C\"\n", "invalid #cgo verb" },
        unsupported_verb = { "foo.go", "package foo\n\n// #cgo pkg-config: foo\nimport \"C\"\n", "not supported" },
        bad_quoting = { "foo.go", "package foo\n\n// #cgo CFLAGS: 'foo bar'\nimport \"C\"\n", "malformed #cgo argument" },
    )]
    fn test_go_file_info_failures(name: &str, source: &str, expected: &str) {
        let err = go_info(name, source).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "got {:?}, want error containing {:?}",
            err.to_string(),
            expected
        );
        assert_eq!(err.path, Path::new(".").join(name));
    }

    #[test]
    fn test_go_file_info_preamble_error_kind() {
        let err = go_info("foo.go", "package foo\n\n// #cgo FFLAGS: -O0\nimport \"C\"\n").unwrap_err();
        assert!(matches!(
            err.kind,
            FileErrorKind::Preamble(PreambleError::InvalidVerb(_))
        ));
    }

    #[test]
    fn test_other_file_info_tags() {
        let info = other_file_info(
            &config(),
            Path::new("."),
            "foo.c",
            Some("// +build foo bar\n// +build baz,!ignore\n\n"),
        )
        .unwrap();
        assert_eq!(info.constraints.tags, vec!["foo bar", "baz,!ignore"]);

        let info = other_file_info(&config(), Path::new("."), "foo.c", Some("")).unwrap();
        assert!(info.constraints.tags.is_empty());
    }

    #[test]
    fn test_other_file_info_ignored() {
        let info = other_file_info(&config(), Path::new("."), "foo.txt", None).unwrap();
        assert_eq!(info.category, FileCategory::Ignored);
    }

    #[test]
    fn test_other_file_info_unsupported() {
        let err = other_file_info(&config(), Path::new("."), "foo.m", None).unwrap_err();
        assert!(err.to_string().contains("file extension not yet supported"));
        assert!(matches!(err.kind, FileErrorKind::UnsupportedExtension));
    }

    #[test]
    fn test_other_file_info_unsupported_on_ignore_list() {
        let config = config().with_ignored_extensions([".m"]);
        let info = other_file_info(&config, Path::new("."), "foo.m", None).unwrap();
        assert_eq!(info.category, FileCategory::Ignored);
    }

    #[parameterized(
        no_prefix_fmt = { "", "fmt", true },
        no_prefix_nested = { "", "encoding/json", true },
        no_prefix_local_looking = { "", "foo/bar", true },
        no_prefix_domain = { "", "foo.com/bar", false },
        prefix_fmt = { "foo", "fmt", true },
        prefix_nested = { "foo", "encoding/json", true },
        prefix_itself = { "foo", "foo", true },
        prefix_child = { "foo", "foo/bar", false },
        prefix_domain = { "foo", "foo.com/bar", false },
        domain_prefix_fmt = { "foo.com/bar", "fmt", true },
        domain_prefix_nested = { "foo.com/bar", "encoding/json", true },
        domain_prefix_other = { "foo.com/bar", "foo/bar", true },
        domain_prefix_itself = { "foo.com/bar", "foo.com/bar", false },
    )]
    fn test_is_standard(go_prefix: &str, import_path: &str, expected: bool) {
        assert_eq!(is_standard(go_prefix, import_path), expected);
    }
}
