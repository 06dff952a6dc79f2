use super::PlatformStrings;
use crate::error::{FileError, FileErrorKind};
use crate::fileinfo::{FileCategory, FileRecord};
use crate::platform::PlatformTable;
use serde::Serialize;
use std::path::PathBuf;

const GENERATED_PROTO_SUFFIX: &str = ".pb.go";

/// One buildable unit within a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Target {
    pub sources: PlatformStrings,
    pub imports: PlatformStrings,
    pub copts: PlatformStrings,
    pub clinkopts: PlatformStrings,
}

impl Target {
    /// Adds a file's name, imports and flags.
    ///
    /// An unconstrained file contributes to the generic lists. A constrained one
    /// contributes to each platform whose tags satisfy it, and nowhere else.
    pub fn add_file(&mut self, platforms: &PlatformTable, info: &FileRecord) {
        if !info.has_constraints() {
            self.sources.add_generic_strings([info.name.as_str()]);
            self.imports.add_generic_strings(&info.imports);
            self.copts.add_generic_opts(platforms, &info.copts);
            self.clinkopts.add_generic_opts(platforms, &info.clinkopts);
            return;
        }

        for (name, tags) in platforms.iter() {
            if !info.constraints.check(tags) {
                continue;
            }
            self.sources.add_platform_strings(name, [info.name.as_str()]);
            self.imports.add_platform_strings(name, &info.imports);
            self.copts.add_tagged_opts(name, tags, &info.copts);
            self.clinkopts.add_tagged_opts(name, tags, &info.clinkopts);
        }
    }

    pub fn clean(&mut self) {
        self.sources.clean();
        self.imports.clean();
        self.copts.clean();
        self.clinkopts.clean();
    }

    pub fn has_go(&self) -> bool {
        self.sources.has_go()
    }
}

/// Build metadata for the Go package in one directory, split by target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Declared package name, without the `_test` suffix of external tests.
    pub name: String,
    pub dir: PathBuf,
    /// Slash-separated path from the repository root; empty for the root itself.
    pub rel: String,

    pub library: Target,
    pub cgo_library: Target,
    pub binary: Target,
    pub test: Target,
    pub xtest: Target,

    pub protos: Vec<String>,
    pub has_pb_go: bool,
    pub has_testdata: bool,
}

impl Package {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, rel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            rel: rel.into(),
            ..Default::default()
        }
    }

    /// Routes a file to the target it belongs to.
    ///
    /// `cgo` says whether any Go file in the package imports `"C"`; C sources and
    /// headers only join the cgo library in that case. Ignored and unsupported
    /// files are skipped. Tests that use cgo are rejected.
    pub fn add_file(
        &mut self,
        platforms: &PlatformTable,
        info: &FileRecord,
        cgo: bool,
    ) -> Result<(), FileError> {
        use FileCategory::*;

        match info.category {
            Ignored | Unsupported => return Ok(()),
            _ if info.is_xtest || info.is_test => {
                if info.is_cgo {
                    return Err(FileError::new(&info.path, FileErrorKind::CgoInTest));
                }
                let target = if info.is_xtest {
                    &mut self.xtest
                } else {
                    &mut self.test
                };
                target.add_file(platforms, info);
            }
            C | Header | CAsm if cgo => self.cgo_library.add_file(platforms, info),
            _ if info.is_cgo => self.cgo_library.add_file(platforms, info),
            Go | Asm | Header => self.library.add_file(platforms, info),
            Proto => self.protos.push(info.name.clone()),
            C | CAsm => {}
        }

        if info.name.ends_with(GENERATED_PROTO_SUFFIX) {
            self.has_pb_go = true;
        }
        Ok(())
    }

    /// Normalizes every target and sorts the proto list.
    pub fn clean(&mut self) {
        for target in self.targets_mut() {
            target.clean();
        }
        self.protos.sort();
        self.protos.dedup();
    }

    pub fn is_command(&self) -> bool {
        self.name == "main"
    }

    /// True when any target has a `.go` source.
    pub fn has_go(&self) -> bool {
        self.first_go_file().is_some()
    }

    pub fn first_go_file(&self) -> Option<&str> {
        [
            &self.library,
            &self.cgo_library,
            &self.binary,
            &self.test,
            &self.xtest,
        ]
        .into_iter()
        .find_map(|t| t.sources.first_go_file())
    }

    fn targets_mut(&mut self) -> [&mut Target; 5] {
        [
            &mut self.library,
            &mut self.cgo_library,
            &mut self.binary,
            &mut self.test,
            &mut self.xtest,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fileinfo::{file_name_info, go_file_info, other_file_info};
    use crate::preamble::TaggedOpt;
    use crate::source::HeaderScanner;
    use std::path::Path;

    fn platforms() -> PlatformTable {
        PlatformTable::new()
            .with_platform("linux_amd64", ["linux", "amd64"])
            .with_platform("darwin_amd64", ["darwin", "amd64"])
            .with_platform("windows_amd64", ["windows", "amd64"])
    }

    fn go(name: &str, source: &str) -> FileRecord {
        go_file_info(&Config::new("", "/repo"), &HeaderScanner, Path::new("/repo/pkg"), name, source)
            .unwrap()
    }

    fn other(name: &str) -> FileRecord {
        other_file_info(&Config::new("", "/repo"), Path::new("/repo/pkg"), name, Some("")).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_routes_by_role() {
        let table = platforms();
        let mut pkg = Package::new("foo", "/repo/pkg", "pkg");

        for info in [
            go("foo.go", "package foo\n"),
            go("foo_test.go", "package foo\n"),
            go("foo_x_test.go", "package foo_test\n"),
            other("foo.s"),
            other("foo.h"),
            other("foo.proto"),
            other("README.md"),
        ] {
            pkg.add_file(&table, &info, false).unwrap();
        }
        pkg.clean();

        assert_eq!(pkg.library.sources.generic, strings(&["foo.go", "foo.h", "foo.s"]));
        assert_eq!(pkg.test.sources.generic, strings(&["foo_test.go"]));
        assert_eq!(pkg.xtest.sources.generic, strings(&["foo_x_test.go"]));
        assert!(pkg.cgo_library.sources.is_empty());
        assert_eq!(pkg.protos, strings(&["foo.proto"]));
    }

    #[test]
    fn test_c_files_need_cgo_package() {
        let table = platforms();
        let mut pkg = Package::new("foo", "/repo/pkg", "pkg");
        pkg.add_file(&table, &other("foo.c"), false).unwrap();
        pkg.add_file(&table, &other("foo.S"), false).unwrap();
        assert!(pkg.library.sources.is_empty());
        assert!(pkg.cgo_library.sources.is_empty());

        pkg.add_file(&table, &other("foo.c"), true).unwrap();
        pkg.add_file(&table, &other("foo.h"), true).unwrap();
        pkg.add_file(&table, &other("foo.S"), true).unwrap();
        pkg.add_file(&table, &other("foo.s"), true).unwrap();
        pkg.clean();
        assert_eq!(pkg.cgo_library.sources.generic, strings(&["foo.S", "foo.c", "foo.h"]));
        assert_eq!(pkg.library.sources.generic, strings(&["foo.s"]));
    }

    #[test]
    fn test_cgo_file_goes_to_cgo_library() {
        let table = platforms();
        let mut pkg = Package::new("foo", "/repo/pkg", "pkg");
        let info = go(
            "foo.go",
            "package foo\n\n// #cgo linux LDFLAGS: -lfoo\n// #cgo CFLAGS: -DFOO\nimport \"C\"\n",
        );
        pkg.add_file(&table, &info, true).unwrap();
        pkg.clean();

        assert_eq!(pkg.cgo_library.sources.generic, strings(&["foo.go"]));
        assert_eq!(pkg.cgo_library.copts.generic, strings(&["-DFOO"]));
        assert!(pkg.cgo_library.clinkopts.generic.is_empty());
        assert_eq!(pkg.cgo_library.clinkopts.platform["linux_amd64"], strings(&["-lfoo"]));
        assert!(pkg.library.sources.is_empty());
    }

    #[test]
    fn test_cgo_test_rejected() {
        let mut info = file_name_info(Path::new("/repo/pkg"), "foo_test.go");
        info.is_cgo = true;
        let mut pkg = Package::default();
        let err = pkg.add_file(&platforms(), &info, true).unwrap_err();
        assert_eq!(err.to_string(), "/repo/pkg/foo_test.go: use of cgo in test not supported");
        assert!(pkg.test.sources.is_empty());
    }

    #[test]
    fn test_constrained_files_go_to_matching_platforms() {
        let table = platforms();
        let mut pkg = Package::new("foo", "/repo/pkg", "pkg");
        pkg.add_file(&table, &go("foo.go", "package foo\n\nimport \"github.com/a/b\"\n"), false)
            .unwrap();
        pkg.add_file(
            &table,
            &go("foo_linux.go", "package foo\n\nimport \"github.com/a/b\"\nimport \"github.com/c/d\"\n"),
            false,
        )
        .unwrap();
        pkg.add_file(
            &table,
            &go("unix.go", "// +build linux darwin\n\npackage foo\n"),
            false,
        )
        .unwrap();
        pkg.clean();

        let sources = &pkg.library.sources;
        assert_eq!(sources.generic, strings(&["foo.go"]));
        assert_eq!(sources.platform["linux_amd64"], strings(&["foo_linux.go", "unix.go"]));
        assert_eq!(sources.platform["darwin_amd64"], strings(&["unix.go"]));
        assert!(!sources.platform.contains_key("windows_amd64"));

        let imports = &pkg.library.imports;
        assert_eq!(imports.generic, strings(&["github.com/a/b"]));
        assert_eq!(imports.platform["linux_amd64"], strings(&["github.com/c/d"]));
        assert_eq!(imports.platform.len(), 1);
    }

    #[test]
    fn test_tagged_opts_on_constrained_file() {
        let mut info = file_name_info(Path::new("/repo/pkg"), "foo_amd64.go");
        info.category = FileCategory::Go;
        info.is_cgo = true;
        info.copts = vec![TaggedOpt::new("", "-DAMD64"), TaggedOpt::new("darwin", "-DMAC")];

        let mut target = Target::default();
        target.add_file(&platforms(), &info);
        target.clean();

        assert!(target.copts.generic.is_empty());
        assert_eq!(target.copts.platform["linux_amd64"], strings(&["-DAMD64"]));
        assert_eq!(target.copts.platform["darwin_amd64"], strings(&["-DAMD64", "-DMAC"]));
    }

    #[test]
    fn test_pb_go_flag() {
        let table = platforms();
        let mut pkg = Package::new("foo", "/repo/pkg", "pkg");
        pkg.add_file(&table, &go("foo.go", "package foo\n"), false).unwrap();
        assert!(!pkg.has_pb_go);
        pkg.add_file(&table, &go("foo.pb.go", "package foo\n"), false).unwrap();
        assert!(pkg.has_pb_go);
    }

    #[test]
    fn test_order_independence() {
        let table = platforms();
        let files = vec![
            go("a.go", "package foo\n\nimport \"github.com/x/y\"\n"),
            go("b_linux.go", "package foo\n\nimport \"github.com/x/y\"\n"),
            go("c_windows.go", "package foo\n\nimport \"github.com/z/w\"\n"),
            go("a_test.go", "package foo\n"),
            other("z.proto"),
            other("a.proto"),
        ];

        let build = |order: Vec<&FileRecord>| {
            let mut pkg = Package::new("foo", "/repo/pkg", "pkg");
            for info in order {
                pkg.add_file(&table, info, false).unwrap();
            }
            pkg.clean();
            pkg
        };

        let forward = build(files.iter().collect());
        let backward = build(files.iter().rev().collect());
        assert_eq!(forward, backward);
        assert_eq!(forward.protos, strings(&["a.proto", "z.proto"]));
    }

    #[test]
    fn test_is_command_and_has_go() {
        let mut pkg = Package::new("main", "/repo/cmd", "cmd");
        assert!(pkg.is_command());
        assert!(!pkg.has_go());

        pkg.add_file(&platforms(), &other("foo.s"), false).unwrap();
        assert!(!pkg.has_go());

        pkg.add_file(&platforms(), &go("main_test.go", "package main\n"), false)
            .unwrap();
        assert!(pkg.has_go());
        assert_eq!(pkg.first_go_file(), Some("main_test.go"));
    }
}
