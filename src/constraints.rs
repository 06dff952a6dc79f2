//! Build constraint evaluation
//!
//! Files opt in or out of platforms two ways: through an `_<os>`, `_<arch>` or
//! `_<os>_<arch>` suffix on the file name, and through `// +build` comment lines at
//! the top of the file. Both are collected into [`Constraints`] and evaluated
//! against a platform's [`TagSet`].
//!
//! A `+build` line is a space-separated list of OR terms; each term is a
//! comma-separated list of AND factors, and each factor may be negated with `!`.

use crate::platform::{is_known_arch, is_known_os, TagSet};
use regex::Regex;
use std::sync::OnceLock;

const BUILD_TAG_MARKER: &str = "+build";

/// Platform information encoded in a file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNameParts {
    /// The stem ends in a `_test` token.
    pub has_test_suffix: bool,
    pub goos: Option<String>,
    pub goarch: Option<String>,
}

/// Splits a file stem (the name without its extension) into its test marker and
/// OS/architecture suffixes.
///
/// Only the suffix form counts: `linux.go` does not constrain the OS, while
/// `foo_linux.go` does. An architecture token that precedes an OS token
/// (`foo_amd64_linux.go`) is dropped and only the OS is kept.
pub fn split_file_name(stem: &str) -> FileNameParts {
    let mut parts: Vec<&str> = stem.split('_').collect();
    let mut result = FileNameParts::default();

    if parts.len() >= 2 && parts[parts.len() - 1] == "test" {
        result.has_test_suffix = true;
        parts.pop();
    }

    let n = parts.len();
    if n >= 3 && is_known_os(parts[n - 2]) && is_known_arch(parts[n - 1]) {
        result.goos = Some(parts[n - 2].to_string());
        result.goarch = Some(parts[n - 1].to_string());
    } else if n >= 2 && is_known_os(parts[n - 1]) {
        result.goos = Some(parts[n - 1].to_string());
    } else if n >= 2 && is_known_arch(parts[n - 1]) {
        result.goarch = Some(parts[n - 1].to_string());
    }

    result
}

/// Extracts the `+build` lines from the leading comment block of a file.
///
/// The block is the run of `//` comments and blank lines at the very top of the
/// file, and it only counts up to the last blank line inside it: a directive that
/// runs straight into the package clause is ignored. Each returned string is the
/// directive's expression with whitespace collapsed to single spaces.
pub fn read_tags(content: &str) -> Vec<String> {
    let mut comments = Vec::new();
    let mut end = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            end = comments.len();
            continue;
        }
        if let Some(comment) = line.strip_prefix("//") {
            comments.push(comment);
            continue;
        }
        break;
    }

    comments[..end]
        .iter()
        .filter_map(|comment| {
            let mut fields = comment.split_whitespace();
            if fields.next() == Some(BUILD_TAG_MARKER) {
                Some(fields.collect::<Vec<_>>().join(" "))
            } else {
                None
            }
        })
        .collect()
}

/// Evaluates one `+build` expression against a set of satisfied tags.
///
/// Release tags (`go1.8`) are treated as satisfied whether or not they are negated.
/// A factor written with a double negation (`!!foo`) makes the whole line false.
/// An empty line is false.
pub fn check_tags(line: &str, tags: &TagSet) -> bool {
    let mut line_ok = false;
    for group in line.split_whitespace() {
        let mut group_ok = true;
        for factor in group.split(',') {
            if factor.starts_with("!!") {
                return false;
            }
            let (negated, tag) = match factor.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, factor),
            };
            if is_release_tag(tag) {
                continue;
            }
            group_ok = group_ok && (negated != tags.contains(tag));
        }
        line_ok = line_ok || group_ok;
    }
    line_ok
}

/// Reports whether `tag` is a minimum-version tag such as `go1.7`.
pub fn is_release_tag(tag: &str) -> bool {
    static RELEASE_TAG: OnceLock<Regex> = OnceLock::new();
    RELEASE_TAG
        .get_or_init(|| Regex::new(r"^go[0-9]\.[0-9]+$").expect("release tag regex is valid"))
        .is_match(tag)
}

/// All platform constraints attached to a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub goos: Option<String>,
    pub goarch: Option<String>,
    /// Raw `+build` expressions, in file order. All must hold.
    pub tags: Vec<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.goos.is_none() && self.goarch.is_none() && self.tags.is_empty()
    }

    /// True when the OS and architecture suffixes (if any) are in `tags` and every
    /// `+build` line evaluates to true.
    pub fn check(&self, tags: &TagSet) -> bool {
        if let Some(goos) = &self.goos {
            if !tags.contains(goos) {
                return false;
            }
        }
        if let Some(goarch) = &self.goarch {
            if !tags.contains(goarch) {
                return false;
            }
        }
        self.tags.iter().all(|line| check_tags(line, tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::tag_set;
    use yare::parameterized;

    fn tags(list: &str) -> TagSet {
        tag_set(list.split(','))
    }

    fn parts(test: bool, goos: Option<&str>, goarch: Option<&str>) -> FileNameParts {
        FileNameParts {
            has_test_suffix: test,
            goos: goos.map(String::from),
            goarch: goarch.map(String::from),
        }
    }

    #[parameterized(
        simple = { "simple", parts(false, None, None) },
        test_suffix = { "foo_test", parts(true, None, None) },
        bare_test = { "test", parts(false, None, None) },
        underscore_test = { "_test", parts(true, None, None) },
        goos = { "foo_linux", parts(false, Some("linux"), None) },
        goarch = { "foo_amd64", parts(false, None, Some("amd64")) },
        goos_then_goarch = { "foo_linux_amd64", parts(false, Some("linux"), Some("amd64")) },
        goarch_then_goos = { "foo_amd64_linux", parts(false, Some("linux"), None) },
        test_with_goos_goarch = { "foo_linux_amd64_test", parts(true, Some("linux"), Some("amd64")) },
        test_then_goos = { "foo_test_linux", parts(false, Some("linux"), None) },
        bare_goos = { "linux", parts(false, None, None) },
        bare_goarch = { "amd64", parts(false, None, None) },
        bare_goos_test = { "linux_test", parts(true, None, None) },
        bare_goos_goarch = { "linux_amd64", parts(false, None, Some("amd64")) },
    )]
    fn test_split_file_name(stem: &str, expected: FileNameParts) {
        assert_eq!(split_file_name(stem), expected);
    }

    #[parameterized(
        empty_file = { "", &[] },
        single_comment_without_blank_line = { "// +build foo\npackage main", &[] },
        multiple_comments_without_blank_line = { "// +build foo\n\n// +build bar\npackage main\n\n", &["foo"] },
        single_comment = { "// +build foo\n\n", &["foo"] },
        multiple_comments = { "// +build foo\n// +build bar\n\npackage main", &["foo", "bar"] },
        multiple_comments_with_blank = { "// +build foo\n\n// +build bar\n\npackage main", &["foo", "bar"] },
        comment_with_space = { "  //   +build   foo   bar  \n\n", &["foo bar"] },
        slash_star_comment = { "/* +build foo */\n\n", &[] },
        copyright_before_tags = { "// Copyright 2017\n\n// +build darwin freebsd\n\n// Package route does things.\npackage route\n", &["darwin freebsd"] },
        marker_not_first_field = { "// see +build foo\n\npackage main", &[] },
    )]
    fn test_read_tags(source: &str, expected: &[&str]) {
        assert_eq!(read_tags(source), expected);
    }

    #[parameterized(
        empty_tags = { "", "", false },
        ignored = { "ignore", "", false },
        single_satisfied = { "foo", "foo", true },
        single_unsatisfied = { "foo", "bar", false },
        not_satisfied = { "!foo", "", true },
        not_unsatisfied = { "!foo", "foo", false },
        double_negative_fails = { "yes !!yes yes", "yes", false },
        and_satisfied = { "foo,bar", "foo,bar", true },
        and_not_satisfied = { "foo,!bar", "foo", true },
        and_unsatisfied = { "foo,bar", "foo", false },
        and_not_unsatisfied = { "foo,!bar", "foo,bar", false },
        or_satisfied = { "foo bar", "foo", true },
        or_not_satisfied = { "foo !bar", "", true },
        or_unsatisfied = { "foo bar", "", false },
        or_not_unsatisfied = { "foo !bar", "bar", false },
        release_tags = { "go1.7,go1.8,go1.9,go1.91,go2.0", "", true },
        release_tag_negated = { "!go1.8", "", true },
    )]
    fn test_check_tags(line: &str, satisfied: &str, expected: bool) {
        assert_eq!(check_tags(line, &tags(satisfied)), expected);
    }

    #[parameterized(
        release = { "go1.8", true },
        two_digit_minor = { "go1.10", true },
        major_two = { "go2.0", true },
        no_minor = { "go1", false },
        no_dot = { "go18", false },
        suffix = { "go1.8beta", false },
        plain = { "gopher", false },
    )]
    fn test_is_release_tag(tag: &str, expected: bool) {
        assert_eq!(is_release_tag(tag), expected);
    }

    fn constraints(goos: Option<&str>, goarch: Option<&str>, lines: &[&str]) -> Constraints {
        Constraints {
            goos: goos.map(String::from),
            goarch: goarch.map(String::from),
            tags: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[parameterized(
        unconstrained = { constraints(None, None, &[]), "", true },
        goos_satisfied = { constraints(Some("linux"), None, &[]), "linux", true },
        goos_unsatisfied = { constraints(Some("linux"), None, &[]), "darwin", false },
        goarch_satisfied = { constraints(None, Some("amd64"), &[]), "amd64", true },
        goarch_unsatisfied = { constraints(None, Some("amd64"), &[]), "arm", false },
        goos_goarch_satisfied = { constraints(Some("linux"), Some("amd64"), &[]), "linux,amd64", true },
        goos_goarch_unsatisfied = { constraints(Some("linux"), Some("amd64"), &[]), "darwin,amd64", false },
        tags_all_satisfied = { constraints(None, None, &["foo", "bar"]), "foo,bar", true },
        tags_some_unsatisfied = { constraints(None, None, &["foo", "bar"]), "foo", false },
        goos_unsatisfied_tags_satisfied = { constraints(Some("linux"), None, &["foo"]), "darwin,foo", false },
    )]
    fn test_check_constraints(c: Constraints, satisfied: &str, expected: bool) {
        assert_eq!(c.check(&tags(satisfied)), expected);
    }

    #[test]
    fn test_adding_a_tag_can_falsify_a_negated_line() {
        assert!(check_tags("foo,!bar", &tags("foo")));
        assert!(!check_tags("foo,!bar", &tags("foo,bar")));
    }

    #[test]
    fn test_is_empty() {
        assert!(Constraints::default().is_empty());
        assert!(!constraints(Some("linux"), None, &[]).is_empty());
        assert!(!constraints(None, None, &["foo"]).is_empty());
    }
}
