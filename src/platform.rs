//! Target platforms and the build tags each one satisfies
//!
//! A platform is a named OS/architecture pair (for example `linux_amd64`). Files
//! and flags gated by build constraints are evaluated once per platform against
//! the platform's tag set.

use std::collections::{BTreeMap, HashSet};

/// Set of build tags satisfied by one platform.
pub type TagSet = HashSet<String>;

/// Operating systems recognized in file name suffixes and build tags.
pub const KNOWN_OS: &[&str] = &[
    "android", "darwin", "dragonfly", "freebsd", "linux", "nacl", "netbsd", "openbsd", "plan9",
    "solaris", "windows", "zos",
];

/// Architectures recognized in file name suffixes and build tags.
pub const KNOWN_ARCH: &[&str] = &[
    "386",
    "amd64",
    "amd64p32",
    "arm",
    "armbe",
    "arm64",
    "arm64be",
    "ppc64",
    "ppc64le",
    "mips",
    "mipsle",
    "mips64",
    "mips64le",
    "mips64p32",
    "mips64p32le",
    "ppc",
    "s390",
    "s390x",
    "sparc",
    "sparc64",
];

const DEFAULT_PLATFORMS: &[(&str, &str)] = &[
    ("android", "386"),
    ("android", "amd64"),
    ("android", "arm"),
    ("android", "arm64"),
    ("darwin", "386"),
    ("darwin", "amd64"),
    ("darwin", "arm"),
    ("darwin", "arm64"),
    ("dragonfly", "amd64"),
    ("freebsd", "386"),
    ("freebsd", "amd64"),
    ("freebsd", "arm"),
    ("linux", "386"),
    ("linux", "amd64"),
    ("linux", "arm"),
    ("linux", "arm64"),
    ("linux", "mips"),
    ("linux", "mips64"),
    ("linux", "mips64le"),
    ("linux", "mipsle"),
    ("linux", "ppc64"),
    ("linux", "ppc64le"),
    ("linux", "s390x"),
    ("nacl", "386"),
    ("nacl", "amd64p32"),
    ("nacl", "arm"),
    ("netbsd", "386"),
    ("netbsd", "amd64"),
    ("netbsd", "arm"),
    ("openbsd", "386"),
    ("openbsd", "amd64"),
    ("openbsd", "arm"),
    ("plan9", "386"),
    ("plan9", "amd64"),
    ("solaris", "amd64"),
    ("windows", "386"),
    ("windows", "amd64"),
];

pub fn is_known_os(s: &str) -> bool {
    KNOWN_OS.contains(&s)
}

pub fn is_known_arch(s: &str) -> bool {
    KNOWN_ARCH.contains(&s)
}

/// Builds a tag set from individual tags.
pub fn tag_set<I, S>(tags: I) -> TagSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}

/// Read-only mapping from platform name to its satisfied tag set.
///
/// Backed by an ordered map so that every walk over the table visits platforms in
/// the same order regardless of how the table was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformTable {
    platforms: BTreeMap<String, TagSet>,
}

impl PlatformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard OS/architecture pairs, named `<os>_<arch>`.
    pub fn default_platforms() -> Self {
        let mut table = Self::new();
        for (os, arch) in DEFAULT_PLATFORMS {
            let mut tags = vec![os.to_string(), arch.to_string()];
            if *os == "android" {
                tags.push("linux".to_string());
            }
            table.insert(format!("{}_{}", os, arch), tags);
        }
        table
    }

    pub fn insert<I, S>(&mut self, name: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.insert(name.into(), tag_set(tags));
    }

    pub fn with_platform<I, S>(mut self, name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, tags);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TagSet> {
        self.platforms.get(name)
    }

    /// Platforms in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagSet)> {
        self.platforms
            .iter()
            .map(|(name, tags)| (name.as_str(), tags))
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
