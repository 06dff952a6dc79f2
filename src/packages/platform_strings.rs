use crate::constraints::check_tags;
use crate::platform::{PlatformTable, TagSet};
use crate::preamble::TaggedOpt;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A set of strings that apply to every platform, plus per-platform additions.
///
/// Used for source file names, import paths and compiler/linker flags. Values are
/// appended freely while files are added and put in canonical form by
/// [`PlatformStrings::clean`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStrings {
    pub generic: Vec<String>,
    /// Keyed by platform name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub platform: BTreeMap<String, Vec<String>>,
}

impl PlatformStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_generic_strings<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generic.extend(values.into_iter().map(Into::into));
    }

    pub fn add_platform_strings<I, S>(&mut self, platform: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform
            .entry(platform.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Adds flags from an unconstrained file. Untagged flags are generic; tagged
    /// ones go to every platform whose tags satisfy them.
    pub fn add_generic_opts(&mut self, platforms: &PlatformTable, opts: &[TaggedOpt]) {
        for opt in opts {
            if !opt.is_tagged() {
                self.generic.push(opt.opts.clone());
                continue;
            }
            for (name, tags) in platforms.iter() {
                if check_tags(&opt.tags, tags) {
                    self.add_platform_strings(name, [opt.opts.as_str()]);
                }
            }
        }
    }

    /// Adds flags from a file that applies to `platform`.
    pub fn add_tagged_opts(&mut self, platform: &str, tags: &TagSet, opts: &[TaggedOpt]) {
        for opt in opts {
            if !opt.is_tagged() || check_tags(&opt.tags, tags) {
                self.add_platform_strings(platform, [opt.opts.as_str()]);
            }
        }
    }

    /// Sorts and de-duplicates every list, removes platform values that are
    /// already generic, and drops platforms left with nothing.
    pub fn clean(&mut self) {
        self.generic.sort();
        self.generic.dedup();

        let generic: BTreeSet<&str> = self.generic.iter().map(String::as_str).collect();
        for values in self.platform.values_mut() {
            values.retain(|v| !generic.contains(v.as_str()));
            values.sort();
            values.dedup();
        }
        self.platform.retain(|_, values| !values.is_empty());
    }

    /// Applies `f` to every value, keeping the structure.
    ///
    /// Values for which `f` fails are left out of the result and every failure is
    /// returned; a failure never stops the remaining values from being mapped.
    pub fn map<F, E>(&self, mut f: F) -> (PlatformStrings, Vec<E>)
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        let mut errors = Vec::new();
        let mut apply = |values: &Vec<String>| -> Vec<String> {
            values
                .iter()
                .filter_map(|v| match f(v.as_str()) {
                    Ok(mapped) => Some(mapped),
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                })
                .collect()
        };

        let generic = apply(&self.generic);
        let platform = self
            .platform
            .iter()
            .map(|(name, values)| (name.clone(), apply(values)))
            .collect();

        (PlatformStrings { generic, platform }, errors)
    }

    pub fn is_empty(&self) -> bool {
        self.generic.is_empty() && self.platform.values().all(Vec::is_empty)
    }

    pub fn has_go(&self) -> bool {
        self.first_go_file().is_some()
    }

    /// The first `.go` name, generic values first.
    pub fn first_go_file(&self) -> Option<&str> {
        self.generic
            .iter()
            .chain(self.platform.values().flatten())
            .map(String::as_str)
            .find(|f| f.ends_with(".go"))
    }
}
