use super::expr::Rule;
use super::resolve::{LabelResolver, ResolveError, DEFAULT_LIBRARY};
use super::value::{new_rule, Value};
use crate::config::Config;
use crate::packages::{Package, PlatformStrings, Target};
use tracing::{debug, warn};

const CGO_LIBRARY: &str = "cgo_default_library";
const PROTO_FILEGROUP: &str = "go_default_library_protos";
const TEST_RULE: &str = "go_default_test";
const XTEST_RULE: &str = "go_default_xtest";
const PUBLIC_VISIBILITY: &str = "//visibility:public";
const PRIVATE_VISIBILITY: &str = "//visibility:private";
const TESTDATA_GLOB: &str = "testdata/**";

/// Rules for one package plus the imports that could not be resolved.
#[derive(Debug, Default)]
pub struct GeneratedRules {
    pub rules: Vec<Rule>,
    pub errors: Vec<ResolveError>,
}

/// Turns a finished [`Package`] into rule declarations.
#[derive(Debug, Clone)]
pub struct RuleGenerator {
    resolver: LabelResolver,
    platform_label_prefix: String,
}

impl RuleGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: LabelResolver::new(config.go_prefix.clone()),
            platform_label_prefix: config.platform_label_prefix.clone(),
        }
    }

    pub fn generate(&self, pkg: &Package) -> GeneratedRules {
        let mut out = GeneratedRules::default();

        if !pkg.protos.is_empty() {
            out.rules.push(new_rule(
                "filegroup",
                vec![],
                vec![
                    ("name", PROTO_FILEGROUP.into()),
                    ("srcs", Value::strings(&pkg.protos)),
                ],
            ));
        }

        let has_cgo = !pkg.cgo_library.sources.is_empty();
        if has_cgo {
            let mut attrs = vec![("name", CGO_LIBRARY.into())];
            attrs.extend(self.target_attrs(pkg, &pkg.cgo_library, &mut out.errors));
            attrs.push(("visibility", Value::strings([PRIVATE_VISIBILITY])));
            out.rules.push(new_rule("cgo_library", vec![], attrs));
        }

        let has_library = pkg.library.has_go() || pkg.cgo_library.has_go();
        if has_library {
            let mut attrs = vec![("name", DEFAULT_LIBRARY.into())];
            if !pkg.library.sources.is_empty() {
                attrs.push(("srcs", self.platform_value(&pkg.library.sources)));
            }
            if has_cgo {
                attrs.push(("library", format!(":{}", CGO_LIBRARY).into()));
            }
            if let Some(deps) = self.deps(pkg, &pkg.library, &mut out.errors) {
                attrs.push(("deps", deps));
            }
            attrs.push(("visibility", Value::strings([PUBLIC_VISIBILITY])));
            out.rules.push(new_rule("go_library", vec![], attrs));
        }

        if pkg.is_command() && (has_library || pkg.binary.has_go()) {
            let mut attrs = vec![("name", binary_name(pkg).into())];
            if pkg.binary.has_go() {
                attrs.push(("srcs", self.platform_value(&pkg.binary.sources)));
                if let Some(deps) = self.deps(pkg, &pkg.binary, &mut out.errors) {
                    attrs.push(("deps", deps));
                }
            }
            if has_library {
                attrs.push(("library", format!(":{}", DEFAULT_LIBRARY).into()));
            }
            attrs.push(("visibility", Value::strings([PUBLIC_VISIBILITY])));
            out.rules.push(new_rule("go_binary", vec![], attrs));
        }

        if pkg.test.has_go() {
            let mut attrs = vec![
                ("name", TEST_RULE.into()),
                ("srcs", self.platform_value(&pkg.test.sources)),
            ];
            if has_library {
                attrs.push(("library", format!(":{}", DEFAULT_LIBRARY).into()));
            }
            self.push_test_attrs(pkg, &pkg.test, &mut attrs, &mut out.errors);
            out.rules.push(new_rule("go_test", vec![], attrs));
        }

        if pkg.xtest.has_go() {
            let mut attrs = vec![
                ("name", XTEST_RULE.into()),
                ("srcs", self.platform_value(&pkg.xtest.sources)),
            ];
            self.push_test_attrs(pkg, &pkg.xtest, &mut attrs, &mut out.errors);
            out.rules.push(new_rule("go_test", vec![], attrs));
        }

        for error in &out.errors {
            warn!(package = %pkg.rel, error = %error, "Unresolvable import");
        }
        debug!(package = %pkg.rel, rules = out.rules.len(), "Rules generated");
        out
    }

    fn target_attrs(
        &self,
        pkg: &Package,
        target: &Target,
        errors: &mut Vec<ResolveError>,
    ) -> Vec<(&'static str, Value)> {
        let mut attrs = vec![("srcs", self.platform_value(&target.sources))];
        if !target.copts.is_empty() {
            attrs.push(("copts", self.platform_value(&target.copts)));
        }
        if !target.clinkopts.is_empty() {
            attrs.push(("clinkopts", self.platform_value(&target.clinkopts)));
        }
        if let Some(deps) = self.deps(pkg, target, errors) {
            attrs.push(("deps", deps));
        }
        attrs
    }

    fn push_test_attrs(
        &self,
        pkg: &Package,
        target: &Target,
        attrs: &mut Vec<(&'static str, Value)>,
        errors: &mut Vec<ResolveError>,
    ) {
        if let Some(deps) = self.deps(pkg, target, errors) {
            attrs.push(("deps", deps));
        }
        if pkg.has_testdata {
            attrs.push(("data", Value::glob([TESTDATA_GLOB])));
        }
    }

    /// Resolved labels for the target's imports, or `None` when there are none.
    fn deps(
        &self,
        pkg: &Package,
        target: &Target,
        errors: &mut Vec<ResolveError>,
    ) -> Option<Value> {
        let (mut labels, failed) = target
            .imports
            .map(|import| self.resolver.resolve(import, &pkg.rel));
        errors.extend(failed);
        labels.clean();
        if labels.is_empty() {
            None
        } else {
            Some(self.platform_value(&labels))
        }
    }

    /// Wraps `ps` with its platform names turned into condition labels.
    fn platform_value(&self, ps: &PlatformStrings) -> Value {
        Value::PlatformStrings(PlatformStrings {
            generic: ps.generic.clone(),
            platform: ps
                .platform
                .iter()
                .map(|(name, values)| {
                    (
                        format!("{}{}", self.platform_label_prefix, name),
                        values.clone(),
                    )
                })
                .collect(),
        })
    }
}

/// The binary is named after the package directory.
fn binary_name(pkg: &Package) -> String {
    match pkg.rel.rsplit('/').next() {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => pkg
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pkg.name.clone()),
    }
}
