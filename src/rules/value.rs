use super::expr::{DictEntry, Expr, Rule};
use crate::packages::PlatformStrings;
use std::collections::BTreeMap;

/// Key of the branch every conditional expression falls back to.
pub const DEFAULT_CONDITION: &str = "//conditions:default";

/// The values that can be turned into build file expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// A `glob(...)` call. `excludes` is only written when non-empty.
    Glob {
        patterns: Vec<String>,
        excludes: Vec<String>,
    },
    /// Generic values plus a conditional expression for per-platform ones.
    PlatformStrings(PlatformStrings),
    /// Rendered as a conditional expression keyed by the map's keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(values.into_iter().map(|s| Value::String(s.into())).collect())
    }

    pub fn glob<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Glob {
            patterns: patterns.into_iter().map(Into::into).collect(),
            excludes: Vec::new(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::strings(v)
    }
}

impl From<PlatformStrings> for Value {
    fn from(v: PlatformStrings) -> Self {
        Value::PlatformStrings(v)
    }
}

/// Builds a rule call. Positional arguments come first, then `key = value`
/// keyword arguments, both in the order given.
pub fn new_rule(kind: &str, args: Vec<Value>, kwargs: Vec<(&str, Value)>) -> Rule {
    let mut list: Vec<Expr> = args.iter().map(new_value).collect();
    list.extend(
        kwargs
            .into_iter()
            .map(|(key, value)| Expr::keyword(key, new_value(&value))),
    );
    Rule::new(kind, list)
}

/// Converts a value into its expression.
pub fn new_value(value: &Value) -> Expr {
    match value {
        Value::Int(i) => Expr::literal(i.to_string()),
        Value::Float(f) => Expr::literal(format!("{:.6}", f)),
        Value::String(s) => Expr::string(s.as_str()),
        Value::List(items) => Expr::list(items.iter().map(new_value).collect()),
        Value::Map(entries) => select(entries.iter().map(|(k, v)| (k.as_str(), new_value(v)))),
        Value::Glob { patterns, excludes } => {
            let mut args = vec![string_list(patterns)];
            if !excludes.is_empty() {
                args.push(Expr::keyword("exclude", string_list(excludes)));
            }
            Expr::call("glob", args)
        }
        Value::PlatformStrings(ps) => {
            let generic = string_list(&ps.generic);
            if ps.platform.is_empty() {
                return generic;
            }
            let conditional = select(
                ps.platform
                    .iter()
                    .map(|(name, values)| (name.as_str(), string_list(values))),
            );
            if ps.generic.is_empty() {
                return conditional;
            }
            Expr::binary(generic.multiline(), "+", conditional)
        }
    }
}

fn string_list(values: &[String]) -> Expr {
    Expr::list(values.iter().map(|v| Expr::string(v.as_str())).collect())
}

/// `select({...})` with branches sorted by key, list branches one element per
/// line, and an empty default branch last.
fn select<'a, I>(branches: I) -> Expr
where
    I: IntoIterator<Item = (&'a str, Expr)>,
{
    let mut branches: Vec<(&str, Expr)> = branches.into_iter().collect();
    branches.sort_by(|a, b| a.0.cmp(b.0));

    let mut entries: Vec<DictEntry> = branches
        .into_iter()
        .map(|(key, value)| DictEntry {
            key: Expr::string(key),
            value: value.multiline(),
        })
        .collect();
    entries.push(DictEntry {
        key: Expr::string(DEFAULT_CONDITION),
        value: Expr::list(Vec::new()),
    });

    Expr::call(
        "select",
        vec![Expr::Dict {
            entries,
            force_multiline: true,
        }],
    )
}
