//! Build rule synthesis
//!
//! - [`expr`]: the expression tree handed to a formatter
//! - [`value`]: conversion of plain values and [`PlatformStrings`] into expressions,
//!   including `select()` conditionals
//! - [`resolve`]: import path to label mapping
//! - [`generate`]: the rule set for a finished package
//!
//! [`PlatformStrings`]: crate::packages::PlatformStrings

pub mod expr;
pub mod generate;
pub mod resolve;
pub mod value;

pub use expr::{DictEntry, Expr, Rule};
pub use generate::{GeneratedRules, RuleGenerator};
pub use resolve::{LabelResolver, ResolveError, DEFAULT_LIBRARY};
pub use value::{new_rule, new_value, Value, DEFAULT_CONDITION};
