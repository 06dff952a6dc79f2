//! rulesmith - platform-aware build rules for Go packages
//!
//! This library reads a directory of Go sources and derives the build rule
//! declarations for it: which files make up the library, the cgo library, the
//! tests and the external tests, which dependencies each one has, and which of
//! those only apply on some platforms.
//!
//! # Core Concepts
//!
//! - **Constraints**: `_linux`/`_amd64` file name suffixes and `// +build` lines,
//!   evaluated per platform
//! - **Preamble**: `#cgo` compiler and linker flags above `import "C"`, optionally
//!   gated by their own tag expression
//! - **PlatformStrings**: values common to every platform plus per-platform
//!   additions, rendered as `generic + select({...})`
//!
//! # Example Usage
//!
//! ```no_run
//! use rulesmith::{build_package, Config, RealFileSystem, RuleGenerator};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::new("github.com/example/project", "/src/project");
//! config.validate()?;
//!
//! let analysis = build_package(&RealFileSystem, &config, Path::new("/src/project/lib"))?;
//! for error in &analysis.errors {
//!     eprintln!("{}", error);
//! }
//!
//! if let Some(package) = analysis.package {
//!     let generated = RuleGenerator::new(&config).generate(&package);
//!     for rule in &generated.rules {
//!         println!("{}", rule.to_json()?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constraints;
pub mod error;
pub mod fileinfo;
pub mod fs;
pub mod packages;
pub mod platform;
pub mod preamble;
pub mod rules;
pub mod source;
pub mod util;

pub use config::{Config, ConfigError};
pub use error::{FileError, FileErrorKind, PackageError};
pub use fileinfo::{FileCategory, FileRecord};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use packages::{build_package, DirectoryAnalysis, Package, PlatformStrings, Target};
pub use platform::{PlatformTable, TagSet};
pub use rules::{new_rule, new_value, Expr, GeneratedRules, Rule, RuleGenerator, Value};
pub use source::{HeaderScanner, SourceParser};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
