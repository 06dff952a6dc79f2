//! Aggregation of per-file records into platform-aware packages
//!
//! A directory's files are routed into the fixed targets of a [`Package`]
//! (library, cgo library, binary, test, external test). Each target keeps its
//! sources, imports and flags as [`PlatformStrings`]: values common to every
//! platform plus per-platform additions. [`Package::clean`] puts everything in
//! canonical order once all files are in, so the result does not depend on the
//! order files were added.

mod builder;
mod package;
mod platform_strings;

pub use builder::{build_package, DirectoryAnalysis, PackageBuilder};
pub use package::{Package, Target};
pub use platform_strings::PlatformStrings;
