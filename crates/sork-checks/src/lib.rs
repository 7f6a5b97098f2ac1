//! # sork-checks
//!
//! Built-in checks for sork.
//!
//! ## Available Checks
//!
//! | Name | Applies to | Reports |
//! |------|------------|---------|
//! | `clang-format` | all sources | hunks that differ from `clang-format` output |
//! | `clang-tidy` | files with a compile command | `clang-tidy` diagnostics |
//! | `include_guard` | headers | missing or misnamed include guards |
//! | `license_header` | all sources | a missing or wrong license header |
//!
//! ## Usage
//!
//! ```ignore
//! use sork_checks::all_checks;
//!
//! let checks = all_checks().create(&project, &["clang", "-clang-tidy"])?;
//! let output = sork_core::check_file(&checks, &file)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clang_format;
pub mod clang_tidy;
pub mod diff;
pub mod include_guard;
pub mod license_header;
mod registry;

pub use clang_format::ClangFormatCheck;
pub use clang_tidy::ClangTidyCheck;
pub use include_guard::IncludeGuardCheck;
pub use license_header::LicenseHeaderCheck;
pub use registry::all_checks;
