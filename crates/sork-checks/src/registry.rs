//! The registry of built-in checks.

use sork_core::CheckRegistry;

use crate::{clang_format, clang_tidy, include_guard, license_header};

/// Returns every built-in check.
///
/// Order matters: it is the order checks are listed in and run in.
/// - `clang-format` - formatting according to `.clang-format`
/// - `clang-tidy` - `clang-tidy` diagnostics using the compile command
/// - `include_guard` - include guard named after the header path
/// - `license_header` - license header at the top of every file
#[must_use]
pub fn all_checks() -> CheckRegistry {
    CheckRegistry::new()
        .with(clang_format::NAME, clang_format::create)
        .with(clang_tidy::NAME, clang_tidy::create)
        .with(include_guard::NAME, include_guard::create)
        .with(license_header::NAME, license_header::create)
}
