//! Command implementations.

pub mod analyze;
pub mod assembler;
pub mod check;
pub mod list_checks;

use anyhow::Result;
use sork_core::{Progress, Project};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Explicit build directory.
    pub build_path: Option<PathBuf>,
    /// Worker thread count; one per logical core when `None`.
    pub jobs: Option<usize>,
    /// Verbose progress and logging.
    pub verbose: bool,
    /// Raised when the user interrupts the run.
    pub interrupted: Arc<AtomicBool>,
}

/// Locates the project containing the first of `paths`, or the working
/// directory when no paths are given.
pub fn locate_project(options: &Options, paths: &[PathBuf]) -> Result<Project> {
    let path_in_project = paths.first().map_or(Path::new("."), PathBuf::as_path);
    Ok(Project::locate(path_in_project, options.build_path.as_deref())?)
}

/// Progress on standard output that stops at the first interrupt.
fn progress_for(options: &Options) -> Progress<io::Stdout> {
    Progress::stdout(options.verbose).with_interrupt(Arc::clone(&options.interrupted))
}

/// Explicit paths for source discovery, `None` meaning the configured
/// source paths.
fn explicit_paths(paths: &[PathBuf]) -> Option<&[PathBuf]> {
    (!paths.is_empty()).then_some(paths)
}
