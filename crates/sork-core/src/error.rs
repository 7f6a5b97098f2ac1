//! Crate-level error type.

use miette::Diagnostic;
use thiserror::Error;

use crate::build_system::BuildSystemError;
use crate::check::{CheckError, RegistryError};
use crate::compilation_database::CompilationDatabaseError;
use crate::concurrent::DispatchError;
use crate::config::ConfigError;
use crate::paths::PathError;
use crate::source::SourceError;

/// Any error raised by the pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Project root or build directory could not be determined.
    #[error(transparent)]
    #[diagnostic(
        code(sork::paths),
        help("run from inside the project, or pass the build directory with --build-path")
    )]
    Path(#[from] PathError),

    /// The `.sork` configuration is invalid.
    #[error(transparent)]
    #[diagnostic(code(sork::config))]
    Config(#[from] ConfigError),

    /// The compilation database could not be loaded.
    #[error(transparent)]
    #[diagnostic(
        code(sork::compilation_database),
        help("regenerate compile_commands.json with the build system")
    )]
    CompilationDatabase(#[from] CompilationDatabaseError),

    /// Source files could not be located or read.
    #[error(transparent)]
    #[diagnostic(code(sork::source))]
    Source(#[from] SourceError),

    /// A check failed to run.
    #[error(transparent)]
    #[diagnostic(code(sork::check))]
    Check(#[from] CheckError),

    /// Check selection failed.
    #[error(transparent)]
    #[diagnostic(code(sork::checks), help("list the available checks with `sork list-checks`"))]
    Registry(#[from] RegistryError),

    /// Build system dependencies could not be extracted.
    #[error(transparent)]
    #[diagnostic(code(sork::build_system))]
    BuildSystem(#[from] BuildSystemError),

    /// Work could not be dispatched.
    #[error(transparent)]
    #[diagnostic(code(sork::dispatch))]
    Dispatch(#[from] DispatchError),

    /// A command failed for a reason of its own.
    #[error("{0}")]
    #[diagnostic(code(sork::command))]
    Command(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
