//! # sork-core
//!
//! Source discovery and check dispatch for C and C++ projects.
//!
//! The pipeline locates the project root and its build directory, loads
//! the `.sork` configuration and `compile_commands.json`, finds the source
//! files to work on and runs a function over them on a bounded worker pool
//! while reporting progress.
//!
//! ## Example
//!
//! ```ignore
//! use sork_core::{concurrent, source, Progress, Project};
//!
//! let project = Project::locate(Path::new("."), None)?;
//! let files = source::find_source_files(&project, None)?;
//! let progress = Progress::stdout(false);
//!
//! concurrent::for_each_with_progress(&progress, "Checking source", &files, None, |file| {
//!     Ok::<_, sork_core::Error>(check_file(file))
//! })?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod build_system;
pub mod check;
pub mod compilation_database;
pub mod concurrent;
pub mod config;
pub mod environment;
mod error;
pub mod paths;
pub mod progress;
pub mod project;
pub mod source;
pub mod text;
pub mod tool;

pub use build_system::Dependency;
pub use check::{check_file, Check, CheckBox, CheckError, CheckFactory, CheckRegistry};
pub use compilation_database::{CompilationDatabase, CompileCommand};
pub use config::{Config, Section};
pub use environment::ToolEnvironment;
pub use error::{Error, Result};
pub use progress::Progress;
pub use project::Project;
pub use source::SourceFile;
