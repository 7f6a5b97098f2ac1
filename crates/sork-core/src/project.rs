//! The project handle shared by every command and check.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compilation_database::{CompilationDatabase, CompileCommand};
use crate::config::{Config, Node, Schema, Type};
use crate::error::Result;
use crate::paths::{self, DOT_SORK_PATH};

/// Section holding the include guard check settings.
pub const INCLUDE_GUARD_SECTION: &str = "checks.include_guard";

/// Section holding the license header check settings.
pub const LICENSE_HEADER_SECTION: &str = "checks.license_header";

/// Builds the schema of the `.sork` configuration file.
#[must_use]
pub fn project_schema() -> Schema {
    Schema::new()
        .with("source_exclude", Node::value(""))
        .with("source_paths", Node::strings(&["."]))
        .with("checks", Node::strings(&[]))
        .with(
            INCLUDE_GUARD_SECTION,
            Node::object(
                Schema::new()
                    .with("prefix", Node::value(""))
                    .with("suffix", Node::value("_H"))
                    .with("strip_paths", Node::strings(&["include", "src"])),
            ),
        )
        .with(
            LICENSE_HEADER_SECTION,
            Node::object(
                Schema::new()
                    .with(
                        "license",
                        Node::with_types("", vec![Type::String, Type::list_min(Type::String, 1)]),
                    )
                    .with("project", Node::value(""))
                    .with("prefix", Node::value("/**\n"))
                    .with("line_prefix", Node::value(" * "))
                    .with("suffix", Node::value("\n */\n")),
            ),
        )
}

/// A resolved project: where it lives, where it is built, how it is
/// configured and how each of its files is compiled.
///
/// Built once before any concurrent work starts and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root, in the form it was given (absolute or relative).
    pub project_path: PathBuf,
    /// Build directory holding `compile_commands.json`.
    pub build_path: PathBuf,
    /// Merged and validated `.sork` configuration.
    pub config: Config,
    /// Compile commands keyed by normalized source path.
    pub compilation_database: CompilationDatabase,
    working_dir: PathBuf,
}

impl Project {
    /// Loads the configuration and compilation database of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined, the
    /// configuration is invalid, or the compilation database cannot be
    /// loaded.
    pub fn new(project_path: impl Into<PathBuf>, build_path: impl Into<PathBuf>) -> Result<Self> {
        Self::new_in(paths::working_dir()?, project_path, build_path)
    }

    /// Like [`Project::new`] with relative paths resolved against
    /// `working_dir`.
    ///
    /// # Errors
    ///
    /// See [`Project::new`].
    pub fn new_in(
        working_dir: impl Into<PathBuf>,
        project_path: impl Into<PathBuf>,
        build_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let working_dir = working_dir.into();
        let project_path = project_path.into();
        let build_path = build_path.into();

        let config_path = paths::absolute_in(&working_dir, &project_path.join(DOT_SORK_PATH));
        let config = Config::load(&config_path, &project_schema())?;

        let compilation_database = CompilationDatabase::load_in(
            &working_dir,
            &project_path,
            &paths::absolute_in(&working_dir, &build_path),
        )?;

        debug!(
            "Project at {}, build directory {}",
            project_path.display(),
            build_path.display()
        );

        Ok(Self {
            project_path,
            build_path,
            config,
            compilation_database,
            working_dir,
        })
    }

    /// Finds the project containing `path_in_project` and its build
    /// directory, unless one is given explicitly.
    ///
    /// # Errors
    ///
    /// Returns resolution errors from [`paths`] as well as the errors of
    /// [`Project::new`].
    pub fn locate(path_in_project: &Path, build_path: Option<&Path>) -> Result<Self> {
        let working_dir = paths::working_dir()?;
        let project_path = paths::find_project_path_in(&working_dir, path_in_project)?;
        let build_path = match build_path {
            Some(path) => path.to_path_buf(),
            None => paths::find_build_path_in(&working_dir, &project_path)?,
        };

        info!("Using build directory {}", build_path.display());

        Self::new_in(working_dir, project_path, build_path)
    }

    /// Expresses `path` relative to the project root.
    #[must_use]
    pub fn normalize_path(&self, path: &Path) -> PathBuf {
        paths::normalize_path_in(&self.working_dir, &self.project_path, path)
    }

    /// Normalizes a list of paths, optionally dropping the project root.
    #[must_use]
    pub fn normalize_paths<P: AsRef<Path>>(&self, paths: &[P], filter_project_path: bool) -> Vec<PathBuf> {
        paths::normalize_paths_in(&self.working_dir, &self.project_path, paths, filter_project_path)
    }

    /// Absolute location of a path given relative to the working directory,
    /// as paths on the command line are.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        paths::absolute_in(&self.working_dir, path)
    }

    /// Absolute location of a project-relative path.
    #[must_use]
    pub fn absolute_path(&self, normalized: &Path) -> PathBuf {
        paths::absolute_in(&self.working_dir, &self.project_path.join(normalized))
    }

    /// Absolute location of the project root.
    #[must_use]
    pub fn absolute_project_path(&self) -> PathBuf {
        paths::absolute_in(&self.working_dir, &self.project_path)
    }

    /// Absolute location of the build directory.
    #[must_use]
    pub fn absolute_build_path(&self) -> PathBuf {
        paths::absolute_in(&self.working_dir, &self.build_path)
    }

    /// Compile command of a normalized source path, if any.
    #[must_use]
    pub fn compile_command(&self, normalized: &Path) -> Option<&CompileCommand> {
        self.compilation_database.get_command(normalized)
    }
}
