//! Environment handed to external tools.

use std::collections::HashMap;
use std::process::Command;

use crate::build_system::{self, BuildSystemError, Dependency};
use crate::project::Project;

/// Separator between entries of a search path variable.
pub const PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Include path variables read by C and C++ compilers.
pub const INCLUDE_PATH_VARIABLES: &[&str] = &["C_INCLUDE_PATH", "CPLUS_INCLUDE_PATH"];

/// Appends `paths` to the search path variable `key`.
///
/// An empty value is treated as unset, and an unset variable stays unset
/// when there is nothing to append.
pub fn append_paths(env: &mut HashMap<String, String>, key: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }

    let appended = paths.join(PATH_SEPARATOR);
    let value = match env.get(key).filter(|v| !v.is_empty()) {
        Some(existing) => format!("{existing}{PATH_SEPARATOR}{appended}"),
        None => appended,
    };

    env.insert(key.to_string(), value);
}

/// Process environment extended with the include paths of build system
/// dependencies.
#[derive(Debug, Clone, Default)]
pub struct ToolEnvironment {
    vars: HashMap<String, String>,
}

impl ToolEnvironment {
    /// The current process environment extended with the include paths of
    /// `dependencies`.
    #[must_use]
    pub fn new(dependencies: &[Dependency]) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        Self::with_vars(vars, dependencies)
    }

    /// Like [`ToolEnvironment::new`] starting from `vars`.
    #[must_use]
    pub fn with_vars(mut vars: HashMap<String, String>, dependencies: &[Dependency]) -> Self {
        let include_paths: Vec<String> = dependencies
            .iter()
            .flat_map(|dep| dep.include_paths.iter().cloned())
            .collect();

        for key in INCLUDE_PATH_VARIABLES {
            append_paths(&mut vars, key, &include_paths);
        }

        Self { vars }
    }

    /// Environment for tools run on behalf of `project`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build system dependencies cannot be read.
    pub fn for_project(project: &Project) -> Result<Self, BuildSystemError> {
        let dependencies = build_system::find_dependencies(&project.absolute_build_path())?;
        Ok(Self::new(&dependencies))
    }

    /// Value of a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Replaces the environment of `command` with this one.
    pub fn apply(&self, command: &mut Command) {
        command.env_clear().envs(&self.vars);
    }
}
