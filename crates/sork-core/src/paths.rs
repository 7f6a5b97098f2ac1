//! Project root and build directory resolution.
//!
//! All paths handed to the rest of the pipeline are expressed relative to
//! the project root and lexically normalized, so that the same file is
//! always identified by the same key no matter how the user spelled it
//! on the command line or how the build system recorded it.
//!
//! Functions that depend on the process working directory have an `_in`
//! variant taking the base directory explicitly.

use std::path::{Component, Path, PathBuf};

use glob::MatchOptions;
use thiserror::Error;
use tracing::debug;

/// Name of the per-project configuration file, also a project root marker.
pub const DOT_SORK_PATH: &str = ".sork";

/// Entries whose presence marks a directory as the project root.
pub const PROJECT_ROOT_MARKERS: &[&str] = &[".git", DOT_SORK_PATH];

/// File name of the compilation database inside the build directory.
pub const COMPILE_COMMANDS_JSON_PATH: &str = "compile_commands.json";

/// How the project root itself looks after normalization.
pub const NORMALIZED_PROJECT_PATH: &str = ".";

/// Errors that can occur while resolving project and build paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// No ancestor of the given path contains a project root marker.
    #[error("unable to determine project root path for {}, currently looking for: {}", .path.display(), PROJECT_ROOT_MARKERS.join(", "))]
    NoProjectRoot {
        /// Path the upward search started from.
        path: PathBuf,
    },

    /// No compilation database was found in any standard location.
    #[error("unable to determine build path, specify a path manually or use one of the standard locations:\n{}", .patterns.join("\n"))]
    NoBuildPath {
        /// The glob patterns that were searched.
        patterns: Vec<String>,
    },

    /// More than one compilation database was found.
    #[error("multiple build paths found, specify a path manually:\n{}", format_paths(.candidates))]
    AmbiguousBuildPath {
        /// All directories holding a compilation database.
        candidates: Vec<PathBuf>,
    },

    /// A build path glob pattern could not be compiled.
    #[error("invalid build path pattern {pattern}: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        source: glob::PatternError,
    },

    /// The process working directory could not be determined.
    #[error("failed to determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the process working directory.
///
/// # Errors
///
/// Returns [`PathError::WorkingDirectory`] if it cannot be determined.
pub fn working_dir() -> Result<PathBuf, PathError> {
    std::env::current_dir().map_err(PathError::WorkingDirectory)
}

/// Collapses `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept. An empty result
/// becomes `.`.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(NORMALIZED_PROJECT_PATH);
    }

    parts.iter().collect()
}

/// Joins `path` onto `base` unless it is already absolute, then normalizes.
#[must_use]
pub fn absolute_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        lexical_normalize(path)
    } else {
        lexical_normalize(&base.join(path))
    }
}

/// Computes the relative path leading from `base` to `path`.
///
/// Both paths must be absolute and normalized. Returns `.` when they are
/// equal.
#[must_use]
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = path.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(NORMALIZED_PROJECT_PATH)
    } else {
        result
    }
}

/// Expresses an absolute `path` in the same form as `like`: absolute if
/// `like` is absolute, otherwise relative to `base`.
fn in_form_of(base: &Path, like: &Path, path: &Path) -> PathBuf {
    if like.is_absolute() {
        path.to_path_buf()
    } else {
        relative_path(base, path)
    }
}

/// Normalizes `path` to be relative to `project_path`, resolving relative
/// inputs against `base`.
#[must_use]
pub fn normalize_path_in(base: &Path, project_path: &Path, path: &Path) -> PathBuf {
    let base = absolute_in(Path::new("/"), base);
    relative_path(&absolute_in(&base, project_path), &absolute_in(&base, path))
}

/// Normalizes `path` to be relative to `project_path`.
///
/// # Errors
///
/// Returns an error if the working directory cannot be determined.
pub fn normalize_path(project_path: &Path, path: &Path) -> Result<PathBuf, PathError> {
    Ok(normalize_path_in(&working_dir()?, project_path, path))
}

/// Normalizes every path in `paths`, optionally dropping those that refer
/// to the project root itself.
#[must_use]
pub fn normalize_paths_in<P: AsRef<Path>>(
    base: &Path,
    project_path: &Path,
    paths: &[P],
    filter_project_path: bool,
) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| normalize_path_in(base, project_path, p.as_ref()))
        .filter(|p| !filter_project_path || !is_project_root(p))
        .collect()
}

/// Returns `true` if a normalized path refers to the project root.
#[must_use]
pub fn is_project_root(normalized: &Path) -> bool {
    normalized == Path::new(NORMALIZED_PROJECT_PATH)
}

fn is_project_path(path: &Path) -> bool {
    PROJECT_ROOT_MARKERS
        .iter()
        .any(|marker| path.join(marker).exists())
}

/// Finds the project root by walking upward from `path_in_project`.
///
/// The walk is lexical, so `path_in_project` need not exist; reporting
/// missing source paths is left to source discovery.
///
/// # Errors
///
/// Returns [`PathError::NoProjectRoot`] if the filesystem root is reached
/// without finding a marker.
pub fn find_project_path(path_in_project: &Path) -> Result<PathBuf, PathError> {
    find_project_path_in(&working_dir()?, path_in_project)
}

/// Testable core of [`find_project_path`].
///
/// The result keeps the form of the input: absolute stays absolute,
/// relative is expressed relative to `base`.
pub fn find_project_path_in(base: &Path, path_in_project: &Path) -> Result<PathBuf, PathError> {
    let base = absolute_in(Path::new("/"), base);
    let absolute = absolute_in(&base, path_in_project);

    let mut candidate = if absolute.is_file() {
        absolute
            .parent()
            .map_or_else(|| absolute.clone(), Path::to_path_buf)
    } else {
        absolute
    };

    loop {
        if is_project_path(&candidate) {
            debug!("Found project root: {}", candidate.display());
            return Ok(in_form_of(&base, path_in_project, &candidate));
        }

        match candidate.parent() {
            Some(parent) => candidate = parent.to_path_buf(),
            None => {
                return Err(PathError::NoProjectRoot {
                    path: path_in_project.to_path_buf(),
                })
            }
        }
    }
}

fn build_path_patterns(project_path: &str, basename: &str) -> Vec<String> {
    vec![
        format!("{project_path}/*"),
        format!("{project_path}/../{basename}*"),
        format!("{project_path}/../build*/{basename}*"),
        format!("{project_path}/../build-{basename}*"),
    ]
}

/// Finds the unique build directory for `project_path`.
///
/// Looks for a compilation database in the standard locations: a direct
/// child of the project, a sibling named after the project, a project
/// named directory inside a sibling `build*` directory, or a sibling
/// `build-<project>` directory.
///
/// # Errors
///
/// Returns [`PathError::NoBuildPath`] listing the patterns searched when
/// nothing is found and [`PathError::AmbiguousBuildPath`] listing all
/// candidates when more than one is found.
pub fn find_build_path(project_path: &Path) -> Result<PathBuf, PathError> {
    find_build_path_in(&working_dir()?, project_path)
}

/// Testable core of [`find_build_path`].
pub fn find_build_path_in(base: &Path, project_path: &Path) -> Result<PathBuf, PathError> {
    let base = absolute_in(Path::new("/"), base);
    let absolute = absolute_in(&base, project_path);
    let basename = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let escaped_project = glob::Pattern::escape(&absolute.to_string_lossy());
    let escaped_basename = glob::Pattern::escape(&basename);

    // Wildcards never match hidden entries such as `.cache`.
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut found = Vec::new();
    for pattern in build_path_patterns(&escaped_project, &escaped_basename) {
        let pattern = format!("{pattern}/{COMPILE_COMMANDS_JSON_PATH}");
        let entries = glob::glob_with(&pattern, options).map_err(|source| PathError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    let dir = lexical_normalize(&path);
                    if let Some(parent) = dir.parent() {
                        found.push(parent.to_path_buf());
                    }
                }
                Err(e) => debug!("Skipping unreadable build path candidate: {e}"),
            }
        }
    }

    found.sort();
    found.dedup();

    let mut found: Vec<PathBuf> = found
        .iter()
        .map(|p| in_form_of(&base, project_path, p))
        .collect();

    match found.len() {
        0 => Err(PathError::NoBuildPath {
            patterns: build_path_patterns(&project_path.to_string_lossy(), &basename),
        }),
        1 => Ok(found.remove(0)),
        _ => {
            found.sort();
            Err(PathError::AmbiguousBuildPath { candidates: found })
        }
    }
}
