//! Dependencies as recorded by the build system that generated the build
//! directory.
//!
//! Only include paths are of interest; they are handed to external tools
//! through the environment so that headers of dependencies resolve.

use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

const CMAKE_CACHE_PATH: &str = "CMakeCache.txt";
const MESON_PRIVATE_PATH: &str = "meson-private";
const INCLUDE_PATH_FLAGS: &[&str] = &["-isystem", "-iquote", "-I"];

/// A dependency of the project being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name as known by the build system.
    pub name: String,
    /// Header search paths, in order.
    pub include_paths: Vec<String>,
}

/// Errors in extracting dependencies from a build directory.
#[derive(Debug, Error)]
pub enum BuildSystemError {
    /// A build system file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The introspection tool could not be run.
    #[error("failed to run meson introspect: {0}")]
    Spawn(#[source] io::Error),

    /// The introspection tool reported a failure.
    #[error("meson introspect failed: {stderr}")]
    Introspect {
        /// What the tool wrote to stderr.
        stderr: String,
    },

    /// The introspection output is not what was expected.
    #[error("failed to decode Meson introspection data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Returns `true` if `build_path` was generated by Meson.
#[must_use]
pub fn is_meson_build_path(build_path: &Path) -> bool {
    build_path.join(MESON_PRIVATE_PATH).exists()
}

/// Returns `true` if `build_path` was generated by CMake.
#[must_use]
pub fn is_cmake_build_path(build_path: &Path) -> bool {
    build_path.join(CMAKE_CACHE_PATH).exists()
}

/// Finds the dependencies recorded in `build_path`.
///
/// Build directories of unknown build systems yield no dependencies.
///
/// # Errors
///
/// Returns an error if the build system files cannot be read or
/// introspection fails.
pub fn find_dependencies(build_path: &Path) -> Result<Vec<Dependency>, BuildSystemError> {
    let dependencies = if is_meson_build_path(build_path) {
        meson_dependencies(build_path)?
    } else if is_cmake_build_path(build_path) {
        cmake_dependencies(build_path)?
    } else {
        warn!("Unable to extract dependencies from build system");
        Vec::new()
    };

    debug!("Found {} build system dependencies", dependencies.len());

    Ok(dependencies)
}

/// Extracts the paths of `-I`, `-isystem` and `-iquote` arguments.
#[must_use]
pub fn include_paths(args: &[String]) -> Vec<String> {
    args.iter()
        .filter_map(|arg| {
            INCLUDE_PATH_FLAGS
                .iter()
                .find_map(|flag| arg.strip_prefix(flag))
                .filter(|path| !path.is_empty())
                .map(String::from)
        })
        .collect()
}

fn cmake_dependencies(build_path: &Path) -> Result<Vec<Dependency>, BuildSystemError> {
    let path = build_path.join(CMAKE_CACHE_PATH);
    let cache = std::fs::read_to_string(&path).map_err(|source| BuildSystemError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(parse_cmake_cache(&cache))
}

/// Collects `NAME_FOUND:INTERNAL=1` entries, in order, together with their
/// `NAME_INCLUDE_DIRS`.
fn parse_cmake_cache(cache: &str) -> Vec<Dependency> {
    let internal: Vec<(&str, &str)> = cache
        .lines()
        .filter_map(|line| line.split_once(":INTERNAL="))
        .collect();
    let lookup: HashMap<&str, &str> = internal.iter().copied().collect();

    internal
        .iter()
        .filter(|(_, value)| *value == "1")
        .filter_map(|(key, _)| key.strip_suffix("_FOUND"))
        .map(|name| Dependency {
            name: name.to_string(),
            include_paths: lookup
                .get(format!("{name}_INCLUDE_DIRS").as_str())
                .map(|dirs| {
                    dirs.split(';')
                        .filter(|d| !d.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct MesonDependency {
    name: String,
    #[serde(default)]
    compile_args: Vec<String>,
}

fn meson_dependencies(build_path: &Path) -> Result<Vec<Dependency>, BuildSystemError> {
    let output = Command::new("meson")
        .arg("introspect")
        .arg("--dependencies")
        .arg(build_path)
        .output()
        .map_err(BuildSystemError::Spawn)?;

    if !output.status.success() {
        return Err(BuildSystemError::Introspect {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_meson_dependencies(&String::from_utf8_lossy(&output.stdout))
}

fn parse_meson_dependencies(json: &str) -> Result<Vec<Dependency>, BuildSystemError> {
    let dependencies: Vec<MesonDependency> = serde_json::from_str(json)?;

    Ok(dependencies
        .into_iter()
        .map(|dep| Dependency {
            include_paths: include_paths(&dep.compile_args),
            name: dep.name,
        })
        .collect())
}
