//! Source file discovery.
//!
//! Files are identified by their normalized project-relative path. A
//! [`SourceFile`] borrows the [`Project`] it belongs to and reads its
//! content at most once, on first access.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::compilation_database::CompileCommand;
use crate::config::ConfigError;
use crate::paths;
use crate::project::Project;

/// Suffix of template files that are turned into sources at build time.
pub const IN_EXTENSION: &str = ".in";

/// C source extensions.
pub const C_EXTENSIONS: &[&str] = &[".c"];

/// C++ source extensions.
pub const CPP_EXTENSIONS: &[&str] = &[".cpp", ".cxx", ".cc", ".C", ".c++"];

/// Header extensions.
pub const HEADER_EXTENSIONS: &[&str] = &[".h", ".hh", ".hp", ".hpp", ".h++", ".hxx"];

/// Errors that can occur while locating or reading source files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Explicitly requested paths that do not exist.
    #[error("no such file or directory: {}", format_paths(.paths))]
    Missing {
        /// Every missing path, in the order given.
        paths: Vec<PathBuf>,
    },

    /// A source file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Project-relative path of the file.
        path: PathBuf,
        /// Underlying IO error, shared with the content cache.
        source: Arc<io::Error>,
    },

    /// A single file was requested but the path matched zero or several.
    #[error("expected exactly one source file for {}, found {count}", .path.display())]
    NotExactlyOne {
        /// The requested path.
        path: PathBuf,
        /// Number of matching source files.
        count: usize,
    },

    /// The configured `source_exclude` is not a valid regex.
    #[error("invalid source_exclude pattern \"{pattern}\": {source}")]
    InvalidExclude {
        /// The configured pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// Discovery settings could not be read from the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Directory traversal failed.
    #[error("failed to traverse {}: {source}", .path.display())]
    Walk {
        /// Directory being traversed.
        path: PathBuf,
        /// Underlying traversal error.
        source: walkdir::Error,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A source file of a project.
#[derive(Debug)]
pub struct SourceFile<'p> {
    /// Normalized project-relative path.
    pub path: PathBuf,
    /// How the file is compiled, if the build system knows.
    pub compile_command: Option<&'p CompileCommand>,
    project: &'p Project,
    content: OnceLock<Result<String, Arc<io::Error>>>,
}

impl<'p> SourceFile<'p> {
    /// Creates a source file for a normalized path, looking up its compile
    /// command in the project.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, project: &'p Project) -> Self {
        let path = path.into();
        let compile_command = project.compile_command(&path);

        Self {
            path,
            compile_command,
            project,
            content: OnceLock::new(),
        }
    }

    /// The project this file belongs to.
    #[must_use]
    pub fn project(&self) -> &'p Project {
        self.project
    }

    /// File content, read on first access and cached afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Read`] naming the file if it cannot be read.
    /// A failed read is cached too.
    pub fn content(&self) -> Result<&str, SourceError> {
        let content = self.content.get_or_init(|| {
            std::fs::read_to_string(self.project.absolute_path(&self.path)).map_err(Arc::new)
        });

        match content {
            Ok(content) => Ok(content),
            Err(source) => Err(SourceError::Read {
                path: self.path.clone(),
                source: Arc::clone(source),
            }),
        }
    }

    fn without_template_suffix(&self) -> PathBuf {
        if has_template_suffix(&self.path) {
            self.path.with_extension("")
        } else {
            self.path.clone()
        }
    }

    /// Returns `true` for headers, including header templates such as
    /// `config.h.in`.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.without_template_suffix()
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Path without extension, and without the template suffix if any.
    #[must_use]
    pub fn stem(&self) -> PathBuf {
        self.without_template_suffix().with_extension("")
    }
}

impl fmt::Display for SourceFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn has_template_suffix(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| format!(".{}", ext.to_string_lossy()) == IN_EXTENSION)
}

fn has_source_extension(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };

    C_EXTENSIONS
        .iter()
        .chain(CPP_EXTENSIONS)
        .chain(HEADER_EXTENSIONS)
        .any(|ext| name.ends_with(ext))
        || HEADER_EXTENSIONS
            .iter()
            .any(|ext| name.ends_with(&format!("{ext}{IN_EXTENSION}")))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Decides which discovered paths take part in a run.
struct Exclusion {
    pattern: Option<Regex>,
    build_path: Option<PathBuf>,
}

impl Exclusion {
    fn new(project: &Project) -> Result<Self, SourceError> {
        let configured = project.config.string("source_exclude")?.to_string();

        let pattern = if configured.is_empty() {
            None
        } else {
            let regex = Regex::new(&format!("^(?:{configured})")).map_err(|source| {
                SourceError::InvalidExclude {
                    pattern: configured.clone(),
                    source,
                }
            })?;
            Some(regex)
        };

        // With the build directory being the project root there is nothing
        // left to exclude by location.
        let build_path = project.normalize_path(&project.build_path);
        let build_path = (!paths::is_project_root(&build_path)).then_some(build_path);

        Ok(Self {
            pattern,
            build_path,
        })
    }

    fn includes(&self, normalized: &Path) -> bool {
        if let Some(pattern) = &self.pattern {
            if pattern.is_match(&normalized.to_string_lossy()) {
                return false;
            }
        }

        !self
            .build_path
            .as_ref()
            .is_some_and(|build| normalized.starts_with(build))
    }
}

/// Paths to search, as normalized project-relative paths.
fn search_paths(project: &Project, paths: Option<&[PathBuf]>) -> Result<Vec<PathBuf>, SourceError> {
    if let Some(paths) = paths.filter(|p| !p.is_empty()) {
        let missing: Vec<PathBuf> = paths
            .iter()
            .filter(|p| !project.resolve_path(p).exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::Missing { paths: missing });
        }

        let normalized = project.normalize_paths(paths, true);
        if !normalized.is_empty() {
            return Ok(normalized);
        }
    }

    let configured = project.config.strings("source_paths")?;

    Ok(configured
        .iter()
        .map(|p| paths::lexical_normalize(Path::new(p)))
        .filter(|p| {
            let exists = project.absolute_path(p).exists();
            if !exists {
                warn!("Configured source path {} does not exist, skipping", p.display());
            }
            exists
        })
        .collect())
}

/// Finds the source files of a project.
///
/// `paths` are files or directories relative to the working directory.
/// Directories are searched recursively for C, C++ and header files.
/// Without paths, or when every path refers to the project root, the
/// configured `source_paths` are searched. Results are de-duplicated and
/// sorted by path.
///
/// # Errors
///
/// Returns [`SourceError::Missing`] listing every explicit path that does
/// not exist, and errors for an invalid exclude pattern or a failed
/// traversal.
pub fn find_source_files<'p>(
    project: &'p Project,
    paths: Option<&[PathBuf]>,
) -> Result<Vec<SourceFile<'p>>, SourceError> {
    let exclusion = Exclusion::new(project)?;
    let mut found = BTreeSet::new();

    for path in search_paths(project, paths)? {
        let absolute = project.absolute_path(&path);

        if !absolute.is_dir() {
            if exclusion.includes(&path) {
                found.insert(path);
            }
            continue;
        }

        let walker = WalkDir::new(&absolute)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(|source| SourceError::Walk {
                path: path.clone(),
                source,
            })?;

            if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
                continue;
            }

            let normalized = project.normalize_path(entry.path());
            if exclusion.includes(&normalized) {
                found.insert(normalized);
            }
        }
    }

    debug!("Found {} source files", found.len());

    Ok(found
        .into_iter()
        .map(|path| SourceFile::new(path, project))
        .collect())
}

/// Like [`find_source_files`], keeping only files with a compile command.
///
/// # Errors
///
/// See [`find_source_files`].
pub fn find_buildable_files<'p>(
    project: &'p Project,
    paths: Option<&[PathBuf]>,
) -> Result<Vec<SourceFile<'p>>, SourceError> {
    Ok(find_source_files(project, paths)?
        .into_iter()
        .filter(|file| file.compile_command.is_some())
        .collect())
}

/// Finds exactly one source file for `path`.
///
/// # Errors
///
/// Returns [`SourceError::NotExactlyOne`] if `path` matches no file or a
/// directory with several files.
pub fn find_file<'p>(project: &'p Project, path: &Path) -> Result<SourceFile<'p>, SourceError> {
    let mut files = find_source_files(project, Some(&[path.to_path_buf()]))?;

    if files.len() != 1 {
        return Err(SourceError::NotExactlyOne {
            path: path.to_path_buf(),
            count: files.len(),
        });
    }

    Ok(files.remove(0))
}
