//! Loading of `compile_commands.json`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::paths::{self, COMPILE_COMMANDS_JSON_PATH};

/// How a single source file is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// Full shell-style compiler invocation.
    pub invocation: String,
    /// Directory the invocation must run in.
    pub work_dir: PathBuf,
    /// The file argument exactly as recorded in the database.
    pub file: String,
}

/// One entry as it appears in the JSON document.
#[derive(Debug, Deserialize)]
struct Entry {
    directory: String,
    command: String,
    file: String,
}

/// Errors that can occur while loading a compilation database.
#[derive(Debug, Error)]
pub enum CompilationDatabaseError {
    /// The database file could not be read.
    #[error("failed to read compilation database {}: {source}", .path.display())]
    Io {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The document is not a list of well-formed entries.
    #[error("invalid compilation database {}: {source}", .path.display())]
    Parse {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying JSON error, naming the violation.
        source: serde_json::Error,
    },
}

/// Compile commands keyed by project-relative normalized source path.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    commands: HashMap<PathBuf, CompileCommand>,
}

impl CompilationDatabase {
    /// Loads the database from `build_path`, keying entries relative to
    /// `project_path`. Relative paths are resolved against `base`.
    ///
    /// # Errors
    ///
    /// Fails as a whole if the file cannot be read, is not a JSON list, or
    /// any entry lacks a string `directory`, `command` or `file`.
    pub fn load_in(
        base: &Path,
        project_path: &Path,
        build_path: &Path,
    ) -> Result<Self, CompilationDatabaseError> {
        let path = build_path.join(COMPILE_COMMANDS_JSON_PATH);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            CompilationDatabaseError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let database = Self::parse_in(base, project_path, &content)
            .map_err(|source| CompilationDatabaseError::Parse { path, source })?;

        debug!("Loaded {} compile commands", database.len());

        Ok(database)
    }

    /// Parses database content. Later entries for the same normalized path
    /// replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed documents or entries.
    pub fn parse_in(
        base: &Path,
        project_path: &Path,
        content: &str,
    ) -> Result<Self, serde_json::Error> {
        let entries: Vec<Entry> = serde_json::from_str(content)?;

        let commands = entries
            .into_iter()
            .map(|entry| {
                let file_path = Path::new(&entry.file);
                let source_path = if file_path.is_absolute() {
                    file_path.to_path_buf()
                } else {
                    Path::new(&entry.directory).join(file_path)
                };

                let key = paths::normalize_path_in(base, project_path, &source_path);
                let command = CompileCommand {
                    invocation: entry.command,
                    work_dir: PathBuf::from(entry.directory),
                    file: entry.file,
                };

                (key, command)
            })
            .collect();

        Ok(Self { commands })
    }

    /// Returns the compile command for a normalized source path.
    #[must_use]
    pub fn get_command(&self, path: &Path) -> Option<&CompileCommand> {
        self.commands.get(path)
    }

    /// Number of distinct source paths with a command.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if the database holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_database(dir: &Path, content: &str) -> PathBuf {
        let build = dir.join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join(COMPILE_COMMANDS_JSON_PATH), content).unwrap();
        build
    }

    #[test]
    fn empty_list_loads() {
        let tmp = TempDir::new().unwrap();
        let build = write_database(tmp.path(), "[]");

        let db = CompilationDatabase::load_in(tmp.path(), tmp.path(), &build).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn entries_are_keyed_by_normalized_path() {
        let tmp = TempDir::new().unwrap();
        let build_dir = tmp.path().join("build");
        let content = serde_json::json!([
            {
                "directory": build_dir,
                "command": "c++ -o foo.o -c ../foo.cpp",
                "file": "../foo.cpp"
            },
            {
                "directory": build_dir,
                "command": "cc -o bar.o -c /abs/bar.c",
                "file": tmp.path().join("src/bar.c")
            }
        ])
        .to_string();
        let build = write_database(tmp.path(), &content);

        let db = CompilationDatabase::load_in(Path::new("/"), tmp.path(), &build).unwrap();

        let foo = db.get_command(Path::new("foo.cpp")).unwrap();
        assert_eq!(foo.invocation, "c++ -o foo.o -c ../foo.cpp");
        assert_eq!(foo.work_dir, build_dir);
        assert_eq!(foo.file, "../foo.cpp");

        assert!(db.get_command(Path::new("src/bar.c")).is_some());
        assert!(db.get_command(Path::new("has_no_command.cpp")).is_none());
    }

    #[test]
    fn later_entries_win() {
        let content = r#"[
            {"directory": "/p/build", "command": "first", "file": "../a.cpp"},
            {"directory": "/p", "command": "second", "file": "a.cpp"}
        ]"#;

        let db = CompilationDatabase::parse_in(Path::new("/"), Path::new("/p"), content).unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.get_command(Path::new("a.cpp")).unwrap().invocation, "second");
    }

    #[test]
    fn malformed_documents_name_the_file() {
        let cases = [
            "not json",
            r#"{"directory": "/", "command": "c", "file": "a.c"}"#,
            r#"[{"command": "c", "file": "a.c"}]"#,
            r#"[{"directory": "/", "file": "a.c"}]"#,
            r#"[{"directory": "/", "command": "c"}]"#,
            r#"[{"directory": "/", "command": 1, "file": "a.c"}]"#,
            r#"[{"directory": "/", "command": "c", "file": "a.c"}, 5]"#,
        ];

        for content in cases {
            let tmp = TempDir::new().unwrap();
            let build = write_database(tmp.path(), content);

            let err = CompilationDatabase::load_in(tmp.path(), tmp.path(), &build).unwrap_err();

            assert!(
                matches!(err, CompilationDatabaseError::Parse { .. }),
                "expected parse error for {content}"
            );
            assert!(err.to_string().contains(COMPILE_COMMANDS_JSON_PATH));
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = CompilationDatabase::load_in(tmp.path(), tmp.path(), tmp.path()).unwrap_err();
        assert!(matches!(err, CompilationDatabaseError::Io { .. }));
    }
}
