//! Include guard check for headers.
//!
//! A header must open with `#ifndef GUARD` / `#define GUARD`, optionally
//! preceded by comments, and close with `#endif // GUARD`. The expected
//! guard is derived from the path of the header, e.g. `src/foo/bar-baz.h`
//! becomes `FOO_BAR_BAZ_H` with the default settings.

use regex::Regex;
use sork_core::check::{Check, CheckBox, CheckError};
use sork_core::project::INCLUDE_GUARD_SECTION;
use sork_core::text::index_to_line_and_column;
use sork_core::{Project, SourceFile};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Name of the check.
pub const NAME: &str = "include_guard";

#[allow(clippy::expect_used)]
static GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)^(?:\s*|/\*.*?\*/|//[^\n]*)*",
        r"#ifndef\s+(\S*)\s*\n\s*",
        r"#define\s(\S*).*\n.*",
        r"#endif\s+//\s+(\S*)\s*$",
    ))
    .expect("valid include guard pattern")
});

#[allow(clippy::expect_used)]
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ /\\-]").expect("valid separator pattern"));

/// Checks that every header has an include guard named after its path.
#[derive(Debug)]
pub struct IncludeGuardCheck {
    prefix: String,
    suffix: String,
    strip_paths: Vec<PathBuf>,
}

/// Creates the check from the `checks.include_guard` settings.
///
/// # Errors
///
/// Returns [`CheckError::Config`] if the settings have the wrong shape.
pub fn create(project: &Project) -> Result<CheckBox, CheckError> {
    let section = project.config.section(INCLUDE_GUARD_SECTION)?;

    Ok(Box::new(IncludeGuardCheck {
        prefix: section.string("prefix")?.to_string(),
        suffix: section.string("suffix")?.to_string(),
        strip_paths: section.strings("strip_paths")?.into_iter().map(PathBuf::from).collect(),
    }))
}

impl IncludeGuardCheck {
    /// Expected guard for a header whose path without extension is `stem`.
    #[must_use]
    pub fn guard_for(&self, stem: &Path) -> String {
        let stripped = self
            .strip_paths
            .iter()
            .find_map(|strip| stem.strip_prefix(strip).ok())
            .unwrap_or(stem);

        let name = SEPARATORS.replace_all(&stripped.to_string_lossy(), "_").to_uppercase();
        format!("{}{name}{}", self.prefix, self.suffix)
    }
}

impl Check for IncludeGuardCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        if !file.is_header() {
            return Ok(None);
        }

        let content = file.content()?;
        let Some(captures) = GUARD.captures(content) else {
            return Ok(Some(format!("{}: error: missing include guard", file.path.display())));
        };

        let guard = self.guard_for(&file.stem());
        let mut out = String::new();

        for found in captures.iter().skip(1).flatten() {
            if found.as_str() == guard {
                continue;
            }

            let (line, column) = position(content, found.start());
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = write!(
                out,
                "{}:{line}:{column}: error: include guard name should be {guard}",
                file.path.display()
            );
        }

        Ok((!out.is_empty()).then_some(out))
    }
}

/// Line and column of `index`, where an index at the very end refers to the
/// position just past the last character.
fn position(text: &str, index: usize) -> (usize, usize) {
    index_to_line_and_column(text, index).unwrap_or_else(|| {
        let line = text.matches('\n').count() + 1;
        let column = text.rsplit('\n').next().map_or(0, str::len) + 1;
        (line, column)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sork_core::paths::COMPILE_COMMANDS_JSON_PATH;
    use std::fs;
    use tempfile::TempDir;

    fn check() -> IncludeGuardCheck {
        IncludeGuardCheck {
            prefix: String::new(),
            suffix: "_H".to_string(),
            strip_paths: vec![PathBuf::from("include"), PathBuf::from("src")],
        }
    }

    fn project_with(files: &[(&str, &str)]) -> (TempDir, Project) {
        let tmp = TempDir::new().expect("tempdir");
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).expect("build dir");
        fs::write(build.join(COMPILE_COMMANDS_JSON_PATH), "[]").expect("database");

        for (path, content) in files {
            let path = tmp.path().join(path);
            fs::create_dir_all(path.parent().expect("parent")).expect("fixture dir");
            fs::write(path, content).expect("fixture file");
        }

        let project = Project::new_in(tmp.path(), ".", "build").expect("project");
        (tmp, project)
    }

    fn run(project: &Project, path: &str) -> Option<String> {
        let check = create(project).expect("check");
        check.run(&SourceFile::new(path, project)).expect("run")
    }

    #[test]
    fn guard_names_follow_the_path() {
        let check = check();

        assert_eq!(check.guard_for(Path::new("src/foo")), "FOO_H");
        assert_eq!(check.guard_for(Path::new("include/foo/bar-baz")), "FOO_BAR_BAZ_H");
        assert_eq!(check.guard_for(Path::new("lib/my file")), "LIB_MY_FILE_H");
        assert_eq!(check.guard_for(Path::new("srcfoo/x")), "SRCFOO_X_H");
    }

    #[test]
    fn prefix_and_suffix_are_applied() {
        let check = IncludeGuardCheck {
            prefix: "PROJ_".to_string(),
            suffix: "_INCLUDED".to_string(),
            strip_paths: Vec::new(),
        };

        assert_eq!(check.guard_for(Path::new("src/a")), "PROJ_SRC_A_INCLUDED");
    }

    #[test]
    fn correct_guard_after_comments_passes() {
        let (_tmp, project) = project_with(&[(
            "src/foo/bar.h",
            "/*\n * License\n */\n// more\n\n#ifndef FOO_BAR_H\n#define FOO_BAR_H\n\nint x;\n\n#endif // FOO_BAR_H\n",
        )]);

        assert_eq!(run(&project, "src/foo/bar.h"), None);
    }

    #[test]
    fn sources_are_ignored() {
        let (_tmp, project) = project_with(&[("src/foo.cpp", "int x;\n")]);
        assert_eq!(run(&project, "src/foo.cpp"), None);
    }

    #[test]
    fn missing_guard_is_reported() {
        let (_tmp, project) = project_with(&[("src/foo.h", "#pragma once\nint x;\n")]);

        assert_eq!(
            run(&project, "src/foo.h"),
            Some("src/foo.h: error: missing include guard".to_string())
        );
    }

    #[test]
    fn each_wrong_name_is_reported_with_position() {
        let (_tmp, project) = project_with(&[(
            "include/foo.h",
            "#ifndef WRONG\n#define FOO_H\n#endif // ALSO_WRONG\n",
        )]);

        assert_eq!(
            run(&project, "include/foo.h"),
            Some(
                "include/foo.h:1:9: error: include guard name should be FOO_H\n\
                 include/foo.h:3:11: error: include guard name should be FOO_H"
                    .to_string()
            )
        );
    }

    #[test]
    fn header_templates_use_the_stem_without_template_suffix() {
        let (_tmp, project) = project_with(&[(
            "src/config.h.in",
            "#ifndef CONFIG_H\n#define CONFIG_H\n#endif // CONFIG_H\n",
        )]);

        assert_eq!(run(&project, "src/config.h.in"), None);
    }

    #[test]
    fn position_past_the_end() {
        assert_eq!(position("ab\ncd", 5), (2, 3));
        assert_eq!(position("ab\n", 3), (2, 1));
    }
}
