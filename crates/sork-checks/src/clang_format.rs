//! Formatting check backed by `clang-format`.

use sork_core::check::{Check, CheckBox, CheckError};
use sork_core::text::strip_single_suffix;
use sork_core::{tool, Project, SourceFile};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::diff::{self, Tag};

/// Name of the check.
pub const NAME: &str = "clang-format";

const CONTEXT_LINES: usize = 1;

/// Reports every hunk where the file differs from what `clang-format`
/// makes of it.
#[derive(Debug)]
pub struct ClangFormatCheck {
    project_path: PathBuf,
}

/// Creates the check for `project`.
///
/// # Errors
///
/// Never fails; the signature matches the other check factories.
pub fn create(project: &Project) -> Result<CheckBox, CheckError> {
    Ok(Box::new(ClangFormatCheck {
        project_path: project.absolute_project_path(),
    }))
}

impl Check for ClangFormatCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        let content = file.content()?;
        let assume_filename = format!("-assume-filename={}", file.path.display());

        let output = tool::run_with_input(NAME, &[&assume_filename], content, &self.project_path)
            .map_err(|source| CheckError::Tool {
                tool: NAME.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stderr).into_owned()));
        }

        let formatted = String::from_utf8_lossy(&output.stdout);
        let diff = format_diff(&file.path, content, &formatted);

        Ok((!diff.is_empty()).then_some(diff))
    }
}

/// Renders the differences between `content` and `formatted` as hunks
/// introduced by `path:line: error: wrong format:`.
#[must_use]
pub fn format_diff(path: &Path, content: &str, formatted: &str) -> String {
    let content_lines: Vec<&str> = content.split_inclusive('\n').collect();
    let formatted_lines: Vec<&str> = formatted.split_inclusive('\n').collect();
    let mut out = String::new();

    for group in diff::grouped_opcodes(&content_lines, &formatted_lines, CONTEXT_LINES) {
        let first_line = group.first().map_or(0, |code| code.a_start) + 1;
        let _ = writeln!(out, "{}:{first_line}: error: wrong format:", path.display());

        for code in group {
            let removed = &content_lines[code.a_start..code.a_end];
            let added = &formatted_lines[code.b_start..code.b_end];

            match code.tag {
                Tag::Equal => push_lines(&mut out, ' ', removed),
                Tag::Delete => push_lines(&mut out, '-', removed),
                Tag::Insert => push_lines(&mut out, '+', added),
                Tag::Replace => {
                    push_lines(&mut out, '-', removed);
                    push_lines(&mut out, '+', added);
                }
            }
        }
    }

    strip_single_suffix(&out, '\n').to_string()
}

fn push_lines(out: &mut String, marker: char, lines: &[&str]) {
    for line in lines {
        out.push(marker);
        out.push_str(line);
    }
}
