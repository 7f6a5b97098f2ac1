//! Static analysis check backed by `clang-tidy`.

use regex::Regex;
use sork_core::check::{Check, CheckBox, CheckError};
use sork_core::{tool, CompileCommand, Project, SourceFile, ToolEnvironment};
use std::sync::LazyLock;
use tracing::debug;

/// Name of the check.
pub const NAME: &str = "clang-tidy";

#[allow(clippy::expect_used)]
static WARNING_FLAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" '?-W[a-z0-9\-=]+'?").expect("valid warning flag pattern"));

#[allow(clippy::expect_used)]
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^(?:",
        r"\d+ warnings? (?:and \d+ errors? )?generated\.",
        r"|Suppressed \d+ warnings? \(\d+ in non-user code(?:, \d+ NOLINT)?\)\.",
        r"|Use -header-filter=\.\* to display errors from all non-system headers\.",
        r"(?: Use -system-headers to display errors from system headers as well\.)?",
        r")$",
    ))
    .expect("valid noise pattern")
});

/// Runs `clang-tidy` with the compile command of each file.
#[derive(Debug)]
pub struct ClangTidyCheck {
    environment: ToolEnvironment,
}

/// Creates the check for `project`.
///
/// # Errors
///
/// Returns [`CheckError::BuildSystem`] if the build system cannot be
/// asked for dependencies.
pub fn create(project: &Project) -> Result<CheckBox, CheckError> {
    Ok(Box::new(ClangTidyCheck {
        environment: ToolEnvironment::for_project(project)?,
    }))
}

impl Check for ClangTidyCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        let Some(command) = file.compile_command else {
            debug!("{file} has no compile command, skipping {NAME}");
            return Ok(None);
        };

        let invocation = tidy_invocation(command);
        let output = tool::run_shell(&invocation, &command.work_dir, &self.environment).map_err(
            |source| CheckError::Tool {
                tool: NAME.to_string(),
                source,
            },
        )?;

        let output = strip_noise(&output.output);
        Ok((!output.is_empty()).then_some(output))
    }
}

/// Turns a compile command into a `clang-tidy` invocation: the compiler
/// becomes `clang-tidy <file> --` and warning flags are dropped.
#[must_use]
pub fn tidy_invocation(command: &CompileCommand) -> String {
    let invocation = command.invocation.trim_start();
    let arguments = invocation
        .split_once(char::is_whitespace)
        .map_or("", |(_, rest)| rest);

    let invocation = format!("{NAME} {} -- {arguments}", command.file);
    WARNING_FLAGS.replace_all(&invocation, "").trim_end().to_string()
}

/// Removes the summary lines `clang-tidy` prints on every run.
#[must_use]
pub fn strip_noise(output: &str) -> String {
    NOISE.replace_all(output, "").trim().to_string()
}
