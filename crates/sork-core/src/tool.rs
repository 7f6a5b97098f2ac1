//! Running external programs.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

use crate::environment::ToolEnvironment;

/// Combined result of a shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Whether the invocation exited successfully.
    pub success: bool,
    /// Standard output and standard error, interleaved.
    pub output: String,
}

/// Runs a shell-style `invocation` in `work_dir` with `env`, capturing
/// standard output and standard error together.
///
/// # Errors
///
/// Returns an error if the shell cannot be started.
pub fn run_shell(invocation: &str, work_dir: &Path, env: &ToolEnvironment) -> io::Result<ShellOutput> {
    debug!("Running in {}: {invocation}", work_dir.display());

    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(format!("{invocation} 2>&1"))
        .current_dir(work_dir);
    env.apply(&mut command);

    let output = command.output()?;

    Ok(ShellOutput {
        success: output.status.success(),
        output: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

/// Runs `program` in `work_dir`, feeding it `input` on standard input.
///
/// # Errors
///
/// Returns an error if the program cannot be started or its standard
/// input cannot be written.
pub fn run_with_input(program: &str, args: &[&str], input: &str, work_dir: &Path) -> io::Result<Output> {
    debug!("Running {program} in {}", work_dir.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdin = child.stdin.take();

    // Feed input while output is drained, so a large file cannot fill both
    // pipes and stall.
    std::thread::scope(|scope| {
        let writer = scope.spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes())?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;

        match writer.join() {
            Ok(result) => result?,
            Err(_) => return Err(io::Error::other(format!("writing input to {program} failed"))),
        }

        Ok(output)
    })
}
