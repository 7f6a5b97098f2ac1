//! Analyze command implementation.

use anyhow::Result;
use sork_core::{concurrent, source, tool, SourceFile, ToolEnvironment};
use std::path::PathBuf;

use super::{explicit_paths, locate_project, progress_for, Options};
use crate::invocation::analyzer_invocation;

/// Runs the clang static analyzer over every file with a compile command.
pub fn run(options: &Options, paths: &[PathBuf]) -> Result<()> {
    let project = locate_project(options, paths)?;
    let environment = ToolEnvironment::for_project(&project).map_err(sork_core::Error::from)?;
    let files = source::find_buildable_files(&project, explicit_paths(paths))
        .map_err(sork_core::Error::from)?;

    tracing::info!("Analyzing {} files", files.len());

    let progress = progress_for(options);
    concurrent::for_each_with_progress(&progress, "Analyzing source", &files, options.jobs, |file| {
        analyze_file(file, &environment)
    })?;

    Ok(())
}

fn analyze_file(file: &SourceFile<'_>, environment: &ToolEnvironment) -> sork_core::Result<Option<String>> {
    let Some(command) = file.compile_command else {
        return Ok(None);
    };

    let invocation = analyzer_invocation(&command.invocation);
    let output = tool::run_shell(&invocation, &command.work_dir, environment)?;
    let output = output.output.trim();

    Ok((!output.is_empty()).then(|| output.to_string()))
}
