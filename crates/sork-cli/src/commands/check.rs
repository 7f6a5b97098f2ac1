//! Check command implementation.

use anyhow::Result;
use sork_checks::all_checks;
use sork_core::{check_file, concurrent, source};
use std::path::PathBuf;

use super::{explicit_paths, locate_project, progress_for, Options};

/// Runs the enabled checks over the source files of the project.
///
/// `checks` overrides the `checks` list of the configuration.
pub fn run(options: &Options, checks: Option<&str>, paths: &[PathBuf]) -> Result<()> {
    let project = locate_project(options, paths)?;

    let tokens = match checks {
        Some(list) => split_check_list(list),
        None => project.config.strings("checks").map_err(sork_core::Error::from)?,
    };

    let checks = all_checks().create(&project, &tokens)?;
    let files = source::find_source_files(&project, explicit_paths(paths))
        .map_err(sork_core::Error::from)?;

    tracing::info!("Checking {} files with {} checks", files.len(), checks.len());

    let progress = progress_for(options);
    concurrent::for_each_with_progress(&progress, "Checking source", &files, options.jobs, |file| {
        let output = check_file(&checks, file)?;
        Ok::<_, sork_core::Error>(Some(output))
    })?;

    Ok(())
}

/// Splits a comma-separated check list, ignoring empty entries.
fn split_check_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}
