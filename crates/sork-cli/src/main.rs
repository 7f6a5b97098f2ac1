//! sork CLI tool.
//!
//! Usage:
//! ```bash
//! sork check [OPTIONS] [PATH]...
//! sork analyze [PATH]...
//! sork asm [--verbose-asm] [--count] <FILE>
//! sork list-checks
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod interrupt;
mod invocation;

/// Style checks and static analysis for C and C++ source trees
#[derive(Parser, Debug)]
#[command(name = "sork")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Ctrl-C lets running tools finish, marks the run as aborted and exits with status 130. Press it twice to exit immediately.")]
struct Cli {
    /// Path to build directory, automatically detected if possible
    #[arg(short, long, global = true, value_name = "PATH")]
    build_path: Option<PathBuf>,

    /// Run N jobs in parallel (default: number of logical cores)
    #[arg(short, long, global = true, value_name = "N", value_parser = parse_jobs)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Style check source code
    Check {
        /// Checks to enable (comma-separated regexes, `-` prefix disables)
        #[arg(short, long, allow_hyphen_values = true)]
        checks: Option<String>,

        /// Only check these paths (directories are recursed)
        paths: Vec<PathBuf>,
    },

    /// Run the clang static analyzer
    Analyze {
        /// Only analyze these paths (directories are recursed)
        paths: Vec<PathBuf>,
    },

    /// Output assembler for a compilation unit
    #[command(alias = "assembler")]
    Asm {
        /// Tell the compiler to output verbose assembler
        #[arg(long)]
        verbose_asm: bool,

        /// Print how often each opcode occurs instead of the assembler
        #[arg(long)]
        count: bool,

        /// Source file to output assembler for
        file: PathBuf,
    },

    /// List available checks
    ListChecks,
}

fn parse_jobs(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let interrupted = interrupt::watch();
    let result = run(cli, Arc::clone(&interrupted));

    if interrupted.load(Ordering::SeqCst) || result.as_ref().is_err_and(interrupt::is_interrupted) {
        return ExitCode::from(interrupt::INTERRUPTED_EXIT_CODE);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast::<sork_core::Error>() {
                Ok(err) => eprintln!("{:?}", miette::Report::new(err)),
                Err(err) => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, interrupted: Arc<AtomicBool>) -> Result<()> {
    let options = commands::Options {
        build_path: cli.build_path,
        jobs: cli.jobs,
        verbose: cli.verbose,
        interrupted,
    };

    match cli.command {
        Commands::Check { checks, paths } => commands::check::run(&options, checks.as_deref(), &paths),
        Commands::Analyze { paths } => commands::analyze::run(&options, &paths),
        Commands::Asm {
            verbose_asm,
            count,
            file,
        } => commands::assembler::run(&options, &file, verbose_asm, count),
        Commands::ListChecks => {
            commands::list_checks::run();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_options_go_anywhere() {
        let cli = Cli::try_parse_from(["sork", "check", "-j", "4", "-b", "../build", "src"])
            .expect("valid arguments");

        assert_eq!(cli.jobs, Some(4));
        assert_eq!(cli.build_path, Some(PathBuf::from("../build")));
        assert!(matches!(cli.command, Commands::Check { ref paths, .. } if paths == &[PathBuf::from("src")]));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(Cli::try_parse_from(["sork", "-j", "0", "check"]).is_err());
        assert!(Cli::try_parse_from(["sork", "-j", "x", "check"]).is_err());
    }

    #[test]
    fn assembler_is_an_alias_of_asm() {
        let cli = Cli::try_parse_from(["sork", "assembler", "--count", "src/a.cpp"])
            .expect("valid arguments");

        assert!(matches!(
            cli.command,
            Commands::Asm {
                count: true,
                verbose_asm: false,
                ..
            }
        ));
    }

    #[test]
    fn asm_requires_a_file() {
        assert!(Cli::try_parse_from(["sork", "asm"]).is_err());
    }

    #[test]
    fn checks_option_is_kept_verbatim() {
        let cli = Cli::try_parse_from(["sork", "check", "--checks", "clang,-clang-tidy"])
            .expect("valid arguments");

        assert!(matches!(
            cli.command,
            Commands::Check { checks: Some(ref checks), ref paths } if checks == "clang,-clang-tidy" && paths.is_empty()
        ));
    }
}
