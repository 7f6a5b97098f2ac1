//! The check capability and the registry that selects checks by name.

use regex::Regex;
use std::io;
use thiserror::Error;
use tracing::debug;

use crate::build_system::BuildSystemError;
use crate::config::ConfigError;
use crate::project::Project;
use crate::source::{SourceError, SourceFile};

/// Errors raised while creating or running a check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// An external tool could not be started or waited for.
    #[error("failed to run {tool}: {source}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The file under check could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The check settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No usable license template could be determined.
    #[error("{0}")]
    License(String),

    /// A pattern built from the configuration does not compile.
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Build system dependencies could not be determined.
    #[error(transparent)]
    BuildSystem(#[from] BuildSystemError),
}

/// A single analysis run against each source file.
///
/// Created once per run from the [`Project`] and shared between worker
/// threads, so any state must be precomputed at construction.
pub trait Check: Send + Sync {
    /// Name used for selecting the check.
    fn name(&self) -> &'static str;

    /// Checks one file, returning diagnostic text if anything is wrong.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be carried out at all, as
    /// opposed to the file failing it.
    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError>;
}

/// Boxed check.
pub type CheckBox = Box<dyn Check>;

/// Creates a check for a project.
pub type CheckFactory = fn(&Project) -> Result<CheckBox, CheckError>;

/// Errors in selecting checks by name.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A token that is not a valid regular expression.
    #[error("invalid check pattern \"{token}\": {source}")]
    InvalidPattern {
        /// The token without leading `-`.
        token: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A token that matches none of the registered checks.
    #[error("{token} does not match any of the available checks ({available})")]
    NoMatch {
        /// The token without leading `-`.
        token: String,
        /// Comma separated names of all checks.
        available: String,
    },

    /// The tokens disable every check.
    #[error("{tokens} results in no checks")]
    NoChecksEnabled {
        /// The tokens as given.
        tokens: String,
    },
}

/// Ordered set of named check factories.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    entries: Vec<(&'static str, CheckFactory)>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check. Registration order is the order checks are
    /// listed and run in.
    #[must_use]
    pub fn with(mut self, name: &'static str, factory: CheckFactory) -> Self {
        self.entries.push((name, factory));
        self
    }

    /// Names of all registered checks, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Resolves enable/disable tokens to check names.
    ///
    /// A token is a regular expression matched at the start of each name; a
    /// leading `-` disables the matches instead of enabling them. Without
    /// tokens, or when the first token disables, every check starts out
    /// enabled. Tokens apply left to right, so later tokens win.
    ///
    /// # Errors
    ///
    /// Returns an error for a token that is invalid or matches nothing, and
    /// when no check remains enabled.
    pub fn enabled_names<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<&'static str>, RegistryError> {
        let start_with_all = tokens
            .first()
            .map_or(true, |first| first.as_ref().starts_with('-'));
        let mut enabled = vec![start_with_all; self.entries.len()];

        for token in tokens {
            let token = token.as_ref();
            let disable = token.starts_with('-');
            let pattern = token.trim_start_matches('-');

            let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
                RegistryError::InvalidPattern {
                    token: pattern.to_string(),
                    source,
                }
            })?;

            let mut matched = false;
            for (flag, name) in enabled.iter_mut().zip(self.names()) {
                if regex.is_match(name) {
                    *flag = !disable;
                    matched = true;
                }
            }

            if !matched {
                return Err(RegistryError::NoMatch {
                    token: pattern.to_string(),
                    available: self.names().collect::<Vec<_>>().join(", "),
                });
            }
        }

        let names: Vec<&'static str> = self
            .names()
            .zip(&enabled)
            .filter_map(|(name, &on)| on.then_some(name))
            .collect();

        if names.is_empty() {
            return Err(RegistryError::NoChecksEnabled {
                tokens: tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(","),
            });
        }

        Ok(names)
    }

    /// Creates the checks enabled by `tokens`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns selection errors and any error creating a check.
    pub fn create<S: AsRef<str>>(
        &self,
        project: &Project,
        tokens: &[S],
    ) -> crate::Result<Vec<CheckBox>> {
        let names = self.enabled_names(tokens)?;
        debug!("Enabled checks: {}", names.join(", "));

        let mut checks = Vec::with_capacity(names.len());
        for (name, factory) in &self.entries {
            if names.contains(name) {
                checks.push(factory(project)?);
            }
        }

        Ok(checks)
    }
}

/// Runs every check against `file` and joins their non-empty outputs with
/// newlines. An empty result means no findings.
///
/// # Errors
///
/// Returns the first error raised by a check.
pub fn check_file(checks: &[CheckBox], file: &SourceFile<'_>) -> Result<String, CheckError> {
    let mut outputs = Vec::new();

    for check in checks {
        if let Some(output) = check.run(file)? {
            if !output.is_empty() {
                outputs.push(output);
            }
        }
    }

    Ok(outputs.join("\n"))
}
