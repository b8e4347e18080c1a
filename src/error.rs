//! Error types for the split pipeline.
//!
//! Every unit of work (one module's types, one module's implementation files,
//! the core package) owns its failure. The orchestrator never aborts on a
//! `SplitError` from a unit; it records it alongside the module name in the
//! build report.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::splitter::{Direction, ModuleName, SubmoduleVersion};

/// Result type for split operations.
pub type SplitResult<T> = Result<T, SplitError>;

/// Errors raised while splitting a source tree.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Reading or writing a file or directory failed.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declaration stream had a namespace block that could not be captured.
    #[error("{0}")]
    Structural(ParseIssue),

    /// A module source directory contained an entry that is neither a regular
    /// file nor a (single-level) version directory.
    #[error("unsupported entry in module source tree: '{}'", path.display())]
    UnknownEntry { path: PathBuf },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The package metadata collaborator rejected a package.
    #[error("package metadata for '{package}' failed: {message}")]
    Metadata { package: String, message: String },
}

impl SplitError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<ParseIssue> for SplitError {
    fn from(issue: ParseIssue) -> Self {
        SplitError::Structural(issue)
    }
}

/// What went wrong with a namespace block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The block was still open when the stream ended or when the next
    /// module-level block began.
    Unclosed,
    /// The block's key had already been committed earlier in the same stream.
    /// The later block was discarded; `line` is the 1-based line of its opener.
    Reopened { line: usize },
}

/// A structural problem found while parsing a declaration stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub module: ModuleName,
    pub submodule: Option<SubmoduleVersion>,
    pub direction: Direction,
    pub kind: IssueKind,
}

impl ParseIssue {
    /// Human-readable scope, `Module` or `Module.vX`.
    pub fn scope(&self) -> String {
        match &self.submodule {
            Some(version) => format!("{}.{}", self.module, version),
            None => self.module.to_string(),
        }
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            IssueKind::Unclosed => write!(
                f,
                "namespace '{}' in {} declarations was never closed",
                self.scope(),
                self.direction
            ),
            IssueKind::Reopened { line } => write!(
                f,
                "namespace '{}' reopened at line {} of {} declarations; second block was not captured",
                self.scope(),
                line,
                self.direction
            ),
        }
    }
}

/// Errors loading or validating the build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
