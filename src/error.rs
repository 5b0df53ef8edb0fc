//! Error types for gf
//!
//! This module defines the error hierarchy that covers:
//! - Configuration and CLI errors (fatal, before traversal starts)
//! - Per-path walk errors (recoverable, reported and dropped)
//! - Visitor errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors local to one path never abort the walk
//! - Preserve error chains for debugging

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for usage errors and unparseable patterns
pub const EXIT_USAGE: u8 = 2;

/// Exit code for environment and runtime failures
pub const EXIT_FAILURE: u8 = 1;

/// Top-level error type for gf
#[derive(Error, Debug)]
pub enum FinderError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (output writer, diagnostics flush)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FinderError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            FinderError::Config(e) => e.exit_code(),
            _ => EXIT_FAILURE,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Search pattern does not compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Exclude pattern does not compile
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Working directory could not be resolved
    #[error("Cannot resolve working directory: {0}")]
    WorkingDir(#[source] io::Error),
}

impl ConfigError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::WorkingDir(_) => EXIT_FAILURE,
            _ => EXIT_USAGE,
        }
    }
}

/// Errors raised by a visitor for a single path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisitError {
    /// Result sink went away while the walk was still expected to report
    #[error("result sink closed while reporting '{}'", path.display())]
    SinkClosed { path: PathBuf },

    /// Visitor refused the path
    #[error("'{}' rejected: {}", path.display(), reason)]
    Rejected { path: PathBuf, reason: String },
}

/// Per-path failures inside a level
///
/// All of these are recoverable: the path is dropped and the level continues.
#[derive(Error, Debug)]
pub enum WalkError {
    /// Metadata probe failed
    #[error("stat {}: {}", path.display(), source)]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory could not be opened or iterated
    #[error("readdir {}: {}", path.display(), source)]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Visitor reported an error
    #[error(transparent)]
    Visit(#[from] VisitError),
}

impl WalkError {
    /// Path vanished between discovery and probe, a normal race on live trees
    pub fn is_not_found(&self) -> bool {
        match self {
            WalkError::Probe { source, .. } | WalkError::ReadDir { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            WalkError::Visit(_) => false,
        }
    }
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread panicked
    #[error("Thread {name} panicked: {message}")]
    Panicked { name: String, message: String },

    /// Thread could not be spawned
    #[error("Failed to spawn {name}: {reason}")]
    SpawnFailed { name: String, reason: String },
}

/// Result type alias for FinderError
pub type Result<T> = std::result::Result<T, FinderError>;
