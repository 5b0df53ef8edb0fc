//! Configuration types for gf
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The engine-facing walk options derived from it

use crate::error::ConfigError;
use clap::Parser;
use regex::bytes::Regex;
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 1024;

/// Level queue slots per worker thread
pub const QUEUE_SLOTS_PER_WORKER: usize = 16;

/// Capacity of the channel between workers and the result sink
pub const RESULT_CHANNEL_CAPACITY: usize = 1024;

/// Root used when no directories are given
pub const DEFAULT_ROOT: &str = ".";

/// Concurrent breadth-first filename search
#[derive(Parser, Debug, Clone)]
#[command(
    name = "gf",
    version,
    about = "Find files whose name matches a regular expression",
    long_about = "Walks one or more directory trees level by level with a pool of worker \
                  threads and prints every path whose base name matches PATTERN.\n\n\
                  The pattern is matched against the final path component only.",
    after_help = "EXAMPLES:\n    \
        gf '\\.rs$' src\n    \
        gf -n 1 '^Cargo\\.toml$' ~/code\n    \
        gf -p -f 'config' /etc --exclude '\\.git$'"
)]
pub struct CliArgs {
    /// Regular expression matched against each entry's base name
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Directories to search (defaults to the current directory)
    #[arg(value_name = "DIRECTORY")]
    pub directories: Vec<PathBuf>,

    /// Print paths joined onto the working directory
    #[arg(short = 'p', long)]
    pub full_path: bool,

    /// Follow symlinks to directories
    #[arg(short = 'f', long = "follow")]
    pub follow_symlinks: bool,

    /// Quiet mode - suppress diagnostics
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Stop after this many matches
    #[arg(short = 'n', long, value_name = "NUM")]
    pub max_results: Option<usize>,

    /// Number of worker threads per level
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Prune paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Verbose output (debug tracing on stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Filesystem calls block, so oversubscribe the cores
    num_cpus::get() * 4
}

/// Options consumed by the walk engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Worker threads per level
    pub worker_count: usize,

    /// Capacity of each level channel
    pub queue_capacity: usize,

    /// Children of paths at this depth are not enqueued
    pub max_depth: Option<usize>,
}

impl WalkOptions {
    /// Options for `worker_count` workers with the default queue sizing
    pub fn with_workers(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            worker_count,
            queue_capacity: worker_count * QUEUE_SLOTS_PER_WORKER,
            max_depth: None,
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::with_workers(default_workers())
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Compiled base-name pattern
    pub pattern: Regex,

    /// Roots of the walk
    pub roots: Vec<PathBuf>,

    /// Working directory, used for full-path output
    pub cwd: PathBuf,

    /// Print paths joined onto `cwd`
    pub full_path: bool,

    /// Expand symlinked directories
    pub follow_symlinks: bool,

    /// Match budget (unbounded if not set)
    pub max_results: Option<usize>,

    /// Number of worker threads per level
    pub worker_count: usize,

    /// Level channel capacity
    pub queue_capacity: usize,

    /// Result sink channel capacity
    pub result_capacity: usize,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,
}

impl SearchConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        Self::from_args_in(args, cwd)
    }

    /// Same as [`SearchConfig::from_args`] with an explicit working directory
    pub fn from_args_in(args: CliArgs, cwd: PathBuf) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&args.pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: args.pattern.clone(),
            reason: e.to_string(),
        })?;

        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let roots = if args.directories.is_empty() {
            vec![PathBuf::from(DEFAULT_ROOT)]
        } else {
            args.directories
        };

        Ok(Self {
            pattern,
            roots,
            cwd,
            full_path: args.full_path,
            follow_symlinks: args.follow_symlinks,
            max_results: args.max_results,
            worker_count: args.workers,
            queue_capacity: args.workers * QUEUE_SLOTS_PER_WORKER,
            result_capacity: RESULT_CHANNEL_CAPACITY,
            max_depth: args.max_depth,
            exclude_patterns,
        })
    }

    /// A zero budget means there is nothing to search for
    pub fn is_noop(&self) -> bool {
        self.max_results == Some(0)
    }

    /// Check if a path should be pruned
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let bytes = path.as_os_str().as_encoded_bytes();
        self.exclude_patterns.iter().any(|re| re.is_match(bytes))
    }

    /// Engine options for this search
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            worker_count: self.worker_count,
            queue_capacity: self.queue_capacity,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("gf").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::from_args_in(parse(&["foo"]), "/work".into()).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from(".")]);
        assert_eq!(config.max_results, None);
        assert!(!config.follow_symlinks);
        assert!(!config.full_path);
        assert_eq!(config.queue_capacity, config.worker_count * QUEUE_SLOTS_PER_WORKER);
        assert_eq!(config.result_capacity, RESULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-p", "-f", "-q", "-n", "3", "-w", "2", "x", "a", "b"]);
        let config = SearchConfig::from_args_in(args, "/work".into()).unwrap();
        assert!(config.full_path);
        assert!(config.follow_symlinks);
        assert_eq!(config.max_results, Some(3));
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.roots, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.walk_options().queue_capacity, 32);
    }

    #[test]
    fn test_missing_pattern_is_usage_error() {
        let err = CliArgs::try_parse_from(["gf"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = SearchConfig::from_args_in(parse(&["("]), "/work".into()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_worker_count() {
        let err = SearchConfig::from_args_in(parse(&["-w", "0", "x"]), "/work".into()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { count: 0, .. }));
    }

    #[test]
    fn test_zero_budget_is_noop() {
        let config = SearchConfig::from_args_in(parse(&["-n", "0", "x"]), "/work".into()).unwrap();
        assert!(config.is_noop());
    }

    #[test]
    fn test_exclude_pattern() {
        let args = parse(&["--exclude", r"\.git$", "--exclude", "^target", "x"]);
        let config = SearchConfig::from_args_in(args, "/work".into()).unwrap();

        assert!(config.is_excluded(Path::new("repo/.git")));
        assert!(config.is_excluded(Path::new("target/debug")));
        assert!(!config.is_excluded(Path::new("src/main.rs")));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let args = parse(&["--exclude", "[", "x"]);
        let err = SearchConfig::from_args_in(args, "/work".into()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExcludePattern { .. }));
    }

    #[test]
    fn test_walk_options_with_workers() {
        let options = WalkOptions::with_workers(0);
        assert_eq!(options.worker_count, 1);
        assert_eq!(options.queue_capacity, QUEUE_SLOTS_PER_WORKER);
        assert_eq!(options.max_depth, None);
    }
}
