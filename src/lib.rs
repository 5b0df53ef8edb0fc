//! gf - Concurrent Breadth-First Filename Search
//!
//! Finds files whose base name matches a regular expression, walking one or
//! more directory trees level by level with a pool of worker threads and
//! streaming matches to stdout as they are found.
//!
//! # Features
//!
//! - **Level-Synchronized BFS**: every path at depth `d` is visited before
//!   any path at depth `d + 1`, so shallow matches come out first.
//!
//! - **Bounded Memory**: work and result queues are bounded; a slow reader
//!   on stdout stalls the workers instead of growing buffers.
//!
//! - **Early Stop**: `-n` caps the number of matches. The walk stops at the
//!   next level boundary once the budget is used up.
//!
//! - **Loop-Safe Symlinks**: with `-f`, a symlinked directory is expanded
//!   once and symlinks found below it are not followed again.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Walker                                  │
//! │              (one LevelPool per BFS level)                       │
//! │                                                                  │
//! │   level N ──► ┌─────────┐  ┌─────────┐         ┌─────────┐      │
//! │               │Worker 1 │  │Worker 2 │  ...    │Worker N │      │
//! │               │ lstat   │  │ lstat   │         │ lstat   │      │
//! │               │ visit   │  │ visit   │         │ visit   │      │
//! │               │ readdir │  │ readdir │         │ readdir │      │
//! │               └────┬────┘  └────┬────┘         └────┬────┘      │
//! │                    └────────────┼───────────────────┘           │
//! │                                 ▼                                │
//! │                      ┌────────────────────┐                     │
//! │                      │  Level Queue       │ ──► level N + 1     │
//! │                      │ (crossbeam bounded)│                     │
//! │                      └────────────────────┘                     │
//! └─────────────────────────────────┬───────────────────────────────┘
//!                                   │ matches (NameMatcher)
//!                                   ▼
//!                        ┌────────────────────┐
//!                        │    Result Sink     │
//!                        │ - match budget     │
//!                        │ - raises stop flag │
//!                        └─────────┬──────────┘
//!                                  ▼
//!                               stdout
//! ```
//!
//! # Example
//!
//! ```bash
//! # Every Rust source under src/
//! gf '\.rs$' src
//!
//! # First Cargo.toml found, absolute path
//! gf -p -n 1 '^Cargo\.toml$' ~/code
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod search;
pub mod sink;
pub mod walker;

pub use config::{CliArgs, SearchConfig, WalkOptions};
pub use diagnostics::Diagnostics;
pub use error::{FinderError, Result};
pub use search::{NameMatcher, Search, SearchOutcome};
pub use sink::{ResultSink, SinkReport};
pub use walker::{VisitOutcome, Visitor, WalkSummary, Walker};
