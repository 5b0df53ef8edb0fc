//! Level-synchronized breadth-first walker
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │         Walker          │
//!                     │  - owns level queues    │
//!                     │  - stop flag check      │
//!                     └───────────┬─────────────┘
//!                                 │ one LevelPool per level
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  lstat    │             │  lstat    │             │  lstat    │
//! │  visit    │             │  visit    │             │  visit    │
//! │  readdir  │             │  readdir  │             │  readdir  │
//! └───────────┘             └───────────┘             └───────────┘
//! ```

pub mod driver;
pub mod pool;
pub mod probe;
pub mod queue;
pub mod visitor;

pub use driver::{WalkSummary, Walker};
pub use pool::{LevelPool, LevelReport, WorkerStats};
pub use probe::{probe, probe_target, EntryType, Metadata};
pub use queue::{LevelQueue, WorkItem};
pub use visitor::{VisitOutcome, Visitor};
