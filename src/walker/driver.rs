//! Level driver - orchestrates the breadth-first walk
//!
//! The driver owns the level queues. It seeds the first level with the
//! roots, runs a fresh [`LevelPool`] over it, takes the collected children as
//! the next level and repeats until a level produces nothing:
//!
//! ```text
//! Seed ──► ProcessLevel ──► CollectNext ──┬──► ProcessLevel
//!                                         └──► Done
//! ```
//!
//! Cancellation is cooperative. The stop flag is checked before every level,
//! so a level that already started always drains completely.

use super::pool::{LevelPool, LevelReport};
use super::queue::WorkItem;
use super::visitor::Visitor;
use crate::config::WalkOptions;
use crate::diagnostics::Diagnostics;
use crate::error::WorkerError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of a completed walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Levels processed
    pub levels: usize,

    /// Paths probed and visited
    pub visited: u64,

    /// Paths dropped because of errors
    pub failed: u64,

    /// Paths not expanded by policy
    pub skipped: u64,

    /// Time taken for the walk
    pub duration: Duration,

    /// Whether the walk ran out of work (vs was stopped)
    pub completed: bool,
}

/// Driver state between levels
#[derive(Debug)]
enum DriverState {
    Seed(Vec<PathBuf>),
    ProcessLevel(Vec<WorkItem>),
    CollectNext(LevelReport),
    Done { completed: bool },
}

/// Breadth-first walker over one or more roots
pub struct Walker {
    options: WalkOptions,
    diagnostics: Diagnostics,
    shutdown: Arc<AtomicBool>,
}

impl Walker {
    /// Create a new walker
    pub fn new(options: WalkOptions, diagnostics: Diagnostics) -> Self {
        Self {
            options,
            diagnostics,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Observe an existing stop flag instead of a private one
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Get a clone of the shutdown flag (for the result sink and signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Walk every root level by level, calling `visitor` for each path
    pub fn run(
        &self,
        roots: &[PathBuf],
        visitor: &dyn Visitor,
    ) -> Result<WalkSummary, WorkerError> {
        let start = Instant::now();
        let pool = LevelPool::new(&self.options, &self.diagnostics);
        let mut summary = WalkSummary::default();
        let mut state = DriverState::Seed(roots.to_vec());

        info!(
            roots = roots.len(),
            workers = self.options.worker_count,
            "Starting walk"
        );

        let completed = loop {
            state = match state {
                DriverState::Seed(roots) => {
                    DriverState::ProcessLevel(roots.into_iter().map(WorkItem::root).collect())
                }
                DriverState::ProcessLevel(level) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        info!(level = summary.levels, "Shutdown requested, not starting level");
                        DriverState::Done { completed: false }
                    } else {
                        debug!(level = summary.levels, paths = level.len(), "Processing level");
                        DriverState::CollectNext(pool.run(level, visitor)?)
                    }
                }
                DriverState::CollectNext(report) => {
                    summary.levels += 1;
                    summary.visited += report.stats.visited;
                    summary.failed += report.stats.failed;
                    summary.skipped += report.stats.skipped;

                    if report.next.is_empty() {
                        DriverState::Done { completed: true }
                    } else {
                        DriverState::ProcessLevel(report.next)
                    }
                }
                DriverState::Done { completed } => break completed,
            };
        };

        summary.duration = start.elapsed();
        summary.completed = completed;

        info!(
            levels = summary.levels,
            visited = summary.visited,
            failed = summary.failed,
            completed = summary.completed,
            duration_ms = summary.duration.as_millis() as u64,
            "Walk finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::probe::Metadata;
    use crate::walker::visitor::VisitOutcome;
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn walker(workers: usize) -> Walker {
        Walker::new(WalkOptions::with_workers(workers), Diagnostics::stderr(true))
    }

    /// root/{a, d1/{b, d2/{c}}}
    fn make_tree(root: &Path) {
        fs::create_dir_all(root.join("d1/d2")).unwrap();
        fs::write(root.join("a"), b"").unwrap();
        fs::write(root.join("d1/b"), b"").unwrap();
        fs::write(root.join("d1/d2/c"), b"").unwrap();
    }

    #[test]
    fn test_walk_visits_every_path() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let seen = Mutex::new(Vec::new());
        let visitor = |path: &Path, _: &Metadata| {
            seen.lock().push(path.to_path_buf());
            VisitOutcome::Continue
        };

        let summary = walker(4).run(&[dir.path().to_path_buf()], &visitor).unwrap();

        assert!(summary.completed);
        assert_eq!(summary.levels, 4);
        assert_eq!(summary.visited, 6);
        assert_eq!(seen.lock().len(), 6);
    }

    #[test]
    fn test_levels_are_processed_in_depth_order() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());
        fs::create_dir_all(dir.path().join("e1/e2/e3")).unwrap();

        let root_depth = dir.path().components().count();
        let depths = Mutex::new(Vec::new());
        let visitor = |path: &Path, _: &Metadata| {
            depths.lock().push(path.components().count() - root_depth);
            VisitOutcome::Continue
        };

        walker(8).run(&[dir.path().to_path_buf()], &visitor).unwrap();

        let depths = depths.into_inner();
        assert!(depths.windows(2).all(|w| w[0] <= w[1]), "{depths:?}");
    }

    #[test]
    fn test_stop_flag_prevents_next_level() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let walker = walker(2);
        let stop = walker.shutdown_flag();
        let visitor = |_: &Path, _: &Metadata| {
            stop.store(true, Ordering::SeqCst);
            VisitOutcome::Continue
        };

        let summary = walker.run(&[dir.path().to_path_buf()], &visitor).unwrap();

        // The root level drains, nothing after it starts
        assert!(!summary.completed);
        assert_eq!(summary.levels, 1);
        assert_eq!(summary.visited, 1);
    }

    #[test]
    fn test_shared_flag_already_set() {
        let dir = tempdir().unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let walker = walker(2).with_shutdown_flag(Arc::clone(&flag));
        let visitor = |_: &Path, _: &Metadata| VisitOutcome::Continue;

        let summary = walker.run(&[dir.path().to_path_buf()], &visitor).unwrap();
        assert_eq!(summary.levels, 0);
        assert!(!summary.completed);
    }

    #[test]
    fn test_empty_roots_complete_immediately() {
        let visitor = |_: &Path, _: &Metadata| VisitOutcome::Continue;
        let summary = walker(2).run(&[], &visitor).unwrap();
        assert!(summary.completed);
        assert_eq!(summary.levels, 1);
        assert_eq!(summary.visited, 0);
    }
}
