//! Level worker pool
//!
//! One pool processes exactly one level and is then torn down:
//!
//! ```text
//!   level Vec ──► feeder ──► [input queue] ──┬─► walker-0 ─┐
//!                                            ├─► walker-1 ─┼─► [output queue] ──► collector ──► next level
//!                                            └─► walker-N ─┘
//! ```
//!
//! Each worker probes a path, hands it to the visitor and, when the visitor
//! allows it, pushes the directory's immediate children onto the output
//! queue. The pool returns only after every thread has been joined, which is
//! the barrier between levels.

use super::probe::{probe, probe_target};
use super::queue::{LevelQueue, LevelReceiver, LevelSender, WorkItem};
use super::visitor::{VisitOutcome, Visitor};
use crate::config::WalkOptions;
use crate::diagnostics::Diagnostics;
use crate::error::{WalkError, WorkerError};
use std::any::Any;
use std::fs;
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, trace};

/// Statistics collected by a worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Paths probed and visited
    pub visited: u64,

    /// Directories whose children were enqueued
    pub expanded: u64,

    /// Paths not expanded by policy (visitor skip, depth cap, symlink bound)
    pub skipped: u64,

    /// Paths dropped because of an error
    pub failed: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Visited => self.visited += 1,
            ItemOutcome::Expanded { .. } => {
                self.visited += 1;
                self.expanded += 1;
            }
            ItemOutcome::Skipped { .. } => {
                self.visited += 1;
                self.skipped += 1;
            }
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    fn merge(&mut self, other: WorkerStats) {
        self.visited += other.visited;
        self.expanded += other.expanded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Result of processing one level
#[derive(Debug, Default)]
pub struct LevelReport {
    /// Children discovered by this level, in no particular order
    pub next: Vec<WorkItem>,

    /// Totals across all workers
    pub stats: WorkerStats,

    /// Number of workers that ran
    pub workers: usize,
}

/// What happened to a single path
#[derive(Debug)]
enum ItemOutcome {
    /// Visited, nothing to expand
    Visited,

    /// Children were enqueued
    Expanded { children: usize },

    /// Not expanded by policy
    Skipped { reason: &'static str },

    /// Dropped after an error (already reported)
    Failed,
}

/// Runs one level at a time
pub struct LevelPool<'a> {
    options: &'a WalkOptions,
    diagnostics: &'a Diagnostics,
}

impl<'a> LevelPool<'a> {
    /// Create a pool using `options` for sizing
    pub fn new(options: &'a WalkOptions, diagnostics: &'a Diagnostics) -> Self {
        Self {
            options,
            diagnostics,
        }
    }

    /// Process every item of `level` and return the next level
    pub fn run(
        &self,
        level: Vec<WorkItem>,
        visitor: &dyn Visitor,
    ) -> Result<LevelReport, WorkerError> {
        if level.is_empty() {
            return Ok(LevelReport::default());
        }

        // No point running more workers than there are paths
        let worker_count = self.options.worker_count.min(level.len()).max(1);
        let (input_tx, input_rx) = LevelQueue::new(self.options.queue_capacity).split();
        let output_queue = LevelQueue::new(self.options.queue_capacity);
        let output_stats = output_queue.stats();
        let (output_tx, output_rx) = output_queue.split();

        thread::scope(|scope| {
            let feeder = spawn(scope, "level-feeder".into(), move || {
                for item in level {
                    if input_tx.send(item).is_err() {
                        break;
                    }
                }
            })?;

            let collector = spawn(scope, "level-collector".into(), move || output_rx.collect())?;

            let mut workers = Vec::with_capacity(worker_count);
            for id in 0..worker_count {
                let input = input_rx.clone();
                let output = output_tx.clone();
                let diagnostics = self.diagnostics;
                let max_depth = self.options.max_depth;
                let handle = spawn(scope, format!("walker-{id}"), move || {
                    worker_loop(id, input, output, visitor, diagnostics, max_depth)
                })?;
                workers.push((id, handle));
            }

            // Workers hold the only remaining ends
            drop(input_rx);
            drop(output_tx);

            let mut stats = WorkerStats::default();
            let mut first_panic = None;
            for (id, handle) in workers {
                match handle.join() {
                    Ok(worker_stats) => stats.merge(worker_stats),
                    Err(payload) if first_panic.is_none() => {
                        first_panic = Some(WorkerError::Panicked {
                            name: format!("walker-{id}"),
                            message: panic_message(payload.as_ref()),
                        });
                    }
                    Err(_) => {}
                }
            }

            feeder.join().map_err(|payload| WorkerError::Panicked {
                name: "level-feeder".into(),
                message: panic_message(payload.as_ref()),
            })?;
            let next = collector.join().map_err(|payload| WorkerError::Panicked {
                name: "level-collector".into(),
                message: panic_message(payload.as_ref()),
            })?;

            if let Some(err) = first_panic {
                return Err(err);
            }

            debug!(
                workers = worker_count,
                children = output_stats.throughput(),
                backpressure = output_stats.backpressure_count(),
                "Level drained"
            );

            Ok(LevelReport {
                next,
                stats,
                workers: worker_count,
            })
        })
    }
}

fn spawn<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: String,
    f: F,
) -> Result<ScopedJoinHandle<'scope, T>, WorkerError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(scope, f)
        .map_err(|e| WorkerError::SpawnFailed {
            name,
            reason: e.to_string(),
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Main worker loop: drain the input queue until it closes
fn worker_loop(
    id: usize,
    input: LevelReceiver,
    output: LevelSender,
    visitor: &dyn Visitor,
    diagnostics: &Diagnostics,
    max_depth: Option<usize>,
) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while let Some(item) = input.recv() {
        let outcome = process_item(&item, visitor, &output, diagnostics, max_depth);
        match &outcome {
            ItemOutcome::Expanded { children } => {
                trace!(worker = id, path = %item.path.display(), children, "Directory expanded");
            }
            ItemOutcome::Skipped { reason } => {
                trace!(worker = id, path = %item.path.display(), reason, "Subtree skipped");
            }
            ItemOutcome::Visited | ItemOutcome::Failed => {}
        }
        stats.record(&outcome);
    }

    debug!(
        worker = id,
        visited = stats.visited,
        expanded = stats.expanded,
        failed = stats.failed,
        "Worker drained level"
    );
    stats
}

/// Probe, visit and possibly expand a single path
fn process_item(
    item: &WorkItem,
    visitor: &dyn Visitor,
    output: &LevelSender,
    diagnostics: &Diagnostics,
    max_depth: Option<usize>,
) -> ItemOutcome {
    let metadata = match probe(&item.path) {
        Ok(metadata) => metadata,
        Err(e) => {
            diagnostics.report(&e);
            return ItemOutcome::Failed;
        }
    };

    match visitor.visit(&item.path, &metadata) {
        VisitOutcome::Error(e) => {
            diagnostics.report(&WalkError::Visit(e));
            return ItemOutcome::Failed;
        }
        outcome if !outcome.allows_expansion() => {
            return ItemOutcome::Skipped {
                reason: "visitor skipped subtree",
            }
        }
        _ => {}
    }

    if !metadata.is_dir() && !metadata.is_symlink() {
        return ItemOutcome::Visited;
    }

    if max_depth.is_some_and(|max| item.depth >= max) {
        return ItemOutcome::Skipped {
            reason: "max depth reached",
        };
    }

    // Symlinks are only followed once the visitor has let them through
    if metadata.is_symlink() {
        if item.via_symlink {
            return ItemOutcome::Skipped {
                reason: "symlink below a followed symlink",
            };
        }
        match probe_target(&item.path) {
            Ok(target) if target.is_dir() => {}
            Ok(_) => return ItemOutcome::Visited,
            Err(e) => {
                diagnostics.report(&e);
                return ItemOutcome::Failed;
            }
        }
    }

    expand(item, metadata.is_symlink(), output, diagnostics)
}

/// Enqueue the immediate children of a directory
fn expand(
    item: &WorkItem,
    via_symlink: bool,
    output: &LevelSender,
    diagnostics: &Diagnostics,
) -> ItemOutcome {
    let entries = match fs::read_dir(&item.path) {
        Ok(entries) => entries,
        Err(source) => {
            diagnostics.report(&WalkError::ReadDir {
                path: item.path.clone(),
                source,
            });
            return ItemOutcome::Failed;
        }
    };

    let mut children = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                diagnostics.report(&WalkError::ReadDir {
                    path: item.path.clone(),
                    source,
                });
                continue;
            }
        };

        if output.send(item.child(&entry.file_name(), via_symlink)).is_err() {
            // Collector is gone; nothing downstream can use more children
            break;
        }
        children += 1;
    }

    ItemOutcome::Expanded { children }
}
