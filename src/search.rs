//! Filename search on top of the walker
//!
//! [`NameMatcher`] is the visitor: it matches the pattern against the base
//! name of each path, forwards hits to the result sink and prunes symlinks
//! and excluded subtrees. [`Search`] wires the walker, the sink and the
//! diagnostics sink together for one run.

use crate::config::SearchConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::sink::{ResultSender, ResultSink, SinkReport};
use crate::walker::{Metadata, VisitOutcome, Visitor, WalkSummary, Walker};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Final component of `path` as raw bytes, or the whole path if it has none (`.`, `..`)
pub fn base_name(path: &Path) -> &[u8] {
    path.file_name().unwrap_or(path.as_os_str()).as_encoded_bytes()
}

/// Visitor matching base names against the search pattern
pub struct NameMatcher<'a> {
    config: &'a SearchConfig,
    results: ResultSender,
}

impl<'a> NameMatcher<'a> {
    /// Create a matcher reporting into `results`
    pub fn new(config: &'a SearchConfig, results: ResultSender) -> Self {
        Self { config, results }
    }

    /// Check the pattern against the base name only
    pub fn is_match(&self, path: &Path) -> bool {
        self.config.pattern.is_match(base_name(path))
    }

    /// Path as it should be printed
    fn display_path(&self, path: &Path) -> PathBuf {
        if self.config.full_path {
            self.config.cwd.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Visitor for NameMatcher<'_> {
    fn visit(&self, path: &Path, metadata: &Metadata) -> VisitOutcome {
        if self.config.is_excluded(path) {
            return VisitOutcome::SkipSubtree;
        }

        if self.is_match(path) {
            if let Err(e) = self.results.send(self.display_path(path)) {
                return VisitOutcome::Error(e);
            }
        }

        if metadata.is_symlink() && !self.config.follow_symlinks {
            return VisitOutcome::SkipSubtree;
        }

        VisitOutcome::Continue
    }
}

/// Outcome of one search
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Walk statistics, `None` when no walk was needed
    pub walk: Option<WalkSummary>,

    /// What the result sink wrote
    pub results: SinkReport,
}

/// One search run
pub struct Search {
    config: SearchConfig,
    diagnostics: Diagnostics,
    shutdown: Arc<AtomicBool>,
}

impl Search {
    /// Create a search reporting failures to `diagnostics`
    pub fn new(config: SearchConfig, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the stop flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the search, writing matches to `output`
    pub fn run(self, output: Box<dyn Write + Send>) -> Result<SearchOutcome> {
        if self.config.is_noop() {
            debug!("Match budget is zero, skipping walk");
            return Ok(SearchOutcome::default());
        }

        let sink = ResultSink::spawn(
            output,
            self.config.max_results,
            self.config.result_capacity,
            Arc::clone(&self.shutdown),
        )?;

        let walker = Walker::new(self.config.walk_options(), self.diagnostics.clone())
            .with_shutdown_flag(Arc::clone(&self.shutdown));

        let walk = {
            let matcher = NameMatcher::new(&self.config, sink.sender());
            walker.run(&self.config.roots, &matcher)
        };

        // Matcher is gone, so the sink sees the end of input
        let results = sink.finish();

        if let Err(e) = self.diagnostics.flush() {
            warn!(error = %e, "Failed to flush diagnostics");
        }

        let walk = walk?;
        let results = results?;

        if results.budget_exhausted && !walk.completed {
            debug!(emitted = results.emitted, "Walk stopped early after reaching the match budget");
        } else if self.shutdown.load(Ordering::SeqCst) && !walk.completed {
            debug!("Walk interrupted");
        }

        Ok(SearchOutcome {
            walk: Some(walk),
            results,
        })
    }
}
