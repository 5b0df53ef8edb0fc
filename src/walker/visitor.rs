//! Visitor contract
//!
//! The walker calls a [`Visitor`] exactly once for every path it manages to
//! probe, before deciding whether to expand it. Visitors run on worker
//! threads, so a slow visitor slows the whole level down.

use super::probe::Metadata;
use crate::error::VisitError;
use std::path::Path;

/// What the walker should do with a visited path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Expand the path if it is a directory
    Continue,

    /// Never enumerate children, even for a directory
    SkipSubtree,

    /// Report the error and drop the path without expanding it
    Error(VisitError),
}

impl VisitOutcome {
    /// Check if the walker may expand this path
    pub fn allows_expansion(&self) -> bool {
        matches!(self, VisitOutcome::Continue)
    }
}

/// Per-path callback invoked by the level workers
pub trait Visitor: Sync {
    /// Inspect `path` and decide how the walk proceeds below it
    fn visit(&self, path: &Path, metadata: &Metadata) -> VisitOutcome;
}

impl<F> Visitor for F
where
    F: Fn(&Path, &Metadata) -> VisitOutcome + Sync,
{
    fn visit(&self, path: &Path, metadata: &Metadata) -> VisitOutcome {
        self(path, metadata)
    }
}
