//! Diagnostics sink for per-path failures
//!
//! Failures that only affect one path (a vanished file, an unreadable
//! directory) are reported here instead of aborting the walk. The sink is
//! created once in `main`, handed to the walker, and flushed at shutdown.
//! Every line is prefixed with `ERROR: ` so it can be told apart from match
//! output. Quiet mode swaps the writer for [`std::io::sink`].

use crate::error::WalkError;
use parking_lot::Mutex;
use std::fmt::Display;
use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Prefix written before every diagnostic line
pub const PREFIX: &str = "ERROR: ";

struct Inner {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    reported: AtomicU64,
}

/// Shared handle to the diagnostics writer
#[derive(Clone)]
pub struct Diagnostics {
    inner: Arc<Inner>,
}

impl Diagnostics {
    /// Diagnostics written to `writer`
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(BufWriter::new(writer)),
                reported: AtomicU64::new(0),
            }),
        }
    }

    /// Buffered standard error, or a discarding writer in quiet mode
    pub fn stderr(quiet: bool) -> Self {
        if quiet {
            Self::new(Box::new(io::sink()))
        } else {
            Self::new(Box::new(io::stderr()))
        }
    }

    /// Report a recoverable per-path failure
    pub fn report(&self, err: &WalkError) {
        if err.is_not_found() {
            debug!(error = %err, "Path vanished during walk");
        } else {
            trace!(error = %err, "Path dropped");
        }
        self.line(err);
    }

    /// Write one prefixed line
    pub fn line(&self, message: impl Display) {
        self.inner.reported.fetch_add(1, Ordering::Relaxed);
        let mut writer = self.inner.writer.lock();
        // stderr write failures are ignored
        let _ = writeln!(writer, "{PREFIX}{message}");
    }

    /// Number of lines reported so far
    pub fn reported(&self) -> u64 {
        self.inner.reported.load(Ordering::Relaxed)
    }

    /// Flush buffered lines to the underlying writer
    pub fn flush(&self) -> io::Result<()> {
        self.inner.writer.lock().flush()
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("reported", &self.reported())
            .finish()
    }
}
