//! Result sink
//!
//! Matched paths travel from the workers to a dedicated `result-sink` thread
//! over a bounded channel, so a slow terminal stalls the workers instead of
//! letting results pile up in memory. The sink writes one path per line into
//! a buffered writer and counts them.
//!
//! When the match budget is used up the sink raises the shared stop flag,
//! stops consuming and drops its receiver. Producers then fail fast instead
//! of blocking. The flag is raised whenever the sink exits, whatever the
//! reason, and the final [`SinkReport`] is handed back exactly once through
//! [`ResultSink::finish`].

use crate::error::{FinderError, VisitError, WorkerError};
use crossbeam_channel::{bounded, Receiver, SendError, Sender};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Final state of the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Paths written
    pub emitted: usize,

    /// Stopped because the budget was reached
    pub budget_exhausted: bool,

    /// Stopped because the reader of the output went away
    pub output_closed: bool,
}

/// Handle for sending matched paths to the sink
#[derive(Clone)]
pub struct ResultSender {
    sender: Sender<PathBuf>,
    shutdown: Arc<AtomicBool>,
}

impl ResultSender {
    /// Send a matched path, blocking while the channel is full
    ///
    /// After a stop request, paths the sink no longer accepts are dropped
    /// silently. A sink that vanished without one is an error.
    pub fn send(&self, path: PathBuf) -> Result<(), VisitError> {
        match self.sender.send(path) {
            Ok(()) => Ok(()),
            Err(SendError(_)) if self.shutdown.load(Ordering::SeqCst) => Ok(()),
            Err(SendError(path)) => Err(VisitError::SinkClosed { path }),
        }
    }
}

/// Consumer of matched paths running in its own thread
pub struct ResultSink {
    handle: JoinHandle<io::Result<SinkReport>>,
    sender: ResultSender,
}

impl ResultSink {
    /// Spawn the sink thread writing to `writer`
    ///
    /// `budget` caps the number of paths written; `None` is unbounded.
    pub fn spawn(
        writer: Box<dyn Write + Send>,
        budget: Option<usize>,
        capacity: usize,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let (sender, receiver) = bounded(capacity.max(1));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("result-sink".into())
            .spawn(move || {
                let result = sink_loop(&receiver, writer, budget, &thread_shutdown);
                // Raise the flag before producers can observe the disconnect
                thread_shutdown.store(true, Ordering::SeqCst);
                drop(receiver);
                result
            })
            .map_err(|e| WorkerError::SpawnFailed {
                name: "result-sink".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            handle,
            sender: ResultSender { sender, shutdown },
        })
    }

    /// Get a handle for sending paths to the sink
    pub fn sender(&self) -> ResultSender {
        self.sender.clone()
    }

    /// Close the sink's own sender and wait for it to flush
    ///
    /// Returns once every other [`ResultSender`] has been dropped or the
    /// sink stopped on its own.
    pub fn finish(self) -> Result<SinkReport, FinderError> {
        drop(self.sender);

        let report = match self.handle.join() {
            Ok(result) => result?,
            Err(_) => {
                return Err(WorkerError::Panicked {
                    name: "result-sink".into(),
                    message: "result sink thread panicked".into(),
                }
                .into())
            }
        };

        debug!(
            emitted = report.emitted,
            budget_exhausted = report.budget_exhausted,
            "Result sink finished"
        );
        Ok(report)
    }
}

/// Sink thread - writes paths until the budget is used up or producers hang up
fn sink_loop(
    receiver: &Receiver<PathBuf>,
    writer: Box<dyn Write + Send>,
    budget: Option<usize>,
    shutdown: &AtomicBool,
) -> io::Result<SinkReport> {
    let mut out = BufWriter::new(writer);
    let mut report = SinkReport::default();

    for path in receiver.iter() {
        if let Err(e) = write_path(&mut out, &path) {
            return closed_or_err(e, report);
        }
        report.emitted += 1;

        if budget.is_some_and(|max| report.emitted >= max) {
            report.budget_exhausted = true;
            shutdown.store(true, Ordering::SeqCst);
            break;
        }
    }

    match out.flush() {
        Ok(()) => Ok(report),
        Err(e) => closed_or_err(e, report),
    }
}

/// Write one path and a newline, keeping non-UTF-8 names byte-exact on unix
fn write_path(out: &mut impl Write, path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        out.write_all(path.as_os_str().as_bytes())?;
    }
    #[cfg(not(unix))]
    write!(out, "{}", path.display())?;
    out.write_all(b"\n")
}

/// A closed pipe (`gf ... | head`) ends the output normally
fn closed_or_err(e: io::Error, mut report: SinkReport) -> io::Result<SinkReport> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        report.output_closed = true;
        Ok(report)
    } else {
        Err(e)
    }
}
