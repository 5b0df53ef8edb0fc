//! Level queues with backpressure
//!
//! Each level of the walk uses two bounded queues: one feeding the level's
//! paths to the workers and one carrying discovered children to the
//! collector. When a queue is full the sender blocks, so at most one level of
//! paths is ever buffered.
//!
//! A queue closes once every [`LevelSender`] has been dropped; receivers then
//! drain what is left and stop.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A path waiting to be probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Path to probe
    pub path: PathBuf,

    /// Depth from its root (0 = root)
    pub depth: usize,

    /// Reached through a symlink the walker already followed
    pub via_symlink: bool,
}

impl WorkItem {
    /// Create a root item
    pub fn root(path: PathBuf) -> Self {
        Self {
            path,
            depth: 0,
            via_symlink: false,
        }
    }

    /// Create the item for a child named `name`
    ///
    /// Children of `.` are written without the `./` prefix.
    pub fn child(&self, name: &OsStr, via_symlink: bool) -> Self {
        let path = if self.path == Path::new(".") {
            PathBuf::from(name)
        } else {
            self.path.join(name)
        };

        Self {
            path,
            depth: self.depth + 1,
            via_symlink: self.via_symlink || via_symlink,
        }
    }
}

/// Statistics for a level queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,

    /// Number of sends that found the queue full and had to wait
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    /// Get queue throughput (dequeued items)
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// Bounded queue holding one level's worth of work
pub struct LevelQueue {
    sender: Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    stats: Arc<QueueStats>,
}

impl LevelQueue {
    /// Create a new queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Split into the two ends
    ///
    /// Clone the ends for each producer and consumer. Dropping every sender
    /// closes the queue.
    pub fn split(self) -> (LevelSender, LevelReceiver) {
        let sender = LevelSender {
            sender: self.sender,
            stats: Arc::clone(&self.stats),
        };
        let receiver = LevelReceiver {
            receiver: self.receiver,
            stats: self.stats,
        };
        (sender, receiver)
    }
}

/// Queue is closed: every receiver has been dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueClosed(pub WorkItem);

/// Handle for sending items to a level queue
#[derive(Clone)]
pub struct LevelSender {
    sender: Sender<WorkItem>,
    stats: Arc<QueueStats>,
}

impl LevelSender {
    /// Send an item, blocking while the queue is full
    pub fn send(&self, item: WorkItem) -> Result<(), QueueClosed> {
        let item = match self.sender.try_send(item) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Full(item)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                item
            }
            Err(TrySendError::Disconnected(item)) => return Err(QueueClosed(item)),
        };

        self.sender.send(item).map_err(|e| QueueClosed(e.0))?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Handle for receiving items from a level queue
#[derive(Clone)]
pub struct LevelReceiver {
    receiver: Receiver<WorkItem>,
    stats: Arc<QueueStats>,
}

impl LevelReceiver {
    /// Receive an item from the queue
    ///
    /// Blocks until an item is available. Returns `None` once the queue is
    /// closed and drained.
    pub fn recv(&self) -> Option<WorkItem> {
        match self.receiver.recv() {
            Ok(item) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            Err(_) => None,
        }
    }

    /// Receive every remaining item until the queue closes
    pub fn collect(&self) -> Vec<WorkItem> {
        let mut items = Vec::new();
        while let Some(item) = self.recv() {
            items.push(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_child_paths() {
        let root = WorkItem::root(PathBuf::from("root"));
        let child = root.child(OsStr::new("sub"), false);
        assert_eq!(child.path, PathBuf::from("root/sub"));
        assert_eq!(child.depth, 1);
        assert!(!child.via_symlink);

        let linked = child.child(OsStr::new("loop"), true);
        assert!(linked.via_symlink);
        assert_eq!(linked.depth, 2);

        // Symlink ancestry is inherited
        let below = linked.child(OsStr::new("x"), false);
        assert!(below.via_symlink);
    }

    #[test]
    fn test_children_of_current_dir() {
        let root = WorkItem::root(PathBuf::from("."));
        let child = root.child(OsStr::new("a.txt"), false);
        assert_eq!(child.path, PathBuf::from("a.txt"));
    }

    #[test]
    fn test_queue_closes_when_senders_drop() {
        let (sender, receiver) = LevelQueue::new(10).split();

        sender.send(WorkItem::root("/a".into())).unwrap();
        sender.send(WorkItem::root("/b".into())).unwrap();
        drop(sender);

        let items = receiver.collect();
        assert_eq!(items.len(), 2);
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn test_send_to_closed_queue() {
        let (sender, receiver) = LevelQueue::new(1).split();
        drop(receiver);

        let err = sender.send(WorkItem::root("/a".into())).unwrap_err();
        assert_eq!(err.0.path, PathBuf::from("/a"));
    }

    #[test]
    fn test_queue_backpressure() {
        let queue = LevelQueue::new(1);
        let stats = queue.stats();
        let (sender, receiver) = queue.split();

        let producer = thread::spawn(move || {
            for name in ["/a", "/b", "/c"] {
                sender.send(WorkItem::root(name.into())).unwrap();
            }
        });

        // Give the producer time to fill the single slot
        thread::sleep(std::time::Duration::from_millis(50));
        let items = receiver.collect();
        producer.join().unwrap();

        assert_eq!(items.len(), 3);
        assert!(stats.backpressure_count() >= 1);
        assert_eq!(stats.enqueued.load(Ordering::Relaxed), 3);
        assert_eq!(stats.throughput(), 3);
    }
}
