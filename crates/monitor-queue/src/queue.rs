use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

use parking_lot::{Condvar, Mutex};

use crate::wait::Wait;

/// A queued payload and the wall-clock time its send was issued.
struct Slot<T> {
    item: T,
    enqueued_at: SystemTime,
}

/// A payload delivered out of a queue.
///
/// Ownership of `item` transfers to the receiver. `enqueued_at` is the
/// wall-clock time captured when the producer issued the send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery<T> {
    pub item: T,
    pub enqueued_at: SystemTime,
}

/// A bounded (or unbounded) FIFO queue shared by any number of producer and
/// consumer threads.
///
/// All queue state is guarded by a single mutex. Two condition variables
/// decouple the notifications the two roles care about: producers park on
/// "space available", consumers on "data available", so neither role is
/// woken for the other's events. Every wake re-validates its predicate under
/// the lock before proceeding.
///
/// Items that are discarded rather than delivered (by [`discard`],
/// [`wipe`], or teardown) are routed through the disposer installed with
/// [`with_disposer`], if any. Delivered items never are.
///
/// [`discard`]: MonitorQueue::discard
/// [`wipe`]: MonitorQueue::wipe
/// [`with_disposer`]: MonitorQueue::with_disposer
pub struct MonitorQueue<T> {
    items: Mutex<VecDeque<Slot<T>>>,
    /// Notified once per slot freed; producers park here when at capacity.
    space_available: Condvar,
    /// Notified once per slot queued; consumers park here when empty.
    data_available: Condvar,
    capacity: Option<usize>,
    disposer: Option<Box<dyn Fn(T) + Send + Sync>>,
}

impl<T> MonitorQueue<T> {
    /// Create a queue that holds at most `capacity` items. Once full,
    /// sends block, fail, or time out according to their [`Wait`] policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self::new(Some(capacity))
    }

    /// Create a queue that never applies backpressure: sends always
    /// succeed immediately, regardless of their wait policy.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    fn new(capacity: Option<usize>) -> Self {
        tracing::trace!(?capacity, "created monitor queue");
        Self {
            items: Mutex::new(VecDeque::new()),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
            capacity,
            disposer: None,
        }
    }

    /// Install a disposer invoked, with ownership, for every item that is
    /// discarded, wiped, or still queued at teardown. Delivered items never
    /// reach it.
    ///
    /// Consumes and returns the queue so the disposer is in place before
    /// the handle is shared.
    pub fn with_disposer(mut self, dispose: impl Fn(T) + Send + Sync + 'static) -> Self {
        self.disposer = Some(Box::new(dispose));
        self
    }

    /// Enqueue `item` at the tail, waiting for space per `wait` if the
    /// queue is at capacity.
    ///
    /// On failure the rejected item travels back inside the error; nothing
    /// else changes. The enqueue timestamp is captured at call entry, before
    /// any blocking.
    pub fn send(&self, item: T, wait: Wait) -> Result<(), SendError<T>> {
        let slot = Slot {
            item,
            enqueued_at: SystemTime::now(),
        };
        let deadline = wait.deadline();

        let mut items = self.items.lock();
        if let Some(capacity) = self.capacity {
            let mut expired = false;
            while items.len() >= capacity {
                if expired {
                    drop(items);
                    return Err(match wait {
                        Wait::NoWait => SendError::Full(slot.item),
                        _ => SendError::Timeout(slot.item),
                    });
                }
                expired = !deadline.park(&self.space_available, &mut items);
            }
        }
        items.push_back(slot);
        drop(items);

        self.data_available.notify_one();
        Ok(())
    }

    /// Dequeue the head item, waiting for data per `wait` if the queue is
    /// empty.
    ///
    /// A non-empty queue delivers immediately regardless of the policy. The
    /// timeout outcomes carry no item and have no side effects.
    pub fn recv(&self, wait: Wait) -> Result<Delivery<T>, RecvError> {
        self.take_head(wait).map(|slot| Delivery {
            item: slot.item,
            enqueued_at: slot.enqueued_at,
        })
    }

    /// Dequeue the head item and route it through the disposer instead of
    /// delivering it. Same wait semantics as [`recv`](MonitorQueue::recv).
    pub fn discard(&self, wait: Wait) -> Result<(), RecvError> {
        let slot = self.take_head(wait)?;
        self.dispose(slot.item);
        Ok(())
    }

    fn take_head(&self, wait: Wait) -> Result<Slot<T>, RecvError> {
        let deadline = wait.deadline();

        let mut items = self.items.lock();
        let mut expired = false;
        loop {
            if let Some(slot) = items.pop_front() {
                drop(items);
                self.space_available.notify_one();
                return Ok(slot);
            }
            if expired {
                return Err(match wait {
                    Wait::NoWait => RecvError::Empty,
                    _ => RecvError::Timeout,
                });
            }
            expired = !deadline.park(&self.data_available, &mut items);
        }
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The capacity bound, or `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drain every queued item through the disposer.
    ///
    /// The queue is immediately reusable afterwards. Producers blocked on
    /// backpressure are woken, since all space just freed.
    pub fn wipe(&self) {
        let drained = std::mem::take(&mut *self.items.lock());
        if drained.is_empty() {
            return;
        }
        let count = drained.len();
        self.space_available.notify_all();
        // Dispose after releasing the monitor: the disposer may itself use
        // the queue, and the lock is not reentrant.
        for slot in drained {
            self.dispose(slot.item);
        }
        tracing::trace!(count, "wiped monitor queue");
    }

    fn dispose(&self, item: T) {
        match &self.disposer {
            Some(dispose) => dispose(item),
            None => drop(item),
        }
    }
}

impl<T> Drop for MonitorQueue<T> {
    fn drop(&mut self) {
        let drained = std::mem::take(self.items.get_mut());
        for slot in drained {
            self.dispose(slot.item);
        }
    }
}

/// Error returned by [`MonitorQueue::send`]. Both variants hand the
/// rejected item back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum SendError<T> {
    /// The queue was at capacity and the policy was [`Wait::NoWait`].
    Full(T),
    /// The deadline passed before space freed.
    Timeout(T),
}

impl<T> SendError<T> {
    /// Recover the item that was not enqueued.
    pub fn into_inner(self) -> T {
        match self {
            SendError::Full(item) | SendError::Timeout(item) => item,
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Full(_) => f.write_str("queue is full"),
            SendError::Timeout(_) => f.write_str("timed out waiting for queue space"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

/// A receive that ended without data. Not a fault of the queue: the two
/// variants only report which wait policy gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The queue was empty and the policy was [`Wait::NoWait`].
    Empty,
    /// The deadline passed before data arrived.
    Timeout,
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecvError::Empty => f.write_str("queue is empty"),
            RecvError::Timeout => f.write_str("timed out waiting for queue data"),
        }
    }
}

impl std::error::Error for RecvError {}
