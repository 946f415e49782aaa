use std::fmt;

use crate::queue::{Delivery, MonitorQueue, RecvError, SendError};
use crate::wait::Wait;

/// A queue for variable-length byte payloads.
///
/// Thin adapter over a [`MonitorQueue`] of owned buffers: `send` copies the
/// caller's slice into a fresh allocation, `recv` moves the buffer out to
/// the receiver, which releases it by dropping. Buffers that are discarded,
/// wiped, or still queued at teardown are released by their own `Drop`, so
/// no message leaks whatever path it takes.
pub struct ByteQueue {
    inner: MonitorQueue<Box<[u8]>>,
}

impl ByteQueue {
    /// Create a queue holding at most `capacity` messages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: MonitorQueue::bounded(capacity),
        }
    }

    /// Create a queue that never applies backpressure.
    pub fn unbounded() -> Self {
        Self {
            inner: MonitorQueue::unbounded(),
        }
    }

    /// Copy `bytes` into a fresh buffer and enqueue it, waiting for space
    /// per `wait` if the queue is at capacity.
    ///
    /// Empty payloads are rejected up front. On backpressure rejection or
    /// timeout the copy is released before returning, so failure never
    /// leaks.
    pub fn send(&self, bytes: &[u8], wait: Wait) -> Result<(), ByteSendError> {
        if bytes.is_empty() {
            return Err(ByteSendError::Empty);
        }
        let buffer: Box<[u8]> = bytes.into();
        self.inner.send(buffer, wait).map_err(ByteSendError::from)
    }

    /// Dequeue the head message, waiting for data per `wait` if the queue
    /// is empty.
    ///
    /// The returned buffer (whose length is the payload size) now belongs
    /// to the caller. Nothing is allocated on the empty path.
    pub fn recv(&self, wait: Wait) -> Result<Delivery<Box<[u8]>>, RecvError> {
        self.inner.recv(wait)
    }

    /// Dequeue and release the head message without delivering it.
    pub fn discard(&self, wait: Wait) -> Result<(), RecvError> {
        self.inner.discard(wait)
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The capacity bound, or `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }

    /// Release every queued message. The queue is immediately reusable.
    pub fn wipe(&self) {
        self.inner.wipe();
    }
}

/// Error returned by [`ByteQueue::send`]. The rejected copy has already
/// been released; only the reason travels back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteSendError {
    /// The payload was empty.
    Empty,
    /// The queue was at capacity and the policy was [`Wait::NoWait`].
    Full,
    /// The deadline passed before space freed.
    Timeout,
}

impl From<SendError<Box<[u8]>>> for ByteSendError {
    fn from(err: SendError<Box<[u8]>>) -> Self {
        match err {
            SendError::Full(_) => ByteSendError::Full,
            SendError::Timeout(_) => ByteSendError::Timeout,
        }
    }
}

impl fmt::Display for ByteSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteSendError::Empty => f.write_str("payload is empty"),
            ByteSendError::Full => f.write_str("queue is full"),
            ByteSendError::Timeout => f.write_str("timed out waiting for queue space"),
        }
    }
}

impl std::error::Error for ByteSendError {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn round_trip_is_byte_identical() {
        let queue = ByteQueue::unbounded();
        let payload = b"the quick brown fox";

        queue.send(payload, Wait::NoWait).unwrap();
        let delivery = queue.recv(Wait::NoWait).unwrap();

        assert_eq!(&*delivery.item, payload);
        assert_eq!(delivery.item.len(), payload.len());
    }

    #[test]
    fn copies_are_isolated_from_the_caller() {
        let queue = ByteQueue::unbounded();
        let mut original = vec![1u8, 2, 3, 4];
        queue.send(&original, Wait::NoWait).unwrap();

        // Mutating the source after send must not affect the message.
        original[0] = 99;
        assert_eq!(&*queue.recv(Wait::NoWait).unwrap().item, &[1, 2, 3, 4]);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let queue = ByteQueue::unbounded();
        assert_eq!(queue.send(&[], Wait::NoWait), Err(ByteSendError::Empty));
        assert!(queue.is_empty());
    }

    #[test]
    fn backpressure_maps_to_payloadless_errors() {
        let queue = ByteQueue::bounded(1);
        queue.send(b"first", Wait::NoWait).unwrap();

        assert_eq!(
            queue.send(b"second", Wait::NoWait),
            Err(ByteSendError::Full)
        );
        assert_eq!(
            queue.send(b"second", Wait::For(Duration::from_millis(10))),
            Err(ByteSendError::Timeout)
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn recv_on_empty_reports_no_data() {
        let queue = ByteQueue::bounded(4);
        assert_eq!(queue.recv(Wait::NoWait).unwrap_err(), RecvError::Empty);
        assert_eq!(
            queue.recv(Wait::For(Duration::from_millis(10))).unwrap_err(),
            RecvError::Timeout
        );
    }

    #[test]
    fn messages_keep_their_own_lengths() {
        let queue = ByteQueue::unbounded();
        queue.send(b"a", Wait::NoWait).unwrap();
        queue.send(b"four", Wait::NoWait).unwrap();
        queue.send(b"sixteen bytes!!!", Wait::NoWait).unwrap();

        assert_eq!(queue.recv(Wait::NoWait).unwrap().item.len(), 1);
        assert_eq!(queue.recv(Wait::NoWait).unwrap().item.len(), 4);
        assert_eq!(queue.recv(Wait::NoWait).unwrap().item.len(), 16);
    }

    #[test]
    fn wipe_empties_and_queue_stays_usable() {
        let queue = ByteQueue::bounded(8);
        for _ in 0..5 {
            queue.send(b"payload", Wait::NoWait).unwrap();
        }
        queue.wipe();
        assert_eq!(queue.len(), 0);

        queue.send(b"again", Wait::NoWait).unwrap();
        assert_eq!(&*queue.recv(Wait::NoWait).unwrap().item, b"again");
    }
}
