use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

/// How long a queue operation is willing to block for its predicate
/// (space on send, data on receive) to become true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until the operation can complete, however long that takes.
    Indefinitely,
    /// Never block: check once, then give up immediately.
    NoWait,
    /// Block up to the given duration, measured from call entry.
    For(Duration),
}

impl Wait {
    /// Resolve the policy against the clock, once, at call entry.
    pub(crate) fn deadline(self) -> Deadline {
        match self {
            Wait::Indefinitely => Deadline::Never,
            Wait::NoWait => Deadline::Now,
            Wait::For(timeout) => Deadline::At(Instant::now() + timeout),
        }
    }
}

/// A [`Wait`] policy pinned to an absolute point in time.
///
/// Waits re-arm against this fixed instant, never against "now", so a run of
/// spurious wakeups cannot extend the total blocking time.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Deadline {
    Never,
    Now,
    At(Instant),
}

impl Deadline {
    /// Park on `condvar` until notified or the deadline passes.
    ///
    /// Returns `false` once the caller should stop retrying. The mutex is
    /// released for the duration of the wait and held again on return.
    pub(crate) fn park<T>(&self, condvar: &Condvar, guard: &mut MutexGuard<'_, T>) -> bool {
        match self {
            Deadline::Never => {
                condvar.wait(guard);
                true
            }
            Deadline::Now => false,
            Deadline::At(instant) => !condvar.wait_until(guard, *instant).timed_out(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wait_resolves_to_now() {
        assert!(matches!(Wait::NoWait.deadline(), Deadline::Now));
    }

    #[test]
    fn indefinite_resolves_to_never() {
        assert!(matches!(Wait::Indefinitely.deadline(), Deadline::Never));
    }

    #[test]
    fn timeout_resolves_to_future_instant() {
        let before = Instant::now();
        let deadline = Wait::For(Duration::from_millis(250)).deadline();
        let Deadline::At(instant) = deadline else {
            panic!("expected an absolute deadline, got {deadline:?}");
        };
        assert!(instant >= before + Duration::from_millis(250));
    }
}
