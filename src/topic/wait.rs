//! Deadline bookkeeping and the re-checking condvar wait loop shared by
//! every blocking operation on [`Topic`](crate::Topic) and
//! [`Subscription`](crate::Subscription).

use std::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// How a blocking operation should behave when its wait condition isn't
/// met yet.
#[derive(Clone, Copy)]
pub(crate) enum WaitPolicy {
    /// Check once, return immediately either way. Also what `block=true`
    /// with a zero timeout collapses to, per spec.
    NonBlocking,
    /// Wait with no time limit.
    Infinite,
    /// Wait until this instant, computed once at call entry.
    Deadline(Instant),
}

impl WaitPolicy {
    pub(crate) fn new(block: bool, timeout: Option<Duration>) -> Self {
        if !block {
            return WaitPolicy::NonBlocking;
        }
        match timeout {
            None => WaitPolicy::Infinite,
            Some(d) if d.is_zero() => WaitPolicy::NonBlocking,
            Some(d) => WaitPolicy::Deadline(Instant::now() + d),
        }
    }
}

/// Waits on `cv` until `met(&guard)` holds or `policy` runs out of
/// patience, re-checking `met` after every wakeup (including spurious
/// ones) so the caller never observes a violated invariant.
///
/// Returns the (possibly reacquired) guard and whether `met` held when the
/// function returned.
pub(crate) fn wait_until<'a, T>(
    cv: &Condvar,
    mut guard: MutexGuard<'a, T>,
    policy: WaitPolicy,
    mut met: impl FnMut(&T) -> bool,
) -> (MutexGuard<'a, T>, bool) {
    loop {
        if met(&guard) {
            return (guard, true);
        }
        match policy {
            WaitPolicy::NonBlocking => return (guard, false),
            WaitPolicy::Infinite => {
                guard = cv.wait(guard).expect("lock poisoned");
            }
            WaitPolicy::Deadline(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return (guard, false);
                }
                let (next_guard, _timed_out) =
                    cv.wait_timeout(guard, deadline - now).expect("lock poisoned");
                guard = next_guard;
            }
        }
    }
}
