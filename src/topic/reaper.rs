//! The background sweep thread.
//!
//! Bounds the delay between a message expiring and its physical removal,
//! so capacity is freed even when no consumer is polling. Optional: only
//! spawned by [`TopicBuilder::build`](super::TopicBuilder::build) when a
//! TTL is configured and the reaper isn't explicitly disabled.

use std::sync::Arc;

use log::debug;

use super::{Inner, TopicState};
use crate::error::Mode;

pub(super) fn run(inner: Arc<Inner>) {
    loop {
        let should_stop = {
            let stop = inner.reaper_stop.lock().expect("reaper-stop lock poisoned");
            let (stop, _timed_out) = inner
                .reaper_wake
                .wait_timeout(stop, inner.reaper_interval)
                .expect("reaper-stop lock poisoned");
            *stop
        };
        if should_stop {
            break;
        }
        sweep(&inner);
    }
    debug!("topic '{}': reaper thread stopped", inner.name);
}

fn sweep(inner: &Inner) {
    match inner.mode {
        Mode::WorkQueue => sweep_work_queue(inner),
        Mode::FanOut => sweep_fan_out(inner),
    }
}

fn sweep_work_queue(inner: &Inner) {
    let ttl = inner.ttl;
    let removed = {
        let mut state = inner.state.lock().expect("topic lock poisoned");
        let TopicState::WorkQueue(queue) = &mut *state else {
            return;
        };
        queue.remove_matching(|m| m.is_expired(ttl))
    };
    if removed > 0 {
        debug!(
            "topic '{}': reaper swept {} expired message(s)",
            inner.name, removed
        );
        if inner.capacity.is_some() {
            inner.not_full.notify_all();
        }
    }
}

fn sweep_fan_out(inner: &Inner) {
    // Snapshot the subscriber set under the topic lock, then release it
    // before touching individual Subscription locks: the reaper never
    // holds two locks at once, mirroring every other code path.
    let subs = {
        let state = inner.state.lock().expect("topic lock poisoned");
        match &*state {
            TopicState::FanOut(map) => map.values().cloned().collect::<Vec<_>>(),
            TopicState::WorkQueue(_) => return,
        }
    };

    let ttl = inner.ttl;
    let mut total_removed = 0;
    for sub in &subs {
        let mut queue = sub.inner.lock().expect("subscription lock poisoned");
        total_removed += queue.remove_matching(|m| m.is_expired(ttl));
    }

    if total_removed > 0 {
        debug!(
            "topic '{}': reaper swept {} expired message(s) across {} subscriber(s)",
            inner.name,
            total_removed,
            subs.len()
        );
        // Each removal happened under its own Subscription's lock, not the
        // topic lock a blocked producer holds across its predicate check and
        // `cv.wait` call, so the notify has to be ordered against that lock
        // too, or it can land in the gap between the two and be lost.
        let _state = inner.state.lock().expect("topic lock poisoned");
        inner.not_full.notify_all();
    }
}
