//! Fluent configuration for [`Topic`], grounded in the builder shape
//! widely used for multi-optional-argument constructors in the Rust
//! ecosystem (e.g. a `QueueBuilder` offering `with_message_capacity`,
//! `with_subscription_capacity`, `with_ttl` before a final `build`).

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use log::debug;

use super::{Inner, Topic, TopicState, reaper};
use crate::error::Mode;
use crate::queue::LinkedQueue;

/// Reaper interval used when a TTL is configured but no explicit interval
/// was requested: one fifth of the TTL, floored to avoid a busy-sweeping
/// thread for very small TTLs.
const DEFAULT_REAPER_FRACTION: u32 = 5;
const MIN_REAPER_INTERVAL: Duration = Duration::from_millis(10);

pub struct TopicBuilder {
    name: String,
    capacity: Option<usize>,
    ttl: Option<Duration>,
    mode: Mode,
    reaper_enabled: bool,
    reaper_interval: Option<Duration>,
}

impl TopicBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            ttl: None,
            mode: Mode::WorkQueue,
            reaper_enabled: true,
            reaper_interval: None,
        }
    }

    /// Bounds the topic (or, in fan-out mode, each subscriber created
    /// without its own explicit capacity) to `capacity` in-flight
    /// messages.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the message retention TTL. Spawns a reaper thread at `build()`
    /// unless [`TopicBuilder::disable_reaper`] was also called.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Switches the topic to fan-out (broadcast) mode.
    #[must_use]
    pub fn fanout(mut self) -> Self {
        self.mode = Mode::FanOut;
        self
    }

    /// Switches the topic to work-queue (competing consumer) mode. This is
    /// the default, so this method only matters when undoing a previous
    /// `.fanout()` call on the same builder.
    #[must_use]
    pub fn work_queue(mut self) -> Self {
        self.mode = Mode::WorkQueue;
        self
    }

    /// Explicit reaper sweep interval. Implies TTL-based eviction remains
    /// enabled; has no effect unless [`TopicBuilder::ttl`] is also set.
    #[must_use]
    pub fn reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = Some(interval);
        self
    }

    /// Disables the background reaper even if a TTL is configured.
    /// Expired messages are then only skipped/dropped on encounter by
    /// `dequeue`/`fanout_dequeue`/`enqueue`, never proactively reclaimed.
    #[must_use]
    pub fn disable_reaper(mut self) -> Self {
        self.reaper_enabled = false;
        self
    }

    pub fn build(self) -> Topic {
        let state = match self.mode {
            Mode::WorkQueue => TopicState::WorkQueue(LinkedQueue::new()),
            Mode::FanOut => TopicState::FanOut(std::collections::HashMap::new()),
        };

        let reaper_interval = self.reaper_interval.unwrap_or_else(|| {
            self.ttl
                .map(|ttl| (ttl / DEFAULT_REAPER_FRACTION).max(MIN_REAPER_INTERVAL))
                .unwrap_or(MIN_REAPER_INTERVAL)
        });

        let inner = Arc::new(Inner {
            name: self.name,
            capacity: self.capacity,
            ttl: self.ttl,
            mode: self.mode,
            state: Mutex::new(state),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            reaper_interval,
            reaper_stop: Mutex::new(false),
            reaper_wake: Condvar::new(),
            reaper_handle: Mutex::new(None),
        });

        if self.ttl.is_some() && self.reaper_enabled {
            let reaper_inner = inner.clone();
            let handle = thread::Builder::new()
                .name(format!("topic-reaper-{}", inner.name))
                .spawn(move || reaper::run(reaper_inner))
                .expect("failed to spawn topic reaper thread");
            debug!("topic '{}': reaper thread spawned", inner.name);
            *inner
                .reaper_handle
                .lock()
                .expect("reaper-handle lock poisoned") = Some(handle);
        }

        Topic(inner)
    }
}
