//! The concurrency core of the crate.
//!
//! A [`Topic`] owns either a single shared buffer (work-queue mode, FIFO,
//! competing consumers) or a set of per-subscriber [`Subscription`]s
//! (fan-out mode, broadcast). One `Mutex` (the "topic lock") protects
//! whichever of the two the topic was built with, paired with a
//! `not_empty` condvar (work-queue only) and a `not_full` condvar (both
//! modes, used by producers waiting for room).
//!
//! ```text
//!  work-queue                         fan-out
//!  ┌────────────┐                     ┌────────────┐
//!  │   Topic    │                     │   Topic    │
//!  │  (1 lock)  │                     │  (1 lock)  │
//!  └─────┬──────┘                     └─────┬──────┘
//!        │ LinkedQueue                       │ name -> Subscription
//!        ▼                             ┌─────┴─────┬─────────────┐
//!   producers ⇄ consumers              ▼           ▼             ▼
//!                                 Subscription  Subscription  Subscription
//!                                  (own lock)    (own lock)    (own lock)
//! ```
//!
//! Lock order in fan-out mode is always topic lock, then Subscription
//! locks in iteration order. A consumer draining its own Subscription
//! only takes that Subscription's lock; it never nests the topic lock
//! underneath it, which rules out deadlock against a broadcasting
//! producer. After releasing the Subscription lock, a consumer that freed
//! capacity takes the topic lock on its own, separately, just to notify
//! blocked producers: `Condvar::wait` releases the topic lock atomically
//! with registering the wait, so a notify sent by anyone not holding that
//! same lock at the time can still land in the gap before the wait call
//! and be lost.

mod builder;
mod dequeue;
mod enqueue;
mod reaper;
mod wait;

pub use builder::TopicBuilder;

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::debug;

use crate::error::{DuplicateSubscriber, Mode, ModeError, Operation};
use crate::queue::LinkedQueue;
use crate::subscription::Subscription;

pub(crate) enum TopicState {
    WorkQueue(LinkedQueue),
    FanOut(HashMap<String, Arc<Subscription>>),
}

impl TopicState {
    fn work_queue(&self) -> Option<&LinkedQueue> {
        match self {
            TopicState::WorkQueue(q) => Some(q),
            TopicState::FanOut(_) => None,
        }
    }

    fn work_queue_mut(&mut self) -> Option<&mut LinkedQueue> {
        match self {
            TopicState::WorkQueue(q) => Some(q),
            TopicState::FanOut(_) => None,
        }
    }

    fn subscribers(&self) -> Option<&HashMap<String, Arc<Subscription>>> {
        match self {
            TopicState::FanOut(map) => Some(map),
            TopicState::WorkQueue(_) => None,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) name: String,
    pub(crate) capacity: Option<usize>,
    pub(crate) ttl: Option<Duration>,
    pub(crate) mode: Mode,
    pub(crate) state: Mutex<TopicState>,
    pub(crate) not_empty: Condvar,
    pub(crate) not_full: Condvar,
    reaper_interval: Duration,
    reaper_stop: Mutex<bool>,
    reaper_wake: Condvar,
    reaper_handle: Mutex<Option<JoinHandle<()>>>,
}

/// A named delivery channel, in either work-queue (competing consumers) or
/// fan-out (broadcast) mode.
///
/// Cheaply cloneable: cloning a `Topic` shares the same underlying buffers
/// and locks, which is the intended way to hand it to producer/consumer
/// threads.
#[derive(Clone)]
pub struct Topic(pub(crate) Arc<Inner>);

impl Topic {
    /// Shorthand for `Topic::builder(name).build()`: unbounded,
    /// no TTL, work-queue mode, no reaper.
    pub fn new(name: impl Into<String>) -> Self {
        TopicBuilder::new(name).build()
    }

    /// Starts configuring a [`Topic`] via [`TopicBuilder`].
    pub fn builder(name: impl Into<String>) -> TopicBuilder {
        TopicBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.0.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.0.ttl
    }

    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    /// Registers a new subscriber. Only valid in fan-out mode.
    pub fn subscribe(
        &self,
        name: impl Into<String>,
        capacity: Option<usize>,
    ) -> Result<Arc<Subscription>, SubscribeError> {
        if self.0.mode != Mode::FanOut {
            log::warn!(
                "topic '{}': subscribe called on a {} topic",
                self.0.name,
                self.0.mode
            );
            return Err(SubscribeError::Mode(ModeError {
                operation: Operation::Subscribe,
                actual_mode: self.0.mode,
            }));
        }
        let name = name.into();
        let mut state = self.0.state.lock().expect("topic lock poisoned");
        let TopicState::FanOut(map) = &mut *state else {
            unreachable!("mode checked above");
        };
        if map.contains_key(&name) {
            log::warn!(
                "topic '{}': duplicate subscriber '{}'",
                self.0.name,
                name
            );
            return Err(SubscribeError::Duplicate(DuplicateSubscriber { name }));
        }
        let sub = Arc::new(Subscription::new(name.clone(), capacity));
        map.insert(name.clone(), sub.clone());
        debug!("topic '{}': subscriber '{}' registered", self.0.name, name);
        Ok(sub)
    }

    /// Total buffered (undelivered) messages: the main queue's length in
    /// work-queue mode, or the sum across subscribers in fan-out mode.
    pub fn size(&self) -> usize {
        let state = self.0.state.lock().expect("topic lock poisoned");
        match &*state {
            TopicState::WorkQueue(q) => q.len(),
            TopicState::FanOut(map) => map.values().map(|s| s.size()).sum(),
        }
    }

    /// Per-subscriber buffered counts. Empty in work-queue mode.
    pub fn sizes_by_subscriber(&self) -> HashMap<String, usize> {
        let state = self.0.state.lock().expect("topic lock poisoned");
        match &*state {
            TopicState::WorkQueue(_) => HashMap::new(),
            TopicState::FanOut(map) => map.iter().map(|(k, v)| (k.clone(), v.size())).collect(),
        }
    }

    /// Stops and joins the reaper thread, if one is running. Idempotent:
    /// safe to call more than once, and returns promptly on repeat calls.
    pub fn teardown(&self) {
        *self.0.reaper_stop.lock().expect("reaper-stop lock poisoned") = true;
        self.0.reaper_wake.notify_all();
        let handle = self
            .0
            .reaper_handle
            .lock()
            .expect("reaper-handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            debug!("topic '{}': joining reaper thread", self.0.name);
            let _ = handle.join();
        }
    }
}

/// Error returned by [`Topic::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    Mode(ModeError),
    Duplicate(DuplicateSubscriber),
}

impl std::fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::Mode(e) => e.fmt(f),
            SubscribeError::Duplicate(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for SubscribeError {}
