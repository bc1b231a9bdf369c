//! Consumer-side operations.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};

use super::Topic;
use super::wait::{WaitPolicy, wait_until};
use crate::error::{Mode, ModeError, Operation};
use crate::message::Message;
use crate::subscription::Subscription;

impl Topic {
    /// Takes the next message from the shared buffer. Only valid in
    /// work-queue mode.
    ///
    /// Expired heads are skipped (and counted toward freed capacity, not
    /// toward this call's receipt) until a live message is found or the
    /// buffer empties. An empty buffer after skipping returns `None` even
    /// though the call may have been told to block, exactly like a plain
    /// empty-buffer timeout: the caller is expected to retry.
    pub fn dequeue(&self, block: bool, timeout: Option<Duration>) -> Result<Option<Arc<Message>>, ModeError> {
        if self.0.mode != Mode::WorkQueue {
            warn!("topic '{}': dequeue called on a fan-out topic", self.0.name);
            return Err(ModeError {
                operation: Operation::Dequeue,
                actual_mode: self.0.mode,
            });
        }

        let policy = WaitPolicy::new(block, timeout);
        let mut state = self.0.state.lock().expect("topic lock poisoned");

        let (next_state, became_non_empty) = wait_until(&self.0.not_empty, state, policy, |s| {
            s.work_queue().is_some_and(|q| !q.is_empty())
        });
        state = next_state;
        if !became_non_empty {
            return Ok(None);
        }

        let queue = state.work_queue_mut().expect("work-queue topic");
        let ttl = self.0.ttl;
        while let Ok(head) = queue.peek() {
            if !head.is_expired(ttl) {
                break;
            }
            let expired = queue.pop().expect("peeked head must pop");
            debug!(
                "topic '{}': skipped expired message {} on dequeue",
                self.0.name,
                expired.id()
            );
            if self.0.capacity.is_some() {
                self.0.not_full.notify_one();
            }
        }

        if queue.is_empty() {
            return Ok(None);
        }
        let msg = queue.pop().expect("checked non-empty above");
        if self.0.capacity.is_some() {
            self.0.not_full.notify_one();
        }
        trace!("topic '{}': dequeued message {}", self.0.name, msg.id());
        Ok(Some(msg))
    }

    /// Takes the next message from `sub`'s own buffer. Only valid in
    /// fan-out mode. Mirrors [`Topic::dequeue`]'s expired-head skipping,
    /// but also wakes the topic-level not-full condvar on every removal so
    /// a producer blocked on this subscriber being full can proceed.
    pub fn fanout_dequeue(
        &self,
        sub: &Subscription,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<Option<Arc<Message>>, ModeError> {
        if self.0.mode != Mode::FanOut {
            warn!(
                "topic '{}': fanout_dequeue called on a work-queue topic",
                self.0.name
            );
            return Err(ModeError {
                operation: Operation::FanoutDequeue,
                actual_mode: self.0.mode,
            });
        }

        let policy = WaitPolicy::new(block, timeout);
        let mut queue = sub.inner.lock().expect("subscription lock poisoned");

        let (next_queue, became_non_empty) =
            wait_until(&sub.not_empty, queue, policy, |q| !q.is_empty());
        queue = next_queue;
        if !became_non_empty {
            return Ok(None);
        }

        let ttl = self.0.ttl;
        let mut freed = 0u32;
        while let Ok(head) = queue.peek() {
            if !head.is_expired(ttl) {
                break;
            }
            let expired = queue.pop().expect("peeked head must pop");
            debug!(
                "topic '{}': subscriber '{}' skipped expired message {}",
                self.0.name,
                sub.name(),
                expired.id()
            );
            freed += 1;
        }

        let popped = if queue.is_empty() {
            None
        } else {
            let msg = queue.pop().expect("checked non-empty above");
            freed += 1;
            Some(msg)
        };

        // Drop the subscription lock before taking the topic lock to notify:
        // the waiting producer's predicate check and its `cv.wait` call are
        // atomic with respect to the topic lock, so a notify sent without
        // holding that same lock can land in the gap between the two and be
        // lost. Taking it here, after releasing the subscription lock,
        // keeps the topic-then-subscription lock order intact.
        drop(queue);
        for _ in 0..freed {
            let _state = self.0.state.lock().expect("topic lock poisoned");
            self.0.not_full.notify_one();
        }

        match popped {
            Some(msg) => {
                trace!(
                    "topic '{}': subscriber '{}' dequeued message {}",
                    self.0.name,
                    sub.name(),
                    msg.id()
                );
                Ok(Some(msg))
            }
            None => Ok(None),
        }
    }
}
