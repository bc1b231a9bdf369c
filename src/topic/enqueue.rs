//! Producer-side operations.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use super::wait::{WaitPolicy, wait_until};
use super::{Topic, TopicState};
use crate::message::Message;

impl Topic {
    /// Publishes `msg`.
    ///
    /// - Work-queue mode: pushed to the single shared buffer, delivered to
    ///   exactly one consumer.
    /// - Fan-out mode: delivered to every subscriber that exists at the
    ///   moment the publish commits; a topic with no subscribers drops the
    ///   message and still returns `true` (nothing to do).
    ///
    /// `block`/`timeout` govern backpressure: with capacity configured and
    /// the buffer full (or, in fan-out mode, any subscriber full), the
    /// call waits per [`WaitPolicy`] and returns `false` on timeout or when
    /// `block` is `false`. An already-expired message is accepted (`true`)
    /// but silently dropped, so producer semantics don't depend on TTL.
    pub fn enqueue(&self, msg: Message, block: bool, timeout: Option<Duration>) -> bool {
        let policy = WaitPolicy::new(block, timeout);
        let msg = Arc::new(msg);
        match self.0.mode {
            crate::error::Mode::WorkQueue => self.enqueue_work_queue(msg, policy),
            crate::error::Mode::FanOut => self.enqueue_fan_out(msg, policy),
        }
    }

    fn enqueue_work_queue(&self, msg: crate::queue::Item, policy: WaitPolicy) -> bool {
        let capacity = self.0.capacity;
        let mut state = self.0.state.lock().expect("topic lock poisoned");

        if let Some(cap) = capacity {
            let (next_state, has_room) = wait_until(&self.0.not_full, state, policy, |s| {
                s.work_queue().is_some_and(|q| q.len() < cap)
            });
            state = next_state;
            if !has_room {
                trace!(
                    "topic '{}': enqueue gave up waiting for capacity",
                    self.0.name
                );
                return false;
            }
        }

        if msg.is_expired(self.0.ttl) {
            debug!(
                "topic '{}': dropping already-expired message {}",
                self.0.name,
                msg.id()
            );
            return true;
        }

        let queue = state.work_queue_mut().expect("work-queue topic");
        queue.push(msg);
        let size = queue.len();
        self.0.not_empty.notify_one();
        trace!("topic '{}': enqueued, size={}", self.0.name, size);
        true
    }

    fn enqueue_fan_out(&self, msg: crate::queue::Item, policy: WaitPolicy) -> bool {
        let mut state = self.0.state.lock().expect("topic lock poisoned");

        let has_subscribers = state
            .subscribers()
            .is_some_and(|subs| !subs.is_empty());
        if !has_subscribers {
            trace!(
                "topic '{}': no subscribers, dropping message {}",
                self.0.name,
                msg.id()
            );
            return true;
        }

        let (next_state, all_have_room) =
            wait_until(&self.0.not_full, state, policy, any_subscriber_full_negated);
        state = next_state;
        if !all_have_room {
            trace!(
                "topic '{}': enqueue gave up waiting for subscriber capacity",
                self.0.name
            );
            return false;
        }

        if msg.is_expired(self.0.ttl) {
            debug!(
                "topic '{}': dropping already-expired broadcast message {}",
                self.0.name,
                msg.id()
            );
            return true;
        }

        let subs = state.subscribers().expect("fan-out topic");
        for sub in subs.values() {
            let mut queue = sub.inner.lock().expect("subscription lock poisoned");
            queue.push(msg.clone());
            sub.not_empty.notify_one();
        }
        trace!(
            "topic '{}': broadcast to {} subscriber(s)",
            self.0.name,
            subs.len()
        );
        true
    }
}

fn any_subscriber_full_negated(state: &TopicState) -> bool {
    match state.subscribers() {
        Some(subs) => !subs.values().any(|s| s.is_full()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::super::Topic;
    use crate::message::Message;
    use std::time::Duration;

    #[test]
    fn enqueue_non_blocking_fails_when_full() {
        let topic = Topic::builder("t").capacity(1).build();
        assert!(topic.enqueue(Message::new(1, "a"), false, None));
        assert!(!topic.enqueue(Message::new(2, "b"), false, None));
        assert_eq!(topic.size(), 1);
    }

    #[test]
    fn enqueue_blocking_times_out_when_full() {
        let topic = Topic::builder("t").capacity(1).build();
        assert!(topic.enqueue(Message::new(1, "a"), true, None));
        let ok = topic.enqueue(Message::new(2, "b"), true, Some(Duration::from_millis(20)));
        assert!(!ok);
        assert_eq!(topic.size(), 1);
    }

    #[test]
    fn enqueue_already_expired_message_is_dropped_but_reports_success() {
        let topic = Topic::builder("t").ttl(Duration::from_millis(5)).disable_reaper().build();
        std::thread::sleep(Duration::from_millis(10));
        let accepted = topic.enqueue(Message::new(1, "stale"), false, None);
        assert!(accepted);
        assert_eq!(topic.size(), 0);
    }

    #[test]
    fn fan_out_with_no_subscribers_drops_message() {
        let topic = Topic::builder("t").fanout().build();
        assert!(topic.enqueue(Message::new(1, "a"), false, None));
        assert_eq!(topic.size(), 0);
    }

    #[test]
    fn fan_out_broadcasts_to_every_subscriber() {
        let topic = Topic::builder("t").fanout().build();
        let a = topic.subscribe("a", None).unwrap();
        let b = topic.subscribe("b", None).unwrap();
        assert!(topic.enqueue(Message::new(1, "hi"), false, None));
        assert_eq!(a.size(), 1);
        assert_eq!(b.size(), 1);
    }

    #[test]
    fn fan_out_blocks_until_every_subscriber_has_room() {
        let topic = Topic::builder("t").fanout().capacity(1).build();
        let slow = topic.subscribe("slow", None).unwrap();
        let fast = topic.subscribe("fast", None).unwrap();
        assert!(topic.enqueue(Message::new(1, "a"), false, None));

        let ok = topic.enqueue(Message::new(2, "b"), true, Some(Duration::from_millis(20)));
        assert!(!ok, "publish should block while either subscriber is still full");

        // Draining only one of the two still leaves the other full.
        assert_eq!(topic.fanout_dequeue(&slow, false, None).unwrap().unwrap().id(), 1);
        let ok = topic.enqueue(Message::new(2, "b"), true, Some(Duration::from_millis(20)));
        assert!(!ok, "'fast' is still full");

        assert_eq!(topic.fanout_dequeue(&fast, false, None).unwrap().unwrap().id(), 1);
        assert!(topic.enqueue(Message::new(3, "c"), true, Some(Duration::from_millis(200))));
    }
}
