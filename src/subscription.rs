//! Per-subscriber fan-out buffer.
//!
//! Each [`Subscription`] has its own [`LinkedQueue`], its own `Mutex`, and
//! its own `not_empty` `Condvar`. The design deliberately gives every
//! subscriber its own lock rather than sharing one lock across all
//! subscriber queues: a slow consumer draining its own queue never blocks a
//! fast consumer draining another. Only the owning [`Topic`](crate::Topic)
//! mutates a subscription's queue; the type itself exposes only a `size`
//! accessor for observability.

use std::sync::{Condvar, Mutex};

use crate::queue::LinkedQueue;

#[derive(Debug)]
pub struct Subscription {
    name: String,
    capacity: Option<usize>,
    pub(crate) inner: Mutex<LinkedQueue>,
    pub(crate) not_empty: Condvar,
}

impl Subscription {
    pub(crate) fn new(name: impl Into<String>, capacity: Option<usize>) -> Self {
        Self {
            name: name.into(),
            capacity,
            inner: Mutex::new(LinkedQueue::new()),
            not_empty: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Current number of buffered (undelivered) messages for this
    /// subscriber.
    pub fn size(&self) -> usize {
        self.inner.lock().expect("subscription lock poisoned").len()
    }

    pub(crate) fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.inner.lock().expect("subscription lock poisoned").len() >= cap,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscription_is_empty() {
        let sub = Subscription::new("a", Some(4));
        assert_eq!(sub.size(), 0);
        assert!(!sub.is_full());
    }

    #[test]
    fn unbounded_subscription_is_never_full() {
        let sub = Subscription::new("a", None);
        for i in 0..1000 {
            sub.inner
                .lock()
                .unwrap()
                .push(std::sync::Arc::new(crate::message::Message::new(i, "x")));
        }
        assert!(!sub.is_full());
    }

    #[test]
    fn full_once_capacity_reached() {
        let sub = Subscription::new("a", Some(2));
        let mut q = sub.inner.lock().unwrap();
        q.push(std::sync::Arc::new(crate::message::Message::new(1, "x")));
        assert!(!{
            drop(q);
            sub.is_full()
        });
        sub.inner
            .lock()
            .unwrap()
            .push(std::sync::Arc::new(crate::message::Message::new(2, "x")));
        assert!(sub.is_full());
    }
}
