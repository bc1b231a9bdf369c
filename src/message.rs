use std::time::{Duration, Instant};

/// An immutable unit of work moving through a [`Topic`](crate::Topic).
///
/// `id` and `content` are opaque to the broker (it never inspects or
/// compares them). `priority` and `work_ms` are caller-defined metadata
/// carried alongside the message; the broker does not use them to order or
/// schedule delivery (see the crate's Non-goals: no priority-ordered
/// dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: u64,
    content: String,
    created_at: Instant,
    priority: u8,
    work_ms: u32,
}

/// Default priority for a [`Message`] that doesn't specify one: `1 = low`.
pub const DEFAULT_PRIORITY: u8 = 1;
/// Default simulated work duration, in milliseconds, for a [`Message`].
pub const DEFAULT_WORK_MS: u32 = 50;

impl Message {
    /// Creates a message with default metadata (`priority = 1`, `work_ms =
    /// 50`), stamped with the current instant.
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            created_at: Instant::now(),
            priority: DEFAULT_PRIORITY,
            work_ms: DEFAULT_WORK_MS,
        }
    }

    /// Returns a copy of this message with `priority` overridden.
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a copy of this message with `work_ms` overridden.
    #[must_use]
    pub fn with_work_ms(mut self, work_ms: u32) -> Self {
        self.work_ms = work_ms;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn work_ms(&self) -> u32 {
        self.work_ms
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Age of this message relative to now, per the monotonic clock used
    /// for every TTL check in the crate.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.age() > ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn defaults_match_original_source() {
        let msg = Message::new(1, "hello");
        assert_eq!(msg.priority(), 1);
        assert_eq!(msg.work_ms(), 50);
    }

    #[test]
    fn builder_overrides_stick() {
        let msg = Message::new(7, "payload").with_priority(3).with_work_ms(120);
        assert_eq!(msg.priority(), 3);
        assert_eq!(msg.work_ms(), 120);
    }

    #[test]
    fn no_ttl_never_expires() {
        let msg = Message::new(1, "x");
        sleep(Duration::from_millis(5));
        assert!(!msg.is_expired(None));
    }

    #[test]
    fn expires_strictly_after_ttl() {
        let msg = Message::new(1, "x");
        assert!(!msg.is_expired(Some(Duration::from_secs(10))));
        sleep(Duration::from_millis(20));
        assert!(msg.is_expired(Some(Duration::from_millis(10))));
    }
}
