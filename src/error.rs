//! Error types raised by [`Topic`](crate::Topic)'s public operations.
//!
//! Both kinds here are synchronous, non-retryable signals of caller
//! misuse (calling an operation in the wrong mode, or registering a
//! subscriber name twice). Timeouts, full buffers, expired messages and an
//! absent subscriber are all expected operational outcomes and are modeled
//! as return values (`false`, `None`, a silent drop), not errors.

use std::fmt;

/// The delivery mode a [`Topic`](crate::Topic) was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    WorkQueue,
    FanOut,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::WorkQueue => write!(f, "work-queue"),
            Mode::FanOut => write!(f, "fan-out"),
        }
    }
}

/// The operation a [`ModeError`] was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Dequeue,
    FanoutDequeue,
    Subscribe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Dequeue => write!(f, "dequeue"),
            Operation::FanoutDequeue => write!(f, "fanout_dequeue"),
            Operation::Subscribe => write!(f, "subscribe"),
        }
    }
}

/// Raised when an operation is invoked on a [`Topic`](crate::Topic) in the
/// wrong mode: `dequeue` on a fan-out topic, `fanout_dequeue` or
/// `subscribe` on a work-queue topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeError {
    pub operation: Operation,
    pub actual_mode: Mode,
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` is not valid on a {} topic",
            self.operation, self.actual_mode
        )
    }
}

impl std::error::Error for ModeError {}

/// Raised by `subscribe` when the given name is already registered on the
/// topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSubscriber {
    pub name: String,
}

impl fmt::Display for DuplicateSubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber '{}' already exists", self.name)
    }
}

impl std::error::Error for DuplicateSubscriber {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_error_message_names_operation_and_mode() {
        let err = ModeError {
            operation: Operation::Dequeue,
            actual_mode: Mode::FanOut,
        };
        assert_eq!(err.to_string(), "`dequeue` is not valid on a fan-out topic");
    }

    #[test]
    fn duplicate_subscriber_message_names_subscriber() {
        let err = DuplicateSubscriber {
            name: "alice".to_string(),
        };
        assert_eq!(err.to_string(), "subscriber 'alice' already exists");
    }
}
