//! An in-process message broker: bounded, TTL-aware topics with either
//! work-queue (competing consumer) or fan-out (broadcast) delivery.
//!
//! ```
//! use switchboard::{Message, Topic};
//!
//! let topic = Topic::new("jobs");
//! assert!(topic.enqueue(Message::new(1, "render frame"), false, None));
//! let job = topic.dequeue(false, None).unwrap().unwrap();
//! assert_eq!(job.content(), "render frame");
//! ```
//!
//! Use [`Topic::builder`] to configure capacity, TTL and mode:
//!
//! ```
//! use std::time::Duration;
//! use switchboard::{Message, Topic};
//!
//! let topic = Topic::builder("events")
//!     .fanout()
//!     .capacity(100)
//!     .ttl(Duration::from_secs(60))
//!     .build();
//!
//! let sub = topic.subscribe("audit-log", None).unwrap();
//! topic.enqueue(Message::new(1, "user.created"), false, None);
//! let received = topic.fanout_dequeue(&sub, false, None).unwrap();
//! assert!(received.is_some());
//! topic.teardown();
//! ```

mod error;
mod message;
mod queue;
mod subscription;
mod topic;

pub use error::{DuplicateSubscriber, Mode, ModeError, Operation};
pub use message::{DEFAULT_PRIORITY, DEFAULT_WORK_MS, Message};
pub use subscription::Subscription;
pub use topic::{SubscribeError, Topic, TopicBuilder};
