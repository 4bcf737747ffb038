//! # Shared Bus - In-Process Publish/Subscribe Transport
//!
//! An MQTT-shaped bus for driving the hub without a broker. The runtime
//! tests and the workspace integration tests use it in place of the
//! `rumqttc` session.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Publisher   │                    │  Ingest Loop │
//! │  (options/…) │    publish()       │ (presentation│
//! │              │ ──────┐            │   /+, data/+)│
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ InMemoryBroker│          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe(filter)
//! ```
//!
//! ## Semantics
//!
//! - Topic filters support `+` (one level) and `#` (remaining levels).
//! - Delivery is fire-and-forget: a message with no matching subscriber is
//!   dropped, like a non-retained MQTT publish.
//! - Slow subscribers lag; lagged messages are dropped and logged.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod filter;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use filter::{FilterError, TopicFilter};
pub use publisher::{check_publish_topic, InMemoryBroker, MessagePublisher};
pub use subscriber::{MessageSource, Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
