//! # Topic Namespace
//!
//! Constants for the two-level topic namespace used by sensor nodes.

/// Separator between topic levels.
pub const TOPIC_SEPARATOR: char = '/';

/// Single-level wildcard for subscriptions.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";

/// Multi-level wildcard for subscriptions (last level only).
pub const MULTI_LEVEL_WILDCARD: &str = "#";

/// Category of the reply topic carrying per-node options.
pub const OPTIONS_CATEGORY: &str = "options";

/// Build the subscription filter for a category: `<category>/+`.
#[must_use]
pub fn category_subscription(category: &str) -> String {
    format!("{category}{TOPIC_SEPARATOR}{SINGLE_LEVEL_WILDCARD}")
}

/// Build the reply topic for a node: `options/<hardware-address>`.
#[must_use]
pub fn options_topic(hardware_address: &str) -> String {
    format!("{OPTIONS_CATEGORY}{TOPIC_SEPARATOR}{hardware_address}")
}
