//! # Integration Tests
//!
//! Cross-crate flows: `shared-bus` transport, `hub-runtime` wiring and the
//! `node-registry` service together.

pub mod hub_flows;
pub mod lifecycle;
