//! # Shared Types Crate
//!
//! This crate contains the message types exchanged with the publish/subscribe
//! transport and the errors every transport adapter reports.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Inbound and outbound message shapes are
//!   defined once, here, and consumed by `shared-bus`, `node-registry` and
//!   `hub-runtime`.
//! - **Transport Agnostic**: Nothing in this crate knows about MQTT sessions;
//!   adapters translate their wire packets into `TransportMessage`.
//! - **Two-Level Topics**: Topics follow `<category>/<hardware-address>`.

pub mod errors;
pub mod message;
pub mod topic;

pub use errors::*;
pub use message::{DeliveryQos, MessageId, OutboundMessage, TransportMessage};
pub use topic::*;
