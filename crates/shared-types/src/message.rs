//! # Transport Messages
//!
//! Inbound and outbound message envelopes. Adapters convert their own wire
//! packets (MQTT `Publish`, in-process bus frames) into these types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation id assigned to every message on receipt.
///
/// Nodes do not send ids; this exists so that every log line produced while
/// handling one message can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery guarantee requested from the transport.
///
/// The hub inherits whatever the transport provides; this only selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryQos {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// A message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Correlation id (assigned locally).
    pub id: MessageId,
    /// Raw topic, e.g. `presentation/aa:bb:cc:dd:ee:ff`.
    pub topic: String,
    /// Raw payload bytes (expected to be UTF-8 JSON).
    pub payload: Vec<u8>,
}

impl TransportMessage {
    /// Create a message with a fresh correlation id.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: MessageId::new(),
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Payload as text, lossily decoded. For logging only.
    #[must_use]
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// A message to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: DeliveryQos,
    pub retain: bool,
}

impl OutboundMessage {
    /// Non-retained, at-least-once message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: DeliveryQos::AtLeastOnce,
            retain: false,
        }
    }

    #[must_use]
    pub fn with_qos(mut self, qos: DeliveryQos) -> Self {
        self.qos = qos;
        self
    }

    /// Turn this outbound message into what a subscriber on the same bus sees.
    #[must_use]
    pub fn into_delivered(self) -> TransportMessage {
        TransportMessage::new(self.topic, self.payload)
    }
}
