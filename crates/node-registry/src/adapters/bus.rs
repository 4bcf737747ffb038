//! # Bus Adapter
//!
//! Bridges `OptionsPublisher` onto any `shared_bus::MessagePublisher`: the
//! in-process broker in tests, the MQTT client in production.

use crate::ports::outbound::OptionsPublisher;
use shared_bus::MessagePublisher;
use shared_types::{DeliveryQos, OutboundMessage, PublishError};

/// Publishes options as non-retained messages at a fixed QoS.
pub struct BusOptionsPublisher<P: MessagePublisher> {
    inner: P,
    qos: DeliveryQos,
}

impl<P: MessagePublisher> BusOptionsPublisher<P> {
    /// Publish at least once, the delivery level nodes subscribe with.
    pub fn new(inner: P) -> Self {
        Self::with_qos(inner, DeliveryQos::AtLeastOnce)
    }

    pub fn with_qos(inner: P, qos: DeliveryQos) -> Self {
        Self { inner, qos }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: MessagePublisher> OptionsPublisher for BusOptionsPublisher<P> {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.inner
            .publish(OutboundMessage::new(topic, payload).with_qos(self.qos))
    }
}
