//! # MQTT Transport
//!
//! `rumqttc` adapters for both sides of the broker session.
//!
//! - `MqttSource` drives the event loop and yields inbound `Publish` packets
//!   as `TransportMessage`s. Subscriptions are (re)issued on every `ConnAck`,
//!   so a clean-session reconnect restores them.
//! - `MqttPublisher` enqueues outbound messages with `try_publish`; it never
//!   waits for the event loop.
//!
//! Both halves share one `AsyncClient`. The source must be polled for
//! anything to reach the broker.

use crate::config::BrokerConfig;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Packet, QoS};
use shared_bus::{check_publish_topic, MessagePublisher, MessageSource};
use shared_types::{DeliveryQos, OutboundMessage, PublishError, TransportMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// Outgoing request queue depth of the client.
pub const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Consecutive poll errors logged at `error` before the source goes quiet.
const LOGGED_ERRORS: u32 = 3;

const BASE_RECONNECT_DELAY: Duration = Duration::from_millis(500);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Build client options from configuration.
#[must_use]
pub fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    options.set_clean_session(true);
    if let Some((username, password)) = config.credentials() {
        options.set_credentials(username, password);
    }
    options
}

/// Create the client and split it into its publishing and receiving halves.
#[must_use]
pub fn connect(config: &BrokerConfig, filters: Vec<String>) -> (MqttPublisher, MqttSource) {
    let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CHANNEL_CAPACITY);
    info!(
        host = %config.host,
        port = config.port,
        client_id = %config.client_id,
        "[mqtt] Client created"
    );
    (
        MqttPublisher::new(client.clone()),
        MqttSource::new(client, eventloop, filters),
    )
}

#[must_use]
pub fn to_qos(qos: DeliveryQos) -> QoS {
    match qos {
        DeliveryQos::AtMostOnce => QoS::AtMostOnce,
        DeliveryQos::AtLeastOnce => QoS::AtLeastOnce,
        DeliveryQos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

fn to_publish_error(topic: &str, error: ClientError) -> PublishError {
    match error {
        ClientError::TryRequest(_) => PublishError::QueueFull {
            topic: topic.to_string(),
        },
        ClientError::Request(_) => PublishError::Disconnected,
    }
}

/// Delay before the next poll after `attempt` consecutive failures.
#[must_use]
pub fn reconnect_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(6);
    (BASE_RECONNECT_DELAY * factor).min(MAX_RECONNECT_DELAY)
}

/// Inbound half: yields every `Publish` received on the subscribed filters.
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    filters: Vec<String>,
    consecutive_errors: u32,
}

impl MqttSource {
    pub fn new(client: AsyncClient, eventloop: EventLoop, filters: Vec<String>) -> Self {
        Self {
            client,
            eventloop,
            filters,
            consecutive_errors: 0,
        }
    }

    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    fn subscribe_all(&self) {
        for filter in &self.filters {
            match self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                Ok(()) => info!(filter = %filter, "[mqtt] Subscribed"),
                Err(e) => error!(filter = %filter, error = %e, "[mqtt] Subscribe failed"),
            }
        }
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn next_message(&mut self) -> Option<TransportMessage> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.consecutive_errors = 0;
                    return Some(TransportMessage::new(publish.topic, publish.payload.to_vec()));
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    self.consecutive_errors = 0;
                    info!(code = ?ack.code, "[mqtt] Connected to broker");
                    self.subscribe_all();
                }
                Ok(Event::Incoming(packet)) => {
                    self.consecutive_errors = 0;
                    debug!(?packet, "[mqtt] Incoming packet");
                }
                Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                    if self.consecutive_errors <= LOGGED_ERRORS {
                        error!(error = %e, attempt = self.consecutive_errors, "[mqtt] Connection error");
                    }
                    tokio::time::sleep(reconnect_delay(self.consecutive_errors)).await;
                }
            }
        }
    }
}

/// Outbound half: non-blocking enqueue onto the client's request channel.
pub struct MqttPublisher {
    client: AsyncClient,
    published: AtomicU64,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self {
            client,
            published: AtomicU64::new(0),
        }
    }
}

impl MessagePublisher for MqttPublisher {
    fn publish(&self, message: OutboundMessage) -> Result<(), PublishError> {
        check_publish_topic(&message.topic)?;

        let OutboundMessage {
            topic,
            payload,
            qos,
            retain,
        } = message;
        self.client
            .try_publish(topic.as_str(), to_qos(qos), retain, payload)
            .map_err(|e| to_publish_error(&topic, e))?;

        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(topic = %topic, "[mqtt] Publish queued");
        Ok(())
    }

    fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
