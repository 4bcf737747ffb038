//! # Message Publisher
//!
//! Defines the publishing side of the bus.

use crate::filter::{FilterError, TopicFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use shared_types::{OutboundMessage, PublishError, TransportMessage};
use shared_types::{MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Trait for handing messages to a transport.
///
/// Publishing is a non-blocking enqueue: implementations must not wait for
/// the broker to acknowledge delivery.
pub trait MessagePublisher: Send + Sync {
    /// Publish a message.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` when the transport refuses the message.
    fn publish(&self, message: OutboundMessage) -> Result<(), PublishError>;

    /// Total messages accepted for publishing.
    fn messages_published(&self) -> u64;
}

impl<T: MessagePublisher + ?Sized> MessagePublisher for Arc<T> {
    fn publish(&self, message: OutboundMessage) -> Result<(), PublishError> {
        (**self).publish(message)
    }

    fn messages_published(&self) -> u64 {
        (**self).messages_published()
    }
}

/// Reject topics a publisher may not use.
pub fn check_publish_topic(topic: &str) -> Result<(), PublishError> {
    if topic.is_empty()
        || topic.contains(SINGLE_LEVEL_WILDCARD)
        || topic.contains(MULTI_LEVEL_WILDCARD)
    {
        return Err(PublishError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics;
/// each subscription applies its own topic filter on receipt.
pub struct InMemoryBroker {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<TransportMessage>,

    /// Active subscription count by filter.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a new broker with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new broker with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: TopicFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let key = filter.as_str().to_string();

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(key.clone()).or_insert(0) += 1;
        }

        debug!(filter = %key, "New subscription created");

        Subscription::new(receiver, vec![filter], self.subscriptions.clone(), key)
    }

    /// Subscribe to several filters with one handle (e.g. `presentation/+` and `data/+`).
    pub fn subscribe_many<I, S>(&self, filters: I) -> Result<Subscription, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filters = filters
            .into_iter()
            .map(|f| TopicFilter::parse(f.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let key = filters
            .iter()
            .map(TopicFilter::as_str)
            .collect::<Vec<_>>()
            .join(",");

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(key.clone()).or_insert(0) += 1;
        }

        debug!(filters = %key, "New subscription created");

        Ok(Subscription::new(
            self.sender.subscribe(),
            filters,
            self.subscriptions.clone(),
            key,
        ))
    }

    /// Deliver a raw inbound message, as if a remote node had published it.
    pub fn inject(&self, message: TransportMessage) -> usize {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }

    /// Get the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the number of live subscriptions for a filter key.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &str) -> usize {
        self.subscriptions
            .read()
            .map(|subs| subs.get(filter).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePublisher for InMemoryBroker {
    fn publish(&self, message: OutboundMessage) -> Result<(), PublishError> {
        check_publish_topic(&message.topic)?;

        let topic = message.topic.clone();
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message.into_delivered()) {
            Ok(receivers) => {
                debug!(topic = %topic, receivers, "Message published");
            }
            Err(_) => {
                // Non-retained publish with nobody listening: dropped, as on a broker.
                debug!(topic = %topic, "Message dropped (no receivers)");
            }
        }
        Ok(())
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_no_subscribers() {
        let broker = InMemoryBroker::new();
        let msg = OutboundMessage::new("options/aabbccddeeff", b"{}".to_vec());

        assert!(broker.publish(msg).is_ok());
        assert_eq!(broker.messages_published(), 1);
    }

    #[test]
    fn test_publish_rejects_wildcard_topic() {
        let broker = InMemoryBroker::new();
        let msg = OutboundMessage::new("options/+", b"{}".to_vec());

        assert_eq!(
            broker.publish(msg),
            Err(PublishError::InvalidTopic("options/+".to_string()))
        );
        assert_eq!(broker.messages_published(), 0);
    }

    #[test]
    fn test_subscription_tracking() {
        let broker = InMemoryBroker::new();

        let _sub1 = broker.subscribe(TopicFilter::parse("data/+").unwrap());
        let _sub2 = broker.subscribe(TopicFilter::parse("data/+").unwrap());
        let _sub3 = broker.subscribe_many(["presentation/+", "data/+"]).unwrap();

        assert_eq!(broker.subscriber_count(), 3);
        assert_eq!(broker.subscriptions_for("data/+"), 2);
        assert_eq!(broker.subscriptions_for("presentation/+,data/+"), 1);
    }

    #[test]
    fn test_arc_publisher() {
        let broker = Arc::new(InMemoryBroker::with_capacity(16));
        let publisher: Arc<dyn MessagePublisher> = broker.clone();

        publisher
            .publish(OutboundMessage::new("options/aabbccddeeff", b"{}".to_vec()))
            .unwrap();

        assert_eq!(broker.messages_published(), 1);
        assert_eq!(broker.capacity(), 16);
    }
}
