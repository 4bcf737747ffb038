//! # Message Subscriber
//!
//! Defines the subscription side of the bus and the `MessageSource` trait
//! every inbound transport implements.

use crate::filter::TopicFilter;
use async_trait::async_trait;
use shared_types::TransportMessage;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was closed.
    #[error("Bus closed")]
    Closed,
}

/// A source of inbound messages, consumed one at a time.
///
/// `None` means the source is exhausted and will never yield again.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next inbound message.
    async fn next_message(&mut self) -> Option<TransportMessage>;
}

/// A subscription handle for receiving messages.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    receiver: broadcast::Receiver<TransportMessage>,

    /// A message is delivered when ANY filter matches.
    filters: Vec<TopicFilter>,

    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    key: String,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<TransportMessage>,
        filters: Vec<TopicFilter>,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        key: String,
    ) -> Self {
        Self {
            receiver,
            filters,
            subscriptions,
            key,
        }
    }

    fn accepts(&self, message: &TransportMessage) -> bool {
        self.filters.iter().any(|f| f.matches(&message.topic))
    }

    /// Receive the next message that matches the filters.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next matching message
    /// - `None` - The channel was closed (broker dropped)
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        loop {
            let message = match self.receiver.recv().await {
                Ok(m) => m,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, filters = %self.key, "Subscriber lagged, messages dropped");
                    continue;
                }
            };

            if self.accepts(&message) {
                return Some(message);
            }
        }
    }

    /// Try to receive the next message without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A message was available and matched
    /// - `Ok(None)` - No message available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<TransportMessage>, SubscriptionError> {
        loop {
            let message = match self.receiver.try_recv() {
                Ok(m) => m,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.accepts(&message) {
                return Ok(Some(message));
            }
        }
    }

    /// Get the filters for this subscription.
    #[must_use]
    pub fn filters(&self) -> &[TopicFilter] {
        &self.filters
    }
}

#[async_trait]
impl MessageSource for Subscription {
    async fn next_message(&mut self) -> Option<TransportMessage> {
        self.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        let Some(count) = subs.get_mut(&self.key) else {
            debug!(filters = %self.key, "Subscription dropped");
            return;
        };

        *count = count.saturating_sub(1);
        if *count == 0 {
            subs.remove(&self.key);
        }
        debug!(filters = %self.key, "Subscription dropped");
    }
}
