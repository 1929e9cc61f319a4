//! In-process broker backed by tokio broadcast channels.
//!
//! One broadcast channel per topic; every subscription gets its own
//! receiver, so delivery semantics match the Redis implementation
//! (every subscriber, publisher included, sees each publish).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::warn;

use super::{Broker, Subscription};
use crate::shared::error::AppError;

const TOPIC_CAPACITY: usize = 256;

/// Broker for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryBroker {
    topics: Arc<DashMap<String, broadcast::Sender<String>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), AppError> {
        // A publish with no subscribers is fine; drop it like Redis would
        if let Some(sender) = self.topics.get(topic).map(|entry| entry.value().clone()) {
            let _ = sender.send(payload.to_string());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, AppError> {
        // Subscribe while holding the shard lock so a concurrent drop of the
        // last receiver cannot prune the entry out from under us
        let rx = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();
        Ok(Box::new(MemorySubscription {
            rx,
            topic: topic.to_string(),
            topics: Arc::clone(&self.topics),
        }))
    }
}

struct MemorySubscription {
    rx: broadcast::Receiver<String>,
    topic: String,
    topics: Arc<DashMap<String, broadcast::Sender<String>>>,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        // The count still includes this receiver; prune when it is the last
        self.topics
            .remove_if(&self.topic, |_, sender| sender.receiver_count() <= 1);
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_message(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Subscription lagged, dropping messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_reaches_all_topic_subscribers() {
        let broker = MemoryBroker::new();
        let mut sub_a = broker.subscribe("nerds").await.unwrap();
        let mut sub_b = broker.subscribe("nerds").await.unwrap();

        broker.publish("nerds", "hello").await.unwrap();

        assert_eq!(sub_a.next_message().await.as_deref(), Some("hello"));
        assert_eq!(sub_b.next_message().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_other_topics_are_isolated() {
        let broker = MemoryBroker::new();
        let mut other = broker.subscribe("other").await.unwrap();

        broker.publish("nerds", "hello").await.unwrap();
        broker.publish("other", "bye").await.unwrap();

        // The first message on "other" is its own publish, not "nerds"'s
        assert_eq!(other.next_message().await.as_deref(), Some("bye"));
    }

    #[tokio::test]
    async fn test_publisher_receives_its_own_publish() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe("echo").await.unwrap();

        broker.publish("echo", "self").await.unwrap();

        assert_eq!(sub.next_message().await.as_deref(), Some("self"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let broker = MemoryBroker::new();
        assert!(broker.publish("empty", "dropped").await.is_ok());
        assert!(broker.topics.is_empty());
    }

    #[tokio::test]
    async fn test_topic_entry_released_with_last_subscriber() {
        let broker = MemoryBroker::new();
        let sub_a = broker.subscribe("ephemeral").await.unwrap();
        let sub_b = broker.subscribe("ephemeral").await.unwrap();

        drop(sub_a);
        assert!(broker.topics.contains_key("ephemeral"));

        drop(sub_b);
        assert!(!broker.topics.contains_key("ephemeral"));

        // A later subscriber gets a fresh feed on the same name
        let mut again = broker.subscribe("ephemeral").await.unwrap();
        broker.publish("ephemeral", "fresh").await.unwrap();
        assert_eq!(again.next_message().await.as_deref(), Some("fresh"));
    }
}
