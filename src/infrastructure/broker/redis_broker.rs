//! Redis pub/sub broker implementation.
//!
//! Publishes go through a shared `ConnectionManager` (automatic
//! reconnection); each subscription owns a dedicated `PubSub` connection
//! so feeds stay isolated across sessions.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{ConnectionManager, PubSub};
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use super::{Broker, Subscription};
use crate::config::RedisSettings;
use crate::shared::error::AppError;

/// Broker backed by Redis pub/sub.
pub struct RedisBroker {
    client: Client,
    publisher: ConnectionManager,
}

impl RedisBroker {
    /// Connect to Redis and prepare the shared publish connection.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, redis::RedisError> {
        info!("Connecting to Redis broker...");
        let client = Client::open(settings.url.as_str())?;
        let publisher = ConnectionManager::new(client.clone()).await?;
        info!("Redis broker connection established");
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), AppError> {
        // ConnectionManager is cheap to clone; each publish gets its own handle
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn.publish(topic, payload).await?;
        debug!(topic = %topic, receivers = receivers, "Published message");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, AppError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;
        debug!(topic = %topic, "Subscribed to topic");
        Ok(Box::new(RedisSubscription { pubsub }))
    }
}

/// One Redis pub/sub connection bound to a single topic.
struct RedisSubscription {
    pubsub: PubSub,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> Option<String> {
        // on_message only yields payload frames; subscribe acks are
        // consumed by the driver and never surface here.
        loop {
            let msg = self.pubsub.on_message().next().await?;
            match msg.get_payload::<String>() {
                Ok(payload) => return Some(payload),
                Err(e) => {
                    debug!(error = %e, "Skipping non-UTF8 pub/sub payload");
                }
            }
        }
    }
}
