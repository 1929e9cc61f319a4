//! Pub/Sub Broker
//!
//! Topic-based publish/subscribe as consumed by the relay: best-effort,
//! at-least-once delivery to every current subscriber of a topic. Each
//! session opens its own subscription; feeds are never shared, so the
//! publisher's own outbound relay receives its publishes too.
//!
//! `RedisBroker` is the production implementation; `MemoryBroker` backs
//! the integration tests and single-process deployments.

mod memory;
mod redis_broker;

pub use memory::MemoryBroker;
pub use redis_broker::RedisBroker;

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Publish side of the broker contract.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Deliver `payload` to all current subscribers of `topic`.
    /// Best-effort: delivery to zero subscribers is not an error.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), AppError>;

    /// Open a dedicated feed for `topic`. Every subscription gets its own
    /// copy of each publish, including the caller's own.
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, AppError>;
}

/// A per-session feed bound to one topic for the session's lifetime.
///
/// Dropping the subscription releases the underlying resources.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next payload. Returns `None` when the feed is closed.
    /// Broker control frames (subscribe acks) never surface here.
    async fn next_message(&mut self) -> Option<String>;
}
