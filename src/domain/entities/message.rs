//! Message persistence contract.
//!
//! The relay records every routed chat message through this trait; it
//! never reads messages back (history endpoints are out of scope here).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Where a message is going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Direct chat, target addressed by email
    DirectEmail(String),
    /// Room chat, target addressed by room name
    Room(String),
}

/// A message to be durably recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author user ID
    pub sender_id: i64,

    /// Direct or room recipient
    pub recipient: Recipient,

    /// Text content (empty for media messages)
    pub content: String,

    /// Wire-level type discriminator ("text", "media", ...)
    pub message_type: String,

    /// Stored media address, if any
    pub media: Option<String>,
}

/// Repository trait for message persistence.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Durably record a message. Called fire-and-forget from the relay.
    async fn create(&self, message: &NewMessage) -> Result<(), AppError>;
}
