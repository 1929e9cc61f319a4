//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Presence status enum matching database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Offline,
    Online,
    Busy,
}

impl ChatStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            "busy" => Self::Busy,
            _ => Self::Offline,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
            Self::Busy => "busy",
        }
    }
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY
/// - first_name: VARCHAR(50) NOT NULL
/// - last_name: VARCHAR(50) NOT NULL
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - phone_number: VARCHAR(20) NULL
/// - bio: TEXT NULL
/// - chat_status: VARCHAR(20) DEFAULT 'offline'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: i64,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address (unique; doubles as the public identity)
    pub email: String,

    /// Phone number (optional)
    pub phone_number: Option<String>,

    /// Bio/about me text (optional)
    pub bio: Option<String>,

    /// Presence status
    #[serde(default)]
    pub chat_status: ChatStatus,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if the user is currently reachable.
    pub fn is_online(&self) -> bool {
        matches!(self.chat_status, ChatStatus::Online | ChatStatus::Busy)
    }
}

/// Repository trait for User data access operations.
///
/// The relay resolves connection identities and flips presence through
/// this contract; implementations live in the infrastructure layer.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their internal ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Update a user's presence status.
    async fn update_chat_status(&self, id: i64, status: ChatStatus) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_status_default_is_offline() {
        assert_eq!(ChatStatus::default(), ChatStatus::Offline);
    }

    #[test]
    fn test_chat_status_from_str() {
        assert_eq!(ChatStatus::from_str("online"), ChatStatus::Online);
        assert_eq!(ChatStatus::from_str("ONLINE"), ChatStatus::Online);
        assert_eq!(ChatStatus::from_str("busy"), ChatStatus::Busy);
        assert_eq!(ChatStatus::from_str("offline"), ChatStatus::Offline);
    }

    #[test]
    fn test_chat_status_from_str_unknown_defaults_to_offline() {
        assert_eq!(ChatStatus::from_str("unknown"), ChatStatus::Offline);
        assert_eq!(ChatStatus::from_str(""), ChatStatus::Offline);
    }

    #[test]
    fn test_chat_status_as_str_roundtrip() {
        for status in [ChatStatus::Offline, ChatStatus::Online, ChatStatus::Busy] {
            assert_eq!(ChatStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn test_chat_status_serializes_lowercase() {
        let serialized = serde_json::to_string(&ChatStatus::Online).unwrap();
        assert_eq!(serialized, "\"online\"");
    }

    fn sample_user() -> User {
        User {
            id: 42,
            first_name: "Alice".to_string(),
            last_name: "Park".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: None,
            bio: None,
            chat_status: ChatStatus::Offline,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_full_name() {
        assert_eq!(sample_user().full_name(), "Alice Park");
    }

    #[test]
    fn test_user_is_online() {
        let mut user = sample_user();
        assert!(!user.is_online());
        user.chat_status = ChatStatus::Online;
        assert!(user.is_online());
        user.chat_status = ChatStatus::Busy;
        assert!(user.is_online());
    }
}
