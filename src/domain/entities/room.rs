//! Room entity, membership and repository trait.
//!
//! Maps to the `rooms` and `room_members` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a multi-user chat room.
///
/// Maps to the `rooms` table:
/// - id: BIGINT PRIMARY KEY
/// - room_name: VARCHAR(100) NOT NULL UNIQUE
/// - description: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Primary key
    pub id: i64,

    /// Unique room name (also the pub/sub topic)
    pub room_name: String,

    /// Room description
    pub description: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Membership row binding a user to a room.
///
/// Maps to the `room_members` table:
/// - room_id: BIGINT NOT NULL REFERENCES rooms(id)
/// - member_id: BIGINT NOT NULL REFERENCES users(id)
/// - banned: BOOLEAN NOT NULL DEFAULT FALSE
/// - admin: BOOLEAN NOT NULL DEFAULT FALSE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMember {
    pub room_id: i64,
    pub member_id: i64,
    pub banned: bool,
    pub admin: bool,
}

/// Repository trait for room lookup and moderation side effects.
///
/// `ban_member`/`unban_member` enforce that the acting user is an admin
/// of the room; the relay dispatches them fire-and-forget and never
/// blocks a publish on their outcome.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a room by its unique name.
    async fn find_by_name(&self, room_name: &str) -> Result<Option<Room>, AppError>;

    /// Find the membership row for a user in a room, if the user is an admin.
    async fn find_admin(&self, user_id: i64, room_id: i64)
        -> Result<Option<RoomMember>, AppError>;

    /// Mark a member as banned. The target is addressed by email, the room
    /// by name; fails with `Forbidden` if `admin_id` is not a room admin.
    async fn ban_member(
        &self,
        admin_id: i64,
        target_email: &str,
        room_name: &str,
    ) -> Result<(), AppError>;

    /// Lift a ban. Same addressing and admin check as `ban_member`.
    async fn unban_member(
        &self,
        admin_id: i64,
        target_email: &str,
        room_name: &str,
    ) -> Result<(), AppError>;
}
