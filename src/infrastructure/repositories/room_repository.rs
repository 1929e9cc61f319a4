//! Room Repository Implementation
//!
//! PostgreSQL implementation of the RoomRepository trait, covering room
//! lookup and the ban/unban moderation side effects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::domain::{Room, RoomMember, RoomRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    room_name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> Room {
        Room {
            id: self.id,
            room_name: self.room_name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoomMemberRow {
    room_id: i64,
    member_id: i64,
    banned: bool,
    admin: bool,
}

impl RoomMemberRow {
    fn into_member(self) -> RoomMember {
        RoomMember {
            room_id: self.room_id,
            member_id: self.member_id,
            banned: self.banned,
            admin: self.admin,
        }
    }
}

/// PostgreSQL room repository implementation.
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve (admin row, target user id, room id) for a moderation call.
    async fn resolve_moderation(
        &self,
        admin_id: i64,
        target_email: &str,
        room_name: &str,
    ) -> Result<(i64, i64), AppError> {
        let room = self
            .find_by_name(room_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_name)))?;

        self.find_admin(admin_id, room.id).await?.ok_or_else(|| {
            AppError::Forbidden(format!(
                "User {} is not an admin of room {}",
                admin_id, room_name
            ))
        })?;

        let target_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
            .bind(target_email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_email)))?;

        Ok((room.id, target_id))
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    /// Find a room by its unique name.
    async fn find_by_name(&self, room_name: &str) -> Result<Option<Room>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, room_name, description, created_at
            FROM rooms
            WHERE room_name = $1
            "#,
        )
        .bind(room_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_room()))
    }

    /// Find the admin membership row for a user in a room.
    async fn find_admin(
        &self,
        user_id: i64,
        room_id: i64,
    ) -> Result<Option<RoomMember>, AppError> {
        let row = sqlx::query_as::<_, RoomMemberRow>(
            r#"
            SELECT room_id, member_id, banned, admin
            FROM room_members
            WHERE room_id = $1 AND member_id = $2 AND admin = TRUE
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_member()))
    }

    /// Mark a member as banned.
    async fn ban_member(
        &self,
        admin_id: i64,
        target_email: &str,
        room_name: &str,
    ) -> Result<(), AppError> {
        let (room_id, target_id) = self
            .resolve_moderation(admin_id, target_email, room_name)
            .await?;

        sqlx::query(
            r#"
            UPDATE room_members
            SET banned = TRUE
            WHERE room_id = $1 AND member_id = $2
            "#,
        )
        .bind(room_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        info!(room = %room_name, target = %target_email, "Member banned");
        Ok(())
    }

    /// Lift a ban.
    async fn unban_member(
        &self,
        admin_id: i64,
        target_email: &str,
        room_name: &str,
    ) -> Result<(), AppError> {
        let (room_id, target_id) = self
            .resolve_moderation(admin_id, target_email, room_name)
            .await?;

        sqlx::query(
            r#"
            UPDATE room_members
            SET banned = FALSE
            WHERE room_id = $1 AND member_id = $2
            "#,
        )
        .bind(room_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        info!(room = %room_name, target = %target_email, "Member unbanned");
        Ok(())
    }
}
