//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait. Resolves the
//! recipient (direct email or room name) and records the message row.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{MessageRepository, NewMessage, Recipient};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    /// Durably record a message.
    async fn create(&self, message: &NewMessage) -> Result<(), AppError> {
        match &message.recipient {
            Recipient::DirectEmail(email) => {
                let receiver_id =
                    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
                        .bind(email)
                        .fetch_optional(&self.pool)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!("User {} not found", email))
                        })?;

                sqlx::query(
                    r#"
                    INSERT INTO messages (sender_id, receiver_id, content, message_type, media)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(message.sender_id)
                .bind(receiver_id)
                .bind(&message.content)
                .bind(&message.message_type)
                .bind(&message.media)
                .execute(&self.pool)
                .await?;
            }
            Recipient::Room(room_name) => {
                let room_id =
                    sqlx::query_scalar::<_, i64>("SELECT id FROM rooms WHERE room_name = $1")
                        .bind(room_name)
                        .fetch_optional(&self.pool)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!("Room {} not found", room_name))
                        })?;

                sqlx::query(
                    r#"
                    INSERT INTO messages (sender_id, room_id, content, message_type, media)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(message.sender_id)
                .bind(room_id)
                .bind(&message.content)
                .bind(&message.message_type)
                .bind(&message.media)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(())
    }
}
