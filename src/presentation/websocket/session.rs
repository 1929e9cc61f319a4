//! Connection session lifecycle.
//!
//! One session per accepted WebSocket. The session resolves the sender's
//! identity and topic, announces presence, then races the inbound and
//! outbound relays: whichever finishes first (normal close, `leave`, or
//! error) cancels the other, after which pending side effects are drained
//! and the socket and subscription are released.

use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::envelope::{Envelope, UserSnapshot};
use super::inbound::inbound_relay;
use super::outbound::outbound_relay;
use super::topic::direct_topic;
use crate::domain::{ChatStatus, User};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// How long teardown waits for in-flight side effects before aborting them.
const SIDE_EFFECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Which kind of channel a connection was opened on.
#[derive(Debug, Clone)]
pub enum ChannelKind {
    /// Room channel; the room name is the topic
    Room(String),
    /// Direct chat with the given receiver identity
    Direct(i64),
}

/// Per-session state shared by the two relays.
pub(super) struct SessionContext {
    pub sender: User,
    pub topic: String,
    pub channel: ChannelKind,
    /// Some(is_admin) on room topics, None on direct chats
    pub admin: Option<bool>,
}

impl SessionContext {
    /// Profile snapshot attached to outbound envelopes.
    pub fn snapshot(&self) -> UserSnapshot {
        let snapshot = UserSnapshot::from_user(&self.sender);
        match self.admin {
            Some(admin) => snapshot.with_admin(admin),
            None => snapshot,
        }
    }
}

/// Run one connection session to completion.
///
/// Generic over the socket halves so tests can drive a session without a
/// real WebSocket; the production caller passes the split axum socket.
pub async fn run_session<R, W>(
    mut reader: R,
    mut writer: W,
    state: &AppState,
    sender_id: i64,
    channel: ChannelKind,
) -> Result<(), AppError>
where
    R: Stream<Item = Result<Message, axum::Error>> + Send + Unpin,
    W: Sink<Message> + Send + Unpin,
    W::Error: std::fmt::Display,
{
    let sender = state
        .users
        .find_by_id(sender_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", sender_id)))?;

    let (topic, admin) = match &channel {
        ChannelKind::Room(room_name) => {
            let room = state
                .rooms
                .find_by_name(room_name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_name)))?;
            let admin = state.rooms.find_admin(sender.id, room.id).await?.is_some();
            (room.room_name, Some(admin))
        }
        ChannelKind::Direct(receiver_id) => (direct_topic(sender.id, *receiver_id), None),
    };

    let ctx = SessionContext {
        sender,
        topic,
        channel,
        admin,
    };

    // Subscribe before announcing so this session sees its own publishes
    let mut subscription = state.broker.subscribe(&ctx.topic).await?;

    state
        .users
        .update_chat_status(ctx.sender.id, ChatStatus::Online)
        .await?;

    let online = Envelope::Online {
        content: format!("{} is online!", ctx.sender.first_name),
        room_name: matches!(ctx.channel, ChannelKind::Room(_)).then(|| ctx.topic.clone()),
        user: ctx.snapshot(),
    };
    state.broker.publish(&ctx.topic, &online.encode()?).await?;

    info!(user_id = ctx.sender.id, topic = %ctx.topic, "Session started");

    let mut side_effects = JoinSet::new();

    // Race the relays; the loser is cancelled at its await point when dropped
    tokio::select! {
        res = inbound_relay(&mut reader, &ctx, state, &mut side_effects) => {
            if let Err(e) = res {
                debug!(topic = %ctx.topic, error = %e, "Inbound relay ended with error");
            }
        }
        res = outbound_relay(subscription.as_mut(), &mut writer) => {
            if let Err(e) = res {
                debug!(topic = %ctx.topic, error = %e, "Outbound relay ended with error");
            }
        }
    }

    // Close the socket on every exit path; best-effort
    let _ = writer.send(Message::Close(None)).await;
    let _ = writer.close().await;

    // Drain tracked fire-and-forget work, then abort anything still running
    let drain = async {
        while side_effects.join_next().await.is_some() {}
    };
    if timeout(SIDE_EFFECT_DRAIN_TIMEOUT, drain).await.is_err() {
        warn!(topic = %ctx.topic, "Side effects still pending at teardown, aborting");
        side_effects.abort_all();
    }

    drop(subscription);
    info!(user_id = ctx.sender.id, topic = %ctx.topic, "Session ended");

    Ok(())
}
