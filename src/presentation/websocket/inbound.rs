//! Inbound relay and message router.
//!
//! Reads one client frame at a time, decodes it as an envelope and
//! dispatches on the `type` discriminator. Persistence and moderation
//! side effects are spawned into the session's JoinSet without awaiting
//! them, so a publish can be observed before its side effect completes.

use axum::extract::ws::Message;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::{Stream, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::envelope::{Envelope, UserSnapshot};
use super::session::{ChannelKind, SessionContext};
use crate::domain::{ChatStatus, NewMessage, Recipient};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Outcome of routing one frame.
enum Flow {
    Continue,
    Terminal,
}

/// Read loop: strictly sequential, one frame at a time.
pub(super) async fn inbound_relay<R>(
    reader: &mut R,
    ctx: &SessionContext,
    state: &AppState,
    side_effects: &mut JoinSet<()>,
) -> Result<(), AppError>
where
    R: Stream<Item = Result<Message, axum::Error>> + Send + Unpin,
{
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let envelope = match Envelope::decode(text.as_str()) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        // Strict decoding: log the content for diagnosis, drop the frame
                        warn!(
                            topic = %ctx.topic,
                            content = %text.as_str(),
                            error = %e,
                            "Dropping undecodable frame"
                        );
                        continue;
                    }
                };
                if let Flow::Terminal = route(envelope, ctx, state, side_effects).await? {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!(topic = %ctx.topic, "Client closed connection");
                break;
            }
            Ok(_) => {} // ping/pong handled by the transport; binary ignored
            Err(e) => {
                debug!(topic = %ctx.topic, error = %e, "WebSocket read error");
                break;
            }
        }
    }
    Ok(())
}

/// Dispatch a decoded envelope. First match wins; broker failures
/// propagate (terminal for the session), side-effect failures do not.
async fn route(
    envelope: Envelope,
    ctx: &SessionContext,
    state: &AppState,
    side_effects: &mut JoinSet<()>,
) -> Result<Flow, AppError> {
    match envelope {
        Envelope::Leave { .. } => handle_leave(ctx, state).await,
        Envelope::Media {
            content,
            room_name,
            receiver,
            ..
        } => handle_media(content, room_name, receiver, ctx, state).await,
        Envelope::Ban {
            receiver,
            room_name,
            ..
        } => handle_moderation(true, receiver, room_name, ctx, state, side_effects).await,
        Envelope::Unban {
            receiver,
            room_name,
            ..
        } => handle_moderation(false, receiver, room_name, ctx, state, side_effects).await,
        Envelope::Assistant { content, .. } => handle_assistant(content, ctx, state).await,
        Envelope::Text {
            content,
            room_name,
            receiver,
            ..
        } => handle_text(content, room_name, receiver, ctx, state, side_effects).await,
        Envelope::Online { .. } | Envelope::Offline { .. } => {
            // Presence announcements are server-synthesized only
            warn!(topic = %ctx.topic, "Dropping client-authored presence frame");
            Ok(Flow::Continue)
        }
    }
}

/// Ordinary text: publish first, persist fire-and-forget.
async fn handle_text(
    content: String,
    room_name: Option<String>,
    receiver: Option<String>,
    ctx: &SessionContext,
    state: &AppState,
    side_effects: &mut JoinSet<()>,
) -> Result<Flow, AppError> {
    let mut out = Envelope::Text {
        content: content.clone(),
        room_name,
        receiver,
        user: None,
    };
    out.attach_user(ctx.snapshot());
    state.broker.publish(&ctx.topic, &out.encode()?).await?;

    spawn_persist(
        side_effects,
        state,
        ctx,
        content,
        "text".to_string(),
        None,
    );

    Ok(Flow::Continue)
}

/// Media: decode, store, persist the reference, then publish the
/// enriched envelope with the raw payload stripped.
async fn handle_media(
    content: String,
    room_name: Option<String>,
    receiver: Option<String>,
    ctx: &SessionContext,
    state: &AppState,
) -> Result<Flow, AppError> {
    let bytes = match BASE64.decode(content.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(topic = %ctx.topic, error = %e, "Dropping media frame with invalid base64");
            return Ok(Flow::Continue);
        }
    };

    let file_name = format!("{}.bin", Uuid::new_v4());
    let address = match state.media.store(&file_name, &bytes).await {
        Ok(address) => address,
        Err(e) => {
            warn!(topic = %ctx.topic, error = %e, "Media store failed, dropping frame");
            return Ok(Flow::Continue);
        }
    };

    let recipient = match resolve_recipient(ctx, state).await {
        Some(recipient) => recipient,
        None => return Ok(Flow::Continue),
    };
    let record = NewMessage {
        sender_id: ctx.sender.id,
        recipient,
        content: String::new(),
        message_type: "media".to_string(),
        media: Some(address.clone()),
    };
    if let Err(e) = state.messages.create(&record).await {
        warn!(topic = %ctx.topic, error = %e, "Failed to persist media message");
    }

    let mut out = Envelope::Media {
        content: String::new(),
        preview: None,
        media: Some(address),
        room_name,
        receiver,
        user: None,
    };
    out.attach_user(ctx.snapshot());
    state.broker.publish(&ctx.topic, &out.encode()?).await?;

    Ok(Flow::Continue)
}

/// Ban/unban: spawn the membership side effect, echo the command
/// immediately. No ordering guarantee between the two.
async fn handle_moderation(
    ban: bool,
    receiver: String,
    room_name: String,
    ctx: &SessionContext,
    state: &AppState,
    side_effects: &mut JoinSet<()>,
) -> Result<Flow, AppError> {
    let rooms = state.rooms.clone();
    let admin_id = ctx.sender.id;
    let target = receiver.clone();
    let room = room_name.clone();
    side_effects.spawn(async move {
        let result = if ban {
            rooms.ban_member(admin_id, &target, &room).await
        } else {
            rooms.unban_member(admin_id, &target, &room).await
        };
        if let Err(e) = result {
            warn!(room = %room, target = %target, error = %e, "Moderation side effect failed");
        }
    });

    let mut out = if ban {
        Envelope::Ban {
            receiver,
            room_name,
            user: None,
        }
    } else {
        Envelope::Unban {
            receiver,
            room_name,
            user: None,
        }
    };
    out.attach_user(ctx.snapshot());
    state.broker.publish(&ctx.topic, &out.encode()?).await?;

    Ok(Flow::Continue)
}

/// Streaming completion: one `start` envelope, then one envelope per
/// chunk carrying the accumulated reply. Failures abort this exchange
/// only; the relay keeps running.
async fn handle_assistant(
    prompt: String,
    ctx: &SessionContext,
    state: &AppState,
) -> Result<Flow, AppError> {
    let persona = UserSnapshot::assistant();

    let start = Envelope::Assistant {
        content: "start".to_string(),
        user: Some(persona.clone()),
    };
    state.broker.publish(&ctx.topic, &start.encode()?).await?;

    let mut chunks = match state.assistant.stream_completion(&prompt).await {
        Ok(chunks) => chunks,
        Err(e) => {
            warn!(topic = %ctx.topic, error = %e, "Completion request failed");
            return Ok(Flow::Continue);
        }
    };

    let mut accumulated = String::new();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(delta) => {
                accumulated.push_str(&delta);
                let partial = Envelope::Assistant {
                    content: accumulated.clone(),
                    user: Some(persona.clone()),
                };
                state.broker.publish(&ctx.topic, &partial.encode()?).await?;
            }
            Err(e) => {
                warn!(topic = %ctx.topic, error = %e, "Completion stream failed mid-exchange");
                break;
            }
        }
    }

    Ok(Flow::Continue)
}

/// Leave: mark offline, announce, end the session.
async fn handle_leave(ctx: &SessionContext, state: &AppState) -> Result<Flow, AppError> {
    if let Err(e) = state
        .users
        .update_chat_status(ctx.sender.id, ChatStatus::Offline)
        .await
    {
        warn!(user_id = ctx.sender.id, error = %e, "Failed to mark user offline");
    }

    let offline = Envelope::Offline {
        content: format!("{} went offline!", ctx.sender.first_name),
        user: ctx.snapshot(),
    };
    state.broker.publish(&ctx.topic, &offline.encode()?).await?;

    info!(user_id = ctx.sender.id, topic = %ctx.topic, "Client left, ending session");
    Ok(Flow::Terminal)
}

/// Spawn fire-and-forget message persistence. Recipient resolution
/// happens inside the task so the relay loop never waits on it.
fn spawn_persist(
    side_effects: &mut JoinSet<()>,
    state: &AppState,
    ctx: &SessionContext,
    content: String,
    message_type: String,
    media: Option<String>,
) {
    let users = state.users.clone();
    let messages = state.messages.clone();
    let channel = ctx.channel.clone();
    let sender_id = ctx.sender.id;
    side_effects.spawn(async move {
        let recipient = match channel {
            ChannelKind::Room(room) => Recipient::Room(room),
            ChannelKind::Direct(receiver_id) => match users.find_by_id(receiver_id).await {
                Ok(Some(user)) => Recipient::DirectEmail(user.email),
                Ok(None) => {
                    warn!(receiver_id, "Recipient not found, skipping persistence");
                    return;
                }
                Err(e) => {
                    warn!(receiver_id, error = %e, "Failed to resolve recipient");
                    return;
                }
            },
        };
        let record = NewMessage {
            sender_id,
            recipient,
            content,
            message_type,
            media,
        };
        if let Err(e) = messages.create(&record).await {
            warn!(error = %e, "Failed to persist message");
        }
    });
}

/// Synchronous recipient resolution for media messages.
async fn resolve_recipient(ctx: &SessionContext, state: &AppState) -> Option<Recipient> {
    match &ctx.channel {
        ChannelKind::Room(room) => Some(Recipient::Room(room.clone())),
        ChannelKind::Direct(receiver_id) => match state.users.find_by_id(*receiver_id).await {
            Ok(Some(user)) => Some(Recipient::DirectEmail(user.email)),
            Ok(None) => {
                warn!(receiver_id, "Recipient not found, dropping media frame");
                None
            }
            Err(e) => {
                warn!(receiver_id, error = %e, "Failed to resolve recipient");
                None
            }
        },
    }
}
