//! Outbound relay.
//!
//! Pulls the next payload from the session's broker subscription and
//! forwards it verbatim as a text frame. Ends when the feed closes or
//! the socket write fails, which ends the session via the race.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tracing::debug;

use crate::infrastructure::broker::Subscription;
use crate::shared::error::AppError;

pub(super) async fn outbound_relay<W>(
    subscription: &mut dyn Subscription,
    writer: &mut W,
) -> Result<(), AppError>
where
    W: Sink<Message> + Send + Unpin,
    W::Error: std::fmt::Display,
{
    while let Some(payload) = subscription.next_message().await {
        if let Err(e) = writer.send(Message::Text(payload.into())).await {
            debug!(error = %e, "Socket write failed, ending outbound relay");
            break;
        }
    }
    Ok(())
}
