//! WebSocket routes.
//!
//! Two upgrade endpoints: room channels keyed by room name, direct
//! chats keyed by the receiver identity.

use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;
use tracing::error;

use super::session::{run_session, ChannelKind};
use crate::startup::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/ws/{sender_id}/{room_name}", get(room_channel))
        .route(
            "/api/v1/ws/chat/{sender_id}/{receiver_id}",
            get(direct_channel),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Room channel upgrade handler.
async fn room_channel(
    ws: WebSocketUpgrade,
    Path((sender_id, room_name)): Path<(i64, String)>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state, sender_id, ChannelKind::Room(room_name))
    })
}

/// Direct-chat channel upgrade handler.
async fn direct_channel(
    ws: WebSocketUpgrade,
    Path((sender_id, receiver_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state, sender_id, ChannelKind::Direct(receiver_id))
    })
}

/// Run the session; errors stop here, the WebSocket server has no
/// upstream recovery.
async fn handle_socket(socket: WebSocket, state: AppState, sender_id: i64, channel: ChannelKind) {
    let (writer, reader) = socket.split();
    if let Err(e) = run_session(reader, writer, &state, sender_id, channel).await {
        error!(sender_id, error = %e, "WebSocket session ended with error");
    }
}
