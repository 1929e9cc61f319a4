//! WebSocket Fan-Out
//!
//! One session per accepted connection, two relays per session:
//! the inbound relay reads client frames, routes them and publishes to
//! the broker; the outbound relay forwards the session's broker feed
//! back to the client. First relay to finish ends the session.

pub mod envelope;
pub mod inbound;
pub mod outbound;
pub mod routes;
pub mod session;
pub mod topic;

pub use envelope::{Envelope, UserSnapshot};
pub use routes::create_router;
pub use session::{run_session, ChannelKind};
pub use topic::direct_topic;
