//! # Presentation Layer
//!
//! WebSocket routes, session lifecycle and the inbound/outbound relays.

pub mod websocket;
