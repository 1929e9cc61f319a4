//! # Chat Relay
//!
//! The realtime fan-out subsystem of a chat backend:
//! - WebSocket sessions for room and direct-chat channels
//! - Redis pub/sub fan-out (one topic per room or identity pair)
//! - Message routing with persistence, presence, moderation and
//!   streaming assistant side effects
//!
//! ## Module Structure
//!
//! ```text
//! chat_relay/
//! +-- config/         Configuration management
//! +-- domain/         Entities and collaborator repository traits
//! +-- infrastructure/ Broker, database, media and assistant implementations
//! +-- presentation/   WebSocket routes, session lifecycle and relays
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - entities and collaborator contracts
pub mod domain;

// Infrastructure layer - external implementations
pub mod infrastructure;

// Presentation layer - WebSocket routes and relays
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
