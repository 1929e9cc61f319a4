//! # Domain Layer
//!
//! Core entities of the chat system and the contracts the relay consumes
//! from its persistence collaborators.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - The relay core only sees these traits, never concrete stores

pub mod entities;

// Re-export commonly used types
pub use entities::*;
