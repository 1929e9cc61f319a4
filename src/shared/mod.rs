//! Shared Utilities
//!
//! Cross-cutting concerns used by all layers.

pub mod error;

pub use error::AppError;
