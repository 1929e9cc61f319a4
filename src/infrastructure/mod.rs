//! # Infrastructure Layer
//!
//! Concrete implementations of the contracts the relay consumes:
//! pub/sub broker, PostgreSQL repositories, media storage and the
//! streaming assistant client.

pub mod assistant;
pub mod broker;
pub mod database;
pub mod media;
pub mod repositories;
