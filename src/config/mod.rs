//! Configuration Module
//!
//! Application settings loaded from files and environment variables.

mod settings;

pub use settings::{
    AssistantSettings, DatabaseSettings, MediaSettings, RedisSettings, ServerSettings, Settings,
};
