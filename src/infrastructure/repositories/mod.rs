//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.

mod message_repository;
mod room_repository;
mod user_repository;

pub use message_repository::PgMessageRepository;
pub use room_repository::PgRoomRepository;
pub use user_repository::PgUserRepository;
