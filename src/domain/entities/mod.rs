//! Domain entities and repository traits.

mod message;
mod room;
mod user;

pub use message::{MessageRepository, NewMessage, Recipient};
pub use room::{Room, RoomMember, RoomRepository};
pub use user::{ChatStatus, User, UserRepository};
