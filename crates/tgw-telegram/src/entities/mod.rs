//! Read views over stored users and chats, plus the chat-level API calls.

pub mod chat;
pub mod user;

pub use chat::Chat;
pub use user::{User, DEFAULT_PROFILE_PICTURE_SIZE};
