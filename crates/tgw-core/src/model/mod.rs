//! Bot API wire types.

pub mod members;
pub mod types;

pub use members::ChatMember;
pub use types::*;
