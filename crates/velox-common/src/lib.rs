pub mod error;
pub mod message;
pub mod types;

pub use error::{Error, Result};
pub use message::{Role, Turn};
pub use types::ConversationId;
