pub mod history;
pub mod kv_store;
pub mod migrations;

pub use history::{ConversationMemory, truncate_window};
pub use kv_store::{InMemoryKvStore, KvStore, SqliteKvStore};
