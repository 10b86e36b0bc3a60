pub mod telegram;
pub mod traits;

pub use telegram::{InboundMessage, TelegramNotifier, parse_update};
pub use traits::{ChatAction, Notifier};
