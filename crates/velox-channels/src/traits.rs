use async_trait::async_trait;
use bytes::Bytes;
use velox_common::Result;

/// Presence indicator shown while a reply is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

impl From<ChatAction> for teloxide::types::ChatAction {
    fn from(action: ChatAction) -> Self {
        match action {
            ChatAction::Typing => Self::Typing,
            ChatAction::UploadPhoto => Self::UploadPhoto,
        }
    }
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::UploadPhoto => "upload_photo",
        }
    }
}

/// Outbound side of a chat platform.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a formatted text reply. If the platform rejects the formatting,
    /// the message is sent once more as plain text.
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()>;

    /// Show a presence indicator. Callers treat failures as harmless.
    async fn send_presence(&self, chat_id: i64, action: ChatAction) -> Result<()>;

    /// Send an image attachment with a formatted caption.
    async fn send_photo(
        &self,
        chat_id: i64,
        image: Bytes,
        caption: &str,
        reply_to: Option<i32>,
    ) -> Result<()>;
}
