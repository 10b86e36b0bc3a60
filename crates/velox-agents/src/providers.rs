use async_trait::async_trait;
use bytes::Bytes;
use velox_common::{Result, Turn};

/// A hosted chat-completion model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider identifier (e.g. "openai").
    fn provider_id(&self) -> &str;

    /// Generate a reply to `turns`, with `system_prompt` sent ahead of them.
    async fn complete(&self, turns: &[Turn], system_prompt: &str) -> Result<String>;
}

/// A hosted text-to-image model.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Render `prompt` and return the raw image bytes.
    async fn generate(&self, prompt: &str) -> Result<Bytes>;
}
