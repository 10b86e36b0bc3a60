use std::fmt::Display;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use velox_agents::{CompletionProvider, ImagePipeline};
use velox_channels::{ChatAction, InboundMessage, Notifier, parse_update};
use velox_common::{ConversationId, Result, Turn};
use velox_db::ConversationMemory;
use velox_security::Allowlist;

use crate::command::{Command, classify};

pub const MEMORY_CLEARED_REPLY: &str = "🧹 Memory cleared.";
pub const CLEAR_FAILED_REPLY: &str = "⚠️ Could not clear memory right now, please try again later.";
pub const IMAGE_USAGE_REPLY: &str = "⚠️ Please add a prompt, for example: `/img a dog`";
pub const IMAGE_DISABLED_REPLY: &str = "⚠️ Image generation is not configured.";

fn completion_failure_reply(cause: impl Display) -> String {
    format!("❌ Error: {cause}")
}

fn image_failure_reply(cause: impl Display) -> String {
    format!("❌ *Image generation failed:* {cause}")
}

/// How an update was resolved. Used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a text message from a user.
    Ignored,
    /// Sender is not on the allow-list.
    Unauthorized,
    MemoryCleared,
    ClearFailed,
    ImageUsage,
    ImageSent,
    ImageFailed,
    Replied,
}

/// Routes a webhook update to the chat, image or memory flow.
pub struct Dispatcher {
    allowlist: Allowlist,
    system_prompt: String,
    memory: ConversationMemory,
    completion: Arc<dyn CompletionProvider>,
    images: Option<ImagePipeline>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        allowlist: Allowlist,
        system_prompt: impl Into<String>,
        memory: ConversationMemory,
        completion: Arc<dyn CompletionProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            allowlist,
            system_prompt: system_prompt.into(),
            memory,
            completion,
            images: None,
            notifier,
        }
    }

    pub fn with_images(mut self, pipeline: ImagePipeline) -> Self {
        self.images = Some(pipeline);
        self
    }

    pub fn images_enabled(&self) -> bool {
        self.images.is_some()
    }

    /// Handle one raw update.
    ///
    /// Business failures are turned into chat replies or log lines. An `Err`
    /// means a reply could not be delivered; the caller logs it and still
    /// acknowledges the webhook.
    pub async fn dispatch(&self, update: &Value) -> Result<Outcome> {
        let Some(message) = parse_update(update) else {
            debug!("ignoring update without a text message");
            return Ok(Outcome::Ignored);
        };

        if !self.allowlist.is_allowed(&message.user_id) {
            return Ok(Outcome::Unauthorized);
        }

        let conversation = ConversationId::from(message.chat_id);

        match classify(&message.text) {
            Command::ClearMemory => self.clear(&message, &conversation).await,
            Command::ImageUsage => {
                self.notifier
                    .send_text(message.chat_id, IMAGE_USAGE_REPLY, None)
                    .await?;
                Ok(Outcome::ImageUsage)
            }
            Command::GenerateImage(prompt) => self.generate_image(&message, &prompt).await,
            Command::Chat(text) => self.chat(&message, &conversation, text).await,
        }
    }

    async fn clear(&self, message: &InboundMessage, conversation: &ConversationId) -> Result<Outcome> {
        match self.memory.clear(conversation).await {
            Ok(()) => {
                info!("cleared memory for conversation {conversation}");
                self.notifier
                    .send_text(message.chat_id, MEMORY_CLEARED_REPLY, None)
                    .await?;
                Ok(Outcome::MemoryCleared)
            }
            Err(e) => {
                warn!("failed to clear memory for conversation {conversation}: {e}");
                self.notifier
                    .send_text(message.chat_id, CLEAR_FAILED_REPLY, None)
                    .await?;
                Ok(Outcome::ClearFailed)
            }
        }
    }

    #[instrument(skip(self, message, prompt), fields(chat_id = message.chat_id))]
    async fn generate_image(&self, message: &InboundMessage, prompt: &str) -> Result<Outcome> {
        let Some(pipeline) = &self.images else {
            self.notifier
                .send_text(message.chat_id, IMAGE_DISABLED_REPLY, Some(message.message_id))
                .await?;
            return Ok(Outcome::ImageFailed);
        };

        self.presence(message.chat_id, ChatAction::UploadPhoto).await;

        let delivered = match pipeline.run(prompt).await {
            Ok(image) => {
                let caption = image.caption();
                self.notifier
                    .send_photo(message.chat_id, image.bytes, &caption, Some(message.message_id))
                    .await
            }
            Err(e) => Err(e),
        };

        match delivered {
            Ok(()) => Ok(Outcome::ImageSent),
            Err(e) => {
                warn!("image generation failed: {e}");
                self.notifier
                    .send_text(message.chat_id, &image_failure_reply(&e), None)
                    .await?;
                Ok(Outcome::ImageFailed)
            }
        }
    }

    #[instrument(skip(self, message, text), fields(chat_id = message.chat_id))]
    async fn chat(
        &self,
        message: &InboundMessage,
        conversation: &ConversationId,
        text: String,
    ) -> Result<Outcome> {
        self.presence(message.chat_id, ChatAction::Typing).await;

        let mut history = match self.memory.load(conversation).await {
            Ok(history) => history,
            Err(e) => {
                warn!("failed to load history, starting empty: {e}");
                Vec::new()
            }
        };
        history.push(Turn::user(text));

        let reply = match self
            .completion
            .complete(&history, &self.system_prompt)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("completion via {} failed: {e}", self.completion.provider_id());
                completion_failure_reply(&e)
            }
        };

        // The turn is remembered even when delivery fails.
        let delivered = self
            .notifier
            .send_text(message.chat_id, &reply, Some(message.message_id))
            .await;

        history.push(Turn::assistant(reply));
        if let Err(e) = self.memory.save(conversation, history).await {
            warn!("failed to persist history: {e}");
        }

        delivered?;
        Ok(Outcome::Replied)
    }

    async fn presence(&self, chat_id: i64, action: ChatAction) {
        if let Err(e) = self.notifier.send_presence(chat_id, action).await {
            debug!("presence {} failed: {e}", action.as_str());
        }
    }
}
