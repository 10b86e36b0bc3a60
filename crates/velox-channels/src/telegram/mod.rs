pub mod update;

use async_trait::async_trait;
use bytes::Bytes;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, InputFile, MessageId, ParseMode, ReplyParameters};
use tracing::{debug, warn};
use url::Url;
use velox_common::{Error, Result};

pub use update::{InboundMessage, parse_update};

use crate::traits::{ChatAction, Notifier};

// Model output is written for the legacy Markdown dialect, not MarkdownV2.
#[allow(deprecated)]
const PARSE_MODE: ParseMode = ParseMode::Markdown;

/// [`Notifier`] backed by the Telegram Bot API.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Talk to a different Bot API server (self-hosted, or a mock in tests).
    pub fn with_api_url(self, api_url: &str) -> Result<Self> {
        let url = Url::parse(api_url)
            .map_err(|e| Error::Config(format!("invalid telegram api url {api_url}: {e}")))?;
        Ok(Self {
            bot: self.bot.set_api_url(url),
        })
    }

    /// Point the bot's webhook at `url`, subscribing to messages only.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid webhook url {url}: {e}")))?;
        self.bot
            .set_webhook(url)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .map_err(|e| channel_error("setWebhook", e))?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i32>,
        parse_mode: Option<ParseMode>,
    ) -> std::result::Result<(), RequestError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(mode) = parse_mode {
            request = request.parse_mode(mode);
        }
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        request.await?;
        Ok(())
    }
}

fn channel_error(method: &str, e: RequestError) -> Error {
    Error::Channel(format!("telegram {method} failed: {e}"))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
        match self
            .send_message(chat_id, text, reply_to, Some(PARSE_MODE))
            .await
        {
            Ok(()) => Ok(()),
            Err(RequestError::Api(e)) => {
                // Usually unbalanced Markdown in model output.
                debug!("telegram rejected formatted text ({e}), resending as plain text");
                self.send_message(chat_id, text, reply_to, None)
                    .await
                    .map_err(|e| channel_error("sendMessage", e))
            }
            Err(e) => Err(channel_error("sendMessage", e)),
        }
    }

    async fn send_presence(&self, chat_id: i64, action: ChatAction) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), action.into())
            .await
            .map_err(|e| channel_error("sendChatAction", e))?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        image: Bytes,
        caption: &str,
        reply_to: Option<i32>,
    ) -> Result<()> {
        if image.is_empty() {
            warn!("refusing to send empty image to chat {chat_id}");
            return Err(Error::Channel("image payload is empty".into()));
        }

        let photo = InputFile::memory(image.to_vec()).file_name("gen.png");
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .parse_mode(PARSE_MODE);
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }

        request
            .await
            .map_err(|e| channel_error("sendPhoto", e))?;
        Ok(())
    }
}
