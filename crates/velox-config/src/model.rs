use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use velox_common::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,

    /// Single operator allowed to talk to the bot. Unset means everyone.
    #[serde(default, deserialize_with = "string_or_number")]
    pub admin_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_telegram_api(),
            admin_id: None,
        }
    }
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_system_prompt() -> String {
    "You are Velox AI, a helpful assistant. Answer concisely. Use Markdown.".to_string()
}

fn default_temperature() -> f64 {
    0.6
}

fn default_max_tokens() -> u32 {
    1024
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStrategyKind {
    /// Append a fixed photorealism suffix to the raw prompt.
    Enhance,
    /// Rewrite the prompt into English through the chat model first.
    Translate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_image_base_url")]
    pub base_url: String,

    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_steps")]
    pub steps: u32,

    #[serde(default = "default_strategy")]
    pub strategy: PromptStrategyKind,

    #[serde(default = "default_enhance_suffix")]
    pub enhance_suffix: String,

    #[serde(default = "default_translate_instruction")]
    pub translate_instruction: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            base_url: default_image_base_url(),
            model: default_image_model(),
            steps: default_steps(),
            strategy: default_strategy(),
            enhance_suffix: default_enhance_suffix(),
            translate_instruction: default_translate_instruction(),
        }
    }
}

fn default_image_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_image_model() -> String {
    "@cf/stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

fn default_steps() -> u32 {
    20
}

fn default_strategy() -> PromptStrategyKind {
    PromptStrategyKind::Translate
}

fn default_enhance_suffix() -> String {
    ", photorealistic, 8k resolution, cinematic lighting, highly detailed, masterpiece, sharp focus"
        .to_string()
}

fn default_translate_instruction() -> String {
    "You are an expert AI photographer. Your task is to rewrite the user's input into a \
     detailed, photorealistic ENGLISH prompt.\n\nRULES:\n\
     1. Output MUST be in English.\n\
     2. Output only the prompt, no explanations.\n\
     3. Focus on lighting, texture, and realism."
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_backend")]
    pub backend: MemoryBackend,

    /// SQLite file. Defaults to `<data_dir>/memory.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum number of stored turns per conversation. At least 2, since
    /// turns are evicted a user/assistant pair at a time.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            window: default_window(),
        }
    }
}

fn default_backend() -> MemoryBackend {
    MemoryBackend::Sqlite
}

fn default_window() -> usize {
    10
}

impl AppConfig {
    /// Fill unset secrets and ids from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Fill unset secrets and ids via `lookup`. Values from the config file win.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        fill(&mut self.telegram.bot_token, read("TG_BOT_TOKEN"));
        fill(&mut self.telegram.admin_id, read("ADMIN_ID"));
        fill(&mut self.llm.api_key, read("GROQ_API_KEY"));
        fill(&mut self.image.account_id, read("CF_ACCOUNT_ID"));
        fill(&mut self.image.api_token, read("CF_API_TOKEN"));
    }

    /// Check that everything needed to serve chat traffic is present.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config(
                "telegram bot token missing (set telegram.bot_token or TG_BOT_TOKEN)".into(),
            ));
        }
        if self.llm.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config(
                "llm api key missing (set llm.api_key or GROQ_API_KEY)".into(),
            ));
        }
        if self.memory.window < 2 {
            return Err(Error::Config(format!(
                "memory.window must be at least 2 (one exchange), got {}",
                self.memory.window
            )));
        }
        Ok(())
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Telegram ids are numbers, but people write them either way in config files.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}
