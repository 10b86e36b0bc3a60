use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use velox_common::{Error, Result, Turn};
use velox_config::LlmConfig;

use crate::providers::CompletionProvider;

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_TEMPERATURE: f64 = 0.6;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// OpenAI-compatible Chat Completions provider (Groq by default).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn from_config(api_key: impl Into<String>, config: &LlmConfig) -> Self {
        Self::new(
            api_key,
            Some(config.model.clone()),
            Some(config.base_url.clone()),
        )
        .with_sampling(config.temperature, config.max_tokens)
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, turns: &[Turn], system_prompt: &str) -> OpenAiRequest {
        let messages = std::iter::once(Turn::system(system_prompt))
            .chain(turns.iter().cloned())
            .map(|turn| OpenAiMessage {
                role: turn.role.as_str().to_string(),
                content: Some(turn.content),
            })
            .collect();

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, turns, system_prompt), fields(model = %self.model, turns = turns.len()))]
    async fn complete(&self, turns: &[Turn], system_prompt: &str) -> Result<String> {
        let body = self.build_request(turns, system_prompt);
        debug!("openai request: {} messages", body.messages.len());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("openai request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("failed to parse openai response: {e}")))?;

        from_openai_response(api_response)
    }
}

// --- OpenAI Wire Types (private) ---

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn from_openai_response(response: OpenAiResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| Error::Agent("model returned no content".into()))
}
