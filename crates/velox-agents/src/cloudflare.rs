use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, instrument};
use velox_common::{Error, Result};
use velox_config::ImageConfig;

use crate::providers::ImageProvider;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
const DEFAULT_MODEL: &str = "@cf/stabilityai/stable-diffusion-xl-base-1.0";
const DEFAULT_STEPS: u32 = 20;

/// Cloudflare Workers AI text-to-image provider.
pub struct WorkersAiProvider {
    client: reqwest::Client,
    account_id: String,
    api_token: String,
    model: String,
    base_url: String,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    prompt: &'a str,
    num_steps: u32,
}

impl WorkersAiProvider {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            account_id: account_id.into(),
            api_token: api_token.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            steps: DEFAULT_STEPS,
        }
    }

    pub fn from_config(
        account_id: impl Into<String>,
        api_token: impl Into<String>,
        config: &ImageConfig,
    ) -> Self {
        Self::new(account_id, api_token)
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_steps(config.steps)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            self.model
        )
    }
}

#[async_trait]
impl ImageProvider for WorkersAiProvider {
    fn provider_id(&self) -> &str {
        "workers-ai"
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, steps = self.steps))]
    async fn generate(&self, prompt: &str) -> Result<Bytes> {
        debug!("workers-ai request: {} prompt chars", prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(&RunRequest {
                prompt,
                num_steps: self.steps,
            })
            .send()
            .await
            .map_err(|e| Error::Agent(format!("workers-ai request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::Agent(format!("workers-ai body read failed: {e}")))
    }
}
