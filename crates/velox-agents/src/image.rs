use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use velox_common::{Result, Turn};
use velox_config::{ImageConfig, PromptStrategyKind};

use crate::providers::{CompletionProvider, ImageProvider};

/// How a user's raw prompt is turned into the prompt the image model sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStrategy {
    /// Append quality keywords. Assumes the prompt is already English.
    Enhance { suffix: String },
    /// Ask the chat model to rewrite the prompt as a realistic English prompt.
    Translate { instruction: String },
}

impl PromptStrategy {
    pub fn from_config(config: &ImageConfig) -> Self {
        match config.strategy {
            PromptStrategyKind::Enhance => Self::Enhance {
                suffix: config.enhance_suffix.clone(),
            },
            PromptStrategyKind::Translate => Self::Translate {
                instruction: config.translate_instruction.clone(),
            },
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Bytes,
    /// Prompt as the user typed it.
    pub raw_prompt: String,
    /// Prompt actually submitted to the image model.
    pub submitted_prompt: String,
    translated: bool,
}

impl GeneratedImage {
    /// Markdown caption for the photo reply.
    pub fn caption(&self) -> String {
        if self.translated {
            format!(
                "🎨 Done\nPrompt: {}\nUnderstood as: `{}`",
                self.raw_prompt, self.submitted_prompt
            )
        } else {
            format!("🎨 `{}`", self.raw_prompt)
        }
    }
}

/// Prompt preparation followed by image generation, strictly in that order.
pub struct ImagePipeline {
    strategy: PromptStrategy,
    completion: Arc<dyn CompletionProvider>,
    image: Arc<dyn ImageProvider>,
}

impl ImagePipeline {
    pub fn new(
        strategy: PromptStrategy,
        completion: Arc<dyn CompletionProvider>,
        image: Arc<dyn ImageProvider>,
    ) -> Self {
        Self {
            strategy,
            completion,
            image,
        }
    }

    /// Build the submitted prompt. Translation failures fall back to `raw`.
    pub async fn prepare_prompt(&self, raw: &str) -> String {
        match &self.strategy {
            PromptStrategy::Enhance { suffix } => format!("{raw}{suffix}"),
            PromptStrategy::Translate { instruction } => {
                match self.completion.complete(&[Turn::user(raw)], instruction).await {
                    Ok(rewritten) => rewritten.trim().to_string(),
                    Err(e) => {
                        warn!("prompt translation failed, using raw prompt: {e}");
                        raw.to_string()
                    }
                }
            }
        }
    }

    pub async fn run(&self, raw: &str) -> Result<GeneratedImage> {
        let submitted = self.prepare_prompt(raw).await;
        info!(
            "generating image via {}: {} prompt chars",
            self.image.provider_id(),
            submitted.len()
        );

        let bytes = self.image.generate(&submitted).await?;

        Ok(GeneratedImage {
            bytes,
            raw_prompt: raw.to_string(),
            submitted_prompt: submitted,
            translated: matches!(self.strategy, PromptStrategy::Translate { .. }),
        })
    }
}
