use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use velox_agents::{
    CompletionProvider, ImagePipeline, OpenAiProvider, PromptStrategy, WorkersAiProvider,
};
use velox_channels::TelegramNotifier;
use velox_common::{Error, Result};
use velox_config::{AppConfig, MemoryBackend};
use velox_db::{ConversationMemory, InMemoryKvStore, KvStore, SqliteKvStore};
use velox_security::Allowlist;

use crate::dispatcher::Dispatcher;

const MEMORY_DB_FILE: &str = "memory.db";

/// Where the SQLite memory file lives: explicit path, else `<data_dir>/memory.db`.
pub fn memory_db_path(config: &AppConfig) -> PathBuf {
    config.memory.path.clone().unwrap_or_else(|| {
        config
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data"))
            .join(MEMORY_DB_FILE)
    })
}

/// Open the configured conversation store.
pub fn build_memory_store(config: &AppConfig) -> Result<Arc<dyn KvStore>> {
    match config.memory.backend {
        MemoryBackend::Memory => {
            warn!("using in-memory conversation store, history is lost on restart");
            Ok(Arc::new(InMemoryKvStore::new()))
        }
        MemoryBackend::Sqlite => {
            let path = memory_db_path(config);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteKvStore::open(&path)?;
            info!("conversation store opened at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}

/// Build the image pipeline, or `None` when Workers AI credentials are missing.
pub fn build_image_pipeline(
    config: &AppConfig,
    completion: Arc<dyn CompletionProvider>,
) -> Option<ImagePipeline> {
    let image = &config.image;
    let (Some(account_id), Some(api_token)) = (
        image.account_id.as_deref().filter(|v| !v.is_empty()),
        image.api_token.as_deref().filter(|v| !v.is_empty()),
    ) else {
        warn!("cloudflare account id or api token missing, /img is disabled");
        return None;
    };

    let provider = WorkersAiProvider::from_config(account_id, api_token, image);
    info!(
        "image generation enabled: model={}, strategy={:?}",
        image.model, image.strategy
    );
    Some(ImagePipeline::new(
        PromptStrategy::from_config(image),
        completion,
        Arc::new(provider),
    ))
}

/// Build a fully-configured [`Dispatcher`] from the application config.
pub fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    config.validate()?;

    let bot_token = config
        .telegram
        .bot_token
        .as_deref()
        .ok_or_else(|| Error::Config("telegram bot token is required".into()))?;
    let api_key = config
        .llm
        .api_key
        .as_deref()
        .ok_or_else(|| Error::Config("llm api key is required".into()))?;

    let notifier = TelegramNotifier::new(bot_token).with_api_url(&config.telegram.api_base_url)?;

    let completion: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiProvider::from_config(api_key, &config.llm));
    info!("completion provider: model={}", config.llm.model);

    let allowlist = Allowlist::from_operator_id(config.telegram.admin_id.as_deref());
    if matches!(allowlist, Allowlist::Open) {
        warn!("no admin id configured, the bot answers everyone");
    }

    let memory = ConversationMemory::new(build_memory_store(config)?, config.memory.window);

    let mut dispatcher = Dispatcher::new(
        allowlist,
        config.llm.system_prompt.clone(),
        memory,
        Arc::clone(&completion),
        Arc::new(notifier),
    );
    if let Some(pipeline) = build_image_pipeline(config, completion) {
        dispatcher = dispatcher.with_images(pipeline);
    }

    Ok(dispatcher)
}
