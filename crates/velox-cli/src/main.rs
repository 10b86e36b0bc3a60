use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use velox_channels::TelegramNotifier;
use velox_config::ConfigLoader;

#[derive(Parser)]
#[command(
    name = "velox",
    version,
    about = "Velox - Telegram bot for chat and image generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the config value, then info.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory holding config.yml / config.toml
    #[arg(long, global = true, env = "VELOX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check whether a local server is answering
    Status,

    /// Register the public webhook URL with Telegram
    SetWebhook {
        /// Public HTTPS URL that Telegram should POST updates to
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let mut config = config_loader.load()?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    // Logging starts after the config is read, so report which file it was.
    match config_loader.config_file() {
        Some(path) => info!("loaded config from {}", path.display()),
        None => info!(
            "no config file in {}, using defaults and environment",
            config_loader.config_dir().display()
        ),
    }

    match cli.command {
        Commands::Start { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            config.data_dir = Some(config_loader.data_dir(&config));
            config_loader.ensure_dirs(&config)?;

            let server = velox_gateway::GatewayServer::new(config);
            server.run().await?;
        }
        Commands::Status => {
            let url = format!(
                "http://{}:{}/health",
                config.gateway.host, config.gateway.port
            );
            let resp = reqwest::get(&url).await.map_err(|_| {
                anyhow::anyhow!(
                    "Velox is not running at {}:{}",
                    config.gateway.host,
                    config.gateway.port
                )
            })?;

            if !resp.status().is_success() {
                anyhow::bail!("server answered {} on {url}", resp.status());
            }
            println!("Velox is running at {}:{}", config.gateway.host, config.gateway.port);
        }
        Commands::SetWebhook { url } => {
            let token = config
                .telegram
                .bot_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .context("telegram bot token missing (set telegram.bot_token or TG_BOT_TOKEN)")?;

            TelegramNotifier::new(token)
                .with_api_url(&config.telegram.api_base_url)?
                .set_webhook(&url)
                .await?;
            println!("Webhook set to {url}");
        }
    }

    Ok(())
}
