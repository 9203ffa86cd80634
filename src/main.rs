mod bot;
mod config;
mod error;
mod llm;
mod platform;
mod polling;
mod replies;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::UpdateDispatcher;
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::llm::{AiResponder, YandexGpt};
use crate::platform::telegram::Telegram;
use crate::platform::Platform;
use crate::replies::ResponseSelector;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,answer_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Starting answer bot ===");

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let explicit_path = std::env::args().nth(1).map(PathBuf::from);
    let required = explicit_path.is_some();
    let config_path = explicit_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = Config::load(&config_path, required)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    info!("  Long-poll timeout: {}s", config.polling.timeout_secs);
    info!("  Drop pending updates: {}", config.polling.drop_pending_updates);

    let platform: Arc<dyn Platform> = Arc::new(
        Telegram::new(&config.bot_token, config.polling.timeout_secs)
            .context("Failed to create Telegram client")?,
    );

    let ai = match &config.ai_credentials {
        Some(credentials) => {
            let http = reqwest::Client::builder()
                .timeout(config.ai.request_timeout())
                .build()
                .context("Failed to build HTTP client for the completion API")?;
            info!("  AI model: {}", config.ai.model);
            let gpt = YandexGpt::new(http, config.ai.clone(), credentials.clone());
            Some(AiResponder::new(Arc::new(gpt)))
        }
        None => {
            info!("  AI disabled: AI_API_KEY and AI_FOLDER_ID are not both set");
            None
        }
    };

    let dispatcher = UpdateDispatcher::new(platform.clone(), ResponseSelector::from_entropy(), ai);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });
    }

    polling::start(platform, dispatcher, &config.polling, &shutdown)
        .await
        .context("Startup failed")?;

    info!("Bot stopped");
    Ok(())
}
