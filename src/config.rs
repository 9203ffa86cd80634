use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Full runtime configuration: secrets from the environment, tunables from
/// an optional TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Present only when both `AI_API_KEY` and `AI_FOLDER_ID` are set.
    pub ai_credentials: Option<AiCredentials>,
    pub polling: PollingConfig,
    pub ai: AiConfig,
}

#[derive(Clone)]
pub struct AiCredentials {
    pub api_key: String,
    pub folder_id: String,
}

// Keep the key out of logs.
impl std::fmt::Debug for AiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiCredentials")
            .field("api_key", &"***")
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

/// Contents of the optional config file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Long-poll timeout passed to the platform.
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u32,
    /// Pause after a failed fetch before the next attempt.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_drop_pending")]
    pub drop_pending_updates: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            retry_delay_secs: default_retry_delay(),
            drop_pending_updates: default_drop_pending(),
        }
    }
}

impl PollingConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl AiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Model URI in the form the completion API expects.
    pub fn model_uri(&self, folder_id: &str) -> String {
        format!("gpt://{}/{}", folder_id, self.model)
    }
}

fn default_poll_timeout() -> u32 {
    10
}

fn default_retry_delay() -> u64 {
    5
}

fn default_drop_pending() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion".to_string()
}

fn default_model() -> String {
    "yandexgpt-lite".to_string()
}

fn default_temperature() -> f32 {
    0.6
}

fn default_max_tokens() -> u32 {
    200
}

fn default_request_timeout() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "Ты дружелюбный телеграм-бот. Отвечай кратко (1-2 предложения). \
     Будь позитивным и иногда используй эмодзи. \
     Если не знаешь ответа, скажи что-то ободряющее."
        .to_string()
}

impl FileConfig {
    /// Read the TOML file at `path`. A missing file is only tolerated when
    /// `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Build the configuration from the process environment plus the
    /// optional config file.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let file = FileConfig::load(path, required)?;
        Self::from_lookup(file, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] but with an injectable variable lookup.
    pub fn from_lookup<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = non_blank("BOT_TOKEN").context(
            "BOT_TOKEN is not set; export it or add it to .env before starting the bot",
        )?;

        let ai_credentials = match (non_blank("AI_API_KEY"), non_blank("AI_FOLDER_ID")) {
            (Some(api_key), Some(folder_id)) => Some(AiCredentials { api_key, folder_id }),
            _ => None,
        };

        Ok(Self {
            bot_token,
            ai_credentials,
            polling: file.polling,
            ai: file.ai,
        })
    }
}
