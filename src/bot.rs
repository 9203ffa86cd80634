use std::sync::Arc;

use chrono::Local;
use rand::Rng;
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::llm::AiResponder;
use crate::platform::{Platform, Update};
use crate::replies::{Command, ResponseSelector};

/// Routes one update to a command reply, the AI responder or a random
/// fallback phrase, and sends the result back.
pub struct UpdateDispatcher<R> {
    platform: Arc<dyn Platform>,
    selector: ResponseSelector<R>,
    ai: Option<AiResponder>,
}

impl<R: Rng> UpdateDispatcher<R> {
    /// `ai` is `None` when no completion credentials are configured.
    pub fn new(
        platform: Arc<dyn Platform>,
        selector: ResponseSelector<R>,
        ai: Option<AiResponder>,
    ) -> Self {
        Self {
            platform,
            selector,
            ai,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }

    pub async fn dispatch(&mut self, update: &Update) -> Result<(), DispatchError> {
        let text = match update.text.as_deref() {
            Some(t) => t,
            None => {
                debug!("Ignoring non-text update {}", update.id);
                return Ok(());
            }
        };

        info!(
            "[{}] {} ({}): {}",
            Local::now().format("%H:%M:%S"),
            update.user_name,
            update
                .user_id
                .map_or_else(|| "?".to_string(), |id| id.to_string()),
            text
        );

        if let Some(command) = Command::parse(text) {
            for reply in command.replies(&update.user_name) {
                self.send(update.chat_id, &reply).await?;
            }
            info!("Sent {} to chat {}", command.label(), update.chat_id);
            return Ok(());
        }

        let response = match &self.ai {
            Some(ai) => {
                if let Err(e) = self.platform.send_typing(update.chat_id).await {
                    debug!("Typing indicator failed for chat {}: {}", update.chat_id, e);
                }
                let reply = ai.reply(text).await;
                info!("AI answer for chat {}: {}", update.chat_id, reply);
                reply
            }
            None => {
                let reply = self.selector.pick_random().to_string();
                info!("Random answer for chat {}: {}", update.chat_id, reply);
                reply
            }
        };

        self.send(update.chat_id, &response).await
    }

    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        self.platform
            .send_text(chat_id, text)
            .await
            .map_err(|source| DispatchError::Send { chat_id, source })
    }
}
