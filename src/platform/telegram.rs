use std::time::Duration;

use async_trait::async_trait;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, UpdateKind};
use tracing::{debug, info};

use crate::error::PlatformError;
use crate::platform::{BotIdentity, Platform, Update};
use crate::replies::ANONYMOUS_USER;

/// Slack on top of the long-poll timeout before the HTTP client gives up.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Telegram Bot API over teloxide, driven by manual `getUpdates` polling.
pub struct Telegram {
    bot: Bot,
    poll_timeout_secs: u32,
}

impl Telegram {
    pub fn new(token: &str, poll_timeout_secs: u32) -> Result<Self, PlatformError> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(poll_timeout_secs.into()) + HTTP_TIMEOUT_MARGIN)
            .build()
            .map_err(|e| PlatformError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            bot: Bot::with_client(token, client),
            poll_timeout_secs,
        })
    }

    async fn fetch(&self, offset: Option<i32>, timeout: u32) -> Result<Vec<Update>, PlatformError> {
        let mut request = self.bot.get_updates().timeout(timeout);
        if let Some(offset) = offset {
            request = request.offset(offset);
        }
        let updates = request.await?;
        Ok(updates.into_iter().map(convert_update).collect())
    }
}

fn offset_after(id: u64) -> Result<i32, PlatformError> {
    i32::try_from(id + 1)
        .map_err(|_| PlatformError::Unavailable(format!("update id {id} out of offset range")))
}

fn convert_update(update: teloxide::types::Update) -> Update {
    let id = u64::from(update.id.0);
    let chat_id = update.chat().map(|chat| chat.id.0).unwrap_or_default();

    match update.kind {
        UpdateKind::Message(msg) => {
            let user = msg.from.as_ref();
            Update {
                id,
                chat_id,
                user_id: user.map(|u| u.id.0),
                user_name: user
                    .map(|u| u.first_name.clone())
                    .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
                text: msg.text().map(str::to_string),
            }
        }
        _ => Update {
            id,
            chat_id,
            user_id: None,
            user_name: ANONYMOUS_USER.to_string(),
            text: None,
        },
    }
}

#[async_trait]
impl Platform for Telegram {
    async fn get_self(&self) -> Result<BotIdentity, PlatformError> {
        let me = self.bot.get_me().await?;
        Ok(BotIdentity {
            id: me.user.id.0,
            username: me.user.username.clone().unwrap_or_default(),
        })
    }

    async fn get_updates(
        &self,
        since: Option<u64>,
        drop_pending: bool,
    ) -> Result<Vec<Update>, PlatformError> {
        let mut since = since;

        if drop_pending {
            // Offset -1 returns only the newest queued update; polling past it
            // acknowledges the whole backlog.
            if let Some(last) = self.fetch(Some(-1), 0).await?.last() {
                info!("Dropping pending updates up to id {}", last.id);
                since = Some(since.map_or(last.id, |s| s.max(last.id)));
            }
        }

        let offset = since.map(offset_after).transpose()?;
        let updates = self.fetch(offset, self.poll_timeout_secs).await?;
        debug!("Fetched {} update(s)", updates.len());
        Ok(updates)
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError> {
        self.bot.send_message(ChatId(chat_id), text.to_string()).await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), PlatformError> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await?;
        Ok(())
    }
}
