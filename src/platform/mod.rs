pub mod telegram;

use async_trait::async_trait;

use crate::error::PlatformError;

/// One inbound event from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Sequence number used as the polling cursor
    pub id: u64,
    pub chat_id: i64,
    pub user_id: Option<u64>,
    /// Display name of the sender
    pub user_name: String,
    /// `None` for photos, stickers and other non-text updates
    pub text: Option<String>,
}

/// Who the bot is, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: u64,
    pub username: String,
}

/// The messaging platform as seen by the polling loop and the dispatcher.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn get_self(&self) -> Result<BotIdentity, PlatformError>;

    /// Updates with an id greater than `since`. With `drop_pending`, anything
    /// queued before this call is acknowledged and left out.
    async fn get_updates(
        &self,
        since: Option<u64>,
        drop_pending: bool,
    ) -> Result<Vec<Update>, PlatformError>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError>;

    /// "typing..." indicator. Best effort.
    async fn send_typing(&self, chat_id: i64) -> Result<(), PlatformError>;
}
