use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bot::UpdateDispatcher;
use crate::config::PollingConfig;
use crate::error::StartupError;
use crate::platform::Platform;

/// Drives the bot: fetch updates past the cursor, dispatch them one at a
/// time in arrival order, advance the cursor.
pub struct PollLoop<R> {
    platform: Arc<dyn Platform>,
    dispatcher: UpdateDispatcher<R>,
    cursor: Option<u64>,
    drop_pending: bool,
    retry_delay: Duration,
}

impl<R: Rng> PollLoop<R> {
    pub fn new(
        platform: Arc<dyn Platform>,
        dispatcher: UpdateDispatcher<R>,
        config: &PollingConfig,
    ) -> Self {
        Self {
            platform,
            dispatcher,
            cursor: None,
            drop_pending: config.drop_pending_updates,
            retry_delay: config.retry_delay(),
        }
    }

    /// Id of the last processed update.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Runs until `shutdown` is cancelled. A fetch in flight is abandoned on
    /// cancellation; a dispatch in flight always completes.
    pub async fn run(&mut self, shutdown: &CancellationToken) {
        let mut first_fetch = true;

        while !shutdown.is_cancelled() {
            let drop_pending = self.drop_pending && first_fetch;

            let fetched = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.platform.get_updates(self.cursor, drop_pending) => result,
            };

            let updates = match fetched {
                Ok(updates) => {
                    first_fetch = false;
                    updates
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch updates (cursor {:?}), retrying in {:?}: {}",
                        self.cursor, self.retry_delay, e
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                    continue;
                }
            };

            for update in &updates {
                if let Err(e) = self.dispatcher.dispatch(update).await {
                    error!(
                        "Dropping update {} from {} (user {:?}, chat {}): {}",
                        update.id, update.user_name, update.user_id, update.chat_id, e
                    );
                }
                self.cursor = Some(self.cursor.map_or(update.id, |c| c.max(update.id)));

                if shutdown.is_cancelled() {
                    break;
                }
            }
        }
    }
}

/// Checks that the platform is reachable, then polls until shutdown.
/// No update is fetched when the identity check fails.
pub async fn start<R: Rng>(
    platform: Arc<dyn Platform>,
    dispatcher: UpdateDispatcher<R>,
    config: &PollingConfig,
    shutdown: &CancellationToken,
) -> Result<(), StartupError> {
    let me = platform
        .get_self()
        .await
        .map_err(StartupError::IdentityCheck)?;

    info!("Bot @{} connected", me.username);
    info!("Bot id: {}", me.id);
    info!("Started at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    if dispatcher.ai_enabled() {
        info!("AI answers: enabled");
    } else {
        info!("AI answers: disabled, replying with random phrases");
    }
    info!("Listening for messages...");

    let mut poll_loop = PollLoop::new(platform, dispatcher, config);
    poll_loop.run(shutdown).await;
    info!("Polling stopped at cursor {:?}", poll_loop.cursor());
    Ok(())
}
