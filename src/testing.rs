//! In-memory stand-ins for the platform and the completion API.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{CompletionError, PlatformError};
use crate::llm::Completer;
use crate::platform::{BotIdentity, Platform, Update};

pub fn text_update(id: u64, chat_id: i64, user_name: &str, text: &str) -> Update {
    Update {
        id,
        chat_id,
        user_id: Some(chat_id as u64),
        user_name: user_name.to_string(),
        text: Some(text.to_string()),
    }
}

pub fn photo_update(id: u64, chat_id: i64) -> Update {
    Update {
        id,
        chat_id,
        user_id: Some(chat_id as u64),
        user_name: "Ann".to_string(),
        text: None,
    }
}

/// Scripted platform. Each `get_updates` call pops the next batch; once the
/// script runs out the shutdown token (if any) is cancelled.
#[derive(Default)]
pub struct FakePlatform {
    fail_identity: bool,
    batches: Mutex<VecDeque<Result<Vec<Update>, String>>>,
    failing_chats: HashSet<i64>,
    shutdown: Option<CancellationToken>,
    cancel_on_send: bool,
    sent: Mutex<Vec<(i64, String)>>,
    fetches: Mutex<Vec<(Option<u64>, bool)>>,
    get_self_calls: AtomicUsize,
    typing_calls: AtomicUsize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_identity(mut self) -> Self {
        self.fail_identity = true;
        self
    }

    pub fn with_batch(self, updates: Vec<Update>) -> Self {
        self.batches.lock().unwrap().push_back(Ok(updates));
        self
    }

    pub fn with_fetch_error(self, message: &str) -> Self {
        self.batches
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Every send to `chat_id` fails.
    pub fn failing_sends_to(mut self, chat_id: i64) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Cancel the shutdown token as soon as a reply is sent.
    pub fn cancelling_on_send(mut self) -> Self {
        self.cancel_on_send = true;
        self
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn fetches(&self) -> Vec<(Option<u64>, bool)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn get_updates_calls(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn get_self_calls(&self) -> usize {
        self.get_self_calls.load(Ordering::SeqCst)
    }

    pub fn typing_calls(&self) -> usize {
        self.typing_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn get_self(&self) -> Result<BotIdentity, PlatformError> {
        self.get_self_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_identity {
            return Err(PlatformError::Unavailable("401 Unauthorized".to_string()));
        }
        Ok(BotIdentity {
            id: 42,
            username: "answer_bot".to_string(),
        })
    }

    async fn get_updates(
        &self,
        since: Option<u64>,
        drop_pending: bool,
    ) -> Result<Vec<Update>, PlatformError> {
        self.fetches.lock().unwrap().push((since, drop_pending));

        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(Ok(updates)) => Ok(updates
                .into_iter()
                .filter(|u| since.map_or(true, |s| u.id > s))
                .collect()),
            Some(Err(message)) => Err(PlatformError::Unavailable(message)),
            None => {
                if let Some(token) = &self.shutdown {
                    token.cancel();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError> {
        if self.failing_chats.contains(&chat_id) {
            return Err(PlatformError::Unavailable(format!(
                "chat {chat_id} not found"
            )));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        if self.cancel_on_send {
            if let Some(token) = &self.shutdown {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn send_typing(&self, _chat_id: i64) -> Result<(), PlatformError> {
        self.typing_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

enum Outcome {
    Reply(String),
    Upstream,
    Transport,
}

/// Completion service with a fixed outcome that records the prompts it saw.
pub struct FakeCompleter {
    outcome: Outcome,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompleter {
    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_outcome(Outcome::Reply(text.to_string()))
    }

    pub fn failing_upstream() -> Self {
        Self::with_outcome(Outcome::Upstream)
    }

    pub fn failing_transport() -> Self {
        Self::with_outcome(Outcome::Transport)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(text.to_string());
        match &self.outcome {
            Outcome::Reply(reply) => Ok(reply.clone()),
            Outcome::Upstream => Err(CompletionError::Upstream("status 500".to_string())),
            Outcome::Transport => Err(CompletionError::Transport("timed out".to_string())),
        }
    }
}
