use thiserror::Error;

/// Failure of a call to the messaging platform (fetch, send, identity check).
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the completion API. Never shown to the chat user.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Auth failure, non-2xx status, malformed body or a missing field.
    #[error("completion API error: {0}")]
    Upstream(String),

    /// Network failure or timeout.
    #[error("completion transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CompletionError::Upstream(format!("malformed response body: {err}"))
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

/// Failure while handling a single update. The update is abandoned.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to send reply to chat {chat_id}: {source}")]
    Send {
        chat_id: i64,
        #[source]
        source: PlatformError,
    },
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("identity check against the platform failed: {0}")]
    IdentityCheck(#[source] PlatformError),
}
