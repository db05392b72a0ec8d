use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// A chat message in the shape the completion API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Message role. Unrecognized roles are carried verbatim so the upstream
/// provider gets to decide what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of streamed output. `content` may be empty (role-only or
/// finish chunks).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Increment {
    pub content: String,
    pub finish_reason: Option<String>,
}

impl Increment {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

pub type IncrementStream = Pin<Box<dyn Stream<Item = Result<Increment, LlmError>> + Send>>;

/// A completion backend that streams its answer.
///
/// The returned stream ends after the provider's end-of-stream marker.
/// Dropping it aborts the underlying request.
#[async_trait]
pub trait ChatStreamProvider: Send + Sync {
    async fn stream_chat(&self, messages: Vec<Message>) -> Result<IncrementStream, LlmError>;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Provider name for logging/debugging.
    fn provider_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse stream chunk: {0}")]
    ParseError(String),
    #[error("stream error: {0}")]
    StreamError(String),
}

/// Scripted provider for exercising the relay without network calls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use futures::{stream, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    #[derive(Debug, Clone)]
    enum Script {
        Deltas(Vec<String>),
        ErrorAfter(Vec<String>, String),
        HangAfter(Vec<String>),
        OpenFailure(u16, String),
    }

    /// Replays the same script on every call and records what it was sent.
    pub struct MockChatProvider {
        script: Script,
        calls: Mutex<Vec<Vec<Message>>>,
        live: Arc<AtomicUsize>,
    }

    /// Counts itself as live until dropped.
    struct Tracked {
        inner: IncrementStream,
        live: Arc<AtomicUsize>,
    }

    impl Tracked {
        fn new(inner: IncrementStream, live: &Arc<AtomicUsize>) -> Self {
            live.fetch_add(1, Ordering::SeqCst);
            Self {
                inner,
                live: Arc::clone(live),
            }
        }
    }

    impl Stream for Tracked {
        type Item = Result<Increment, LlmError>;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.get_mut().inner.as_mut().poll_next(cx)
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn owned(deltas: &[&str]) -> Vec<String> {
        deltas.iter().map(|s| s.to_string()).collect()
    }

    impl MockChatProvider {
        fn with_script(script: Script) -> Self {
            Self {
                script,
                calls: Mutex::new(Vec::new()),
                live: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Yield each delta, then end cleanly.
        pub fn with_deltas(deltas: &[&str]) -> Self {
            Self::with_script(Script::Deltas(owned(deltas)))
        }

        /// Yield each delta, then a stream error.
        pub fn with_error_after(deltas: &[&str], message: &str) -> Self {
            Self::with_script(Script::ErrorAfter(owned(deltas), message.to_string()))
        }

        /// Yield each delta, then never produce another item.
        pub fn hanging_after(deltas: &[&str]) -> Self {
            Self::with_script(Script::HangAfter(owned(deltas)))
        }

        /// Refuse to open the stream.
        pub fn failing_open(status: u16, body: &str) -> Self {
            Self::with_script(Script::OpenFailure(status, body.to_string()))
        }

        pub fn calls(&self) -> Vec<Vec<Message>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Streams handed out and not yet dropped.
        pub fn live_streams(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    fn increments(deltas: Vec<String>) -> Vec<Result<Increment, LlmError>> {
        deltas.into_iter().map(|d| Ok(Increment::text(d))).collect()
    }

    #[async_trait]
    impl ChatStreamProvider for MockChatProvider {
        async fn stream_chat(&self, messages: Vec<Message>) -> Result<IncrementStream, LlmError> {
            self.calls.lock().unwrap().push(messages);
            let inner: IncrementStream = match self.script.clone() {
                Script::Deltas(deltas) => Box::pin(stream::iter(increments(deltas))),
                Script::ErrorAfter(deltas, message) => {
                    let mut items = increments(deltas);
                    items.push(Err(LlmError::StreamError(message)));
                    Box::pin(stream::iter(items))
                }
                Script::HangAfter(deltas) => {
                    Box::pin(stream::iter(increments(deltas)).chain(stream::pending()))
                }
                Script::OpenFailure(status, body) => {
                    return Err(LlmError::ApiError { status, body })
                }
            };
            Ok(Box::pin(Tracked::new(inner, &self.live)))
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }
}
