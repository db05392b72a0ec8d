//! Upstream increment stream → SSE frame relay.
//!
//! Each non-empty increment becomes exactly one `data: "<json string>"` event,
//! followed by the pacing delay. Whatever ends the loop (clean end-of-stream,
//! upstream error, or the client going away), one `data: [DONE]` event is sent
//! afterwards and only then is the upstream stream released.

use std::time::Duration;

use axum::response::sse::Event;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use agora_llm::IncrementStream;

/// Payload of the terminal event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Frames buffered between the relay task and the response body.
pub const CHANNEL_CAPACITY: usize = 32;

/// One SSE event as produced by the relay loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Delta(String),
    Done,
}

impl Frame {
    /// The `data:` payload for this frame.
    pub fn data(&self) -> String {
        match self {
            // Serializing a &str cannot fail.
            Frame::Delta(text) => serde_json::to_string(text).unwrap_or_default(),
            Frame::Done => DONE_SENTINEL.to_string(),
        }
    }

    pub fn into_event(self) -> Event {
        Event::default().data(self.data())
    }
}

/// Why the relay loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    Completed,
    UpstreamError(String),
    ClientGone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub fragments: usize,
    pub end: RelayEnd,
}

/// Pump `upstream` into `tx` until it ends, fails, or the receiver is dropped.
pub async fn relay(
    mut upstream: IncrementStream,
    tx: mpsc::Sender<Frame>,
    pacing: Duration,
) -> RelayOutcome {
    let mut fragments = 0usize;

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => break RelayEnd::ClientGone,
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(increment)) => {
                if let Some(reason) = &increment.finish_reason {
                    debug!(finish_reason = %reason, "upstream finished");
                }
                if increment.is_empty() {
                    continue;
                }
                if tx.send(Frame::Delta(increment.content)).await.is_err() {
                    break RelayEnd::ClientGone;
                }
                fragments += 1;
                tokio::time::sleep(pacing).await;
            }
            Some(Err(e)) => break RelayEnd::UpstreamError(e.to_string()),
            None => break RelayEnd::Completed,
        }
    };

    match &end {
        RelayEnd::Completed => debug!(fragments, "upstream stream completed"),
        RelayEnd::UpstreamError(e) => warn!(fragments, error = %e, "upstream stream failed, ending relay"),
        RelayEnd::ClientGone => debug!(fragments, "client disconnected, aborting upstream"),
    }

    if tx.send(Frame::Done).await.is_err() {
        debug!("client gone before terminal marker");
    }
    drop(upstream);

    RelayOutcome { fragments, end }
}
