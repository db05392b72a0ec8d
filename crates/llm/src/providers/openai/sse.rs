//! SSE decoding for the OpenAI chat-completions streaming API.
//!
//! The response body is a sequence of `data: {chunk}` lines separated by blank
//! lines and terminated by `data: [DONE]`.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::trace;

use crate::provider::{Increment, IncrementStream, LlmError};

const DONE_MARKER: &str = "[DONE]";

/// Longest unterminated line kept in the buffer before the stream is failed.
pub(super) const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

/// What a single SSE line means for the increment stream.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Line {
    Increment(Increment),
    Done,
    Ignored,
}

/// Interpret one line of the response body (without its newline).
pub(super) fn parse_line(line: &str) -> Result<Line, LlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        // Blank separators, comments, `event:` and `id:` fields.
        return Ok(Line::Ignored);
    };
    let data = data.trim();
    if data == DONE_MARKER {
        return Ok(Line::Done);
    }
    if data.is_empty() {
        return Ok(Line::Ignored);
    }

    let payload: ChunkPayload =
        serde_json::from_str(data).map_err(|e| LlmError::ParseError(e.to_string()))?;
    if let Some(err) = payload.error {
        return Err(LlmError::StreamError(err.message));
    }

    // Only the first choice is relayed; a chunk without choices is an empty increment.
    let increment = payload
        .choices
        .into_iter()
        .next()
        .map(|choice| Increment {
            content: choice.delta.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
        .unwrap_or_default();
    Ok(Line::Increment(increment))
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<Increment, LlmError>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    /// Handle every complete line currently buffered.
    fn drain_lines(&mut self) {
        while !self.finished {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line);
        }
        if !self.finished && self.buffer.len() > MAX_LINE_BYTES {
            self.pending.push_back(Err(LlmError::ParseError(format!(
                "line exceeds {} bytes without a newline",
                MAX_LINE_BYTES
            ))));
            self.finished = true;
            self.buffer.clear();
        }
    }

    /// Handle a trailing line that was never newline-terminated.
    fn flush_tail(&mut self) {
        if !self.finished && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(&line);
        }
        self.finished = true;
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\n', '\r']);
        match parse_line(line) {
            Ok(Line::Increment(increment)) => self.pending.push_back(Ok(increment)),
            Ok(Line::Done) => {
                trace!("upstream sent end-of-stream marker");
                self.finished = true;
                self.buffer.clear();
            }
            Ok(Line::Ignored) => {}
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finished = true;
                self.buffer.clear();
            }
        }
    }
}

/// Turn a raw response body into a stream of increments.
///
/// The stream ends after `[DONE]`, after the first error, or when the body
/// runs out. Lines may be split across body chunks at any byte.
pub(crate) fn decode_stream<S, E>(bytes: S) -> IncrementStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::StreamError(e.to_string())), state));
                }
                None => state.flush_tail(),
            }
        }
    }))
}
