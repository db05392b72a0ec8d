//! Dialogue endpoints: compose the persona prompt and relay the completion as SSE.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use agora_core::persona;
use agora_llm::{assemble, Message};

use crate::relay::{self, Frame};
use crate::state::AppState;

use super::types::{ContinueRequest, StartRequest};
use super::{error_response, invalid_request, ApiError, ErrorResponse};

/// Continue a dialogue with a figure
///
/// Prepends the persona system prompt to the submitted history and streams the
/// reply as Server-Sent Events: one `data: "<json string>"` event per fragment,
/// then `data: [DONE]`.
#[utoipa::path(
    post,
    path = "/continue",
    tag = "Dialogue",
    request_body = ContinueRequest,
    responses(
        (status = 200, description = "SSE stream of reply fragments", content_type = "text/event-stream"),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Upstream stream could not be opened", body = ErrorResponse)
    )
)]
pub async fn continue_dialogue(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContinueRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(invalid_request)?;

    info!(
        figure = %req.figure,
        mode = %req.mode,
        topic = req.topic.as_deref().unwrap_or(""),
        history = req.messages.len(),
        "continuing dialogue"
    );
    debug!(message = %req.message, "received message");

    let system_prompt = persona::compose(&req.figure, &req.mode, req.topic.as_deref());
    let messages = assemble(system_prompt, req.messages.into_iter().map(Message::from));

    stream_reply(&state, messages).await
}

/// Start a new dialogue with a figure
///
/// Same stream shape as `/continue`, with an empty prior history.
#[utoipa::path(
    post,
    path = "/start",
    tag = "Dialogue",
    request_body = StartRequest,
    responses(
        (status = 200, description = "SSE stream of reply fragments", content_type = "text/event-stream"),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Upstream stream could not be opened", body = ErrorResponse)
    )
)]
pub async fn start_dialogue(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(invalid_request)?;

    info!(
        figure = %req.figure,
        mode = %req.mode,
        topic = req.topic.as_deref().unwrap_or(""),
        "starting dialogue"
    );

    let system_prompt = persona::compose(&req.figure, &req.mode, req.topic.as_deref());
    let messages = assemble(system_prompt, Vec::new());

    stream_reply(&state, messages).await
}

/// Open the upstream stream, then hand it to a relay task feeding the SSE body.
///
/// Nothing is written before the upstream stream is open, so an open failure
/// is still reported as a plain status code.
async fn stream_reply(state: &AppState, messages: Vec<Message>) -> Result<Response, ApiError> {
    let upstream = state.provider.stream_chat(messages).await.map_err(|e| {
        error!(
            provider = state.provider.provider_name(),
            error = %e,
            "error creating stream"
        );
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error creating stream")
    })?;

    let (tx, rx) = mpsc::channel::<Frame>(relay::CHANNEL_CAPACITY);
    tokio::spawn(relay::relay(upstream, tx, state.pacing));

    let events = ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(frame.into_event()));

    Ok((
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(events),
    )
        .into_response())
}
