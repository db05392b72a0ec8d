//! [`ChatStreamProvider`] implementation for the OpenAI chat-completions API.

mod sse;


use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use agora_core::config::LlmConfig;

use crate::provider::{ChatStreamProvider, IncrementStream, LlmError, Message};

use sse::decode_stream;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Streams completions from `/v1/chat/completions` with `stream: true`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatStreamProvider for OpenAiProvider {
    async fn stream_chat(&self, messages: Vec<Message>) -> Result<IncrementStream, LlmError> {
        let url = self.completions_url();
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        debug!(model = %self.model, url = %url, messages = messages.len(), "starting OpenAI streaming request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_stream(response.bytes_stream()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
