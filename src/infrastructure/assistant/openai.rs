//! OpenAI-compatible completion client.
//!
//! Sends a streaming chat-completions request and exposes the reply as a
//! stream of incremental text chunks. The stream ends at the first
//! terminal chunk (`finish_reason` set) or the `[DONE]` marker.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sse::parse_sse_data;
use super::{ChunkStream, CompletionClient};
use crate::config::AssistantSettings;
use crate::shared::error::AppError;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

/// Completion client for OpenAI-compatible chat APIs.
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    settings: AssistantSettings,
}

impl OpenAiCompletionClient {
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn stream_completion(&self, prompt: &str) -> Result<ChunkStream, AppError> {
        if !self.settings.is_enabled() {
            return Err(AppError::Assistant("no completion provider configured".into()));
        }

        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        debug!(model = %self.settings.model, "Opening completion stream");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&CompletionRequest {
                model: &self.settings.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                stream: true,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Assistant(e.to_string()))?;

        let chunks = parse_sse_data(response.bytes_stream())
            .map(|json| serde_json::from_str::<CompletionChunk>(&json))
            // Stop at the first terminal chunk
            .take_while(|parsed| {
                let keep_going = match parsed {
                    Ok(chunk) => chunk
                        .choices
                        .first()
                        .map(|c| c.finish_reason.is_none())
                        .unwrap_or(true),
                    Err(_) => true,
                };
                futures::future::ready(keep_going)
            })
            .filter_map(|parsed| async move {
                match parsed {
                    Ok(chunk) => chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .map(Ok),
                    Err(e) => Some(Err(AppError::Assistant(format!(
                        "malformed stream chunk: {}",
                        e
                    )))),
                }
            })
            .boxed();

        Ok(chunks)
    }
}
