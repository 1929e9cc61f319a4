//! Streaming Assistant Integration
//!
//! Pluggable completion capability: submit a prompt, get back a finite,
//! non-restartable stream of incremental text chunks. The relay accumulates
//! the chunks and republishes one envelope per chunk so subscribers render
//! the reply incrementally.

mod openai;
mod sse;

pub use openai::OpenAiCompletionClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::shared::error::AppError;

/// A stream of incremental completion text chunks.
pub type ChunkStream = BoxStream<'static, Result<String, AppError>>;

/// Completion provider contract.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Open a streaming completion for `prompt`. The stream ends at the
    /// provider's terminal chunk and cannot be restarted.
    async fn stream_completion(&self, prompt: &str) -> Result<ChunkStream, AppError>;
}
