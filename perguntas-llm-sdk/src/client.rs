use crate::{
    error::LlmError,
    types::{CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse},
};
use async_trait::async_trait;

/// Core trait for language-model clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a request (non-streaming)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Get provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Get model name (e.g., "gpt-4o")
    fn model_name(&self) -> &str;
}

/// Core trait for text embedding clients
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed every input text; vectors are returned in input order
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LlmError>;

    /// Get provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Get embedding model name (e.g., "text-embedding-3-large")
    fn model_name(&self) -> &str;
}
