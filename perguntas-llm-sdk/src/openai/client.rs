use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::{
    error::LlmError,
    models::openai::{GPT_4O_MINI_ID, TEXT_EMBEDDING_3_LARGE_ID},
    openai::types::{
        OpenAIChatCompletionRequest, OpenAIChatCompletionResponse, OpenAIEmbeddingRequest,
        OpenAIEmbeddingResponse, OpenAIErrorResponse, OpenAIMessage, OpenAIRole,
    },
    types::{
        CompletionRequest, CompletionResponse, ContentBlock, EmbeddingRequest, EmbeddingResponse,
        Role, Usage,
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI client for chat completions and text embeddings
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    http_client: reqwest::Client,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::authentication("API key cannot be empty"));
        }

        let http_client = build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;

        Ok(Self {
            api_key,
            base_url: "https://api.openai.com".to_string(),
            chat_model: GPT_4O_MINI_ID.to_string(),
            embedding_model: TEXT_EMBEDDING_3_LARGE_ID.to_string(),
            http_client,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the transport timeout applied to every HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    /// Set the model reported by `LlmClient::model_name`
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Set the model reported by `EmbeddingClient::model_name`
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Create a chat completion using the OpenAI Chat Completions API
    pub async fn create_chat_completion(
        &self,
        request: OpenAIChatCompletionRequest,
    ) -> Result<OpenAIChatCompletionResponse, LlmError> {
        self.post_json("/v1/chat/completions", &request).await
    }

    /// Create embeddings using the OpenAI Embeddings API
    pub async fn create_embeddings(
        &self,
        request: OpenAIEmbeddingRequest,
    ) -> Result<OpenAIEmbeddingResponse, LlmError> {
        self.post_json("/v1/embeddings", &request).await
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, LlmError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|_| LlmError::authentication("Invalid API key format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(url = %url, "Sending OpenAI request");

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network { source: e })?;

        let status = response.status();

        if status.is_success() {
            return response
                .json::<Resp>()
                .await
                .map_err(|e| LlmError::internal(format!("Failed to parse response: {}", e)));
        }

        // Extract retry-after header before consuming the response
        let retry_after = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
        } else {
            None
        };

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = match serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
            Ok(error_response) => error_response.error.message,
            Err(_) => error_text,
        };

        tracing::warn!(status = status.as_u16(), message = %message, "OpenAI request failed");

        Err(LlmError::from_status(status, message, retry_after))
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Network { source: e })
}

fn to_openai_role(role: &Role) -> OpenAIRole {
    match role {
        Role::User => OpenAIRole::User,
        Role::Assistant => OpenAIRole::Assistant,
        Role::System => OpenAIRole::System,
    }
}

#[async_trait]
impl crate::client::LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(OpenAIMessage::system(system));
        }
        messages.extend(
            request
                .messages
                .iter()
                .map(|msg| OpenAIMessage::new(to_openai_role(&msg.role), msg.text_content())),
        );

        let openai_request = OpenAIChatCompletionRequest {
            model: request.model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            top_p: request.top_p,
            stop: request.stop_sequences,
        };

        let openai_response = self.create_chat_completion(openai_request).await?;

        let choice = openai_response
            .choices
            .first()
            .ok_or_else(|| LlmError::internal("No completion choices returned"))?;

        Ok(CompletionResponse {
            content: vec![ContentBlock::Text {
                text: choice.message.content.clone(),
            }],
            role: match choice.message.role {
                OpenAIRole::User => Role::User,
                OpenAIRole::System => Role::System,
                OpenAIRole::Assistant | OpenAIRole::Tool => Role::Assistant,
            },
            usage: Usage {
                input_tokens: openai_response.usage.prompt_tokens,
                output_tokens: openai_response.usage.completion_tokens,
            },
            stop_reason: choice.finish_reason.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        crate::providers::OPENAI
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl crate::client::EmbeddingClient for OpenAIClient {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        if request.input.is_empty() {
            return Err(LlmError::invalid_request("Input is required"));
        }
        let expected = request.input.len();

        let openai_request = OpenAIEmbeddingRequest {
            input: request.input,
            model: request.model,
            dimensions: request.dimensions,
            encoding_format: Some("float".to_string()),
        };

        let openai_response = self.create_embeddings(openai_request).await?;
        let model = openai_response.model.clone();
        let usage = Usage {
            input_tokens: openai_response.usage.prompt_tokens,
            output_tokens: 0,
        };
        let embeddings = openai_response.into_ordered_vectors();

        if embeddings.len() != expected {
            return Err(LlmError::internal(format!(
                "Expected {} embeddings, received {}",
                expected,
                embeddings.len()
            )));
        }

        Ok(EmbeddingResponse {
            model,
            embeddings,
            usage,
        })
    }

    fn provider_name(&self) -> &str {
        crate::providers::OPENAI
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}
