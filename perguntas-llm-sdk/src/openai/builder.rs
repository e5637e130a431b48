//! Fluent request builders for calling the OpenAI endpoints directly.
//!
//! Both builders fall back to the model the client was configured with, so
//! `client.message_builder().user_message("…").send()` is a complete call.

use crate::{
    client::{EmbeddingClient, LlmClient},
    error::LlmError,
    openai::{
        client::OpenAIClient,
        types::{
            OpenAIChatCompletionRequest, OpenAIChatCompletionResponse, OpenAIEmbeddingRequest,
            OpenAIEmbeddingResponse, OpenAIMessage,
        },
    },
};

pub struct OpenAIMessageBuilder<'a> {
    client: &'a OpenAIClient,
    request: OpenAIChatCompletionRequest,
}

impl<'a> OpenAIMessageBuilder<'a> {
    pub fn new(client: &'a OpenAIClient) -> Self {
        Self {
            client,
            request: OpenAIChatCompletionRequest {
                model: LlmClient::model_name(client).to_string(),
                messages: Vec::new(),
                max_completion_tokens: None,
                temperature: None,
                top_p: None,
                stop: None,
            },
        }
    }

    /// Overrides the client's chat model for this request
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = model.into();
        self
    }

    pub fn max_completion_tokens(mut self, tokens: u32) -> Self {
        self.request.max_completion_tokens = Some(tokens);
        self
    }

    pub fn system_message(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(OpenAIMessage::system(content));
        self
    }

    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(OpenAIMessage::user(content));
        self
    }

    pub fn assistant_message(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(OpenAIMessage::assistant(content));
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.request.top_p = Some(top_p);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.request.stop = Some(stop);
        self
    }

    pub async fn send(self) -> Result<OpenAIChatCompletionResponse, LlmError> {
        if self.request.model.is_empty() {
            return Err(LlmError::invalid_request("Model cannot be empty"));
        }
        if self.request.messages.is_empty() {
            return Err(LlmError::invalid_request("At least one message is required"));
        }
        self.client.create_chat_completion(self.request).await
    }
}

pub struct OpenAIEmbeddingBuilder<'a> {
    client: &'a OpenAIClient,
    request: OpenAIEmbeddingRequest,
}

impl<'a> OpenAIEmbeddingBuilder<'a> {
    pub fn new(client: &'a OpenAIClient) -> Self {
        Self {
            client,
            request: OpenAIEmbeddingRequest {
                input: Vec::new(),
                model: EmbeddingClient::model_name(client).to_string(),
                dimensions: None,
                encoding_format: Some("float".to_string()),
            },
        }
    }

    /// Overrides the client's embedding model for this request
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = model.into();
        self
    }

    pub fn input(mut self, text: impl Into<String>) -> Self {
        self.request.input.push(text.into());
        self
    }

    pub fn inputs<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.input.extend(texts.into_iter().map(Into::into));
        self
    }

    /// Truncated vector size; only the text-embedding-3 family accepts it
    pub fn dimensions(mut self, dimensions: u32) -> Self {
        self.request.dimensions = Some(dimensions);
        self
    }

    pub async fn send(self) -> Result<OpenAIEmbeddingResponse, LlmError> {
        if self.request.model.is_empty() {
            return Err(LlmError::invalid_request("Model cannot be empty"));
        }
        if self.request.input.is_empty() {
            return Err(LlmError::invalid_request("Input is required"));
        }
        self.client.create_embeddings(self.request).await
    }
}

impl OpenAIClient {
    pub fn message_builder(&self) -> OpenAIMessageBuilder<'_> {
        OpenAIMessageBuilder::new(self)
    }

    /// ```rust,ignore
    /// let response = client
    ///     .embedding_builder()
    ///     .input("vendas: id, produto, quantidade")
    ///     .dimensions(1024)
    ///     .send()
    ///     .await?;
    /// ```
    pub fn embedding_builder(&self) -> OpenAIEmbeddingBuilder<'_> {
        OpenAIEmbeddingBuilder::new(self)
    }
}
