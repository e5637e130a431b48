//! # Perguntas LLM SDK
//!
//! Provider-neutral traits for chat completion and text embedding, with an
//! OpenAI implementation of both.
//!
//! ## Example
//!
//! ```rust,no_run
//! use perguntas_llm_sdk::client::{EmbeddingClient, LlmClient};
//! use perguntas_llm_sdk::openai::OpenAIClient;
//! use perguntas_llm_sdk::types::{CompletionRequest, EmbeddingRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAIClient::new("your-api-key")?;
//!
//!     let response = client
//!         .complete(CompletionRequest {
//!             messages: vec![Message::user("Quantas vendas hoje?")],
//!             max_tokens: 256,
//!             model: LlmClient::model_name(&client).to_string(),
//!             system: None,
//!             temperature: Some(0.0),
//!             top_p: None,
//!             stop_sequences: None,
//!         })
//!         .await?;
//!     println!("Response: {}", response.text());
//!
//!     let vectors = client
//!         .embed(EmbeddingRequest::single("text-embedding-3-large", "vendas"))
//!         .await?;
//!     println!("Dimension: {}", vectors.embeddings[0].len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod openai;
pub mod providers;
pub mod types;
