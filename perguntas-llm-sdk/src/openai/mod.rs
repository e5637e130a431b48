pub mod builder;
pub mod client;
pub mod types;

pub use builder::{OpenAIEmbeddingBuilder, OpenAIMessageBuilder};
pub use client::OpenAIClient;
pub use types::*;
