//! Provider name constants
//!
//! Canonical provider names reported by `provider_name()`.

/// OpenAI provider (chat completions and embeddings)
pub const OPENAI: &str = "openai";
