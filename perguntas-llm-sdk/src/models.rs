//! Default model identifiers

pub mod openai {
    /// Chat model used for SQL synthesis unless configured otherwise
    pub const GPT_4O_MINI_ID: &str = "gpt-4o-mini";

    /// Embedding model for questions and schema documents
    pub const TEXT_EMBEDDING_3_LARGE_ID: &str = "text-embedding-3-large";
    /// Native vector size of `text-embedding-3-large`
    pub const TEXT_EMBEDDING_3_LARGE_DIMENSION: usize = 3072;
}
