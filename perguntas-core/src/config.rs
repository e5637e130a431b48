use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid configuration: {0}")]
pub struct InvalidConfig(pub String);

/// Tunables of the question pipeline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of nearest schema objects fed to the synthesizer
    pub top_k: usize,
    /// Maximum rows any statement may return
    pub limit_cap: u64,
    /// Wall-clock deadline for one statement
    pub query_timeout_seconds: u64,
    /// Vector size shared by the embedding model and the schema index
    pub embedding_dimension: usize,
    /// Deadline for each embedding and completion call
    pub service_timeout_seconds: u64,
    /// Also render the rows as a Portuguese sentence
    pub human_answer: bool,
    /// Subject of the rendered sentence
    pub company_name: String,
    pub max_completion_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            limit_cap: 100,
            query_timeout_seconds: 10,
            embedding_dimension: perguntas_llm_sdk::models::openai::TEXT_EMBEDDING_3_LARGE_DIMENSION,
            service_timeout_seconds: 30,
            human_answer: true,
            company_name: "A Distribuidora XYZ".to_string(),
            max_completion_tokens: 512,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.top_k == 0 {
            return Err(InvalidConfig("pipeline.top_k must be at least 1".into()));
        }
        if self.limit_cap == 0 {
            return Err(InvalidConfig("pipeline.limit_cap must be at least 1".into()));
        }
        if self.query_timeout_seconds == 0 {
            return Err(InvalidConfig(
                "pipeline.query_timeout_seconds must be at least 1".into(),
            ));
        }
        if self.embedding_dimension == 0 {
            return Err(InvalidConfig(
                "pipeline.embedding_dimension must be at least 1".into(),
            ));
        }
        if self.service_timeout_seconds == 0 {
            return Err(InvalidConfig(
                "pipeline.service_timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_seconds)
    }
}

/// Settings of the schema refresh job
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaIndexConfig {
    /// Database schema whose tables are indexed
    pub schema: String,
    /// Populate an empty index when the API starts
    pub refresh_on_startup: bool,
    /// Documents per embedding request
    pub batch_size: usize,
}

impl Default for SchemaIndexConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            refresh_on_startup: true,
            batch_size: 100,
        }
    }
}

impl SchemaIndexConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.schema.trim().is_empty() {
            return Err(InvalidConfig("schema_index.schema cannot be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(InvalidConfig(
                "schema_index.batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
