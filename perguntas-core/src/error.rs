use perguntas_llm_sdk::error::LlmError;
use thiserror::Error;

/// Failure of one stage of the question pipeline.
///
/// The caller always receives exactly one of these or a full answer;
/// partial results are never returned.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The question (or a request parameter) cannot be processed
    #[error("Pergunta inválida: {message}")]
    InvalidQuestion { message: String },

    /// Embedding service or schema index unavailable
    #[error("Falha ao recuperar o esquema: {message}")]
    Retrieval { message: String },

    /// Language model unavailable or returned no SQL
    #[error("Falha ao gerar SQL: {message}")]
    Synthesis { message: String },

    /// Validator rejected the statement; `reason` is logged, never returned
    #[error("Consulta insegura gerada")]
    UnsafeQuery { reason: String },

    /// Statement exceeded the execution deadline
    #[error("Tempo limite de {timeout_seconds}s excedido na consulta")]
    QueryTimeout { timeout_seconds: u64 },

    /// Database error, carrying the driver's message verbatim
    #[error("{message}")]
    QueryExecution { message: String },
}

impl PipelineError {
    pub fn invalid_question<S: Into<String>>(message: S) -> Self {
        Self::InvalidQuestion {
            message: message.into(),
        }
    }

    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    pub fn synthesis<S: Into<String>>(message: S) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    pub fn unsafe_query<S: Into<String>>(reason: S) -> Self {
        Self::UnsafeQuery {
            reason: reason.into(),
        }
    }

    pub fn query_timeout(timeout_seconds: u64) -> Self {
        Self::QueryTimeout { timeout_seconds }
    }

    pub fn query_execution<S: Into<String>>(message: S) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }

    /// Short machine-readable name used as the `outcome` of the query event
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidQuestion { .. } => "invalid_question",
            PipelineError::Retrieval { .. } => "retrieval_error",
            PipelineError::Synthesis { .. } => "synthesis_error",
            PipelineError::UnsafeQuery { .. } => "unsafe_query",
            PipelineError::QueryTimeout { .. } => "query_timeout",
            PipelineError::QueryExecution { .. } => "query_execution_error",
        }
    }

    /// Errors caused by the question or the generated SQL rather than by an
    /// upstream service
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            PipelineError::Retrieval { .. } | PipelineError::Synthesis { .. }
        )
    }
}

/// Errors raised while building, refreshing or querying the schema index
#[derive(Error, Debug)]
pub enum SchemaIndexError {
    #[error("Database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },

    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {source}")]
    Embedding {
        #[from]
        source: LlmError,
    },

    #[error("Invalid schema index entry: {message}")]
    InvalidEntry { message: String },
}

impl SchemaIndexError {
    pub fn invalid_entry<S: Into<String>>(message: S) -> Self {
        Self::InvalidEntry {
            message: message.into(),
        }
    }
}
