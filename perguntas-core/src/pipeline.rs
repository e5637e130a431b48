use perguntas_llm_sdk::client::{EmbeddingClient, LlmClient};
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::executor::{ConnectionSource, QueryExecutor};
use crate::formatter::AnswerFormatter;
use crate::retriever::SchemaRetriever;
use crate::schema_index::SchemaIndex;
use crate::synthesizer::SqlSynthesizer;
use crate::types::{AnswerResponse, Question};
use crate::validator::SafetyValidator;

/// Target of the one structured event logged per question
pub const QUERY_EVENT_TARGET: &str = "perguntas::query";

/// Question → schema context → SQL → validated SQL → rows → optional sentence.
///
/// Stages run strictly in sequence; the only shared state between concurrent
/// calls is the read-only schema index.
pub struct Pipeline {
    retriever: SchemaRetriever,
    synthesizer: SqlSynthesizer,
    validator: SafetyValidator,
    executor: QueryExecutor,
    formatter: Option<AnswerFormatter>,
    top_k: usize,
}

#[derive(Default)]
struct QueryEvent {
    context: Option<String>,
    sql: Option<String>,
    row_count: Option<usize>,
}

impl Pipeline {
    pub fn new(
        config: &PipelineConfig,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn SchemaIndex>,
        connections: Arc<dyn ConnectionSource>,
    ) -> Self {
        Self {
            retriever: SchemaRetriever::new(embedder, index, config.service_timeout()),
            synthesizer: SqlSynthesizer::new(
                llm,
                config.limit_cap,
                config.max_completion_tokens,
                config.service_timeout(),
            ),
            validator: SafetyValidator::new(config.limit_cap),
            executor: QueryExecutor::new(connections, config.query_timeout()),
            formatter: config
                .human_answer
                .then(|| AnswerFormatter::new(config.company_name.clone())),
            top_k: config.top_k,
        }
    }

    /// Answers one question. Either the full response or a single error comes
    /// back; partial results never do.
    pub async fn ask(&self, question: &str) -> Result<AnswerResponse, PipelineError> {
        let started = Instant::now();
        let mut event = QueryEvent::default();

        let result = self.run(question, &mut event).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                target: QUERY_EVENT_TARGET,
                question,
                context = event.context.as_deref(),
                sql = event.sql.as_deref(),
                row_count = event.row_count,
                duration_ms,
                outcome = "ok",
                "query"
            ),
            Err(err) => {
                let reason = match err {
                    PipelineError::UnsafeQuery { reason } => Some(reason.as_str()),
                    _ => None,
                };
                tracing::warn!(
                    target: QUERY_EVENT_TARGET,
                    question,
                    context = event.context.as_deref(),
                    sql = event.sql.as_deref(),
                    duration_ms,
                    outcome = err.kind(),
                    error = %err,
                    reason,
                    "query"
                )
            }
        }

        result
    }

    async fn run(
        &self,
        question: &str,
        event: &mut QueryEvent,
    ) -> Result<AnswerResponse, PipelineError> {
        let question = Question::new(question)?;

        let context = self.retriever.retrieve(&question, self.top_k).await?;
        event.context = Some(context.to_string());

        let generated = self.synthesizer.synthesize(&question, &context).await?;
        event.sql = Some(generated.to_string());

        let sql = self.validator.validate(&generated)?;
        event.sql = Some(sql.to_string());

        let rows = self.executor.execute(&sql).await?;
        event.row_count = Some(rows.len());

        let resposta = self
            .formatter
            .as_ref()
            .map(|f| f.format(question.as_str(), &rows, sql.as_str()));

        Ok(AnswerResponse {
            sql: sql.into_string(),
            resultado: rows,
            resposta,
        })
    }
}
