use perguntas_llm_sdk::client::LlmClient;
use perguntas_llm_sdk::types::{CompletionRequest, Message};
use std::sync::Arc;
use std::time::Duration;

use crate::error::PipelineError;
use crate::types::{GeneratedSql, Question, SchemaContext};

/// Builds the single prompt sent to the model
pub fn build_prompt(question: &Question, context: &SchemaContext, limit_cap: u64) -> String {
    format!(
        "Você é um assistente que gera consultas SQL para PostgreSQL.\n\
         Use apenas SELECT e sempre inclua LIMIT {limit_cap}.\n\
         Esquema relevante: {context}\n\
         Pergunta: {question}\n\
         SQL:"
    )
}

/// Asks the language model for one SELECT statement.
///
/// Extraction is purely textual; nothing here checks that the SQL is safe.
pub struct SqlSynthesizer {
    llm: Arc<dyn LlmClient>,
    limit_cap: u64,
    max_tokens: u32,
    service_timeout: Duration,
}

impl SqlSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        limit_cap: u64,
        max_tokens: u32,
        service_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            limit_cap,
            max_tokens,
            service_timeout,
        }
    }

    pub async fn synthesize(
        &self,
        question: &Question,
        context: &SchemaContext,
    ) -> Result<GeneratedSql, PipelineError> {
        let request = CompletionRequest {
            messages: vec![Message::user(build_prompt(
                question,
                context,
                self.limit_cap,
            ))],
            max_tokens: self.max_tokens,
            model: self.llm.model_name().to_string(),
            system: None,
            temperature: Some(0.0),
            top_p: None,
            stop_sequences: None,
        };

        let response = tokio::time::timeout(self.service_timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                PipelineError::synthesis(format!(
                    "language model did not answer within {}s",
                    self.service_timeout.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::synthesis(e.to_string()))?;

        let raw = response.text();
        match extract_sql(&raw) {
            Some(sql) => Ok(GeneratedSql::new(sql)),
            None => {
                tracing::warn!(completion = %raw, "Completion contained no SQL");
                Err(PipelineError::synthesis("empty SQL"))
            }
        }
    }
}

/// First non-empty line of a completion with code fences and backticks removed
pub fn extract_sql(raw: &str) -> Option<String> {
    raw.lines()
        .map(strip_fence)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn strip_fence(line: &str) -> &str {
    let trimmed = line.trim();
    let fenced = trimmed.starts_with("```");
    let text = trimmed.trim_matches('`').trim();
    if fenced {
        strip_language_tag(text)
    } else {
        text
    }
}

// "```sql SELECT 1" and a bare "```sql" opener
fn strip_language_tag(text: &str) -> &str {
    match (text.get(..3), text.get(3..)) {
        (Some(tag), Some(rest))
            if tag.eq_ignore_ascii_case("sql")
                && rest.chars().next().map_or(true, char::is_whitespace) =>
        {
            rest.trim()
        }
        _ => text,
    }
}
