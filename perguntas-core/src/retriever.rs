use perguntas_llm_sdk::client::EmbeddingClient;
use perguntas_llm_sdk::types::EmbeddingRequest;
use std::sync::Arc;
use std::time::Duration;

use crate::error::PipelineError;
use crate::schema_index::SchemaIndex;
use crate::types::{ItemType, Question, SchemaContext, SchemaHit};

/// Turns a question into a short schema context by nearest-neighbour search
pub struct SchemaRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn SchemaIndex>,
    service_timeout: Duration,
}

impl SchemaRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn SchemaIndex>,
        service_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            service_timeout,
        }
    }

    /// Embeds `question`, looks up the `top_k` closest schema objects and
    /// renders them as `"tabela(col, col); outra"`.
    ///
    /// An empty index yields an empty context, not an error.
    pub async fn retrieve(
        &self,
        question: &Question,
        top_k: usize,
    ) -> Result<SchemaContext, PipelineError> {
        if top_k == 0 {
            return Err(PipelineError::invalid_question("top_k must be at least 1"));
        }

        let request = EmbeddingRequest::single(self.embedder.model_name(), question.as_str());
        let response = tokio::time::timeout(self.service_timeout, self.embedder.embed(request))
            .await
            .map_err(|_| {
                PipelineError::retrieval(format!(
                    "embedding service did not answer within {}s",
                    self.service_timeout.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::retrieval(e.to_string()))?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::retrieval("embedding service returned no vector"))?;

        let hits = self
            .index
            .nearest(&embedding, top_k)
            .await
            .map_err(|e| PipelineError::retrieval(e.to_string()))?;

        tracing::debug!(hits = hits.len(), "Schema index lookup finished");

        Ok(build_context(&hits))
    }
}

/// Groups hits by table in ranking order; columns never repeat within a table
pub fn build_context(hits: &[SchemaHit]) -> SchemaContext {
    let mut tables: Vec<(&str, Vec<&str>)> = Vec::new();

    for hit in hits {
        let position = match tables.iter().position(|(name, _)| *name == hit.table_name) {
            Some(position) => position,
            None => {
                tables.push((hit.table_name.as_str(), Vec::new()));
                tables.len() - 1
            }
        };

        if hit.item_type == ItemType::Column {
            if let Some(column) = hit.column_name.as_deref() {
                let columns = &mut tables[position].1;
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
    }

    let rendered: Vec<String> = tables
        .into_iter()
        .map(|(table, columns)| {
            if columns.is_empty() {
                table.to_string()
            } else {
                format!("{}({})", table, columns.join(", "))
            }
        })
        .collect();

    SchemaContext::new(rendered.join("; "))
}
