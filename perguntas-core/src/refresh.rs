//! Rebuilds the schema index from `information_schema`.
//!
//! Every table gets one `TABLE` document (`"vendas: id, produto, valor_total"`)
//! and every column one `COLUMN` document (`"vendas.valor_total (numeric)"`).
//! Documents are embedded in batches and swapped into the index atomically.
//! The job is expected to run alone; it does not coordinate with itself.

use perguntas_llm_sdk::client::EmbeddingClient;
use perguntas_llm_sdk::types::EmbeddingRequest;
use sqlx::PgPool;
use std::time::Instant;

use crate::config::SchemaIndexConfig;
use crate::error::SchemaIndexError;
use crate::schema_index::postgres::SCHEMA_INDEX_TABLE;
use crate::schema_index::PgSchemaIndex;
use crate::types::{ItemType, SchemaIndexEntry};

/// One row of `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ColumnInfo {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

/// Text to embed for one index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub item_type: ItemType,
    pub table_name: String,
    pub column_name: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub tables: usize,
    pub columns: usize,
    pub entries: u64,
    pub duration_ms: u64,
}

/// Lists the columns of `schema` ordered by table and position, skipping the
/// index table itself
pub async fn introspect_columns(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<ColumnInfo>, SchemaIndexError> {
    let columns = sqlx::query_as::<_, ColumnInfo>(
        "SELECT table_name::text AS table_name,
                column_name::text AS column_name,
                data_type::text AS data_type
         FROM information_schema.columns
         WHERE table_schema = $1
           AND table_name <> $2
         ORDER BY table_name, ordinal_position",
    )
    .bind(schema)
    .bind(SCHEMA_INDEX_TABLE)
    .fetch_all(pool)
    .await?;

    Ok(columns)
}

/// Groups columns by table, keeping the input order of both
pub fn build_documents(columns: &[ColumnInfo]) -> Vec<SchemaDocument> {
    let mut tables: Vec<(&str, Vec<&ColumnInfo>)> = Vec::new();
    for column in columns {
        match tables.iter_mut().find(|(name, _)| *name == column.table_name) {
            Some((_, cols)) => cols.push(column),
            None => tables.push((column.table_name.as_str(), vec![column])),
        }
    }

    let mut documents = Vec::with_capacity(tables.len() + columns.len());
    for (table, cols) in tables {
        let names: Vec<&str> = cols.iter().map(|c| c.column_name.as_str()).collect();
        documents.push(SchemaDocument {
            item_type: ItemType::Table,
            table_name: table.to_string(),
            column_name: None,
            text: format!("{}: {}", table, names.join(", ")),
        });
        for col in cols {
            documents.push(SchemaDocument {
                item_type: ItemType::Column,
                table_name: table.to_string(),
                column_name: Some(col.column_name.clone()),
                text: format!("{}.{} ({})", table, col.column_name, col.data_type),
            });
        }
    }
    documents
}

/// Embeds documents `batch_size` at a time and checks every vector against
/// the configured dimension
pub async fn embed_documents(
    embedder: &dyn EmbeddingClient,
    documents: Vec<SchemaDocument>,
    batch_size: usize,
    dimension: usize,
) -> Result<Vec<SchemaIndexEntry>, SchemaIndexError> {
    let batch_size = batch_size.max(1);
    let mut entries = Vec::with_capacity(documents.len());

    for (batch_number, batch) in documents.chunks(batch_size).enumerate() {
        tracing::debug!(batch = batch_number, size = batch.len(), "Embedding schema documents");

        let request = EmbeddingRequest {
            model: embedder.model_name().to_string(),
            input: batch.iter().map(|d| d.text.clone()).collect(),
            dimensions: None,
        };
        let response = embedder.embed(request).await?;

        if response.embeddings.len() != batch.len() {
            return Err(SchemaIndexError::invalid_entry(format!(
                "expected {} embeddings, received {}",
                batch.len(),
                response.embeddings.len()
            )));
        }

        for (document, embedding) in batch.iter().zip(response.embeddings) {
            if embedding.len() != dimension {
                return Err(SchemaIndexError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            entries.push(SchemaIndexEntry {
                item_type: document.item_type,
                table_name: document.table_name.clone(),
                column_name: document.column_name.clone(),
                embedding,
            });
        }
    }

    Ok(entries)
}

/// Full refresh: introspect, embed, replace
pub async fn refresh_schema(
    index: &PgSchemaIndex,
    embedder: &dyn EmbeddingClient,
    config: &SchemaIndexConfig,
    dimension: usize,
) -> Result<RefreshSummary, SchemaIndexError> {
    let started = Instant::now();

    index.ensure_table(dimension).await?;

    let columns = introspect_columns(index.pool(), &config.schema).await?;
    let documents = build_documents(&columns);
    let tables = documents
        .iter()
        .filter(|d| d.item_type == ItemType::Table)
        .count();

    tracing::info!(
        schema = %config.schema,
        tables,
        columns = columns.len(),
        "Refreshing schema index"
    );

    let entries = embed_documents(embedder, documents, config.batch_size, dimension).await?;
    let stored = index.replace_all(&entries).await?;

    Ok(RefreshSummary {
        tables,
        columns: columns.len(),
        entries: stored,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Runs [`refresh_schema`] only when the index holds no entries
pub async fn refresh_if_empty(
    index: &PgSchemaIndex,
    embedder: &dyn EmbeddingClient,
    config: &SchemaIndexConfig,
    dimension: usize,
) -> Result<Option<RefreshSummary>, SchemaIndexError> {
    use crate::schema_index::SchemaIndex;

    index.ensure_table(dimension).await?;
    if index.count().await? > 0 {
        return Ok(None);
    }
    refresh_schema(index, embedder, config, dimension)
        .await
        .map(Some)
}
