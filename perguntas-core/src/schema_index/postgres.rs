use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use super::SchemaIndex;
use crate::error::SchemaIndexError;
use crate::types::{SchemaHit, SchemaIndexEntry};

/// Name of the table holding the index; excluded from introspection
pub const SCHEMA_INDEX_TABLE: &str = "schema_index";

#[derive(sqlx::FromRow)]
struct HitRow {
    item_type: String,
    table_name: String,
    column_name: Option<String>,
    distance: f64,
}

/// Schema index stored in a pgvector table
#[derive(Clone)]
pub struct PgSchemaIndex {
    pool: PgPool,
}

impl PgSchemaIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with the write-capable credentials used for introspection
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, SchemaIndexError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the extension, table and unique key when missing.
    ///
    /// An existing table built for another vector size is an error: the
    /// embedding model and the index must agree on the dimension.
    pub async fn ensure_table(&self, dimension: usize) -> Result<(), SchemaIndexError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        if let Some(existing) = self.stored_dimension().await? {
            if existing != dimension {
                return Err(SchemaIndexError::DimensionMismatch {
                    expected: existing,
                    actual: dimension,
                });
            }
            return Ok(());
        }

        tracing::info!(dimension, "Creating schema index table");

        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {SCHEMA_INDEX_TABLE} (
                id BIGSERIAL PRIMARY KEY,
                item_type TEXT NOT NULL CHECK (item_type IN ('TABLE', 'COLUMN')),
                table_name TEXT NOT NULL,
                column_name TEXT,
                embedding vector({dimension}) NOT NULL
            )"
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_key = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {SCHEMA_INDEX_TABLE}_object_key
             ON {SCHEMA_INDEX_TABLE} (table_name, (COALESCE(column_name, '')))"
        );
        sqlx::query(&create_key).execute(&self.pool).await?;

        Ok(())
    }

    /// Declared size of the `embedding` column, or `None` when the table does
    /// not exist yet
    pub async fn stored_dimension(&self) -> Result<Option<usize>, SchemaIndexError> {
        let typmod: Option<i32> = sqlx::query_scalar(
            "SELECT a.atttypmod
             FROM pg_attribute a
             WHERE a.attrelid = to_regclass($1)
               AND a.attname = 'embedding'
               AND NOT a.attisdropped",
        )
        .bind(SCHEMA_INDEX_TABLE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(typmod.and_then(|m| usize::try_from(m).ok()).filter(|m| *m > 0))
    }

    /// Replaces the whole index in one transaction.
    ///
    /// Readers see either the old or the new contents, never a mix.
    pub async fn replace_all(&self, entries: &[SchemaIndexEntry]) -> Result<u64, SchemaIndexError> {
        if let Some(dimension) = self.stored_dimension().await? {
            if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
                return Err(SchemaIndexError::DimensionMismatch {
                    expected: dimension,
                    actual: bad.embedding.len(),
                });
            }
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {SCHEMA_INDEX_TABLE}"))
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO {SCHEMA_INDEX_TABLE} (item_type, table_name, column_name, embedding)
             VALUES ($1, $2, $3, $4)"
        );
        for entry in entries {
            sqlx::query(&insert)
                .bind(entry.item_type.as_str())
                .bind(&entry.table_name)
                .bind(&entry.column_name)
                .bind(Vector::from(entry.embedding.clone()))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(entries = entries.len(), "Schema index replaced");
        Ok(entries.len() as u64)
    }
}

#[async_trait]
impl SchemaIndex for PgSchemaIndex {
    async fn nearest(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SchemaHit>, SchemaIndexError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT item_type, table_name, column_name,
                    (embedding <=> $1)::float8 AS distance
             FROM {SCHEMA_INDEX_TABLE}
             ORDER BY embedding <=> $1, id
             LIMIT $2"
        );
        let rows: Vec<HitRow> = sqlx::query_as(&query)
            .bind(Vector::from(embedding.to_vec()))
            .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let item_type = row
                    .item_type
                    .parse()
                    .map_err(SchemaIndexError::invalid_entry)?;
                Ok(SchemaHit {
                    item_type,
                    table_name: row.table_name,
                    column_name: row.column_name,
                    distance: row.distance,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<u64, SchemaIndexError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {SCHEMA_INDEX_TABLE}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
