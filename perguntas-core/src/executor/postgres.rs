use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Connection, Executor, PgPool, Postgres, Row, TypeInfo};
use std::time::Duration;

use super::{ConnectionSource, ReadOnlyConnection};
use crate::error::PipelineError;
use crate::types::{ResultRow, ResultSet};

// Postgres `query_canceled`, raised when statement_timeout fires
const QUERY_CANCELED: &str = "57014";

/// Pool of connections opened with the read-only credentials
#[derive(Clone)]
pub struct PgConnectionSource {
    pool: PgPool,
}

impl PgConnectionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every session defaults to read-only transactions, on top of whatever
    /// the role itself allows
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY")
                        .await?;
                    Ok(())
                })
            })
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ConnectionSource for PgConnectionSource {
    async fn acquire(&self) -> Result<Box<dyn ReadOnlyConnection>, PipelineError> {
        let conn = self.pool.acquire().await.map_err(|e| {
            PipelineError::query_execution(format!("Failed to acquire read-only connection: {}", e))
        })?;
        Ok(Box::new(PgReadOnlyConnection { conn }))
    }
}

pub struct PgReadOnlyConnection {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl ReadOnlyConnection for PgReadOnlyConnection {
    async fn fetch_rows(
        &mut self,
        sql: &str,
        timeout: Duration,
    ) -> Result<ResultSet, PipelineError> {
        let timeout_seconds = timeout.as_secs();
        let mut tx = self.conn.begin().await.map_err(|e| map_error(e, timeout_seconds))?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_error(e, timeout_seconds))?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_error(e, timeout_seconds))?;

        let rows: Vec<PgRow> = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_error(e, timeout_seconds))?;

        // Nothing to keep; read-only anyway
        tx.rollback()
            .await
            .map_err(|e| map_error(e, timeout_seconds))?;

        Ok(rows.iter().map(row_to_result_row).collect())
    }

    fn release(self: Box<Self>) {
        drop(self.conn);
    }

    fn discard(self: Box<Self>) {
        // Detached connections are closed on drop instead of going back to the pool
        drop(self.conn.detach());
    }
}

fn map_error(error: sqlx::Error, timeout_seconds: u64) -> PipelineError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
            PipelineError::query_timeout(timeout_seconds)
        }
        sqlx::Error::Database(db) => PipelineError::query_execution(db.message()),
        _ => PipelineError::query_execution(error.to_string()),
    }
}

fn row_to_result_row(row: &PgRow) -> ResultRow {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            (
                column.name().to_string(),
                extract_value(row, index, column.type_info().name()),
            )
        })
        .collect()
}

/// Converts one column to JSON based on its Postgres type name.
/// Unknown types fall back to their text form, or null.
fn extract_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(decimal_to_json)
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "JSONB" | "JSON" => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Whole decimals become JSON integers so `SUM(int)` (NUMERIC in Postgres)
/// reads as a count; the rest become floats
fn decimal_to_json(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(int) = value.to_i64() {
            return Value::Number(int.into());
        }
    }
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}
