//! Read-only execution of validated SQL under a wall-clock deadline.
//!
//! Each call acquires one connection, runs one statement, and gives the
//! connection back on every exit path. A connection whose statement hit the
//! deadline is discarded instead of returned, since it may still be busy with
//! the cancelled query.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::PipelineError;
use crate::types::ResultSet;
use crate::validator::ValidatedSql;

pub mod postgres;

pub use postgres::PgConnectionSource;

/// One checked-out connection restricted to read-only transactions
#[async_trait]
pub trait ReadOnlyConnection: Send {
    /// Runs `sql` and materialises every row in database order.
    ///
    /// `timeout` is also handed to the server so it can stop the statement
    /// itself.
    async fn fetch_rows(&mut self, sql: &str, timeout: Duration)
        -> Result<ResultSet, PipelineError>;

    /// Give the connection back for reuse
    fn release(self: Box<Self>);

    /// Close the connection without returning it
    fn discard(self: Box<Self>);
}

#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn ReadOnlyConnection>, PipelineError>;
}

pub struct QueryExecutor {
    connections: Arc<dyn ConnectionSource>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(connections: Arc<dyn ConnectionSource>, timeout: Duration) -> Self {
        Self {
            connections,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One deadline covers waiting for a connection and running the
    /// statement; the server is told whatever time is left.
    pub async fn execute(&self, sql: &ValidatedSql) -> Result<ResultSet, PipelineError> {
        let deadline = Instant::now() + self.timeout;
        let timeout_seconds = self.timeout.as_secs();

        let mut connection = match tokio::time::timeout_at(deadline, self.connections.acquire()).await
        {
            Ok(acquired) => acquired?,
            Err(_) => {
                tracing::warn!(timeout_seconds, "No read-only connection available before deadline");
                return Err(PipelineError::query_timeout(timeout_seconds));
            }
        };

        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1));
        let outcome =
            tokio::time::timeout_at(deadline, connection.fetch_rows(sql.as_str(), remaining)).await;

        match outcome {
            Ok(Ok(rows)) => {
                connection.release();
                Ok(rows)
            }
            Ok(Err(PipelineError::QueryTimeout { .. })) => {
                tracing::warn!(sql = %sql, "Statement cancelled by the server deadline");
                connection.discard();
                Err(PipelineError::query_timeout(timeout_seconds))
            }
            Ok(Err(err)) => {
                connection.release();
                Err(err)
            }
            Err(_) => {
                tracing::warn!(
                    sql = %sql,
                    timeout_seconds,
                    "Statement exceeded deadline, discarding connection"
                );
                connection.discard();
                Err(PipelineError::query_timeout(timeout_seconds))
            }
        }
    }
}
