//! Vector lookup over table and column descriptors.
//!
//! The index is populated by the refresh job ([`crate::refresh`]) and is
//! read-only for the question pipeline, so any number of requests may query
//! it concurrently.

use async_trait::async_trait;

use crate::error::SchemaIndexError;
use crate::types::SchemaHit;

pub mod memory;
pub mod postgres;

pub use memory::InMemorySchemaIndex;
pub use postgres::PgSchemaIndex;

#[async_trait]
pub trait SchemaIndex: Send + Sync {
    /// Up to `top_k` entries ordered by increasing distance to `embedding`.
    /// Ties keep a stable order for identical inputs.
    async fn nearest(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SchemaHit>, SchemaIndexError>;

    /// Number of stored entries
    async fn count(&self) -> Result<u64, SchemaIndexError>;
}
