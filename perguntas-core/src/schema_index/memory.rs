use async_trait::async_trait;
use std::sync::RwLock;

use super::SchemaIndex;
use crate::error::SchemaIndexError;
use crate::types::{SchemaHit, SchemaIndexEntry};

/// Schema index held in process memory, ranked by cosine distance.
///
/// Useful for tests and for databases small enough that a pgvector table is
/// not worth it.
pub struct InMemorySchemaIndex {
    dimension: usize,
    entries: RwLock<Vec<SchemaIndexEntry>>,
}

impl InMemorySchemaIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Replace every entry; fails without changing anything when one of the
    /// vectors has the wrong size.
    pub fn replace_all(&self, entries: Vec<SchemaIndexEntry>) -> Result<(), SchemaIndexError> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != self.dimension) {
            return Err(SchemaIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.embedding.len(),
            });
        }
        let mut guard = self
            .entries
            .write()
            .map_err(|_| SchemaIndexError::invalid_entry("schema index lock poisoned"))?;
        *guard = entries;
        Ok(())
    }
}

#[async_trait]
impl SchemaIndex for InMemorySchemaIndex {
    async fn nearest(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SchemaHit>, SchemaIndexError> {
        if embedding.len() != self.dimension {
            return Err(SchemaIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let guard = self
            .entries
            .read()
            .map_err(|_| SchemaIndexError::invalid_entry("schema index lock poisoned"))?;

        let mut scored: Vec<(usize, f64)> = guard
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_distance(embedding, &entry.embedding)))
            .collect();
        // Stable sort keeps insertion order for equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(position, distance)| {
                let entry = &guard[position];
                SchemaHit {
                    item_type: entry.item_type,
                    table_name: entry.table_name.clone(),
                    column_name: entry.column_name.clone(),
                    distance,
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<u64, SchemaIndexError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| SchemaIndexError::invalid_entry("schema index lock poisoned"))?;
        Ok(guard.len() as u64)
    }
}

/// `1 - cos(a, b)`, matching pgvector's `<=>`; zero vectors are at distance 1
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
