//! In-memory collections with brute-force cosine similarity.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use codeindex_core::{Chunk, Error, Result, SearchResult, VectorCollection};

/// Collections held in process memory, keyed by chunk key.
///
/// `search_only()` builds a store that declines `enumerate`, so callers take
/// the broad-query path the way they would against a search-only backend.
pub struct MemoryCollection {
    collections: RwLock<HashMap<String, BTreeMap<String, Chunk>>>,
    enumerable: bool,
}

impl MemoryCollection {
    #[must_use]
    pub fn new() -> Self {
        Self { collections: RwLock::new(HashMap::new()), enumerable: true }
    }

    #[must_use]
    pub fn search_only() -> Self {
        Self { enumerable: false, ..Self::new() }
    }

    pub async fn count(&self, name: &str) -> usize {
        self.collections.read().await.get(name).map_or(0, BTreeMap::len)
    }

    pub async fn keys(&self, name: &str) -> Vec<String> {
        self.collections.read().await.get(name).map(|c| c.keys().cloned().collect()).unwrap_or_default()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorCollection for MemoryCollection {
    async fn ensure_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| Error::Store(format!("collection {name} does not exist")))?;
        for chunk in chunks {
            collection.insert(chunk.key.clone(), chunk.clone());
        }
        debug!(collection = name, rows = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn search(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(name) else {
            return Ok(Vec::new());
        };
        let mut results: Vec<SearchResult> = collection
            .values()
            .filter(|c| c.is_embedded())
            .map(|c| SearchResult { chunk: c.clone(), score: Self::cosine_similarity(query, &c.embedding) })
            .collect();
        // Stable sort keeps key order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }

    async fn enumerate(&self, name: &str) -> Result<Option<Vec<Chunk>>> {
        if !self.enumerable {
            return Ok(None);
        }
        let collections = self.collections.read().await;
        let chunks = collections.get(name).map(|c| c.values().cloned().collect()).unwrap_or_default();
        Ok(Some(chunks))
    }
}
