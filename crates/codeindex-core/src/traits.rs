use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, SearchResult};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Named, keyed chunk collections with nearest-neighbour search.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Creates the collection if it does not exist yet.
    async fn ensure_collection(&self, name: &str) -> Result<()>;

    /// Inserts chunks, overwriting any existing entry with the same key.
    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<()>;

    /// Up to `k` results, best match first. An empty collection yields no results.
    async fn search(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Every stored chunk, or `None` when the store cannot enumerate.
    async fn enumerate(&self, _name: &str) -> Result<Option<Vec<Chunk>>> {
        Ok(None)
    }
}
