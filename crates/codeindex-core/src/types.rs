//! Domain types shared by the scanner, chunker, stores and query engine.

use serde::{Deserialize, Serialize};

pub type ChunkKey = String;

/// A unit of indexed text.
///
/// - `key`: unique within a collection, derived from `document_name` and `sequence_number`
/// - `document_name`: path relative to the indexed root, always `/`-separated
/// - `sequence_number`: 1-based position within the document
/// - `text`: chunk payload, line terminators included
/// - `embedding`: empty until the embedder has run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub key: ChunkKey,
    pub document_name: String,
    pub sequence_number: usize,
    pub text: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(key: impl Into<ChunkKey>, document_name: impl Into<String>, sequence_number: usize, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            document_name: document_name.into(),
            sequence_number,
            text: text.into(),
            embedding: Vec::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn is_embedded(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// A chunk returned by similarity search.
///
/// `score` is collection-specific but higher is always better. It is only
/// meaningful for ranking results of the same query against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
