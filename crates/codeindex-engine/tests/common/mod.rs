#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use codeindex_core::{Chunker, Embedder, Error, FileScanner, Result};
use codeindex_embed::HashEmbedder;
use codeindex_engine::IndexingPipeline;
use codeindex_vector::MemoryCollection;

pub const COLLECTION: &str = "codebase";
pub const DIM: usize = 64;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn pipeline(store: Arc<MemoryCollection>, max_chunk_size: usize) -> IndexingPipeline {
    IndexingPipeline::new(
        Arc::new(HashEmbedder::new(DIM)),
        store,
        COLLECTION,
        FileScanner::new([".txt", ".rs", ".md"], ["bin", "target"]),
        Chunker::new(max_chunk_size).unwrap(),
    )
}

/// An embedder whose backend is always down.
pub struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Embedding("model offline".to_string()))
    }
}
