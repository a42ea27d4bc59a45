//! Embedding backends behind `codeindex_core::Embedder`.
//!
//! `default_embedder` honours `APP_USE_FAKE_EMBEDDINGS=1` and the configured
//! backend, so tests and offline runs never need model files.

use std::path::{Path, PathBuf};

use tracing::info;

use codeindex_core::config::{EmbeddingBackend, EmbeddingSettings};
use codeindex_core::{Embedder, Error, Result};

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::{BgeM3Embedder, BGE_M3_DIM};
pub use pool::masked_mean_l2;

pub fn default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() || settings.backend == EmbeddingBackend::Hash {
        info!(dim = settings.dim, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dim)));
    }
    let model_dir = resolve_model_dir(settings)?;
    let model = BgeM3Embedder::load(&model_dir).map_err(|e| Error::Embedding(format!("{e:#}")))?;
    Ok(Box::new(model))
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let candidates = settings
        .model_dir()
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain(std::env::var("MODEL_DIR").ok().map(PathBuf::from))
        .chain([Path::new("models/bge-m3").to_path_buf()]);
    for dir in candidates {
        if dir.exists() {
            info!(dir = %dir.display(), "using model dir");
            return Ok(dir);
        }
    }
    Err(Error::NotFound("BGE-M3 model directory (set embedding.model_dir or APP_MODEL_DIR)".to_string()))
}
