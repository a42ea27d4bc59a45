//! Scan → chunk → embed → upsert.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use codeindex_core::config::Settings;
use codeindex_core::scanner::resolve_root;
use codeindex_core::{document_name, Chunk, Chunker, Embedder, Error, FileScanner, Result, VectorCollection};

const DEFAULT_BATCH_SIZE: usize = 64;

/// Outcome of one indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    /// Files that could not be read, with the reason. They do not abort the run.
    pub errors: Vec<(PathBuf, String)>,
}

pub struct IndexingPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorCollection>,
    collection: String,
    scanner: FileScanner,
    chunker: Chunker,
    batch_size: usize,
    show_progress: bool,
}

impl IndexingPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorCollection>,
        collection: impl Into<String>,
        scanner: FileScanner,
        chunker: Chunker,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            scanner,
            chunker,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorCollection>, settings: &Settings) -> Result<Self> {
        let chunker = Chunker::new(settings.chunking.max_chunk_size)?;
        let pipeline = Self::new(embedder, store, &settings.store.collection, FileScanner::from_settings(&settings.scan), chunker);
        pipeline.with_batch_size(settings.indexing.batch_size)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidArgument("batch_size must be greater than zero".to_string()));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn index_codebase(&self, root: &Path) -> Result<IndexReport> {
        self.store.ensure_collection(&self.collection).await?;
        let root = resolve_root(root)?;
        let files = self.scanner.scan(&root)?;

        let mut report = IndexReport { files_scanned: files.len(), ..IndexReport::default() };
        let mut chunks = Vec::new();
        for path in &files {
            match read_source(path) {
                Ok(content) => {
                    chunks.extend(self.chunker.chunk(&document_name(&root, path), &content)?);
                    report.files_indexed += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    report.errors.push((path.clone(), err.to_string()));
                }
            }
        }

        let pb = self.progress_bar(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let embedded = self.embed(batch).await?;
            self.store.upsert(&self.collection, &embedded).await?;
            report.chunks_indexed += embedded.len();
            pb.inc(embedded.len() as u64);
            debug!(batch = embedded.len(), total = report.chunks_indexed, "indexed batch");
        }
        pb.finish_with_message("indexed");

        info!(
            root = %root.display(),
            collection = %self.collection,
            files = report.files_indexed,
            chunks = report.chunks_indexed,
            errors = report.errors.len(),
            "indexing finished"
        );
        Ok(report)
    }

    /// Model inference is CPU bound, so it runs on the blocking pool.
    async fn embed(&self, batch: &[Chunk]) -> Result<Vec<Chunk>> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedder = Arc::clone(&self.embedder);
        let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))??;
        if vectors.len() != batch.len() {
            return Err(Error::Embedding(format!("expected {} embeddings, got {}", batch.len(), vectors.len())));
        }
        Ok(batch.iter().cloned().zip(vectors).map(|(chunk, v)| chunk.with_embedding(v)).collect())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Reads a file as text, replacing invalid UTF-8 rather than failing.
fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
