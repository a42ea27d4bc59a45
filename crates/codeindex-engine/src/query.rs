//! Read-only queries over an indexed collection.
//!
//! Every operation ensures the collection exists, then either renders Markdown
//! or returns a [`QueryFailure`] naming the operation that failed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};

use codeindex_core::config::{QuerySettings, Settings};
use codeindex_core::{Chunk, Embedder, Error, Result, VectorCollection};

use crate::error::{QueryFailure, QueryOperation};
use crate::format::{format_analysis, format_file_bodies, format_file_listing, format_search_results};

pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorCollection>,
    collection: String,
    settings: QuerySettings,
}

impl QueryEngine {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorCollection>, collection: impl Into<String>) -> Self {
        Self { embedder, store, collection: collection.into(), settings: QuerySettings::default() }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorCollection>, settings: &Settings) -> Self {
        Self::new(embedder, store, &settings.store.collection).with_settings(settings.query.clone())
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn default_max_results(&self) -> usize {
        self.settings.default_max_results
    }

    pub async fn search(&self, query: &str, max_results: usize) -> std::result::Result<String, QueryFailure> {
        self.run_search(query, max_results).await.map_err(|e| QueryFailure::new(QueryOperation::Search, e))
    }

    pub async fn list_files(&self, directory: Option<&str>) -> std::result::Result<String, QueryFailure> {
        self.run_list_files(directory).await.map_err(|e| QueryFailure::new(QueryOperation::ListFiles, e))
    }

    pub async fn get_file_info(&self, fragment: &str) -> std::result::Result<String, QueryFailure> {
        self.run_get_file_info(fragment).await.map_err(|e| QueryFailure::new(QueryOperation::GetFileInfo, e))
    }

    pub async fn analyze_structure(&self, fragment: &str) -> std::result::Result<String, QueryFailure> {
        self.run_analyze(fragment).await.map_err(|e| QueryFailure::new(QueryOperation::AnalyzeStructure, e))
    }

    async fn run_search(&self, query: &str, max_results: usize) -> Result<String> {
        require("query", query)?;
        self.store.ensure_collection(&self.collection).await?;
        let vector = self.embedder.embed(query)?;
        let results = self.store.search(&self.collection, &vector, max_results).await?;
        info!(query, hits = results.len(), "search finished");
        let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
        Ok(format_search_results(&chunks))
    }

    async fn run_list_files(&self, directory: Option<&str>) -> Result<String> {
        self.store.ensure_collection(&self.collection).await?;
        let directory = directory.filter(|d| !d.trim().is_empty());
        let names: BTreeSet<String> = self.all_chunks().await?.into_iter().map(|c| c.document_name).collect();
        let names: Vec<String> = match directory {
            Some(dir) => names.into_iter().filter(|n| starts_with_ignore_case(n, dir)).collect(),
            None => names.into_iter().collect(),
        };
        Ok(format_file_listing(&names, directory))
    }

    async fn run_get_file_info(&self, fragment: &str) -> Result<String> {
        require("fragment", fragment)?;
        self.store.ensure_collection(&self.collection).await?;
        let files = group_by_document(self.all_chunks().await?, fragment);
        debug!(fragment, files = files.len(), "matched files");
        Ok(format_file_bodies(fragment, &files))
    }

    async fn run_analyze(&self, fragment: &str) -> Result<String> {
        require("fragment", fragment)?;
        self.store.ensure_collection(&self.collection).await?;
        let files = group_by_document(self.all_chunks().await?, fragment);
        let bodies = format_file_bodies(fragment, &files);
        if files.is_empty() {
            return Ok(bodies);
        }

        let vector = self.embedder.embed(&format!("Code that interacts with or is related to {fragment}"))?;
        let results = self.store.search(&self.collection, &vector, self.settings.related_limit).await?;
        let mut related: Vec<String> = Vec::new();
        for result in results {
            if related.len() >= self.settings.max_related_files {
                break;
            }
            let name = result.chunk.document_name;
            if !contains_ignore_case(&name, fragment) && !related.contains(&name) {
                related.push(name);
            }
        }
        Ok(format_analysis(fragment, &related, &bodies))
    }

    /// Every chunk in the collection. Stores that cannot enumerate are
    /// approximated with a broad similarity query capped at the listing limit.
    async fn all_chunks(&self) -> Result<Vec<Chunk>> {
        if let Some(chunks) = self.store.enumerate(&self.collection).await? {
            return Ok(chunks);
        }
        let limit = self.settings.listing_limit;
        debug!(query = %self.settings.broad_query, limit, "store cannot enumerate, using broad query");
        let vector = self.embedder.embed(&self.settings.broad_query)?;
        let results = self.store.search(&self.collection, &vector, limit).await?;
        Ok(results.into_iter().map(|r| r.chunk).collect())
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be blank")));
    }
    Ok(())
}

/// Chunks whose document name contains `fragment`, grouped per document in
/// name order, each group in sequence order.
fn group_by_document(chunks: Vec<Chunk>, fragment: &str) -> Vec<(String, Vec<Chunk>)> {
    let mut groups: BTreeMap<String, BTreeMap<usize, Chunk>> = BTreeMap::new();
    for chunk in chunks.into_iter().filter(|c| contains_ignore_case(&c.document_name, fragment)) {
        groups.entry(chunk.document_name.clone()).or_default().insert(chunk.sequence_number, chunk);
    }
    groups.into_iter().map(|(name, chunks)| (name, chunks.into_values().collect())).collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_orders_documents_and_sequences() {
        let chunks = vec![
            Chunk::new("b.rs_2", "b.rs", 2, "b2"),
            Chunk::new("a.rs", "a.rs", 1, "a"),
            Chunk::new("b.rs_1", "b.rs", 1, "b1"),
            Chunk::new("c.md", "c.md", 1, "c"),
        ];
        let groups = group_by_document(chunks, ".RS");
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
        let texts: Vec<&str> = groups[1].1.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["b1", "b2"]);
    }

    #[test]
    fn blank_inputs_are_rejected() {
        assert!(matches!(require("query", "   "), Err(Error::InvalidArgument(_))));
        assert!(require("query", "x").is_ok());
    }

    #[test]
    fn case_insensitive_matching() {
        assert!(contains_ignore_case("src/Parser.rs", "parser"));
        assert!(starts_with_ignore_case("Src/a.rs", "src"));
        assert!(!starts_with_ignore_case("lib/src/a.rs", "src"));
    }
}
