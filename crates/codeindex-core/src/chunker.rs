//! Line-oriented chunking.
//!
//! Content that fits within `max_chunk_size` bytes is kept whole under the
//! document's own name. Larger content is packed line by line; a line is never
//! split, so a single oversized line becomes a chunk of its own. Every packed
//! line is re-terminated with `\n`, which means a rebuilt file can carry one
//! more trailing newline than the source did.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Chunk;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chunk_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE }
    }
}

impl Chunker {
    pub fn new(max_chunk_size: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(Error::InvalidArgument("max_chunk_size must be greater than zero".to_string()));
        }
        Ok(Self { max_chunk_size })
    }

    pub fn chunk(&self, document_name: &str, content: &str) -> Result<Vec<Chunk>> {
        if document_name.trim().is_empty() {
            return Err(Error::InvalidArgument("document name must not be blank".to_string()));
        }
        if content.len() <= self.max_chunk_size {
            return Ok(vec![Chunk::new(document_name, document_name, 1, content)]);
        }

        let mut chunks = Vec::new();
        let mut acc = String::new();
        for line in content.split('\n') {
            if acc.len() + line.len() > self.max_chunk_size && !acc.is_empty() {
                chunks.push(numbered(document_name, chunks.len() + 1, std::mem::take(&mut acc)));
            }
            acc.push_str(line);
            acc.push('\n');
        }
        if !acc.is_empty() {
            chunks.push(numbered(document_name, chunks.len() + 1, acc));
        }
        debug!(document = document_name, chunks = chunks.len(), "chunked document");
        Ok(chunks)
    }
}

fn numbered(document_name: &str, sequence_number: usize, text: String) -> Chunk {
    Chunk::new(format!("{document_name}_{sequence_number}"), document_name, sequence_number, text)
}
