#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod scanner;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, DEFAULT_MAX_CHUNK_SIZE};
pub use error::{Error, Result};
pub use scanner::{document_name, FileScanner};
pub use traits::{Embedder, VectorCollection};
pub use types::{Chunk, SearchResult};
