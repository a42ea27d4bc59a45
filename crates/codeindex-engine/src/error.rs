use std::fmt;

use codeindex_core::Error;

/// The query operation a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperation {
    Search,
    ListFiles,
    GetFileInfo,
    AnalyzeStructure,
}

impl QueryOperation {
    pub fn description(self) -> &'static str {
        match self {
            Self::Search => "searching codebase",
            Self::ListFiles => "listing files",
            Self::GetFileInfo => "retrieving file information",
            Self::AnalyzeStructure => "analyzing code structure",
        }
    }
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A query that failed, tagged with the operation it belonged to.
#[derive(Debug, thiserror::Error)]
#[error("Error {operation}: {source}")]
pub struct QueryFailure {
    pub operation: QueryOperation,
    #[source]
    pub source: Error,
}

impl QueryFailure {
    pub fn new(operation: QueryOperation, source: Error) -> Self {
        Self { operation, source }
    }
}
