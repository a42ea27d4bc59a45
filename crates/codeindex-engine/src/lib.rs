#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod error;
pub mod format;
pub mod pipeline;
pub mod query;

pub use error::{QueryFailure, QueryOperation};
pub use pipeline::{IndexReport, IndexingPipeline};
pub use query::QueryEngine;
