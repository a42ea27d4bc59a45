use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const KEY: &str = "key";
pub const DOCUMENT_NAME: &str = "document_name";
pub const SEQUENCE_NUMBER: &str = "sequence_number";
pub const TEXT: &str = "text";
pub const VECTOR: &str = "vector";
pub const DISTANCE: &str = "_distance";

/// One row per chunk; `dim` fixes the embedding width for the whole table.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(KEY, DataType::Utf8, false),
        Field::new(DOCUMENT_NAME, DataType::Utf8, false),
        Field::new(SEQUENCE_NUMBER, DataType::Int32, false),
        Field::new(TEXT, DataType::Utf8, false),
        Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
