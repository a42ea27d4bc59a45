use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tracing::debug;

use codeindex_core::{Chunk, Error, Result, SearchResult, VectorCollection};

use crate::schema::{build_chunk_schema, DISTANCE, DOCUMENT_NAME, KEY, SEQUENCE_NUMBER, TEXT, VECTOR};
use crate::table::{ensure_table, open_db, store_err, table_exists};

/// A LanceDB database where every collection is a table keyed by chunk key.
pub struct LanceCollection {
    db: Connection,
    dim: i32,
}

impl LanceCollection {
    pub async fn open(uri: &str, dim: usize) -> Result<Self> {
        let dim = i32::try_from(dim).map_err(|_| Error::InvalidArgument(format!("embedding dimension {dim} is too large")))?;
        let db = open_db(uri).await?;
        Ok(Self { db, dim })
    }

    fn to_record_batch(&self, chunks: &[Chunk]) -> Result<RecordBatch> {
        let mut keys = Vec::with_capacity(chunks.len());
        let mut names = Vec::with_capacity(chunks.len());
        let mut sequence = Vec::with_capacity(chunks.len());
        let mut texts = Vec::with_capacity(chunks.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.embedding.len() != self.dim as usize {
                return Err(Error::InvalidArgument(format!(
                    "chunk {} has {} dimensions, collection expects {}",
                    chunk.key,
                    chunk.embedding.len(),
                    self.dim
                )));
            }
            let seq = i32::try_from(chunk.sequence_number)
                .map_err(|_| Error::InvalidArgument(format!("sequence number of {} is out of range", chunk.key)))?;
            keys.push(chunk.key.clone());
            names.push(chunk.document_name.clone());
            sequence.push(seq);
            texts.push(chunk.text.clone());
            vectors.push(Some(chunk.embedding.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            build_chunk_schema(self.dim),
            vec![
                Arc::new(StringArray::from(keys)),
                Arc::new(StringArray::from(names)),
                Arc::new(Int32Array::from(sequence)),
                Arc::new(StringArray::from(texts)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim)),
            ],
        )
        .map_err(store_err)
    }
}

#[async_trait]
impl VectorCollection for LanceCollection {
    async fn ensure_collection(&self, name: &str) -> Result<()> {
        ensure_table(&self.db, name, build_chunk_schema(self.dim)).await
    }

    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let batch = self.to_record_batch(chunks)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.db.open_table(name).execute().await.map_err(store_err)?;
        let mut merge = table.merge_insert(&[KEY]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = merge.execute(reader).await.map_err(store_err)?;
        debug!(collection = name, rows = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn search(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || !table_exists(&self.db, name).await? {
            return Ok(Vec::new());
        }
        let table = self.db.open_table(name).execute().await.map_err(store_err)?;
        if table.count_rows(None).await.map_err(store_err)? == 0 {
            return Ok(Vec::new());
        }
        let mut stream = table
            .vector_search(query.to_vec())
            .map_err(store_err)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(store_err)?;

        let mut results = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(store_err)? {
            let chunks = rows_to_chunks(&batch)?;
            let distances = batch
                .column_by_name(DISTANCE)
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::Store(format!("{DISTANCE} column missing")))?;
            for (i, chunk) in chunks.into_iter().enumerate() {
                results.push(SearchResult { chunk, score: 1.0 - distances.value(i) });
            }
        }
        results.truncate(k);
        Ok(results)
    }

    async fn enumerate(&self, name: &str) -> Result<Option<Vec<Chunk>>> {
        if !table_exists(&self.db, name).await? {
            return Ok(Some(Vec::new()));
        }
        let table = self.db.open_table(name).execute().await.map_err(store_err)?;
        let mut stream = table.query().execute().await.map_err(store_err)?;
        let mut chunks = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(store_err)? {
            chunks.extend(rows_to_chunks(&batch)?);
        }
        Ok(Some(chunks))
    }
}

fn rows_to_chunks(batch: &RecordBatch) -> Result<Vec<Chunk>> {
    let keys = string_column(batch, KEY)?;
    let names = string_column(batch, DOCUMENT_NAME)?;
    let texts = string_column(batch, TEXT)?;
    let sequence = batch
        .column_by_name(SEQUENCE_NUMBER)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| Error::Store(format!("{SEQUENCE_NUMBER} column missing")))?;
    let vectors = batch.column_by_name(VECTOR).and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>());

    let mut chunks = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let embedding = match vectors {
            Some(col) if !col.is_null(i) => col.value(i).as_primitive::<arrow_array::types::Float32Type>().values().to_vec(),
            _ => Vec::new(),
        };
        let sequence_number = usize::try_from(sequence.value(i))
            .map_err(|_| Error::Store(format!("negative sequence number for {}", keys.value(i))))?;
        chunks.push(Chunk::new(keys.value(i), names.value(i), sequence_number, texts.value(i)).with_embedding(embedding));
    }
    Ok(chunks)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Store(format!("{name} column missing")))
}
