//! LanceDB connection and table housekeeping.

use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection};
use std::sync::Arc;
use tracing::info;

use codeindex_core::{Error, Result};

pub(crate) fn store_err(e: impl std::fmt::Display) -> Error {
    Error::Store(e.to_string())
}

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(store_err)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(store_err)?;
    Ok(names.iter().any(|n| n == name))
}

/// Creates an empty table with `schema` unless `name` already exists.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(store_err)?;
    info!(table = name, "created table");
    Ok(())
}
