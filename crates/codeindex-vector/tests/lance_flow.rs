use codeindex_core::{Chunk, Embedder, Error, VectorCollection};
use codeindex_embed::HashEmbedder;
use codeindex_vector::LanceCollection;
use tempfile::TempDir;

const DIM: usize = 32;

fn embedded(embedder: &HashEmbedder, key: &str, doc: &str, seq: usize, text: &str) -> Chunk {
    Chunk::new(key, doc, seq, text).with_embedding(embedder.embed(text).unwrap())
}

#[tokio::test]
async fn lance_upsert_search_enumerate() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let uri = tmp.path().to_string_lossy().into_owned();
    let store = LanceCollection::open(&uri, DIM).await?;
    let embedder = HashEmbedder::new(DIM);

    store.ensure_collection("codebase").await?;
    store.ensure_collection("codebase").await?;
    assert!(store.search("codebase", &embedder.embed("anything")?, 5).await?.is_empty());

    let chunks = vec![
        embedded(&embedder, "src/fire.rs_1", "src/fire.rs", 1, "fn start_fire(flint: Flint) {}"),
        embedded(&embedder, "src/fire.rs_2", "src/fire.rs", 2, "fn extinguish(water: Water) {}"),
        embedded(&embedder, "README.md", "README.md", 1, "# Homestead tools"),
    ];
    store.upsert("codebase", &chunks).await?;
    // Re-upserting the same keys must not duplicate rows.
    store.upsert("codebase", &chunks[..1]).await?;

    let all = store.enumerate("codebase").await?.unwrap_or_default();
    assert_eq!(all.len(), 3);
    let readme = all.iter().find(|c| c.key == "README.md").expect("readme row");
    assert_eq!(readme.sequence_number, 1);
    assert_eq!(readme.embedding.len(), DIM);

    let query = embedder.embed("fn start_fire(flint: Flint) {}")?;
    let results = store.search("codebase", &query, 2).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.key, "src/fire.rs_1");
    assert!(results[0].score >= results[1].score);
    Ok(())
}

#[tokio::test]
async fn lance_rejects_wrong_dimension() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = LanceCollection::open(&tmp.path().to_string_lossy(), DIM).await?;
    store.ensure_collection("codebase").await?;
    let bad = Chunk::new("a", "a", 1, "a").with_embedding(vec![0.5; DIM + 1]);
    let err = store.upsert("codebase", &[bad]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got {err:?}");
    Ok(())
}
