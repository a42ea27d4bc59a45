use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use codeindex_core::config::{Config, Settings};
use codeindex_core::{Embedder, VectorCollection};
use codeindex_embed::default_embedder;
use codeindex_engine::{IndexingPipeline, QueryEngine, QueryFailure};
use codeindex_vector::LanceCollection;

const USAGE: &str = "Usage: codeindex <command> [args]

Commands:
  index [root]               Index a source tree (default: current directory)
  search <query> [--limit N] Semantic search over indexed chunks
  files [dir]                List indexed files, optionally under a directory
  file <fragment>            Show files whose name contains <fragment>
  analyze <fragment>         Show a file together with related files";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let config = Config::load().context("Error loading config")?;
    let settings = config.settings()?;
    let embedder: Arc<dyn Embedder> = Arc::from(default_embedder(&settings.embedding)?);
    let store_path = settings.store.path();
    std::fs::create_dir_all(&store_path).with_context(|| format!("creating {}", store_path.display()))?;
    let store: Arc<dyn VectorCollection> =
        Arc::new(LanceCollection::open(&store_path.to_string_lossy(), embedder.dim()).await?);
    debug!(store = %store_path.display(), collection = %settings.store.collection, "opened store");

    let rest = &args[1..];
    match command.as_str() {
        "index" => index(embedder, store, &settings, rest).await,
        "search" | "files" | "file" | "analyze" => {
            let engine = QueryEngine::from_settings(embedder, store, &settings);
            match query(&engine, command, rest).await {
                Ok(text) => {
                    println!("{text}");
                    Ok(())
                }
                Err(failure) => {
                    eprintln!("{failure}");
                    std::process::exit(1);
                }
            }
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(1);
        }
    }
}

async fn index(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorCollection>, settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let root = args.iter().find(|a| !a.starts_with('-')).map_or_else(|| PathBuf::from("."), PathBuf::from);
    println!("codeindex\n=========");
    println!("Root: {}", root.display());
    println!("Collection: {}", settings.store.collection);

    let pipeline = IndexingPipeline::from_settings(embedder, store, settings)?.with_progress(true);
    let report = pipeline.index_codebase(&root).await?;

    println!("\n✅ Indexing completed");
    println!("📊 {} files scanned, {} indexed, {} chunks", report.files_scanned, report.files_indexed, report.chunks_indexed);
    if !report.errors.is_empty() {
        println!("⚠️  {} files skipped:", report.errors.len());
        for (path, reason) in &report.errors {
            println!("   {}: {}", path.display(), reason);
        }
    }
    Ok(())
}

async fn query(engine: &QueryEngine, command: &str, args: &[String]) -> Result<String, QueryFailure> {
    match command {
        "search" => {
            let mut limit = engine.default_max_results();
            let mut words = Vec::new();
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    "--limit" => {
                        match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                            Some(l) => limit = l,
                            None => {
                                eprintln!("Error: --limit requires a number");
                                std::process::exit(1);
                            }
                        }
                        i += 1;
                    }
                    word => words.push(word),
                }
                i += 1;
            }
            engine.search(&words.join(" "), limit).await
        }
        "files" => engine.list_files(args.first().map(String::as_str)).await,
        "file" => engine.get_file_info(&args.join(" ")).await,
        _ => engine.analyze_structure(&args.join(" ")).await,
    }
}
