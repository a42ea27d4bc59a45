//! Configuration loader and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_STORE__COLLECTION=docs` sets `store.collection`). Every section has
//! defaults, so an empty configuration is valid.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::chunker::DEFAULT_MAX_CHUNK_SIZE;
use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Builds a config from inline TOML, without consulting files or the environment.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings with defaults filled in, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
    pub chunking: ChunkingSettings,
    pub indexing: IndexingSettings,
    pub store: StoreSettings,
    pub embedding: EmbeddingSettings,
    pub query: QuerySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.scan.extensions.is_empty() {
            return Err(Error::InvalidConfig("scan.extensions must not be empty".to_string()));
        }
        if self.chunking.max_chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.max_chunk_size must be greater than zero".to_string()));
        }
        if self.indexing.batch_size == 0 {
            return Err(Error::InvalidConfig("indexing.batch_size must be greater than zero".to_string()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("store.collection must not be blank".to_string()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        let extensions = [
            ".cs", ".json", ".xml", ".csproj", ".sln", ".md", ".html", ".css", ".js", ".ts", ".py", ".java", ".sh",
            ".bat", ".ps1", ".sql", ".yml", ".yaml", ".txt", ".config", ".xaml", ".cshtml", ".razor", ".jsx", ".tsx",
            ".c", ".cpp", ".h", ".go", ".rb", ".php", ".rs", ".toml",
        ];
        let excluded_dirs = [
            "bin", "obj", ".git", ".vs", "node_modules", "packages", "dist", "build", ".vscode", ".idea", "vendor",
            "wwwroot/lib", "target", "out", "Debug", "Release", ".svn", ".hg", ".nuget", "artifacts",
        ];
        Self {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: excluded_dirs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_chunk_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    pub batch_size: usize,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub collection: String,
}

impl StoreSettings {
    pub fn path(&self) -> PathBuf {
        expand_path(&self.uri)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { uri: "~/.codeindex/lancedb".to_string(), collection: "codebase".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EmbeddingBackend {
    #[serde(rename = "bge-m3")]
    BgeM3,
    #[serde(rename = "hash")]
    Hash,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: Option<String>,
    pub dim: usize,
}

impl EmbeddingSettings {
    pub fn model_dir(&self) -> Option<PathBuf> {
        self.model_dir.as_deref().map(expand_path)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::BgeM3, model_dir: None, dim: 1024 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_max_results: usize,
    /// Upper bound on chunks pulled by the broad query. Enumerable stores are read in full.
    pub listing_limit: usize,
    /// Stand-in query for stores that cannot enumerate their contents.
    pub broad_query: String,
    pub related_limit: usize,
    pub max_related_files: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_max_results: 5,
            listing_limit: 1000,
            broad_query: "code".to_string(),
            related_limit: 10,
            max_related_files: 5,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
