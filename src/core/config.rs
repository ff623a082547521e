use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_URI: &str = "http://localhost:7474";
pub const DEFAULT_USERNAME: &str = "neo4j";
pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_INDEX: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    pub indexing: IndexingConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub backend_type: BackendType,
    pub connection: ConnectionConfig,
}

/// Engines the store can be wired to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// In-process engine, nothing survives the process
    Memory,
    /// Neo4j over its transactional HTTP endpoint
    #[default]
    Neo4jHttp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub uri: String,
    pub username: String,
    /// Empty by default; the operator is expected to supply it.
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexingConfig {
    /// Index used when callers pass an empty name.
    pub default_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidates requested per result slot when filters are present.
    /// 1 keeps the backend request at exactly `limit`.
    pub overfetch_factor: u32,
    /// Largest top-k the backend is asked for; also what an unbounded
    /// limit maps to.
    pub max_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            default_index: DEFAULT_INDEX.to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 1,
            max_top_k: i32::MAX as usize,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load a toml configuration file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str::<StoreConfig>(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Override connection settings from `NEO4J_URI`, `NEO4J_USERNAME`,
    /// `NEO4J_PASSWORD` and `NEO4J_DATABASE` when they are set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let connection = &mut self.backend.connection;
        if let Some(uri) = lookup("NEO4J_URI") {
            connection.uri = uri;
        }
        if let Some(username) = lookup("NEO4J_USERNAME") {
            connection.username = username;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            connection.password = password;
        }
        if let Some(database) = lookup("NEO4J_DATABASE") {
            connection.database = database;
        }
    }

    /// Configuration for an in-process store, used by tests and demos.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.backend.backend_type = BackendType::Memory;
        config
    }
}
