use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default character length of a segmentation window.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default character overlap between adjacent windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configured values are individually valid but mutually impossible.
    #[error("Invalid configuration: {0}")]
    InvalidCombination(String),
}

/// Runtime configuration for the Eduvault server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// SQLite URL for the metadata store.
    pub database_url: String,
    /// Base URL of the vector index that stores chunk embeddings.
    pub vector_index_url: String,
    /// Name of the index collection used for embedding records.
    pub vector_index_name: String,
    /// Optional API key required to access the vector index.
    pub vector_index_api_key: Option<String>,
    /// Embedding model identifier recorded for the encoder.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors; must match the index.
    pub embedding_dimension: usize,
    /// Optional override for the segmentation window length.
    pub chunk_size: Option<usize>,
    /// Optional override for the segmentation window overlap.
    pub chunk_overlap: Option<usize>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            database_url: load_env("DATABASE_URL")?,
            vector_index_url: load_env("VECTOR_INDEX_URL")?,
            vector_index_name: load_env("VECTOR_INDEX_NAME")?,
            vector_index_api_key: load_env_optional("VECTOR_INDEX_API_KEY"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            chunk_size: load_env_optional("CHUNK_SIZE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("CHUNK_SIZE".to_string()))
                })
                .transpose()?,
            chunk_overlap: load_env_optional("CHUNK_OVERLAP")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("CHUNK_OVERLAP".to_string()))
                })
                .transpose()?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };

        if config.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if config.chunk_overlap() >= config.chunk_size() {
            return Err(ConfigError::InvalidCombination(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                config.chunk_overlap(),
                config.chunk_size(),
            )));
        }

        Ok(config)
    }

    /// Effective segmentation window length.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Effective segmentation window overlap.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        database_url = %config.database_url,
        vector_index_url = %config.vector_index_url,
        index = %config.vector_index_name,
        dimension = config.embedding_dimension,
        chunk_size = config.chunk_size(),
        chunk_overlap = config.chunk_overlap(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
