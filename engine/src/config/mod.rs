//! Configuration management
//!
//! This module handles loading, validation, and management of the CommitLens
//! configuration. Configuration is stored in TOML format at
//! ~/.commitlens/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Completion endpoint, model and sampling settings
//! - **embedding**: Embedding service endpoint and vector dimension
//! - **mcp**: Tool-call proxy settings
//! - **database**: Postgres connection settings
//! - **server**: HTTP surface bind address
//!
//! API keys are never stored in the file. `llm.api_key_env` names the
//! environment variable that holds the key.
//!
//! # Examples
//!
//! ```no_run
//! use commitlens_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Completion provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Tool-call proxy configuration
    #[serde(default)]
    pub mcp: McpConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP surface configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Full URL of an OpenAI-compatible chat completions endpoint
    #[serde(default = "default_completions_url")]
    pub completions_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_planner_temperature")]
    pub planner_temperature: f64,

    #[serde(default = "default_planner_max_tokens")]
    pub planner_max_tokens: u32,

    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f64,

    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Expected vector dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Tool-call proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Route structured queries through the proxy first
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the proxy
    #[serde(default = "default_mcp_base_url")]
    pub base_url: String,

    /// Tool name used to execute SQL
    #[serde(default = "default_mcp_sql_tool")]
    pub sql_tool: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL (pgvector extension required)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Resolve LLM settings from the most recent `configs` row
    #[serde(default)]
    pub settings_from_db: bool,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[serde(default = "default_bind")]
    pub bind: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_completions_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "COMMITLENS_LLM_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_planner_temperature() -> f64 {
    0.1
}

fn default_planner_max_tokens() -> u32 {
    500
}

fn default_answer_temperature() -> f64 {
    0.3
}

fn default_answer_max_tokens() -> u32 {
    800
}

fn default_embedding_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_mcp_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_mcp_sql_tool() -> String {
    "mcp_postgres_execute_sql".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost/commitlens".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            completions_url: default_completions_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
            planner_temperature: default_planner_temperature(),
            planner_max_tokens: default_planner_max_tokens(),
            answer_temperature: default_answer_temperature(),
            answer_max_tokens: default_answer_max_tokens(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_mcp_base_url(),
            sql_tool: default_mcp_sql_tool(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            settings_from_db: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            embedding: EmbeddingConfig::default(),
            mcp: McpConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl LLMConfig {
    /// Read the API key from the configured environment variable
    ///
    /// A missing key yields an empty string; the completion endpoint then
    /// rejects the call and the pipeline falls back as documented.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

impl Config {
    /// Load configuration from the default location (~/.commitlens/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path (~/.commitlens/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".commitlens").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let urls = [
            ("llm.completions_url", &self.llm.completions_url),
            ("embedding.base_url", &self.embedding.base_url),
            ("mcp.base_url", &self.mcp.base_url),
            ("database.url", &self.database.url),
        ];
        for (key, value) in urls {
            if value.trim().is_empty() {
                return Err(EngineError::Config(format!("{} must not be empty", key)));
            }
        }

        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }

        for (key, value) in [
            ("planner_temperature", self.llm.planner_temperature),
            ("answer_temperature", self.llm.answer_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "{} must be between 0.0 and 2.0",
                    key
                )));
            }
        }

        if self.embedding.dimension == 0 {
            return Err(EngineError::Config(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(EngineError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
