//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.llm-sql-writer.toml` in current directory
//! 4. `~/.config/llm-sql-writer/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! provider = "openai"          # openai, anthropic, ollama
//! model = "gpt-5"
//! api_key = "sk-..."           # or use LLM_API_KEY env var
//! ollama_url = "http://localhost:11434"
//!
//! [retry]
//! max_retries = 3
//! initial_delay_ms = 1000
//! max_delay_ms = 30000
//! backoff_factor = 2.0
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8001
//! max_body_bytes = 65536
//! request_timeout_secs = 180
//!
//! [databases]
//! shop = "/var/data/shop.db"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `LLM_API_KEY` | API key for OpenAI/Anthropic |
//! | `LLM_PROVIDER` | Provider name |
//! | `LLM_MODEL` | Model identifier |
//! | `OLLAMA_URL` | Ollama base URL |
//! | `LLM_SQL_WRITER_HOST` | Bind address |
//! | `LLM_SQL_WRITER_PORT` | Bind port |

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf}
};

use serde::Deserialize;

use crate::error::{AppResult, config_error};

/// Name of the per-directory configuration file
pub const LOCAL_CONFIG_FILE: &str = ".llm-sql-writer.toml";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm:       LlmConfig,
    #[serde(default)]
    pub retry:     RetryConfig,
    #[serde(default)]
    pub server:    ServerConfig,
    /// Database name -> SQLite file path
    #[serde(default)]
    pub databases: BTreeMap<String, PathBuf>
}

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider:   Option<String>,
    pub api_key:    Option<String>,
    pub model:      Option<String>,
    pub ollama_url: Option<String>
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider:   None,
            api_key:    None,
            model:      None,
            ollama_url: Some(String::from("http://localhost:11434"))
        }
    }
}

/// Retry configuration for LLM requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries:      u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms:     u64,
    pub backoff_factor:   f64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries:      3,
            initial_delay_ms: 1000,
            max_delay_ms:     30000,
            backoff_factor:   2.0
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host:                 String,
    pub port:                 u16,
    /// Upper bound on request body size
    pub max_body_bytes:       usize,
    /// Whole-request timeout, must cover the model round trip
    pub request_timeout_secs: u64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host:                 String::from("127.0.0.1"),
            port:                 8001,
            max_body_bytes:       64 * 1024,
            request_timeout_secs: 180
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.llm-sql-writer.toml)
    /// 3. Config file in home directory (~/.config/llm-sql-writer/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("llm-sql-writer")
                .join("config.toml");

            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Parse a single TOML file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override values with environment variables
    pub fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(api_key) = env::var("LLM_API_KEY") {
            self.llm.api_key = Some(api_key);
        }

        if let Ok(provider) = env::var("LLM_PROVIDER") {
            self.llm.provider = Some(provider);
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = Some(model);
        }

        if let Ok(url) = env::var("OLLAMA_URL") {
            self.llm.ollama_url = Some(url);
        }

        if let Ok(host) = env::var("LLM_SQL_WRITER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = env::var("LLM_SQL_WRITER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| config_error(format!("Invalid LLM_SQL_WRITER_PORT '{}': {}", port, e)))?;
        }

        Ok(())
    }
}
