use config::{Config, ConfigError, Environment, File};
use perguntas_core::config::{PipelineConfig, SchemaIndexConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variables read for compatibility with older deployments,
/// mapped to their configuration keys
const LEGACY_VARIABLES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("READONLY_DATABASE_URL", "database.readonly_url"),
    ("OPENAI_API_KEY", "openai.api_key"),
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub openai: OpenAIConfig,
    pub pipeline: PipelineConfig,
    pub schema_index: SchemaIndexConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Write-capable connection, used for the schema index and introspection
    pub url: String,
    /// Connection whose role can only read; every generated query runs here
    pub readonly_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            readonly_url: String::new(),
            max_connections: 5,
            acquire_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            chat_model: perguntas_llm_sdk::models::openai::GPT_4O_MINI_ID.to_string(),
            embedding_model: perguntas_llm_sdk::models::openai::TEXT_EMBEDDING_3_LARGE_ID
                .to_string(),
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Also write logs to this file, off the request path
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl ApiConfig {
    /// Loads, in increasing precedence: built-in defaults, `./perguntas.toml`,
    /// `~/.config/perguntas/perguntas.toml`, `PERGUNTAS_*` variables
    /// (`PERGUNTAS_PIPELINE__TOP_K=3`), then `DATABASE_URL`,
    /// `READONLY_DATABASE_URL` and `OPENAI_API_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_paths(), None, |name| std::env::var(name).ok())
    }

    /// Same as [`ApiConfig::load`] with explicit files and variables.
    /// `env = None` reads the process environment.
    pub fn load_from<F>(
        paths: &[PathBuf],
        env: Option<HashMap<String, String>>,
        legacy: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder();

        for path in paths {
            builder = builder.add_source(File::from(path.clone()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("PERGUNTAS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        for (variable, key) in LEGACY_VARIABLES {
            builder = builder.set_override_option(*key, legacy(variable).filter(|v| !v.is_empty()))?;
        }

        let config: ApiConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.url (or DATABASE_URL) is required".to_string(),
            ));
        }
        if self.database.readonly_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.readonly_url (or READONLY_DATABASE_URL) is required".to_string(),
            ));
        }
        if self.openai.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "openai.api_key (or OPENAI_API_KEY) is required".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        self.schema_index
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("perguntas.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("perguntas/perguntas.toml"));
    }
    paths
}
