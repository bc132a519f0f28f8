use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
    /// Upper bound on one streamed generation, enforced by the server
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_duration_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: false,
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the rolling tracing log
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    /// Append-only event log, one line per server event
    #[serde(default = "default_event_log_path")]
    pub event_log_path: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_event_log_path() -> PathBuf {
    PathBuf::from("app.log")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            event_log_path: default_event_log_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Ground answers with live Google Search results
    #[serde(default = "default_search_grounding")]
    pub search_grounding: bool,
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash-001".to_string()
}

const fn default_search_grounding() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_model: default_llm_model(),
            search_grounding: default_search_grounding(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the flashgen server the generate command talks to
    #[serde(default = "default_client_endpoint")]
    pub endpoint: String,
    /// Where the cached API key is stored
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
}

fn default_client_endpoint() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_settings_path() -> PathBuf {
    PathBuf::from(".flashgen/settings.toml")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_client_endpoint(),
            settings_path: default_settings_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default file paths, falling back to built-in defaults
    pub fn load() -> crate::Result<Self> {
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            tracing::debug!("No config file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.server.max_duration_secs == 0 {
            return Err(crate::FlashgenError::ConfigError(
                "server.max_duration_secs must be greater than zero".to_string(),
            ));
        }
        url::Url::parse(&self.llm.llm_endpoint).map_err(|e| {
            crate::FlashgenError::ConfigError(format!("llm.llm_endpoint is not a valid URL: {e}"))
        })?;
        url::Url::parse(&self.client.endpoint).map_err(|e| {
            crate::FlashgenError::ConfigError(format!("client.endpoint is not a valid URL: {e}"))
        })?;
        Ok(())
    }

    /// Address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Maximum total duration of one streamed generation
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.server.max_duration_secs)
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get the flashgen server endpoint used by the client
    pub fn client_endpoint(&self) -> &str {
        &self.client.endpoint
    }
}
