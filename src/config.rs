use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::AuthConfig;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

/// A configuration value with its source
#[derive(Debug, Clone)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Client configuration with source tracking
#[derive(Debug, Clone)]
pub struct Config {
    /// Sync endpoint (e.g., "http://localhost:4984/db")
    pub sync_url: ConfigValue<Option<String>>,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Config file path used (if any)
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    sync_url: Option<String>,
    auth: Option<AuthConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut sync_url = ConfigValue::new(None, ConfigSource::Default);
        let mut auth = AuthConfig::default();
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.sync_url {
                sync_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(auth_config) = file_config.auth {
                auth = auth_config;
            }
        }

        if let Ok(url) = std::env::var("SYNC_GATEWAY_URL") {
            sync_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Ok(username) = std::env::var("SYNC_GATEWAY_USERNAME") {
            auth.username = Some(username);
        }
        if let Ok(password) = std::env::var("SYNC_GATEWAY_PASSWORD") {
            auth.password = Some(password);
        }
        if let Ok(url) = std::env::var("SYNC_GATEWAY_AUTH_URL") {
            auth.server_url = Some(url);
        }
        if let Ok(value) = std::env::var("SYNC_GATEWAY_SIMPLE_AUTH") {
            auth.simple_auth = parse_bool("SYNC_GATEWAY_SIMPLE_AUTH", &value)?;
        }

        Ok(Self {
            sync_url,
            auth,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/sync-gateway-client/
    /// - macOS: ~/Library/Application Support/sync-gateway-client/
    /// - Windows: %APPDATA%/sync-gateway-client/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sync-gateway-client")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { var: &'static str, value: String },
    MissingSyncUrl,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { var, value } => {
                write!(f, "Invalid value for {}: '{}'", var, value)
            }
            ConfigError::MissingSyncUrl => write!(
                f,
                "Sync endpoint not configured. Set sync_url in config or SYNC_GATEWAY_URL."
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
