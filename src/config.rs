//! Service configuration with validation and defaults
//!
//! Process-level settings come from an optional TOML file overridden by
//! `WAGER_*` environment variables. Game tunables live separately in
//! [`CasinoSettings`](crate::games::CasinoSettings).

use crate::errors::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file with game settings; built-in defaults when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
    pub server: ServerConfig,
    pub engine: EngineSettings,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Token required by admin routes; admin routes are closed when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            admin_token: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Engine-wide knobs that are not per-game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Fixed RNG seed for reproducible runs; OS entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
    /// Wins at or above this multiplier are announced
    pub big_win_multiplier: f64,
    /// Losses at or above this stake are announced
    pub notable_loss_amount: u64,
    /// Attempts at issuing a unique lucky draw token
    pub ticket_token_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rng_seed: None,
            big_win_multiplier: 10.0,
            notable_loss_amount: 100_000,
            ticket_token_attempts: 5,
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => AppConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> ConfigResult<AppConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content).map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut AppConfig) -> ConfigResult<()> {
        if let Ok(host) = env::var("WAGER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("WAGER_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "WAGER_PORT".to_string(),
                value: port,
                reason: "Invalid port number".to_string(),
            })?;
        }
        if let Ok(timeout) = env::var("WAGER_REQUEST_TIMEOUT") {
            config.server.request_timeout_secs = timeout.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "WAGER_REQUEST_TIMEOUT".to_string(),
                value: timeout,
                reason: "Invalid timeout in seconds".to_string(),
            })?;
        }
        if let Ok(token) = env::var("WAGER_ADMIN_TOKEN") {
            config.server.admin_token = Some(token);
        }
        if let Ok(seed) = env::var("WAGER_RNG_SEED") {
            config.engine.rng_seed = Some(seed.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "WAGER_RNG_SEED".to_string(),
                value: seed,
                reason: "Invalid seed".to_string(),
            })?);
        }
        if let Ok(path) = env::var("WAGER_SETTINGS_PATH") {
            config.settings_path = Some(path);
        }

        Ok(())
    }

    fn validate(&self, config: &AppConfig) -> ConfigResult<()> {
        if config.server.port == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if config.server.host.is_empty() {
            return Err(ConfigurationError::MissingRequired("server.host".to_string()));
        }

        if config.server.request_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }

        if matches!(config.server.admin_token.as_deref(), Some("")) {
            return Err(ConfigurationError::InvalidValue {
                field: "server.admin_token".to_string(),
                value: String::new(),
                reason: "Admin token cannot be empty".to_string(),
            });
        }

        if !(config.engine.big_win_multiplier.is_finite() && config.engine.big_win_multiplier > 0.0) {
            return Err(ConfigurationError::InvalidValue {
                field: "engine.big_win_multiplier".to_string(),
                value: config.engine.big_win_multiplier.to_string(),
                reason: "Multiplier must be positive".to_string(),
            });
        }

        if config.engine.ticket_token_attempts == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "engine.ticket_token_attempts".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig, path: &str) -> ConfigResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)))
    }
}

/// Builder pattern for creating configurations
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    pub fn engine(mut self, engine: EngineSettings) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn settings_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.settings_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
