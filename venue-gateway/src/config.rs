//! Configuration for the command center.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Remote inference service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key. May be left unset and supplied at runtime.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model used for tactical responses and density maps.
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,
    /// Model used for insights and people counting.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Upper bound on a single outbound call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            reasoning_model: default_reasoning_model(),
            fast_model: default_fast_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl InferenceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Client-side rate limiting and quota backoff.
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum gap between the starts of two outbound calls.
    #[serde(default = "default_min_request_gap")]
    pub min_request_gap_ms: u64,
    /// How long degraded mode lasts after a quota error.
    #[serde(default = "default_quota_cooldown")]
    pub quota_cooldown_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_request_gap_ms: default_min_request_gap(),
            quota_cooldown_secs: default_quota_cooldown(),
        }
    }
}

impl ThrottleConfig {
    pub fn min_request_gap(&self) -> Duration {
        Duration::from_millis(self.min_request_gap_ms)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_secs(self.quota_cooldown_secs)
    }
}

/// Random occupancy fluctuations for demos.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulation_interval")]
    pub interval_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_simulation_interval(),
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_reasoning_model() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_fast_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_request_timeout() -> u64 {
    12
}
fn default_min_request_gap() -> u64 {
    2500
}
fn default_quota_cooldown() -> u64 {
    60
}
fn default_simulation_interval() -> u64 {
    5
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (VENUE__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    ///
    /// A bare `API_KEY` variable is used when no key is configured.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("throttle.min_request_gap_ms", default_min_request_gap() as i64)?
            .set_default("throttle.quota_cooldown_secs", default_quota_cooldown() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("VENUE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        if config.inference.api_key.is_none() {
            config.inference.api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
        }
        Ok(config)
    }
}
