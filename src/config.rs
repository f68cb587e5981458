//! Configuration for the telemetry ingestion client
//!
//! Follows a TOML file + environment-variable indirection scheme: the file
//! names the variables holding the AWS secrets, never the secrets themselves.
//! Every section has working defaults so a config file can be as small as the
//! `[aws]` endpoint and region.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Immutable credential set for one broker endpoint.
///
/// Sourced once at startup; the secret key is redacted from `Debug` output so
/// it cannot leak through error chains or logs.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    /// IoT endpoint host, without scheme (e.g. `xxxx-ats.iot.us-east-1.amazonaws.com`)
    pub endpoint: String,
    /// AWS region the endpoint lives in
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub aws: AwsSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
    #[serde(default)]
    pub reconnect: ReconnectSection,
    #[serde(default)]
    pub simulation: SimulationSection,
}

/// AWS endpoint and credential indirection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwsSection {
    /// IoT endpoint host (no scheme, no path)
    pub endpoint: String,
    /// AWS region
    pub region: String,
    /// Environment variable containing the access key id
    #[serde(default = "default_access_key_env")]
    pub access_key_id_env: String,
    /// Environment variable containing the secret access key
    #[serde(default = "default_secret_key_env")]
    pub secret_access_key_env: String,
}

fn default_access_key_env() -> String {
    "AWS_ACCESS_KEY_ID".to_string()
}

fn default_secret_key_env() -> String {
    "AWS_SECRET_ACCESS_KEY".to_string()
}

/// Telemetry topic and transport tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySection {
    /// Fixed topic carrying JSON-encoded samples
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    /// Handshake timeout for a single connection attempt
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_topic() -> String {
    "iot/mpu6050pub".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            keep_alive_secs: default_keep_alive(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Reconnection policy. `max_attempts` doubles as the simulation-fallback
/// threshold: once consecutive failures reach it the facade switches over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectSection {
    /// Consecutive failures tolerated before the connection is declared
    /// permanently failed (None = retry forever, no fallback)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,
    /// Delays for the first attempts, in milliseconds
    #[serde(default = "default_backoff_pattern")]
    pub backoff_pattern_ms: Vec<u64>,
    /// Delay used once the pattern is exhausted
    #[serde(default = "default_sustained_delay")]
    pub sustained_delay_ms: u64,
    /// Reset the consecutive-failure counter after a successful reconnect
    #[serde(default = "default_reset_on_success")]
    pub reset_on_success: bool,
}

fn default_max_attempts() -> Option<u32> {
    Some(3)
}

fn default_backoff_pattern() -> Vec<u64> {
    vec![1000, 2000, 5000]
}

fn default_sustained_delay() -> u64 {
    5000
}

fn default_reset_on_success() -> bool {
    true
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_pattern_ms: default_backoff_pattern(),
            sustained_delay_ms: default_sustained_delay(),
            reset_on_success: default_reset_on_success(),
        }
    }
}

/// Synthetic data generator cadence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSection {
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
}

fn default_tick() -> u64 {
    2
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_secs: default_tick(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration entirely from the process environment
    /// (`AWS_IOT_ENDPOINT`, `AWS_REGION` plus the default credential
    /// variables), for hosts that run without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = std::env::var("AWS_IOT_ENDPOINT")
            .map_err(|_| ConfigError::EnvVarNotFound("AWS_IOT_ENDPOINT".to_string()))?;
        let region = std::env::var("AWS_REGION")
            .map_err(|_| ConfigError::EnvVarNotFound("AWS_REGION".to_string()))?;

        let config = ClientConfig {
            aws: AwsSection {
                endpoint,
                region,
                access_key_id_env: default_access_key_env(),
                secret_access_key_env: default_secret_key_env(),
            },
            telemetry: TelemetrySection::default(),
            reconnect: ReconnectSection::default(),
            simulation: SimulationSection::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the full credential set, reading secrets from the environment
    /// variables named in `[aws]`. A missing variable is a configuration
    /// error, not a panic.
    pub fn resolve_credentials(&self) -> Result<Credentials, ConfigError> {
        let access_key_id = std::env::var(&self.aws.access_key_id_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.aws.access_key_id_env.clone()))?;
        let secret_access_key = std::env::var(&self.aws.secret_access_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.aws.secret_access_key_env.clone()))?;

        Ok(Credentials {
            endpoint: self.aws.endpoint.clone(),
            region: self.aws.region.clone(),
            access_key_id,
            secret_access_key,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.endpoint.is_empty() {
            return Err(ConfigError::InvalidEndpoint("endpoint is empty".to_string()));
        }
        if self.aws.endpoint.contains("://") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "endpoint must be a bare host, got '{}'",
                self.aws.endpoint
            )));
        }
        // A host that cannot anchor a wss URL will never connect
        if url::Url::parse(&format!("wss://{}/mqtt", self.aws.endpoint)).is_err() {
            return Err(ConfigError::InvalidEndpoint(self.aws.endpoint.clone()));
        }
        if self.aws.region.is_empty() {
            return Err(ConfigError::InvalidConfig("region is empty".to_string()));
        }
        if self.telemetry.topic.is_empty() {
            return Err(ConfigError::InvalidConfig("topic is empty".to_string()));
        }
        if self.simulation.tick_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "simulation tick must be at least one second".to_string(),
            ));
        }
        if let Some(0) = self.reconnect.max_attempts {
            return Err(ConfigError::InvalidConfig(
                "reconnect max_attempts must be greater than 0 or unset for unlimited".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[aws]
endpoint = "example-ats.iot.us-east-1.amazonaws.com"
region = "us-east-1"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}
