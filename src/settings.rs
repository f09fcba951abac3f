use std::time::Duration;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;

pub const DEFAULT_SCAN_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Deserialize, Debug)]
pub struct GarageSettings {
    pub ip_address: String,
    pub api_key: String,

    /// Poll interval in seconds. Kept as text so that garbage from a settings
    /// file or the environment falls back to the default instead of failing.
    pub scan_interval: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default)]
    pub camera: bool,
}

impl GarageSettings {
    pub fn scan_interval(&self) -> Duration {
        let seconds = self
            .scan_interval
            .as_deref()
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite() && *seconds >= 1.0)
            .map(|seconds| seconds.trunc() as u64)
            .unwrap_or(DEFAULT_SCAN_INTERVAL_SECONDS);

        Duration::from_secs(seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct MqttSettings {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,

    #[serde(default = "default_node_id")]
    pub node_id: String,

    pub base_topic: Option<String>,
}

impl MqttSettings {
    pub fn base_topic(&self) -> String {
        match &self.base_topic {
            Some(base_topic) => base_topic.trim_end_matches('/').to_string(),
            None => format!("centurion/{}", self.node_id),
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct Settings {
    pub garage: GarageSettings,
    pub mqtt: MqttSettings,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

fn default_device_name() -> String {
    "Centurion Garage".to_string()
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

fn default_node_id() -> String {
    "centurion_garage".to_string()
}

fn is_query_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

pub fn read_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("Settings"))
        .add_source(config::Environment::with_prefix("CENTURION").separator("__"));

    build_settings(builder)
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings = builder.build()?.try_deserialize::<Settings>()?;

    if settings.garage.ip_address.trim().is_empty() {
        return Err(ConfigError::Message(
            "garage.ip_address must not be empty".to_string(),
        ));
    }

    if settings.garage.api_key.is_empty() {
        return Err(ConfigError::Message(
            "garage.api_key must not be empty".to_string(),
        ));
    }

    // The key is sent verbatim in the query string.
    if !settings.garage.api_key.chars().all(is_query_safe) {
        return Err(ConfigError::Message(
            "garage.api_key may only contain letters, digits and '-', '.', '_' or '~'".to_string(),
        ));
    }

    Ok(settings)
}
