use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::events::DAILY_ABSENCES_PATH;
use crate::notification::DispatcherConfig;
use crate::transport::{CircuitBreakerConfig, MockConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub absence_check: AbsenceCheckConfig,
    /// Link rendered in every message when the event carries none
    #[serde(default = "default_system_url")]
    pub system_url: String,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    /// `development` or `production`, taken from RUN_MODE
    #[serde(default = "default_run_mode")]
    pub run_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Real transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Explicit availability flag; false sends everything through the mock
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Timeout for one real call in milliseconds
    #[serde(default = "default_transport_timeout_ms")]
    pub timeout_ms: u64,
    /// Start with mock delivery forced
    #[serde(default)]
    pub force_mock: bool,
    #[serde(default)]
    pub endpoints: EndpointTable,
    /// Overrides the endpoint table when set
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Backend base URL per run mode
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointTable {
    #[serde(default = "default_development_endpoint")]
    pub development: String,
    #[serde(default = "default_production_endpoint")]
    pub production: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockSettings {
    /// Simulated latency in milliseconds
    #[serde(default = "default_mock_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_failure_probability")]
    pub failure_probability: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive real failures before the circuit opens (0 = disabled)
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

/// Scheduled daily absence scan
#[derive(Debug, Clone, Deserialize)]
pub struct AbsenceCheckConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Scan interval in seconds
    #[serde(default = "default_absence_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_absence_path")]
    pub path: String,
}

/// Log output shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event, for log shippers
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_run_mode() -> String {
    "development".to_string()
}

fn default_system_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_transport_timeout_ms() -> u64 {
    10_000
}

fn default_development_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_production_endpoint() -> String {
    "https://api.asistencia.universidad.edu".to_string()
}

fn default_mock_delay_ms() -> u64 {
    1000
}

fn default_failure_probability() -> f64 {
    0.10
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_reset_timeout_ms() -> u64 {
    30_000
}

fn default_absence_interval() -> u64 {
    86_400 // once a day
}

fn default_absence_path() -> String {
    DAILY_ABSENCES_PATH.to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "attendance-notifier".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("transport.enabled", true)?
            .set_default("transport.timeout_ms", 10_000)?
            .set_default("mock.delay_ms", 1000)?
            .set_default("mock.failure_probability", 0.10)?
            .set_default("run_mode", run_mode.as_str())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_PORT, TRANSPORT_ENABLED, MOCK_SEED, OTEL_ENABLED, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.mock.failure_probability) {
            return Err(ConfigError::Message(format!(
                "mock.failure_probability must be within [0, 1], got {}",
                self.mock.failure_probability
            )));
        }
        if self.absence_check.enabled && self.absence_check.interval_secs == 0 {
            return Err(ConfigError::Message(
                "absence_check.interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.run_mode == "production" || self.run_mode == "prod"
    }

    /// Base URL of the attendance backend for the current run mode
    pub fn backend_base_url(&self) -> &str {
        self.transport.resolve_base_url(&self.run_mode)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            real_enabled: self.transport.enabled,
            real_timeout: self.transport.timeout(),
            force_mock: self.transport.force_mock,
            circuit_breaker: self.circuit_breaker.to_breaker_config(),
        }
    }

    pub fn mock_config(&self) -> MockConfig {
        MockConfig {
            delay: Duration::from_millis(self.mock.delay_ms),
            failure_probability: self.mock.failure_probability,
            seed: self.mock.seed,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pick the backend URL: explicit override first, then the run-mode table
    pub fn resolve_base_url(&self, run_mode: &str) -> &str {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url;
        }
        match run_mode {
            "production" | "prod" => &self.endpoints.production,
            _ => &self.endpoints.development,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_transport_timeout_ms(),
            force_mock: false,
            endpoints: EndpointTable::default(),
            base_url: None,
        }
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self {
            development: default_development_endpoint(),
            production: default_production_endpoint(),
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_mock_delay_ms(),
            failure_probability: default_failure_probability(),
            seed: None,
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}

impl Default for AbsenceCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_absence_interval(),
            path: default_absence_path(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            transport: TransportConfig::default(),
            mock: MockSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            absence_check: AbsenceCheckConfig::default(),
            system_url: default_system_url(),
            log: LogConfig::default(),
            otel: OtelConfig::default(),
            run_mode: default_run_mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8090);
        assert!(settings.transport.enabled);
        assert!(!settings.transport.force_mock);
        assert_eq!(settings.transport.timeout(), Duration::from_secs(10));
        assert_eq!(settings.mock.delay_ms, 1000);
        assert_eq!(settings.mock.failure_probability, 0.10);
        assert!(!settings.absence_check.enabled);
        assert_eq!(settings.absence_check.path, "/api/ausencias/verificar-diarias");
    }

    #[test]
    fn test_endpoint_resolution_by_run_mode() {
        let transport = TransportConfig::default();
        assert_eq!(transport.resolve_base_url("development"), "http://localhost:8080");
        assert_eq!(
            transport.resolve_base_url("production"),
            "https://api.asistencia.universidad.edu"
        );
        assert_eq!(transport.resolve_base_url("staging"), "http://localhost:8080");
    }

    #[test]
    fn test_base_url_override_wins() {
        let transport = TransportConfig {
            base_url: Some("http://10.0.0.5:8080".to_string()),
            ..Default::default()
        };
        assert_eq!(transport.resolve_base_url("production"), "http://10.0.0.5:8080");

        let blank = TransportConfig {
            base_url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.resolve_base_url("development"), "http://localhost:8080");
    }

    #[test]
    fn test_dispatcher_and_mock_conversion() {
        let mut settings = Settings::default();
        settings.transport.enabled = false;
        settings.mock.seed = Some(42);
        settings.circuit_breaker.reset_timeout_ms = 500;

        let dispatcher = settings.dispatcher_config();
        assert!(!dispatcher.real_enabled);
        assert_eq!(dispatcher.circuit_breaker.reset_timeout, Duration::from_millis(500));

        let mock = settings.mock_config();
        assert_eq!(mock.seed, Some(42));
        assert_eq!(mock.delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_log_format_parsing() {
        let log: LogConfig = serde_json::from_value(serde_json::json!({"format": "json"})).unwrap();
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(Settings::default().log.format, LogFormat::Text);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let mut settings = Settings::default();
        settings.mock.failure_probability = 1.5;
        assert!(settings.validate().is_err());
    }
}
