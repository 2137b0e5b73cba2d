use config::ConfigError;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationConfiguration {
    pub log_format: LogFormat,
    pub url: String,
    pub cors_enabled: Option<bool>,
    pub data_server: DataServerConfig,
    pub external_server_response_timeout_ms: Option<u64>,
    pub event_publishers: Option<EventPublishers>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataServerConfig {
    pub host: String,
    pub port: u16,
    pub trayecto_dir: String,
    #[serde(default = "default_stream_interval_ms")]
    pub stream_interval_ms: u64,
}

impl DataServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_stream_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventPublishers {
    pub http: Option<EventPublisherHttp>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventPublisherHttp {
    pub enabled: bool,
    pub target_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

pub static CONFIG: Lazy<RwLock<ApplicationConfiguration>> =
    Lazy::new(|| RwLock::new(ApplicationConfiguration::new().unwrap()));

impl ApplicationConfiguration {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        info!("Environment variables loaded.");
        info!("Loading application configuration ...");

        let config = if cfg!(feature = "test_utils") {
            config::Config::builder()
                .add_source(config::File::with_name("../telemetry_shared/tests/test-config.yaml"))
                .add_source(config::Environment::with_prefix("TEST_TELEMETRY").separator("__"))
                .build()?
        } else {
            config::Config::builder()
                .add_source(config::File::with_name("telemetry_application/config.yaml"))
                .add_source(config::Environment::with_prefix("TELEMETRY").separator("__"))
                .build()?
        };

        config.try_deserialize().inspect(|config: &ApplicationConfiguration| {
            info!("Configuration loaded successfully");
            debug!("{:#?}", config);
        })
    }

    pub fn enable_event_publisher_http(&mut self) {
        if let Some(event_publishers) = &mut self.event_publishers {
            if let Some(http) = &mut event_publishers.http {
                http.enabled = true;
            }
        }
    }

    pub fn set_event_publisher_http_target_url(&mut self, target_url: String) {
        if let Some(event_publishers) = &mut self.event_publishers {
            if let Some(http) = &mut event_publishers.http {
                http.target_url = target_url;
            }
        }
    }

    pub fn set_data_server_address(&mut self, host: String, port: u16) {
        self.data_server.host = host;
        self.data_server.port = port;
    }

    pub fn set_trayecto_dir(&mut self, trayecto_dir: String) {
        self.data_server.trayecto_dir = trayecto_dir;
    }
}

/// Returns the application configuration or loads it, if it hasn't been loaded already.
pub fn config<'a>() -> RwLockReadGuard<'a, ApplicationConfiguration> {
    CONFIG.read().unwrap()
}

/// Returns Write Guard for the application configuration that can be used to update the configuration during runtime.
#[cfg(feature = "test_utils")]
pub fn set_config<'a>() -> std::sync::RwLockWriteGuard<'a, ApplicationConfiguration> {
    CONFIG.write().unwrap()
}
