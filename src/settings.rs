use config::{Config, ConfigError, Environment, File, FileFormat};
use roller_motion::{MotionConfig, MotionError, StopRule};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_ENV: &str = "ROLLER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub motion: MotionSettings,
    pub pins: PinSettings,
    pub shutdown: ShutdownSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".into(),
            port: 5556,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    pub pulse_rate: u32,
    pub steps_per_percent: f64,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub stop_rule: StopRule,
}

impl Default for MotionSettings {
    fn default() -> Self {
        MotionSettings {
            pulse_rate: 840,
            steps_per_percent: 192.0,
            settle_delay_ms: 1000,
            poll_interval_ms: 1000,
            stop_rule: StopRule::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    Simulated,
    Sysfs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinSettings {
    pub backend: OutputBackend,
    pub enable: u64,
    pub direction: u64,
    pub step: u64,
}

impl Default for PinSettings {
    fn default() -> Self {
        PinSettings {
            backend: OutputBackend::Simulated,
            enable: 25,
            direction: 12,
            step: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    pub timeout_ms: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        ShutdownSettings { timeout_ms: 5000 }
    }
}

impl ShutdownSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Validated motion configuration.
    pub fn motion_config(&self) -> Result<MotionConfig, MotionError> {
        let m = &self.motion;
        Ok(MotionConfig::new(m.pulse_rate, m.steps_per_percent)?
            .with_settle_delay(Duration::from_millis(m.settle_delay_ms))
            .with_poll_interval(Duration::from_millis(m.poll_interval_ms))
            .with_stop_rule(m.stop_rule))
    }
}

/// Load settings from the TOML file named by `ROLLER_CONFIG` (default
/// `config/default.toml`), overridden by `ROLLER_<SECTION>__<KEY>` variables.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(&path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("ROLLER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
