use std::collections::HashSet;
use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    pub auth: Option<GatewayAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node id, prefix of every entity id
    pub id: String,
    /// Topic prefix of the node's own entities
    pub channel: String,
    /// Discovery prefix of the home-automation platform
    pub discovery: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub discovery_delay_ms: u64,
    pub calibration_settle_ms: u64,
    pub calibration_offset: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            discovery_delay_ms: 500,
            calibration_settle_ms: 1000,
            calibration_offset: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub path: String,
    pub flush_interval_secs: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            path: "configs/states.json".to_string(),
            flush_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub id: String,
    #[serde(default)]
    pub window_open_sensor: Option<String>,
    #[serde(default)]
    pub window_tilted_sensor: Option<String>,
    /// Actuator state topic; commands go to `{cover_output}/set`
    pub cover_output: String,
    pub cover_output_calibration_time_up: u32,
    pub cover_output_calibration_time_down: u32,
    pub open_drizzle: u8,
    pub open_storm: u8,
    pub tilted_drizzle: u8,
    pub tilted_storm: u8,
    pub tilted_closed: u8,
}

impl WindowConfig {
    pub fn open_sensor_topic(&self) -> Option<&str> {
        self.window_open_sensor.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn tilted_sensor_topic(&self) -> Option<&str> {
        self.window_tilted_sensor.as_deref().filter(|t| !t.trim().is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Message("window id must not be empty".into()));
        }

        if self.cover_output.trim().is_empty() {
            return Err(ConfigError::Message(format!("window {}: cover_output must not be empty", self.id)));
        }

        if self.cover_output_calibration_time_up == 0 || self.cover_output_calibration_time_down == 0 {
            return Err(ConfigError::Message(format!(
                "window {}: calibration times must be strictly positive",
                self.id
            )));
        }

        let thresholds = [
            ("open_drizzle", self.open_drizzle),
            ("open_storm", self.open_storm),
            ("tilted_drizzle", self.tilted_drizzle),
            ("tilted_storm", self.tilted_storm),
            ("tilted_closed", self.tilted_closed),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, v)| *v > 100) {
            return Err(ConfigError::Message(format!(
                "window {}: {name} = {value} is outside 0..=100",
                self.id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub gateway: Gateway,
    pub node: Node,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("SHUTTERCTL").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.id.trim().is_empty() {
            return Err(ConfigError::Message("node id must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for window in &self.windows {
            window.validate()?;

            if !seen.insert(window.id.as_str()) {
                return Err(ConfigError::Message(format!("duplicate window id {}", window.id)));
            }
        }

        Ok(())
    }
}

fn default_keep_alive_secs() -> u64 {
    5
}
