use std::error::Error;

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
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actuator {
    /// State topic of the simulated actuator
    pub topic: String,
    pub time_up: u32,
    pub time_down: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mock {
    /// Interval between reports while a shutter moves
    pub tick_ms: u64,
    /// Maximum relative deviation of the motor speed per move
    pub jitter: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub gateway: Gateway,
    pub mock: Mock,
    pub actuators: Vec<Actuator>,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/mock.toml"
        )))?;

        Ok(settings)
    }
}
