//! Discovery descriptors announced once per entity.
//!
//! The controller treats these as opaque announcements; the field names follow
//! the MQTT discovery schema of the home-automation platform.

use alloc::string::String;
use alloc::vec::Vec;

use serde::Serialize;

pub const MANUFACTURER: &str = "shutterctl";
pub const NODE_MODEL: &str = "Shutter Control";
pub const WINDOW_MODEL: &str = "Window";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Select,
    Switch,
    Sensor,
    BinarySensor,
    Cover,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Select => "select",
            Component::Switch => "switch",
            Component::Sensor => "sensor",
            Component::BinarySensor => "binary_sensor",
            Component::Cover => "cover",
        }
    }
}

/// Device grouping the entities of one node or one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device identifier
    pub identifiers: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Model name
    pub model: String,
    /// Human-readable device name
    pub name: String,
}

/// Discovery payload of a single entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub name: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_position_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_position_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub qos: u8,
    pub retain: bool,
}

impl Discovery {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
