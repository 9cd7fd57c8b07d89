//! Topic and identifier layout shared by the controller and the simulator.

use alloc::format;
use alloc::string::String;

/// Availability payload while the node is running.
pub const ONLINE: &str = "online";
/// Availability payload after shutdown, also the last will.
pub const OFFLINE: &str = "offline";

/// Suffix of an actuator's command topic.
pub const SET_SUFFIX: &str = "/set";
/// Suffix of an actuator's calibration reset topic.
pub const CALIBRATION_SUFFIX: &str = "/set/calibration_time";

/// Converts a human entity name into snake case.
///
/// `Living Room`, `living-room` and `LivingRoom` all become `living_room`.
pub fn to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if matches!(previous, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == ' ' || c == '-' || c == '.' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
        } else {
            out.push(c);
        }
        previous = Some(c);
    }

    out
}

/// Globally unique entity id.
///
/// Format: `{node_id}_{snake(name)}`
pub fn unique_id(node_id: &str, name: &str) -> String {
    format!("{}_{}", node_id, to_snake(name))
}

/// Own topic of an entity.
///
/// Format: `{channel}/{node_id}/{component}/{unique_id}/{suffix}`
pub fn entity_topic(channel: &str, node_id: &str, component: &str, unique_id: &str, suffix: &str) -> String {
    format!("{channel}/{node_id}/{component}/{unique_id}/{suffix}")
}

/// Discovery config topic of an entity.
///
/// Format: `{discovery}/{component}/{node_id}/{unique_id}/config`
pub fn discovery_topic(discovery: &str, component: &str, node_id: &str, unique_id: &str) -> String {
    format!("{discovery}/{component}/{node_id}/{unique_id}/config")
}

/// Format: `{channel}/{node_id}/availability`
pub fn availability_topic(channel: &str, node_id: &str) -> String {
    format!("{channel}/{node_id}/availability")
}

pub fn actuator_command_topic(actuator: &str) -> String {
    format!("{actuator}{SET_SUFFIX}")
}

pub fn actuator_calibration_topic(actuator: &str) -> String {
    format!("{actuator}{CALIBRATION_SUFFIX}")
}
