use shutterctl_api::models::CoverCommand;
use shutterctl_api::topic::{CALIBRATION_SUFFIX, SET_SUFFIX};

/// Request addressed to one simulated actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorRequest {
    Move(CoverCommand),
    Calibrate(u32),
}

/// Matches `topic` against the actuators' command topics.
///
/// Returns the actuator index and the decoded request, or `None` when the
/// topic is foreign or the payload cannot be decoded.
pub fn parse_request(actuators: &[String], topic: &str, payload: &str) -> Option<(usize, ActuatorRequest)> {
    if let Some(base) = topic.strip_suffix(CALIBRATION_SUFFIX) {
        let index = actuators.iter().position(|a| a == base)?;
        let time = payload.trim().parse::<u32>().ok()?;

        return Some((index, ActuatorRequest::Calibrate(time)));
    }

    if let Some(base) = topic.strip_suffix(SET_SUFFIX) {
        let index = actuators.iter().position(|a| a == base)?;

        return match serde_json::from_str::<CoverCommand>(payload) {
            Ok(command) => Some((index, ActuatorRequest::Move(command))),
            Err(e) => {
                tracing::warn!("Ignoring command {} on {}: {}", payload, topic, e);
                None
            }
        };
    }

    None
}
