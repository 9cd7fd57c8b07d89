use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};

use super::{FULLY_CLOSED, FULLY_OPEN, clamp_position};

/// Last reported state of a cover.
///
/// Actuators report these fields independently, so every field is optional
/// and updates are merged field by field instead of replacing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverState {
    /// Raise time the actuator currently calibrates against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_time: Option<i64>,
    /// Position percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// Motion state token such as `OPEN`, `CLOSE` or `STOP`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Direction while travelling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<String>,
}

impl CoverState {
    /// State of a cover nobody has reported on yet.
    pub fn initial() -> Self {
        Self {
            position: Some(FULLY_CLOSED as i64),
            state: Some(MotionState::Stop.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Decodes a stored record, falling back to [`CoverState::initial`].
    pub fn decode(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self::initial())
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Overwrites only the fields present in `update`.
    pub fn merge(&mut self, update: CoverState) {
        if update.calibration_time.is_some() {
            self.calibration_time = update.calibration_time;
        }
        if update.position.is_some() {
            self.position = update.position;
        }
        if update.state.is_some() {
            self.state = update.state;
        }
        if update.moving.is_some() {
            self.moving = update.moving;
        }
    }

    /// Merges a raw payload: JSON objects merge field-wise, any other token
    /// replaces the `state` field.
    pub fn merge_payload(&mut self, payload: &str) -> Result<(), serde_json::Error> {
        let payload = payload.trim();

        if payload.starts_with('{') {
            let update: CoverState = serde_json::from_str(payload)?;
            self.merge(update);
        } else {
            self.state = Some(payload.to_string());
        }

        Ok(())
    }

    /// Reported position, 0 when the actuator never reported one.
    pub fn position_or_closed(&self) -> u8 {
        self.position.map(clamp_position).unwrap_or(FULLY_CLOSED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotionState {
    Open,
    Close,
    Stop,
}

impl MotionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionState::Open => "OPEN",
            MotionState::Close => "CLOSE",
            MotionState::Stop => "STOP",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "OPEN" => Some(MotionState::Open),
            "CLOSE" => Some(MotionState::Close),
            "STOP" => Some(MotionState::Stop),
            _ => None,
        }
    }
}

/// Command published to an actuator's `/set` topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverCommand {
    /// Plain motion, e.g. `{"state":"OPEN"}`
    Motion { state: MotionState },
    /// Absolute position, e.g. `{"position":67}`
    Position { position: u8 },
}

impl CoverCommand {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload received on a cover's command topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverInput {
    Motion(MotionState),
    Position(u8),
    /// JSON object carrying a subset of [`CoverState`] fields
    Partial(CoverState),
    /// Any other bare token
    Token(String),
}

impl CoverInput {
    pub fn parse(payload: &str) -> Self {
        let payload = payload.trim();

        if let Some(motion) = MotionState::from_token(payload) {
            return CoverInput::Motion(motion);
        }

        if payload.starts_with('{') {
            return CoverInput::Partial(serde_json::from_str(payload).unwrap_or_default());
        }

        match payload.parse::<i64>() {
            Ok(position) => CoverInput::Position(clamp_position(position)),
            Err(_) => CoverInput::Token(payload.to_string()),
        }
    }

    /// Position this input asks for.
    ///
    /// `None` means "stop"; inputs that carry no usable position resolve to
    /// fully closed.
    pub fn requested_position(&self) -> Option<u8> {
        match self {
            CoverInput::Motion(MotionState::Open) => Some(FULLY_OPEN),
            CoverInput::Motion(MotionState::Close) => Some(FULLY_CLOSED),
            CoverInput::Motion(MotionState::Stop) => None,
            CoverInput::Position(position) => Some(*position),
            CoverInput::Partial(state) => Some(state.position_or_closed()),
            CoverInput::Token(_) => Some(FULLY_CLOSED),
        }
    }

    /// Record fields this input sets when it is applied to a cover.
    pub fn into_state_update(self) -> CoverState {
        match self {
            CoverInput::Motion(MotionState::Open) => CoverState {
                position: Some(FULLY_OPEN as i64),
                state: Some(MotionState::Open.as_str().to_string()),
                ..Default::default()
            },
            CoverInput::Motion(MotionState::Close) => CoverState {
                position: Some(FULLY_CLOSED as i64),
                state: Some(MotionState::Close.as_str().to_string()),
                ..Default::default()
            },
            CoverInput::Motion(MotionState::Stop) => CoverState {
                state: Some(MotionState::Stop.as_str().to_string()),
                ..Default::default()
            },
            CoverInput::Position(position) => CoverState {
                position: Some(position as i64),
                ..Default::default()
            },
            CoverInput::Partial(state) => state,
            CoverInput::Token(token) => CoverState {
                state: Some(token),
                ..Default::default()
            },
        }
    }
}
