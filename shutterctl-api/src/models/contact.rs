use serde::{Deserialize, Serialize};

/// Payload of a door/window contact sensor, e.g. `{"contact": true}`.
///
/// `contact == true` means the magnet is closed, so the window is shut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactState {
    pub contact: bool,
}

impl ContactState {
    pub fn parse(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }

    /// Whether a stored sensor value reports the window as shut.
    ///
    /// Absent sensors, sensors that never reported and unreadable payloads
    /// all count as shut, so they never assert an override.
    pub fn is_shut(raw: Option<&str>) -> bool {
        raw.and_then(Self::parse).map(|s| s.contact).unwrap_or(true)
    }
}

/// How far a window is opened, as published on the window-open state sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowOpening {
    Closed = 0,
    Tilted = 1,
    Open = 2,
}

impl WindowOpening {
    pub fn from_contacts(open_shut: bool, tilted_shut: bool) -> Self {
        match (open_shut, tilted_shut) {
            (false, _) => WindowOpening::Open,
            (true, false) => WindowOpening::Tilted,
            (true, true) => WindowOpening::Closed,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}
