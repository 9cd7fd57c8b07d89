use alloc::string::{String, ToString};
use core::fmt;

/// Shutter fully raised.
pub const FULLY_OPEN: u8 = 100;
/// Shutter fully lowered.
pub const FULLY_CLOSED: u8 = 0;

/// Integer encoding of "stop in place" used by older state files; other
/// negative values meant no override.
pub const STOP_SENTINEL: i64 = -2;

const STOP_TOKEN: &str = "STOP";

/// One override tier as it travels between resolver stages.
///
/// The textual form is what the intermediate sensors publish: an empty string
/// for [`Override::Inactive`], `STOP` for [`Override::Stop`] and the decimal
/// position otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Override {
    /// Fall through to the next lower tier
    #[default]
    Inactive,
    /// Halt the actuator where it is
    Stop,
    /// Drive to this position (0-100)
    Position(u8),
}

impl Override {
    /// Parses a stored tier value, degrading anything unparsable to
    /// [`Override::Inactive`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();

        if value.is_empty() {
            return Override::Inactive;
        }

        if value.eq_ignore_ascii_case(STOP_TOKEN) {
            return Override::Stop;
        }

        match value.parse::<i64>() {
            Ok(STOP_SENTINEL) => Override::Stop,
            Ok(v) if v < 0 => Override::Inactive,
            Ok(v) => Override::Position(clamp_position(v)),
            Err(_) => Override::Inactive,
        }
    }

    pub fn is_asserted(&self) -> bool {
        !matches!(self, Override::Inactive)
    }

    pub fn to_state(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Inactive => Ok(()),
            Override::Stop => f.write_str(STOP_TOKEN),
            Override::Position(position) => write!(f, "{position}"),
        }
    }
}

/// Clamps an arbitrary integer into the 0-100 position range.
pub fn clamp_position(value: i64) -> u8 {
    value.clamp(FULLY_CLOSED as i64, FULLY_OPEN as i64) as u8
}

/// Parses a plain position, treating anything unparsable as fully closed.
pub fn parse_position(value: &str) -> u8 {
    value
        .trim()
        .parse::<i64>()
        .map(clamp_position)
        .unwrap_or(FULLY_CLOSED)
}
