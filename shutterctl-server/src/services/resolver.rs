//! Reduction of the competing position desires of one window to a single
//! target.
//!
//! Everything here is a pure function of the window's current inputs, so the
//! synchronization layer can call it on every change without extra state.

use shutterctl_api::models::{FULLY_OPEN, Override, RainLevel, WindowOpening};

use crate::configs::WindowConfig;

/// Per-window positions imposed by the window sensors and the rain level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub open_drizzle: u8,
    pub open_storm: u8,
    pub tilted_drizzle: u8,
    pub tilted_storm: u8,
    pub tilted_closed: u8,
}

impl From<&WindowConfig> for Thresholds {
    fn from(config: &WindowConfig) -> Self {
        Self {
            open_drizzle: config.open_drizzle,
            open_storm: config.open_storm,
            tilted_drizzle: config.tilted_drizzle,
            tilted_storm: config.tilted_storm,
            tilted_closed: config.tilted_closed,
        }
    }
}

/// Current inputs of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inputs {
    pub schedule: u8,
    pub opening: WindowOpening,
    pub rain: RainLevel,
    pub manual: Override,
    pub automation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub safety: Override,
    pub rain: Override,
    /// Authoritative target across all tiers
    pub target: Override,
    /// What the actuator should be driven to, `Inactive` for nothing
    pub command: Override,
}

/// Position ceiling imposed by an open or tilted window.
///
/// Asserted only when it is above the schedule; a more closed schedule wins.
pub fn safety_clamp(opening: WindowOpening, schedule: u8, thresholds: &Thresholds) -> Override {
    match opening {
        WindowOpening::Open if schedule < FULLY_OPEN => Override::Position(FULLY_OPEN),
        WindowOpening::Tilted if schedule < thresholds.tilted_closed => Override::Position(thresholds.tilted_closed),
        _ => Override::Inactive,
    }
}

/// Position imposed by rain through an open or tilted window.
///
/// Asserted only when it is more closed than the schedule.
pub fn rain_clamp(opening: WindowOpening, rain: RainLevel, schedule: u8, thresholds: &Thresholds) -> Override {
    let threshold = match (opening, rain) {
        (WindowOpening::Open, RainLevel::Drizzle) => thresholds.open_drizzle,
        (WindowOpening::Open, RainLevel::Storm) => thresholds.open_storm,
        (WindowOpening::Tilted, RainLevel::Drizzle) => thresholds.tilted_drizzle,
        (WindowOpening::Tilted, RainLevel::Storm) => thresholds.tilted_storm,
        _ => return Override::Inactive,
    };

    if schedule > threshold {
        Override::Position(threshold)
    } else {
        Override::Inactive
    }
}

/// Applies the tiers in ascending priority: schedule, safety, rain, manual.
pub fn authoritative_target(schedule: u8, safety: Override, rain: Override, manual: Override) -> Override {
    [safety, rain, manual]
        .into_iter()
        .filter(Override::is_asserted)
        .last()
        .unwrap_or(Override::Position(schedule))
}

pub fn resolve(inputs: &Inputs, thresholds: &Thresholds) -> Resolution {
    let safety = safety_clamp(inputs.opening, inputs.schedule, thresholds);
    let rain = rain_clamp(inputs.opening, inputs.rain, inputs.schedule, thresholds);
    let target = authoritative_target(inputs.schedule, safety, rain, inputs.manual);

    let command = if inputs.automation { target } else { inputs.manual };

    Resolution {
        safety,
        rain,
        target,
        command,
    }
}
