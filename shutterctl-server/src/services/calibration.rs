use shutterctl_api::models::{CoverCommand, FULLY_CLOSED, FULLY_OPEN, MotionState, Override, clamp_position};

use crate::configs::WindowConfig;

/// Raise and lower travel times of one actuator, in any consistent unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub time_up: u32,
    pub time_down: u32,
}

impl From<&WindowConfig> for Calibration {
    fn from(config: &WindowConfig) -> Self {
        Self {
            time_up: config.cover_output_calibration_time_up,
            time_down: config.cover_output_calibration_time_down,
        }
    }
}

impl Calibration {
    pub fn factor(&self) -> f64 {
        self.time_up as f64 / self.time_down as f64
    }

    /// Position to send when lowering to `target`.
    ///
    /// The actuator tracks position on one clock for both directions, so a
    /// move downward is stretched by the raise/lower ratio over the distance
    /// left to the top.
    pub fn correct(&self, target: u8) -> u8 {
        let remaining = (FULLY_OPEN - target) as f64;
        let corrected = target as f64 + remaining * (self.factor() - 1.0);

        clamp_position(corrected.round() as i64)
    }
}

/// One outbound action towards the actuator, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorStep {
    /// Publish to the calibration reset topic
    Calibrate(u32),
    /// Wait for the actuator to apply the calibration
    Settle,
    /// Publish to the command topic
    Command(CoverCommand),
}

/// Translates a resolved target into actuator steps.
///
/// `None` means there is nothing to send, either because no tier asserted a
/// target or because the actuator already reports it.
pub fn plan(target: Override, current: u8, calibration: &Calibration, offset: u32) -> Option<Vec<ActuatorStep>> {
    let target = match target {
        Override::Inactive => return None,
        Override::Stop => {
            return Some(vec![ActuatorStep::Command(CoverCommand::Motion {
                state: MotionState::Stop,
            })]);
        }
        Override::Position(target) => target,
    };

    if target == current {
        return None;
    }

    if target == FULLY_OPEN {
        return Some(vec![
            ActuatorStep::Calibrate(calibration.time_up + offset),
            ActuatorStep::Calibrate(calibration.time_up),
            ActuatorStep::Settle,
            ActuatorStep::Command(CoverCommand::Motion {
                state: MotionState::Open,
            }),
        ]);
    }

    let position = if target < current && target != FULLY_CLOSED {
        calibration.correct(target)
    } else {
        target
    };

    if position == current {
        return None;
    }

    Some(vec![ActuatorStep::Command(CoverCommand::Position { position })])
}
