use std::time::Duration;

use shutterctl_api::models::{CoverCommand, CoverState, FULLY_CLOSED, FULLY_OPEN, MotionState};

const UP: &str = "UP";
const DOWN: &str = "DOWN";
const STOP: &str = "STOP";

/// A shutter motor tracking its position on a linear clock.
///
/// Travelling the full range takes `time_up` seconds upwards and `time_down`
/// seconds downwards, scaled by a per-move speed factor.
#[derive(Debug, Clone)]
pub struct Shutter {
    position: f64,
    target: f64,
    time_up: u32,
    time_down: u32,
    speed: f64,
}

impl Shutter {
    pub fn new(time_up: u32, time_down: u32) -> Self {
        Self {
            position: FULLY_CLOSED as f64,
            target: FULLY_CLOSED as f64,
            time_up: time_up.max(1),
            time_down: time_down.max(1),
            speed: 1.0,
        }
    }

    pub fn position(&self) -> u8 {
        self.position.round() as u8
    }

    pub fn is_moving(&self) -> bool {
        self.position != self.target
    }

    /// Starts a move; `speed` scales the motor for the whole move.
    pub fn apply(&mut self, command: CoverCommand, speed: f64) {
        self.target = match command {
            CoverCommand::Motion { state: MotionState::Open } => FULLY_OPEN as f64,
            CoverCommand::Motion { state: MotionState::Close } => FULLY_CLOSED as f64,
            CoverCommand::Motion { state: MotionState::Stop } => self.position,
            CoverCommand::Position { position } => position.min(FULLY_OPEN) as f64,
        };
        self.speed = speed.max(0.01);
    }

    pub fn calibrate(&mut self, time_up: u32) {
        self.time_up = time_up.max(1);
    }

    /// Moves towards the target for `elapsed`, never overshooting.
    pub fn advance(&mut self, elapsed: Duration) {
        let span = (FULLY_OPEN - FULLY_CLOSED) as f64;
        let seconds = elapsed.as_secs_f64() * self.speed;

        if self.target > self.position {
            let step = span / self.time_up as f64 * seconds;
            self.position = (self.position + step).min(self.target);
        } else if self.target < self.position {
            let step = span / self.time_down as f64 * seconds;
            self.position = (self.position - step).max(self.target);
        }
    }

    pub fn report(&self) -> CoverState {
        let moving = if self.target > self.position {
            UP
        } else if self.target < self.position {
            DOWN
        } else {
            STOP
        };
        let state = if self.position() == FULLY_CLOSED {
            MotionState::Close
        } else {
            MotionState::Open
        };

        CoverState {
            calibration_time: Some(self.time_up as i64),
            position: Some(self.position() as i64),
            state: Some(state.as_str().to_string()),
            moving: Some(moving.to_string()),
        }
    }
}
