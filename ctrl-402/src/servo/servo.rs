use crate::bus::ProcessData;
use crate::config::Limits;
use crate::error::ErrorCode;
use crate::profile::profile::MotionProfile;

use super::cia402::{decode, DriveState};

pub const MODE_OP_CSP: i8 = 8;
pub const MODE_OP_CSV: i8 = 9;
pub const MODE_OP_CST: i8 = 10;

/// Cyclic synchronous operation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    Position,
    Velocity,
    Torque,
}

impl OperationMode {
    /// Value for the modes of operation object (0x6060).
    pub fn code(self) -> i8 {
        match self {
            OperationMode::Position => MODE_OP_CSP,
            OperationMode::Velocity => MODE_OP_CSV,
            OperationMode::Torque => MODE_OP_CST,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            MODE_OP_CSP => Some(OperationMode::Position),
            MODE_OP_CSV => Some(OperationMode::Velocity),
            MODE_OP_CST => Some(OperationMode::Torque),
            _ => None,
        }
    }
}

impl Default for OperationMode {
    fn default() -> Self {
        OperationMode::Position
    }
}

/// Everything known about one axis. Owned by its orchestrator.
#[derive(Debug, Clone)]
pub struct DriveContext {
    pub axis: u16,
    pub state: DriveState,
    pub status_word: u16,
    pub control_word: u16,
    pub profile: Option<MotionProfile>,
    pub mode: OperationMode,
    pub limits: Limits,
    pub error: Option<ErrorCode>,

    pub actual_position: f64,
    pub actual_velocity: f64,
    pub actual_torque: f64,
    /// Last target value handed to the bus.
    pub setpoint: f64,
}

impl DriveContext {
    /// Everything disabled: voltage off, no profile, no error.
    pub fn new(axis: u16, limits: Limits) -> Self {
        Self {
            axis,
            state: DriveState::NotReady,
            status_word: 0,
            control_word: 0,
            profile: None,
            mode: OperationMode::default(),
            limits,
            error: None,
            actual_position: 0.0,
            actual_velocity: 0.0,
            actual_torque: 0.0,
            setpoint: 0.0,
        }
    }

    /// Takes over the inputs of this cycle and returns the previous state.
    pub fn observe(&mut self, data: &ProcessData) -> DriveState {
        let previous = self.state;
        self.status_word = data.status_word;
        self.state = decode(data.status_word);
        self.actual_position = data.actual_position;
        self.actual_velocity = data.actual_velocity;
        self.actual_torque = data.actual_torque;
        previous
    }

    /// The value matching the operation mode, e.g. to start a ramp from.
    pub fn actual_value(&self) -> f64 {
        match self.mode {
            OperationMode::Position => self.actual_position,
            OperationMode::Velocity => self.actual_velocity,
            OperationMode::Torque => self.actual_torque,
        }
    }
}
