use std::convert::TryFrom;
use std::fmt;

use derive_new::new;
use thiserror::Error;

/// Emergency error codes reported to the diagnostics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DcLinkOverVoltage,
    DcLinkUnderVoltage,
    PhaseFailureL1,
    PhaseFailureL2,
    PhaseFailureL3,
    ExcessTemperatureDevice,
    /// Any control error that cannot be specified further.
    Control,
    MaxTargetPositionExceeded,
    MinTargetPositionExceeded,
    MaxActualPositionExceeded,
    MinActualPositionExceeded,
}

impl ErrorCode {
    pub fn code(self) -> u16 {
        match self {
            ErrorCode::DcLinkOverVoltage => 0x3210,
            ErrorCode::DcLinkUnderVoltage => 0x3220,
            ErrorCode::PhaseFailureL1 => 0x3131,
            ErrorCode::PhaseFailureL2 => 0x3132,
            ErrorCode::PhaseFailureL3 => 0x3133,
            ErrorCode::ExcessTemperatureDevice => 0x4210,
            ErrorCode::Control => 0x8A00,
            ErrorCode::MaxTargetPositionExceeded => 0x8B01,
            ErrorCode::MinTargetPositionExceeded => 0x8B02,
            ErrorCode::MaxActualPositionExceeded => 0x8B03,
            ErrorCode::MinActualPositionExceeded => 0x8B04,
        }
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ok(match code {
            0x3210 => ErrorCode::DcLinkOverVoltage,
            0x3220 => ErrorCode::DcLinkUnderVoltage,
            0x3131 => ErrorCode::PhaseFailureL1,
            0x3132 => ErrorCode::PhaseFailureL2,
            0x3133 => ErrorCode::PhaseFailureL3,
            0x4210 => ErrorCode::ExcessTemperatureDevice,
            0x8A00 => ErrorCode::Control,
            0x8B01 => ErrorCode::MaxTargetPositionExceeded,
            0x8B02 => ErrorCode::MinTargetPositionExceeded,
            0x8B03 => ErrorCode::MaxActualPositionExceeded,
            0x8B04 => ErrorCode::MinActualPositionExceeded,
            other => return Err(other),
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:04X})", self, self.code())
    }
}

/// One report handed to a [`DiagnosticsSink`](crate::bus::DiagnosticsSink).
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct Diagnostic {
    pub axis: u16,
    pub code: ErrorCode,
    /// The offending value in user units.
    pub value: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("profile needs more steps than can be counted")]
    TooManySteps,
    #[error("line {line}: expected {expected} columns, found {found}")]
    ParameterCount { line: usize, expected: usize, found: usize },
    #[error("line {line}: cannot parse {token:?}")]
    Parse { line: usize, token: String },
    #[error("no startup parameters found")]
    Empty,
    #[error("axis {axis} not configured, {axes} axes available")]
    NoSuchAxis { axis: usize, axes: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Rejects zero, negative and non-finite rates.
    pub(crate) fn check_positive<F: num_traits::Float>(name: &'static str, value: F) -> Result<F, ConfigError> {
        if value.is_finite() && value > F::zero() {
            Ok(value)
        } else {
            Err(ConfigError::NonPositive {
                name,
                value: value.to_f64().unwrap_or(f64::NAN),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("limit exceeded: {code} at {value}")]
    LimitExceeded { code: ErrorCode, value: f64 },
    #[error("{0} latched, re-enable required")]
    Latched(ErrorCode),
    #[error("axis is shut down")]
    Shutdown,
}
