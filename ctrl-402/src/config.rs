use std::time::Duration;

use crate::error::ErrorCode;

/// Bounds checked against the actual values every cycle. `None` disables a bound.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Limits {
    pub min_position: Option<f64>,
    pub max_position: Option<f64>,
    /// Absolute torque bound, applied symmetrically.
    pub max_torque: Option<f64>,
}

impl Limits {
    pub fn position(min: f64, max: f64) -> Self {
        Limits {
            min_position: Some(min),
            max_position: Some(max),
            max_torque: None,
        }
    }

    pub fn with_max_torque(mut self, max_torque: f64) -> Self {
        self.max_torque = Some(max_torque);
        self
    }

    /// First violated bound for the given actual values.
    pub fn check_actual(&self, position: f64, torque: f64) -> Option<(ErrorCode, f64)> {
        if let Some(max) = self.max_position {
            if position > max {
                return Some((ErrorCode::MaxActualPositionExceeded, position));
            }
        }
        if let Some(min) = self.min_position {
            if position < min {
                return Some((ErrorCode::MinActualPositionExceeded, position));
            }
        }
        match self.max_torque {
            Some(max) if torque.abs() > max => Some((ErrorCode::Control, torque)),
            _ => None,
        }
    }

    /// Checks a commanded position before it is handed to the drive.
    pub fn check_target(&self, position: f64) -> Option<(ErrorCode, f64)> {
        match (self.min_position, self.max_position) {
            (_, Some(max)) if position > max => Some((ErrorCode::MaxTargetPositionExceeded, position)),
            (Some(min), _) if position < min => Some((ErrorCode::MinTargetPositionExceeded, position)),
            _ => None,
        }
    }
}

/// Per-axis settings, usually derived from the startup parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveConfig {
    pub cycle_period: Duration,
    pub limits: Limits,
    /// |velocity| below which a quick stop is considered finished.
    pub standstill_velocity: f64,
    pub profile_velocity: f64,
    pub profile_acceleration: f64,
    pub profile_deceleration: f64,
    pub torque_slope: f64,
}

impl DriveConfig {
    pub fn cycle_seconds(&self) -> f64 {
        self.cycle_period.as_secs_f64()
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_millis(1),
            limits: Limits::default(),
            standstill_velocity: 1.0,
            profile_velocity: 350.0,
            profile_acceleration: 350.0,
            profile_deceleration: 350.0,
            torque_slope: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_by_default() {
        let limits = Limits::default();
        assert_eq!(limits.check_actual(1e9, -1e9), None);
        assert_eq!(limits.check_target(-1e9), None);
    }

    #[test]
    fn position_bounds() {
        let limits = Limits::position(-10.0, 360.0);
        assert_eq!(limits.check_actual(0.0, 0.0), None);
        assert_eq!(limits.check_actual(360.0, 0.0), None);
        assert_eq!(
            limits.check_actual(360.5, 0.0),
            Some((ErrorCode::MaxActualPositionExceeded, 360.5))
        );
        assert_eq!(
            limits.check_actual(-11.0, 0.0),
            Some((ErrorCode::MinActualPositionExceeded, -11.0))
        );
        assert_eq!(
            limits.check_target(400.0),
            Some((ErrorCode::MaxTargetPositionExceeded, 400.0))
        );
        assert_eq!(
            limits.check_target(-20.0),
            Some((ErrorCode::MinTargetPositionExceeded, -20.0))
        );
    }

    #[test]
    fn torque_bound_is_symmetric() {
        let limits = Limits::default().with_max_torque(30.0);
        assert_eq!(limits.check_actual(0.0, 29.0), None);
        assert_eq!(limits.check_actual(0.0, -31.0), Some((ErrorCode::Control, -31.0)));
    }
}
