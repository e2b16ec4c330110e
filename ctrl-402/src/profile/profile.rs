use num_traits::Float;

use super::{linear::LinearRamp, trapezoid::TrapezoidalRamp};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub enum Ramp<F> {
    Trapezoidal(TrapezoidalRamp<F>),
    Linear(LinearRamp<F>),
}

/// A ramp plus the index of the next step to stream.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProfile<F = f64> {
    ramp: Ramp<F>,
    index: usize,
}

impl<F: Float> MotionProfile<F> {
    pub fn trapezoidal(
        start: F,
        target: F,
        max_velocity: F,
        acceleration: F,
        deceleration: F,
        cycle_period: F,
    ) -> Result<Self, ConfigError> {
        TrapezoidalRamp::new(start, target, max_velocity, acceleration, deceleration, cycle_period)
            .map(|ramp| Self::from(Ramp::Trapezoidal(ramp)))
    }

    pub fn linear(start: F, target: F, slope: F, cycle_period: F) -> Result<Self, ConfigError> {
        LinearRamp::new(start, target, slope, cycle_period).map(|ramp| Self::from(Ramp::Linear(ramp)))
    }

    pub fn ramp(&self) -> &Ramp<F> {
        &self.ramp
    }

    pub fn step_count(&self) -> usize {
        match &self.ramp {
            Ramp::Trapezoidal(ramp) => ramp.step_count(),
            Ramp::Linear(ramp) => ramp.step_count(),
        }
    }

    pub fn target(&self) -> F {
        match &self.ramp {
            Ramp::Trapezoidal(ramp) => ramp.target(),
            Ramp::Linear(ramp) => ramp.target(),
        }
    }

    pub fn generate(&self, index: usize) -> F {
        match &self.ramp {
            Ramp::Trapezoidal(ramp) => ramp.generate(index),
            Ramp::Linear(ramp) => ramp.generate(index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.step_count()
    }

    /// Next setpoint, `None` once every step has been handed out.
    pub fn next_setpoint(&mut self) -> Option<F> {
        if self.is_finished() {
            return None;
        }
        let value = self.generate(self.index);
        self.index += 1;
        Some(value)
    }
}

impl<F> From<Ramp<F>> for MotionProfile<F> {
    fn from(ramp: Ramp<F>) -> Self {
        Self { ramp, index: 0 }
    }
}
