use num_traits::{Float, NumCast};

use crate::error::ConfigError;

/// Constant-slope ramp used for torque and simple velocity setpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRamp<F> {
    start: F,
    target: F,
    steps: usize,
}

impl<F: Float> LinearRamp<F> {
    /// `slope` is in units per second, `cycle_period` in seconds.
    pub fn new(start: F, target: F, slope: F, cycle_period: F) -> Result<Self, ConfigError> {
        let slope = ConfigError::check_positive("slope", slope)?;
        let cycle_period = ConfigError::check_positive("cycle period", cycle_period)?;
        if !start.is_finite() || !target.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "ramp end point",
                value: (target - start).to_f64().unwrap_or(f64::NAN),
            });
        }

        let steps = ((target - start).abs() / (slope * cycle_period))
            .ceil()
            .to_usize()
            .ok_or(ConfigError::TooManySteps)?
            .max(1);

        Ok(Self { start, target, steps })
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn start(&self) -> F {
        self.start
    }

    pub fn target(&self) -> F {
        self.target
    }

    pub fn generate(&self, index: usize) -> F {
        if index >= self.steps.saturating_sub(1) {
            return self.target;
        }
        let done = <F as NumCast>::from(index + 1).unwrap_or_else(F::zero);
        let total = <F as NumCast>::from(self.steps).unwrap_or_else(F::one);
        let value = self.start + (self.target - self.start) * done / total;

        // never overshoot through rounding
        if self.target >= self.start {
            value.min(self.target)
        } else {
            value.max(self.target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torque_ramp_to_25_mnm() {
        let ramp = LinearRamp::new(0.0, 25.0, 10.0, 0.001).unwrap();
        assert!((2500..=2501).contains(&ramp.step_count()));
        assert_eq!(ramp.generate(ramp.step_count() - 1), 25.0);

        let mut last = 0.0;
        for i in 0..ramp.step_count() {
            let value = ramp.generate(i);
            assert!(value <= 25.0);
            assert!(value >= last);
            last = value;
        }
        // 10 mNm/s at 1 ms
        assert!((ramp.generate(0) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn ramps_down() {
        let ramp = LinearRamp::new(25.0_f32, 18.0, 10.0, 0.001).unwrap();
        assert!((700..=701).contains(&ramp.step_count()));
        let last = ramp.step_count() - 1;
        assert_eq!(ramp.generate(last), 18.0);
        assert!(ramp.generate(0) < 25.0);
        for i in 0..=last {
            assert!(ramp.generate(i) >= 18.0);
        }
    }

    #[test]
    fn flat_ramp_is_one_step() {
        let ramp = LinearRamp::new(3.0, 3.0, 1.0, 0.001).unwrap();
        assert_eq!(ramp.step_count(), 1);
        assert_eq!(ramp.generate(0), 3.0);
        assert_eq!(ramp.generate(usize::MAX), 3.0);
    }

    #[test]
    fn any_index_past_the_end_is_the_target() {
        let ramp = LinearRamp::new(0.0, 25.0, 10.0, 0.001).unwrap();
        assert_eq!(ramp.generate(ramp.step_count()), 25.0);
        assert_eq!(ramp.generate(usize::MAX), 25.0);
    }

    #[test]
    fn rejects_bad_slope() {
        assert!(LinearRamp::new(0.0, 1.0, 0.0, 0.001).is_err());
        assert!(LinearRamp::new(0.0, 1.0, -5.0, 0.001).is_err());
        assert!(LinearRamp::new(0.0, 1.0, 5.0, -0.001).is_err());
    }
}
