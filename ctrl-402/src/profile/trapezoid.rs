use num_traits::{Float, NumCast};

use crate::error::ConfigError;

/// Position ramp with acceleration, constant velocity and deceleration phases.
///
/// Short moves that cannot reach `max_velocity` degrade to a triangle with a
/// reduced peak velocity. Times are in seconds, rates in position units per
/// second (squared).
#[derive(Debug, Clone, PartialEq)]
pub struct TrapezoidalRamp<F> {
    start: F,
    target: F,
    direction: F,
    distance: F,
    acceleration: F,
    deceleration: F,
    peak_velocity: F,
    t_accel: F,
    t_const: F,
    t_decel: F,
    cycle_period: F,
    steps: usize,
}

impl<F: Float> TrapezoidalRamp<F> {
    pub fn new(
        start: F,
        target: F,
        max_velocity: F,
        acceleration: F,
        deceleration: F,
        cycle_period: F,
    ) -> Result<Self, ConfigError> {
        let max_velocity = ConfigError::check_positive("max velocity", max_velocity)?;
        let acceleration = ConfigError::check_positive("acceleration", acceleration)?;
        let deceleration = ConfigError::check_positive("deceleration", deceleration)?;
        let cycle_period = ConfigError::check_positive("cycle period", cycle_period)?;
        if !start.is_finite() || !target.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "position",
                value: (target - start).to_f64().unwrap_or(f64::NAN),
            });
        }

        let two = F::one() + F::one();
        let delta = target - start;
        let distance = delta.abs();
        let direction = if delta < F::zero() { -F::one() } else { F::one() };

        let ramp_distance =
            max_velocity * max_velocity / (two * acceleration) + max_velocity * max_velocity / (two * deceleration);
        let peak_velocity = if distance >= ramp_distance {
            max_velocity
        } else {
            // triangle: both ramps meet before max velocity is reached
            (two * distance * acceleration * deceleration / (acceleration + deceleration)).sqrt()
        };

        let (t_accel, t_const, t_decel) = if peak_velocity > F::zero() {
            let s_accel = peak_velocity * peak_velocity / (two * acceleration);
            let s_decel = peak_velocity * peak_velocity / (two * deceleration);
            let s_const = (distance - s_accel - s_decel).max(F::zero());
            (
                peak_velocity / acceleration,
                s_const / peak_velocity,
                peak_velocity / deceleration,
            )
        } else {
            (F::zero(), F::zero(), F::zero())
        };

        let total = t_accel + t_const + t_decel;
        let steps = (total / cycle_period)
            .ceil()
            .to_usize()
            .ok_or(ConfigError::TooManySteps)?
            .max(1);

        log::debug!(
            "trapezoid: {} steps, t_a {:?} t_c {:?} t_d {:?}",
            steps,
            t_accel.to_f64(),
            t_const.to_f64(),
            t_decel.to_f64()
        );

        Ok(Self {
            start,
            target,
            direction,
            distance,
            acceleration,
            deceleration,
            peak_velocity,
            t_accel,
            t_const,
            t_decel,
            cycle_period,
            steps,
        })
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

    pub fn peak_velocity(&self) -> F {
        self.peak_velocity
    }

    /// Durations of the acceleration, constant and deceleration phases.
    pub fn phases(&self) -> (F, F, F) {
        (self.t_accel, self.t_const, self.t_decel)
    }

    /// Setpoint after `index + 1` cycles; the last step is exactly the target.
    pub fn generate(&self, index: usize) -> F {
        if index >= self.steps.saturating_sub(1) {
            return self.target;
        }
        let t = <F as NumCast>::from(index + 1).unwrap_or_else(F::infinity) * self.cycle_period;
        let travelled = self.travelled(t).min(self.distance);
        self.start + self.direction * travelled
    }

    fn travelled(&self, t: F) -> F {
        let half = F::one() / (F::one() + F::one());
        let s_accel = half * self.acceleration * self.t_accel * self.t_accel;
        let s_const = self.peak_velocity * self.t_const;

        if t < self.t_accel {
            half * self.acceleration * t * t
        } else if t < self.t_accel + self.t_const {
            s_accel + self.peak_velocity * (t - self.t_accel)
        } else if t < self.t_accel + self.t_const + self.t_decel {
            let tau = t - self.t_accel - self.t_const;
            s_accel + s_const + self.peak_velocity * tau - half * self.deceleration * tau * tau
        } else {
            self.distance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // rpm -> degree per second
    const RPM: f64 = 6.0;

    #[test]
    fn short_move_is_triangular() {
        let ramp = TrapezoidalRamp::new(0.0, 200.0, 350.0 * RPM, 350.0 * RPM, 350.0 * RPM, 0.001).unwrap();
        let (_, t_const, _) = ramp.phases();
        assert!(t_const < 1e-9);
        assert!(ramp.peak_velocity() < 350.0 * RPM);
        assert!(ramp.step_count() > 0);
        assert_eq!(ramp.generate(ramp.step_count() - 1), 200.0);

        let mut last = 0.0;
        for i in 0..ramp.step_count() {
            let p = ramp.generate(i);
            assert!(p >= last, "step {} went back from {} to {}", i, last, p);
            assert!(p <= 200.0);
            last = p;
        }
    }

    #[test]
    fn csp_move_to_200_degrees() {
        let ramp = TrapezoidalRamp::new(0.0, 200.0, 350.0, 350.0, 350.0, 0.001).unwrap();
        assert!(ramp.step_count() > 0);
        assert_eq!(ramp.generate(ramp.step_count() - 1), 200.0);
        let values: Vec<f64> = (0..ramp.step_count()).map(|i| ramp.generate(i)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn long_move_reaches_max_velocity() {
        let ramp = TrapezoidalRamp::new(0.0, 1000.0, 100.0, 200.0, 100.0, 0.01).unwrap();
        let (t_accel, t_const, t_decel) = ramp.phases();
        assert_eq!(ramp.peak_velocity(), 100.0);
        assert!((t_accel - 0.5).abs() < 1e-12);
        assert!((t_decel - 1.0).abs() < 1e-12);
        // 1000 - 25 - 50 at 100/s
        assert!((t_const - 9.25).abs() < 1e-9);
        assert!((1075..=1076).contains(&ramp.step_count()));

        // velocity in the middle of the constant phase
        let v = (ramp.generate(500) - ramp.generate(499)) / 0.01;
        assert!((v - 100.0).abs() < 1e-6);
    }

    #[test]
    fn moves_backwards() {
        let ramp = TrapezoidalRamp::new(50.0_f32, -30.0, 40.0, 80.0, 80.0, 0.005).unwrap();
        let last = ramp.step_count() - 1;
        assert_eq!(ramp.generate(last), -30.0);
        assert!(ramp.generate(0) < 50.0);
        for i in 1..=last {
            assert!(ramp.generate(i) <= ramp.generate(i - 1));
            assert!(ramp.generate(i) >= -30.0);
        }
    }

    #[test]
    fn zero_distance_is_a_single_step() {
        let ramp = TrapezoidalRamp::new(12.0, 12.0, 10.0, 10.0, 10.0, 0.001).unwrap();
        assert_eq!(ramp.step_count(), 1);
        assert_eq!(ramp.generate(0), 12.0);
    }

    #[test]
    fn past_the_end_holds_target() {
        let ramp = TrapezoidalRamp::new(0.0, 1.0, 10.0, 10.0, 10.0, 0.001).unwrap();
        assert_eq!(ramp.generate(ramp.step_count() + 10), 1.0);
        assert_eq!(ramp.generate(usize::MAX), 1.0);
    }

    #[test]
    fn rejects_bad_rates() {
        assert!(matches!(
            TrapezoidalRamp::new(0.0, 1.0, 0.0, 1.0, 1.0, 0.001),
            Err(ConfigError::NonPositive { name: "max velocity", .. })
        ));
        assert!(TrapezoidalRamp::new(0.0, 1.0, 1.0, -1.0, 1.0, 0.001).is_err());
        assert!(TrapezoidalRamp::new(0.0, 1.0, 1.0, 1.0, 0.0, 0.001).is_err());
        assert!(TrapezoidalRamp::new(0.0, 1.0, 1.0, 1.0, 1.0, 0.0).is_err());
        assert!(TrapezoidalRamp::new(0.0, f64::NAN, 1.0, 1.0, 1.0, 0.001).is_err());
    }
}
