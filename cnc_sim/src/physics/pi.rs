//! PI regulator with trapezoidal integration, optional output clamp and
//! integral clamp (anti-windup).
//!
//! Time is absolute simulation time; the regulator derives the step from
//! the previous call. The first call after construction or [`PiRegulator::reset`]
//! only establishes the time baseline and integrates nothing.

/// Proportional-integral controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PiRegulator {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Output upper bound.
    pub max_out: Option<f64>,
    /// Output lower bound.
    pub min_out: Option<f64>,
    /// Integral accumulator bound, applied symmetrically.
    pub wind_up: Option<f64>,
    set_point: f64,
    integral: f64,
    last_error: f64,
    last_time: Option<f64>,
}

impl PiRegulator {
    /// Create a regulator with no limits.
    pub fn new(kp: f64, ki: f64, set_point: f64) -> Self {
        Self {
            kp,
            ki,
            max_out: None,
            min_out: None,
            wind_up: None,
            set_point,
            integral: 0.0,
            last_error: 0.0,
            last_time: None,
        }
    }

    /// Clamp the output to `[min_out, max_out]`.
    pub fn with_output_limits(mut self, min_out: f64, max_out: f64) -> Self {
        self.min_out = Some(min_out);
        self.max_out = Some(max_out);
        self
    }

    /// Clamp the integral accumulator to `±wind_up`.
    pub fn with_wind_up(mut self, wind_up: Option<f64>) -> Self {
        self.wind_up = wind_up;
        self
    }

    /// Current set point.
    #[inline]
    pub fn set_point(&self) -> f64 {
        self.set_point
    }

    /// Change the set point. Integral state is kept.
    #[inline]
    pub fn set_set_point(&mut self, set_point: f64) {
        self.set_point = set_point;
    }

    /// Integral accumulator.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Compute the output for `measured` at simulation time `time`.
    ///
    /// `time` must not decrease between calls.
    pub fn run(&mut self, time: f64, measured: f64) -> f64 {
        let error = self.set_point - measured;
        let dt = self.last_time.map_or(0.0, |last| time - last);

        self.integral += (self.last_error + error) * dt / 2.0;
        if let Some(limit) = self.wind_up {
            self.integral = self.integral.clamp(-limit.abs(), limit.abs());
        }

        self.last_error = error;
        self.last_time = Some(time);

        let out = self.kp * error + self.ki * self.integral;
        match (self.min_out, self.max_out) {
            (_, Some(max)) if out > max => max,
            (Some(min), _) if out < min => min,
            _ => out,
        }
    }

    /// Zero the integral and the remembered error, and drop the time baseline.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.last_time = None;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.05;

    #[test]
    fn pure_proportional() {
        let mut pi = PiRegulator::new(4.0, 0.0, 10.0);
        let out = pi.run(0.0, 7.5);
        assert!((out - 10.0).abs() < 1e-12);
    }

    #[test]
    fn first_call_only_sets_baseline() {
        let mut pi = PiRegulator::new(0.0, 1.0, 1.0);
        pi.run(100.0, 0.0);
        assert_eq!(pi.integral(), 0.0);
        pi.run(100.0 + DT, 0.0);
        assert!((pi.integral() - DT).abs() < 1e-12);
    }

    #[test]
    fn integral_uses_trapezoidal_rule() {
        let mut pi = PiRegulator::new(0.0, 1.0, 0.0);
        pi.run(0.0, 0.0); // error 0
        pi.run(1.0, -2.0); // error 2: area (0 + 2) / 2 * 1
        assert!((pi.integral() - 1.0).abs() < 1e-12);
        pi.run(3.0, -2.0); // area (2 + 2) / 2 * 2
        assert!((pi.integral() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn wind_up_bounds_integral_both_ways() {
        let mut pi = PiRegulator::new(1.0, 1.0, 100.0).with_wind_up(Some(3.0));
        for i in 0..1000 {
            pi.run(i as f64 * DT, 0.0);
            assert!(pi.integral().abs() <= 3.0);
        }
        assert!((pi.integral() - 3.0).abs() < 1e-12);

        pi.set_set_point(-100.0);
        for i in 1000..3000 {
            pi.run(i as f64 * DT, 0.0);
            assert!(pi.integral().abs() <= 3.0);
        }
        assert!((pi.integral() + 3.0).abs() < 1e-12);
    }

    #[test]
    fn output_stays_within_limits() {
        let mut pi = PiRegulator::new(20.0, 2.0, 0.0)
            .with_output_limits(0.0, 240.0)
            .with_wind_up(Some(30.0));
        let mut measured: f64 = 25.0;
        for i in 0..2000 {
            let t = i as f64 * DT;
            pi.set_set_point(if i < 1000 { 500.0 } else { 0.0 });
            let out = pi.run(t, measured);
            assert!((0.0..=240.0).contains(&out), "out of range: {out}");
            measured += (out - 10.0) * 0.01;
        }
    }

    #[test]
    fn reset_clears_state() {
        let mut pi = PiRegulator::new(1.0, 1.0, 5.0);
        for i in 0..10 {
            pi.run(i as f64, 0.0);
        }
        assert!(pi.integral() > 0.0);
        pi.reset();
        assert_eq!(pi.integral(), 0.0);
        // Baseline dropped: the next call integrates nothing.
        pi.run(50.0, 0.0);
        assert_eq!(pi.integral(), 0.0);
    }
}
