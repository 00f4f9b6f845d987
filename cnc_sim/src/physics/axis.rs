//! Single-axis motion simulator.
//!
//! `SingleAxis` plans a symmetric trapezoidal velocity profile towards a
//! target and integrates it against absolute simulation time:
//!
//! ```text
//!  speed
//!    │      ┌──────────────┐
//!    │     /                \
//!    │    /                  \
//!    └───┴────┴──────────┴────┴──▶ t
//!        0  acc_time  dec_time  movement_time
//! ```
//!
//! Moves too short to reach the requested speed fall back to a triangular
//! profile whose peak is the speed reachable at half the trip.
//!
//! Motion control works in virtual coordinates (physical + offset). Homing
//! and coordinate offsets change the offset, never the physical position.

use cnc_common::machine::AxisConfig;
use tracing::{debug, trace, warn};

const REL_TOL: f64 = 1e-9;
const ABS_TOL: f64 = 1e-12;

/// Tolerance comparison used for position arrival.
#[inline]
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= (REL_TOL * a.abs().max(b.abs())).max(ABS_TOL)
}

/// Motion phase derived from the time elapsed since the move started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    /// Constant acceleration at `max_acc`.
    Accelerating,
    /// Constant speed.
    Cruising,
    /// Constant deceleration at `max_acc`.
    Decelerating,
    /// At target, no motion.
    Idle,
}

/// Axis simulator with trapezoidal planning and rigid-body dynamics.
#[derive(Debug, Clone)]
pub struct SingleAxis {
    /// Axis name, used in log output.
    name: &'static str,
    /// Lower travel bound (reported only).
    pub min_pos: f64,
    /// Upper travel bound (reported only).
    pub max_pos: f64,
    /// Speed limit [m/s]. Call [`SingleAxis::recompute_target`] after changing it.
    pub max_speed: f64,
    /// Acceleration limit [m/s²]. Call [`SingleAxis::recompute_target`] after changing it.
    pub max_acc: f64,
    /// Moving mass [kg].
    pub mass: f64,
    /// Friction force [N].
    pub friction: f64,

    position: f64,
    speed: f64,
    acc: f64,
    target: f64,
    target_speed: f64,
    /// Speed asked for by the last `set_target`, before limits and short-move reduction.
    requested_speed: Option<f64>,
    offset: f64,
    direction: f64,

    trip: f64,
    acc_trip: f64,
    dec_trip: f64,
    acc_time: f64,
    dec_time: f64,
    movement_time: f64,
    start_pos: f64,
    /// Latched by the first `run` after planning.
    start_time: Option<f64>,

    thrust: f64,
    power: f64,
}

impl SingleAxis {
    /// Create an axis at physical zero.
    pub fn new(name: &'static str, config: &AxisConfig) -> Self {
        Self {
            name,
            min_pos: config.min_pos,
            max_pos: config.max_pos,
            max_speed: config.max_speed,
            max_acc: config.max_acc,
            mass: config.mass,
            friction: config.friction,
            position: 0.0,
            speed: 0.0,
            acc: 0.0,
            target: 0.0,
            target_speed: 0.0,
            requested_speed: None,
            offset: 0.0,
            direction: 1.0,
            trip: 0.0,
            acc_trip: 0.0,
            dec_trip: 0.0,
            acc_time: 0.0,
            dec_time: 0.0,
            movement_time: 0.0,
            start_pos: 0.0,
            start_time: None,
            thrust: 0.0,
            power: 0.0,
        }
    }

    // ── Coordinates ─────────────────────────────────────────────────

    /// Physical position [m].
    #[inline]
    pub fn physical_position(&self) -> f64 {
        self.position
    }

    /// Position seen by motion control [m].
    #[inline]
    pub fn virtual_position(&self) -> f64 {
        self.physical_to_virtual(self.position)
    }

    /// Physical target [m].
    #[inline]
    pub fn physical_target(&self) -> f64 {
        self.target
    }

    /// Target seen by motion control [m].
    #[inline]
    pub fn virtual_target(&self) -> f64 {
        self.physical_to_virtual(self.target)
    }

    /// Current virtual-minus-physical offset [m].
    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Declare the current position to be `virtual_position` without moving.
    pub fn set_offset(&mut self, virtual_position: f64) {
        self.offset = virtual_position - self.position;
        debug!("Axis {}: offset set to {:.6}", self.name, self.offset);
    }

    /// Make virtual and physical coordinates coincide again.
    pub fn clear_offset(&mut self) {
        self.offset = 0.0;
    }

    /// Convert a virtual coordinate to physical.
    #[inline]
    pub fn virtual_to_physical(&self, value: f64) -> f64 {
        value - self.offset
    }

    /// Convert a physical coordinate to virtual.
    #[inline]
    pub fn physical_to_virtual(&self, value: f64) -> f64 {
        value + self.offset
    }

    // ── Planning ────────────────────────────────────────────────────

    /// Plan a move to `virtual_target`.
    ///
    /// `target_speed` defaults to, and is capped at, `max_speed`. A move of
    /// zero length, or one that cannot be planned, leaves the current plan
    /// untouched.
    pub fn set_target(&mut self, virtual_target: f64, target_speed: Option<f64>) {
        let physical = self.virtual_to_physical(virtual_target);
        self.plan(physical, target_speed);
    }

    /// Re-plan the last target with the current limits, starting from the
    /// current position. Used after `max_speed` or `max_acc` change.
    pub fn recompute_target(&mut self) {
        self.plan(self.target, self.requested_speed);
    }

    fn plan(&mut self, target: f64, requested: Option<f64>) {
        let mut speed = requested.unwrap_or(self.max_speed).min(self.max_speed);

        let trip = (target - self.position).abs();
        if trip == 0.0 {
            return;
        }
        if !(speed > 0.0 && self.max_acc > 0.0) {
            warn!(
                "Axis {}: cannot plan move at speed {} with max_acc {}",
                self.name, speed, self.max_acc
            );
            return;
        }

        self.direction = if target >= self.position { 1.0 } else { -1.0 };

        let mut acc_time = speed / self.max_acc;
        let mut acc_trip = 0.5 * self.max_acc * acc_time * acc_time;

        // Not enough room to reach `speed` and stop again: peak at half trip.
        // With v = sqrt(max_acc * trip) the ramp covers exactly trip / 2, so
        // this correction never needs to be applied twice.
        if 2.0 * acc_trip > trip && !approx_eq(2.0 * acc_trip, trip) {
            acc_time = (trip / self.max_acc).sqrt();
            speed = self.max_acc * acc_time;
            acc_trip = trip / 2.0;
        }

        let cruise_trip = (trip - 2.0 * acc_trip).max(0.0);
        let cruise_time = cruise_trip / speed;

        self.trip = trip;
        self.target = target;
        self.target_speed = speed;
        self.requested_speed = requested;
        self.start_pos = self.position;
        self.acc_time = acc_time;
        self.acc_trip = acc_trip;
        self.dec_time = acc_time + cruise_time;
        self.dec_trip = acc_trip + cruise_trip;
        self.movement_time = 2.0 * acc_time + cruise_time;
        self.start_time = None;

        debug!(
            "Axis {}: planned {:.6} -> {:.6} (trip {:.6}, v {:.6}, t {:.4}s)",
            self.name, self.start_pos, self.target, self.trip, speed, self.movement_time
        );
    }

    // ── Integration ─────────────────────────────────────────────────

    /// Advance the axis to simulation time `time`.
    pub fn run(&mut self, time: f64) {
        if self.is_moving() {
            let start = *self.start_time.get_or_insert(time);
            let t = time - start;
            let dir = self.direction;

            match self.phase_at(t) {
                MotionPhase::Accelerating => {
                    self.position = self.start_pos + dir * 0.5 * self.max_acc * t * t;
                    self.speed = dir * self.max_acc * t;
                    self.acc = dir * self.max_acc;
                }
                MotionPhase::Cruising => {
                    let tc = t - self.acc_time;
                    self.position = self.start_pos + dir * (self.acc_trip + self.target_speed * tc);
                    self.speed = dir * self.target_speed;
                    self.acc = 0.0;
                }
                MotionPhase::Decelerating => {
                    let td = t - self.dec_time;
                    self.position = self.start_pos
                        + dir * (self.dec_trip + self.target_speed * td - 0.5 * self.max_acc * td * td);
                    self.speed = dir * (self.target_speed - self.max_acc * td);
                    self.acc = -dir * self.max_acc;
                }
                MotionPhase::Idle => self.arrive(),
            }
        } else {
            self.arrive();
        }

        self.compute_dynamics();

        trace!(
            "Axis {}: t={:.3} pos={:.6} v={:.6} a={:.4} P={:.3}",
            self.name, time, self.position, self.speed, self.acc, self.power
        );
    }

    fn phase_at(&self, t: f64) -> MotionPhase {
        if t < self.acc_time {
            MotionPhase::Accelerating
        } else if t < self.dec_time {
            MotionPhase::Cruising
        } else if t < self.movement_time {
            MotionPhase::Decelerating
        } else {
            MotionPhase::Idle
        }
    }

    fn arrive(&mut self) {
        self.position = self.target;
        self.speed = 0.0;
        self.acc = 0.0;
        self.start_time = None;
    }

    fn compute_dynamics(&mut self) {
        self.thrust = -self.acc * self.mass;
        self.power = (self.acc * self.mass + self.friction * self.direction) * self.speed;
    }

    // ── State ───────────────────────────────────────────────────────

    /// Target not yet reached.
    #[inline]
    pub fn is_moving(&self) -> bool {
        !approx_eq(self.target, self.position)
    }

    /// Phase of the current move at simulation time `time`.
    pub fn phase(&self, time: f64) -> MotionPhase {
        match self.start_time {
            Some(start) if self.is_moving() => self.phase_at(time - start),
            None if self.is_moving() => MotionPhase::Accelerating,
            _ => MotionPhase::Idle,
        }
    }

    /// Axis name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signed speed [m/s].
    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Signed acceleration [m/s²].
    #[inline]
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// Cruise speed of the current plan [m/s].
    #[inline]
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    /// Reaction force on the frame [N].
    #[inline]
    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    /// Mechanical power [W]; negative while braking.
    #[inline]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Length of the last planned move [m].
    pub fn trip(&self) -> f64 {
        self.trip
    }

    /// End of the acceleration phase, relative to move start [s].
    pub fn acc_time(&self) -> f64 {
        self.acc_time
    }

    /// Start of the deceleration phase, relative to move start [s].
    pub fn dec_time(&self) -> f64 {
        self.dec_time
    }

    /// Total duration of the current plan [s].
    pub fn movement_time(&self) -> f64 {
        self.movement_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.001;

    fn axis(max_speed: f64, max_acc: f64) -> SingleAxis {
        SingleAxis::new(
            "test",
            &AxisConfig {
                min_pos: 0.0,
                max_pos: 1.0,
                max_speed,
                max_acc,
                mass: 0.5,
                friction: 15.0,
            },
        )
    }

    /// Run from `t0` until `t_end`, returning the peak |speed| and |acc|.
    fn run_until(axis: &mut SingleAxis, t0: f64, t_end: f64) -> (f64, f64) {
        let mut peak = (0.0_f64, 0.0_f64);
        let steps = ((t_end - t0) / DT).ceil() as usize;
        for i in 0..=steps {
            axis.run(t0 + i as f64 * DT);
            peak.0 = peak.0.max(axis.speed().abs());
            peak.1 = peak.1.max(axis.acc().abs());
        }
        peak
    }

    #[test]
    fn trapezoid_reaches_target_and_stops() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);

        assert!((ax.acc_time() - 0.1).abs() < 1e-12);
        assert!((ax.movement_time() - 0.6).abs() < 1e-12);

        let end = ax.movement_time();
        let (peak_speed, peak_acc) = run_until(&mut ax, 0.0, end + 0.01);

        assert!(approx_eq(ax.physical_position(), 0.05));
        assert_eq!(ax.speed(), 0.0);
        assert_eq!(ax.acc(), 0.0);
        assert!(!ax.is_moving());
        assert!(peak_speed <= 0.1 + 1e-12);
        assert!(peak_acc <= 1.0 + 1e-12);
    }

    #[test]
    fn phases_follow_elapsed_time() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);
        ax.run(10.0); // latches start time
        assert_eq!(ax.phase(10.05), MotionPhase::Accelerating);
        assert_eq!(ax.phase(10.3), MotionPhase::Cruising);
        assert_eq!(ax.phase(10.55), MotionPhase::Decelerating);
        assert_eq!(ax.phase(10.7), MotionPhase::Idle);

        ax.run(10.3);
        assert!((ax.speed() - 0.1).abs() < 1e-12);
        assert_eq!(ax.acc(), 0.0);
        ax.run(10.55);
        assert!(ax.acc() < 0.0);
        assert!(ax.power() < ax.friction * ax.speed());
    }

    #[test]
    fn short_move_uses_triangular_profile() {
        let mut ax = axis(0.1, 1.0);
        // 2 * accel distance at 0.1 m/s is 0.01 m; this trip is shorter.
        ax.set_target(0.004, Some(0.1));

        let expected_peak = (1.0_f64 * 0.004).sqrt();
        assert!((ax.target_speed() - expected_peak).abs() < 1e-12);
        assert!(ax.target_speed() < 0.1);
        assert!((ax.acc_time() - ax.dec_time()).abs() < 1e-12);

        let end = ax.movement_time();
        let mut max_pos: f64 = 0.0;
        let steps = (end / DT).ceil() as usize + 5;
        for i in 0..=steps {
            ax.run(i as f64 * DT);
            max_pos = max_pos.max(ax.physical_position());
            assert!(ax.speed().abs() <= expected_peak + 1e-12);
        }
        assert!(max_pos <= 0.004 + 1e-12, "overshoot: {max_pos}");
        assert!(approx_eq(ax.physical_position(), 0.004));
    }

    #[test]
    fn exact_fit_keeps_requested_speed() {
        let mut ax = axis(0.01, 0.05);
        // Ramp at 0.01 m/s covers 0.001 m, twice that is the whole trip.
        ax.set_target(0.002, Some(0.01));
        assert!((ax.target_speed() - 0.01).abs() < 1e-12);
        assert!((ax.dec_time() - ax.acc_time()).abs() < 1e-9);
    }

    #[test]
    fn negative_direction_and_regenerative_power() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);
        run_until(&mut ax, 0.0, 1.0);

        ax.set_target(0.0, None);
        ax.run(2.0);
        ax.run(2.05);
        assert!(ax.speed() < 0.0);
        assert!(ax.acc() < 0.0);
        assert!(ax.thrust() > 0.0);

        ax.run(2.55);
        // Braking: acceleration opposes motion.
        assert!(ax.acc() > 0.0);
        run_until(&mut ax, 2.55, 3.0);
        assert!(approx_eq(ax.physical_position(), 0.0));
    }

    #[test]
    fn speed_is_capped_at_max_speed() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.5, Some(3.0));
        assert_eq!(ax.target_speed(), 0.1);
    }

    #[test]
    fn zero_trip_keeps_current_plan() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);
        ax.run(0.0);
        ax.run(0.2);
        let pos = ax.physical_position();

        ax.set_target(pos, None);
        assert!(approx_eq(ax.trip(), 0.05));
        assert!(approx_eq(ax.physical_target(), 0.05));
        run_until(&mut ax, 0.2, 1.0);
        assert!(approx_eq(ax.physical_position(), 0.05));
    }

    #[test]
    fn unplannable_move_keeps_previous_plan() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);
        let movement_time = ax.movement_time();

        ax.set_target(0.08, Some(0.0));
        assert!(approx_eq(ax.trip(), 0.05));
        assert!(approx_eq(ax.physical_target(), 0.05));
        assert_eq!(ax.movement_time(), movement_time);

        ax.max_acc = 0.0;
        ax.set_target(0.08, None);
        assert!(approx_eq(ax.trip(), 0.05));
        assert!(approx_eq(ax.physical_target(), 0.05));
    }

    #[test]
    fn start_time_latches_on_first_run() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.05, None);
        ax.set_target(0.05, None);
        ax.run(42.0);
        assert_eq!(ax.physical_position(), 0.0);
        ax.run(42.05);
        assert!((ax.physical_position() - 0.5 * 1.0 * 0.05 * 0.05).abs() < 1e-12);
    }

    #[test]
    fn recompute_target_replans_without_position_jump() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.1, None);
        run_until(&mut ax, 0.0, 0.4);
        let before = ax.physical_position();
        assert!(ax.is_moving());

        ax.max_speed = 0.02;
        ax.max_acc = 0.2;
        ax.recompute_target();
        ax.run(0.4 + DT / 2.0);
        assert!((ax.physical_position() - before).abs() < 1e-12);

        let end = 0.4 + ax.movement_time() + 0.01;
        let (peak_speed, peak_acc) = run_until(&mut ax, 0.401, end);
        assert!(peak_speed <= 0.02 + 1e-12);
        assert!(peak_acc <= 0.2 + 1e-12);
        assert!(approx_eq(ax.physical_position(), 0.1));
    }

    #[test]
    fn offset_maps_virtual_coordinates() {
        let mut ax = axis(0.1, 1.0);
        ax.set_target(0.02, None);
        run_until(&mut ax, 0.0, 1.0);

        ax.set_offset(0.0);
        assert!(approx_eq(ax.virtual_position(), 0.0));
        assert!(approx_eq(ax.physical_position(), 0.02));

        ax.set_target(0.01, None);
        assert!(approx_eq(ax.physical_target(), 0.03));
        assert!(approx_eq(ax.virtual_target(), 0.01));

        run_until(&mut ax, 1.0, 2.0);
        ax.clear_offset();
        assert!(approx_eq(ax.virtual_position(), 0.03));
    }
}
