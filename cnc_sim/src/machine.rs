//! Machine state: four axes, two heaters and the G-code bookkeeping.
//!
//! `CncMachine` is plain synchronous state. Everything that waits (blocking
//! moves, homing, heat-up, pause) lives in [`crate::executor`], which holds
//! the machine behind a lock and only takes it for short, non-awaiting
//! sections.
//!
//! # Coordinated moves
//!
//! For a move with feed `F`, the path length `s` is the Euclidean XYZ
//! distance (or the E distance for extruder-only moves) and the nominal
//! duration `t = s / F`. Each axis needs `r_i = s_i / t / max_speed_i` of its
//! own speed limit; when any `r_i` exceeds 1, every axis is slowed by the
//! largest one so they stay in step.
//!
//! Each axis still ramps at its own `max_acc`. Axis `i` needs
//! `s_i / v_i + v_i / max_acc_i`, where the first term is the same for all
//! axes, so every axis starts decelerating at the same instant and arrival
//! times differ by at most the spread of the ramp times `v_i / max_acc_i`.
//! Axes already at their target (within the arrival tolerance) are not
//! re-planned.

use crate::error::{SimError, SimResult};
use crate::gcode::AxisWords;
use crate::physics::axis::approx_eq;
use crate::physics::{HeatingBody, SingleAxis};
use cnc_common::consts::MM_PER_M;
use cnc_common::machine::MachineConfig;
use cnc_common::types::{
    AxisId, AxisSnapshot, HeaterId, HeaterSnapshot, MachineSnapshot, MachineStatus,
};
use tracing::{debug, info, warn};

/// Per-axis virtual targets of one move [m].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveTarget {
    /// X target.
    pub x: Option<f64>,
    /// Y target.
    pub y: Option<f64>,
    /// Z target.
    pub z: Option<f64>,
    /// Extruder target.
    pub e: Option<f64>,
}

impl MoveTarget {
    /// Move of a single axis.
    pub fn single(axis: AxisId, value: f64) -> Self {
        let mut target = Self::default();
        *target.slot(axis) = Some(value);
        target
    }

    /// Convert G-code words (mm) to metres.
    pub fn from_mm(words: &AxisWords) -> Self {
        let mut target = Self::default();
        for id in AxisId::ALL {
            *target.slot(id) = words.get(id).map(|mm| mm / MM_PER_M);
        }
        target
    }

    /// Target of `axis`, if requested.
    pub fn get(&self, axis: AxisId) -> Option<f64> {
        match axis {
            AxisId::X => self.x,
            AxisId::Y => self.y,
            AxisId::Z => self.z,
            AxisId::E => self.e,
        }
    }

    fn slot(&mut self, axis: AxisId) -> &mut Option<f64> {
        match axis {
            AxisId::X => &mut self.x,
            AxisId::Y => &mut self.y,
            AxisId::Z => &mut self.z,
            AxisId::E => &mut self.e,
        }
    }

    fn has_cartesian(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }
}

/// Simulated machine.
#[derive(Debug, Clone)]
pub struct CncMachine {
    axes: [SingleAxis; 4],
    nozzle: HeatingBody,
    plate: HeatingBody,

    feedrate_override: f64,
    default_speed: f64,
    homed: bool,
    time: f64,

    status: MachineStatus,
    pause_requested: bool,
    abort_requested: bool,
    current_file: Option<String>,
    current_line: Option<String>,
    progress: u8,
}

impl CncMachine {
    /// Build the machine at rest, all axes at physical zero, heaters off.
    pub fn new(config: &MachineConfig) -> Self {
        let axis = |id: AxisId, name| SingleAxis::new(name, config.axis(id));
        Self {
            axes: [
                axis(AxisId::X, "X"),
                axis(AxisId::Y, "Y"),
                axis(AxisId::Z, "Z"),
                axis(AxisId::E, "E"),
            ],
            nozzle: HeatingBody::new("nozzle", config.env_temp, &config.nozzle),
            plate: HeatingBody::new("plate", config.env_temp, &config.plate),
            feedrate_override: 1.0,
            default_speed: config.default_speed,
            homed: false,
            time: 0.0,
            status: MachineStatus::Idle,
            pause_requested: false,
            abort_requested: false,
            current_file: None,
            current_line: None,
            progress: 0,
        }
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Advance every axis and heater to simulation time `time`.
    pub fn run(&mut self, time: f64) {
        for axis in &mut self.axes {
            axis.run(time);
        }
        self.nozzle.run(time);
        self.plate.run(time);
        self.time = time;
    }

    /// Simulation time of the last tick [s].
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    // ─── Motion ─────────────────────────────────────────────────────

    /// Plan a coordinated move. Returns `false` when nothing was planned.
    ///
    /// An explicit `speed` [m/s] becomes the new default speed; without one
    /// the default is reused. The feedrate override scales the result.
    pub fn set_target(&mut self, target: MoveTarget, speed: Option<f64>) -> bool {
        if let Some(speed) = speed {
            if !(speed.is_finite() && speed > 0.0) {
                warn!("Ignoring move with non-positive feed {}", speed);
                return false;
            }
            self.default_speed = speed;
        }
        let speed = self.default_speed * self.feedrate_override;

        let dist = |id: AxisId| {
            target.get(id).map_or(0.0, |v| {
                let current = self.axes[id.index()].virtual_position();
                if approx_eq(v, current) {
                    0.0
                } else {
                    (v - current).abs()
                }
            })
        };
        let distances = AxisId::ALL.map(dist);

        let s = if target.has_cartesian() {
            AxisId::CARTESIAN
                .iter()
                .map(|id| distances[id.index()].powi(2))
                .sum::<f64>()
                .sqrt()
        } else if target.e.is_some() {
            distances[AxisId::E.index()]
        } else {
            return false;
        };
        if s == 0.0 {
            return false;
        }

        let t = s / speed;
        let fractions =
            AxisId::ALL.map(|id| distances[id.index()] / t / self.axes[id.index()].max_speed);
        // Keep the nominal feed while every axis is within its own limit.
        let rate = fractions.iter().copied().fold(1.0, f64::max);

        for id in AxisId::ALL {
            let Some(value) = target.get(id) else {
                continue;
            };
            // Already there: nothing to plan for this axis.
            if distances[id.index()] == 0.0 {
                continue;
            }
            let axis = &mut self.axes[id.index()];
            let axis_speed = fractions[id.index()] * axis.max_speed / rate;
            axis.set_target(value, Some(axis_speed));
        }
        debug!(
            "Move {:?} at {:.5} m/s (path {:.6} m, rate {:.3})",
            target, speed, s, rate
        );
        true
    }

    /// Declare the current position of the requested axes (G92).
    pub fn apply_offset(&mut self, target: MoveTarget) {
        for id in AxisId::ALL {
            if let Some(value) = target.get(id) {
                self.axes[id.index()].set_offset(value);
            }
        }
    }

    /// Any axis still travelling.
    pub fn is_moving(&self) -> bool {
        self.axes.iter().any(SingleAxis::is_moving)
    }

    /// One axis.
    #[inline]
    pub fn axis(&self, id: AxisId) -> &SingleAxis {
        &self.axes[id.index()]
    }

    /// One axis, mutably.
    #[inline]
    pub fn axis_mut(&mut self, id: AxisId) -> &mut SingleAxis {
        &mut self.axes[id.index()]
    }

    /// Virtual X, Y, Z, E positions [m].
    pub fn positions(&self) -> [f64; 4] {
        AxisId::ALL.map(|id| self.axes[id.index()].virtual_position())
    }

    /// Feed used by moves without an explicit speed [m/s].
    #[inline]
    pub fn default_speed(&self) -> f64 {
        self.default_speed
    }

    /// Restore a remembered default speed.
    pub fn set_default_speed(&mut self, speed: f64) {
        self.default_speed = speed;
    }

    /// A full homing cycle has completed.
    #[inline]
    pub fn homed(&self) -> bool {
        self.homed
    }

    pub(crate) fn set_homed(&mut self, homed: bool) {
        self.homed = homed;
    }

    // ─── Heaters ────────────────────────────────────────────────────

    /// One heater.
    pub fn heater(&self, id: HeaterId) -> &HeatingBody {
        match id {
            HeaterId::Nozzle => &self.nozzle,
            HeaterId::Plate => &self.plate,
        }
    }

    /// One heater, mutably.
    pub fn heater_mut(&mut self, id: HeaterId) -> &mut HeatingBody {
        match id {
            HeaterId::Nozzle => &mut self.nozzle,
            HeaterId::Plate => &mut self.plate,
        }
    }

    /// Nozzle and plate temperatures [°C].
    pub fn temperatures(&self) -> (f64, f64) {
        (self.nozzle.temperature(), self.plate.temperature())
    }

    // ─── G-code state ───────────────────────────────────────────────

    /// Execution status.
    #[inline]
    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: MachineStatus) {
        if self.status != status {
            debug!("Status {} -> {}", self.status, status);
            self.status = status;
        }
    }

    /// Request a pause after the current line. Only while working.
    pub fn pause(&mut self) -> bool {
        if self.status != MachineStatus::Working {
            debug!("Pause ignored in status {}", self.status);
            return false;
        }
        self.pause_requested = true;
        info!("Pause requested");
        true
    }

    /// Clear a pause. Only while paused.
    pub fn resume(&mut self) -> bool {
        if self.status != MachineStatus::Paused {
            debug!("Resume ignored in status {}", self.status);
            return false;
        }
        self.pause_requested = false;
        info!("Resume requested");
        true
    }

    /// Request an abort after the current line. Only while working.
    pub fn abort(&mut self) -> bool {
        if self.status != MachineStatus::Working {
            debug!("Abort ignored in status {}", self.status);
            return false;
        }
        self.abort_requested = true;
        info!("Abort requested");
        true
    }

    /// A pause is pending or active.
    #[inline]
    pub fn pause_requested(&self) -> bool {
        self.pause_requested
    }

    /// Consume a pending abort.
    pub(crate) fn take_abort(&mut self) -> bool {
        std::mem::take(&mut self.abort_requested)
    }

    pub(crate) fn begin_file(&mut self, name: String) {
        self.current_file = Some(name);
        self.progress = 0;
        self.pause_requested = false;
        self.abort_requested = false;
        self.set_status(MachineStatus::Working);
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    pub(crate) fn finish_file(&mut self) {
        self.progress = 100;
        self.pause_requested = false;
        self.current_file = None;
        self.set_status(MachineStatus::Idle);
    }

    pub(crate) fn set_current_line(&mut self, line: Option<String>) {
        self.current_line = line;
    }

    /// File progress, 0-100.
    #[inline]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Stem of the file being executed.
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// Line being executed.
    pub fn current_line(&self) -> Option<&str> {
        self.current_line.as_deref()
    }

    // ─── Settings ───────────────────────────────────────────────────

    /// Global feed multiplier.
    #[inline]
    pub fn feedrate_override(&self) -> f64 {
        self.feedrate_override
    }

    /// Change the global feed multiplier. Applies from the next move.
    pub fn set_feedrate_override(&mut self, value: f64) -> SimResult<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(SimError::InvalidFeedrateOverride(value));
        }
        self.feedrate_override = value;
        debug!("Feedrate override set to {:.3}", value);
        Ok(())
    }

    /// Change an axis' speed and acceleration limits and re-plan its move.
    pub fn set_axis_limits(&mut self, id: AxisId, max_speed: f64, max_acc: f64) -> SimResult<()> {
        check_axis_limit(id, "max_speed", max_speed)?;
        check_axis_limit(id, "max_acc", max_acc)?;

        let axis = &mut self.axes[id.index()];
        axis.max_speed = max_speed;
        axis.max_acc = max_acc;
        axis.recompute_target();
        debug!("Axis {}: limits v={} a={}", id, max_speed, max_acc);
        Ok(())
    }

    /// Change a heater's PI gains and integral clamp.
    pub fn set_heater_gains(
        &mut self,
        id: HeaterId,
        kp: f64,
        ki: f64,
        wind_up: Option<f64>,
    ) -> SimResult<()> {
        check_heater_value(id, "kp", kp)?;
        check_heater_value(id, "ki", ki)?;
        if let Some(limit) = wind_up {
            check_heater_value(id, "wind_up", limit)?;
        }

        let control = &mut self.heater_mut(id).control;
        control.kp = kp;
        control.ki = ki;
        control.wind_up = wind_up;
        debug!("Heater {}: kp={} ki={} wind_up={:?}", id, kp, ki, wind_up);
        Ok(())
    }

    /// Change a heater's settle band and residency time.
    pub fn set_heater_settle(&mut self, id: HeaterId, window: f64, time: f64) -> SimResult<()> {
        check_heater_value(id, "settle_window", window)?;
        check_heater_value(id, "settle_time", time)?;

        let heater = self.heater_mut(id);
        heater.settle_window = window;
        heater.settle_time = time;
        Ok(())
    }

    // ─── Reporting ──────────────────────────────────────────────────

    /// Sum of the net powers of all axes and heaters [W].
    pub fn total_power(&self) -> f64 {
        self.axes.iter().map(SingleAxis::power).sum::<f64>() + self.nozzle.power() + self.plate.power()
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            time: self.time,
            axes: AxisId::ALL.map(|id| axis_snapshot(&self.axes[id.index()])),
            nozzle: heater_snapshot(&self.nozzle),
            plate: heater_snapshot(&self.plate),
            status: self.status,
            progress: self.progress,
            current_file: self.current_file.clone(),
            current_line: self.current_line.clone(),
            feedrate_override: self.feedrate_override,
            homed: self.homed,
            total_power: self.total_power(),
        }
    }
}

fn axis_snapshot(axis: &SingleAxis) -> AxisSnapshot {
    AxisSnapshot {
        position: axis.virtual_position(),
        target: axis.virtual_target(),
        speed: axis.speed(),
        acc: axis.acc(),
        target_speed: axis.target_speed(),
        power: axis.power(),
        max_speed: axis.max_speed,
        max_acc: axis.max_acc,
    }
}

fn heater_snapshot(body: &HeatingBody) -> HeaterSnapshot {
    HeaterSnapshot {
        temperature: body.temperature(),
        target: body.set_point_temp(),
        power: body.power(),
        power_in: body.power_in(),
        kp: body.control.kp,
        ki: body.control.ki,
        wind_up: body.control.wind_up,
        settle_window: body.settle_window,
        settle_time: body.settle_time,
        temp_reached: body.temp_reached(),
    }
}

pub(crate) fn check_axis_limit(axis: AxisId, field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidAxisLimit { axis, field, value })
    }
}

fn check_heater_value(heater: HeaterId, field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidHeaterTuning {
            heater,
            field,
            value,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.05;

    fn machine() -> CncMachine {
        CncMachine::new(&MachineConfig::default())
    }

    fn settle(m: &mut CncMachine) {
        let mut t = m.time();
        for _ in 0..100_000 {
            if !m.is_moving() {
                break;
            }
            t += DT;
            m.run(t);
        }
        t += DT;
        m.run(t);
        assert!(!m.is_moving());
    }

    #[test]
    fn slow_move_keeps_nominal_feed() {
        let mut m = machine();
        assert!(m.set_target(MoveTarget::single(AxisId::X, 0.05), Some(0.01)));
        assert!((m.axis(AxisId::X).target_speed() - 0.01).abs() < 1e-12);
        settle(&mut m);
        assert!((m.positions()[0] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn fast_move_scales_all_axes_together() {
        let mut m = machine();
        let target = MoveTarget {
            x: Some(0.1),
            y: Some(0.05),
            ..MoveTarget::default()
        };
        assert!(m.set_target(target, Some(0.2)));

        let vx = m.axis(AxisId::X).target_speed();
        let vy = m.axis(AxisId::Y).target_speed();
        // X is the limiting axis and runs at its own limit.
        assert!((vx - 0.1).abs() < 1e-12);
        assert!((vy / vx - 0.5).abs() < 1e-9);
    }

    #[test]
    fn coordinated_axes_arrive_within_ramp_spread() {
        const STEP: f64 = 0.001;
        let mut m = machine();
        let target = MoveTarget {
            x: Some(0.1),
            y: Some(0.05),
            ..MoveTarget::default()
        };
        assert!(m.set_target(target, Some(0.2)));

        let (x, y) = (m.axis(AxisId::X), m.axis(AxisId::Y));
        // Deceleration starts together; only the ramp lengths differ.
        assert!((x.dec_time() - y.dec_time()).abs() < 1e-9);
        let spread = (x.acc_time() - y.acc_time()).abs();
        assert!((spread - 0.05).abs() < 1e-9);

        let mut arrival: [Option<f64>; 2] = [None, None];
        let mut t = 0.0;
        m.run(t);
        while arrival.iter().any(Option::is_none) && t < 5.0 {
            t += STEP;
            m.run(t);
            for (slot, id) in arrival.iter_mut().zip([AxisId::X, AxisId::Y]) {
                if slot.is_none() && !m.axis(id).is_moving() {
                    *slot = Some(t);
                }
            }
        }
        let tx = arrival[0].expect("X arrives");
        let ty = arrival[1].expect("Y arrives");

        assert!((tx - 1.1).abs() <= 2.0 * STEP, "X arrived at {tx}");
        assert!((ty - 1.05).abs() <= 2.0 * STEP, "Y arrived at {ty}");
        assert!((tx - ty).abs() <= spread + 2.0 * STEP);
        assert!((m.positions()[0] - 0.1).abs() < 1e-9);
        assert!((m.positions()[1] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn axis_already_at_target_is_not_replanned() {
        let mut m = machine();
        m.set_target(MoveTarget::single(AxisId::Y, 0.03), Some(0.05));
        settle(&mut m);
        m.apply_offset(MoveTarget::single(AxisId::Y, 0.007));
        let y_trip = m.axis(AxisId::Y).trip();
        let y_target = m.axis(AxisId::Y).physical_target();

        let target = MoveTarget {
            x: Some(0.02),
            y: Some(0.007),
            ..MoveTarget::default()
        };
        assert!(m.set_target(target, Some(0.05)));
        assert!(m.axis(AxisId::X).is_moving());
        assert!(!m.axis(AxisId::Y).is_moving());
        assert_eq!(m.axis(AxisId::Y).trip(), y_trip);
        assert_eq!(m.axis(AxisId::Y).physical_target(), y_target);
    }

    #[test]
    fn feedrate_override_scales_speed() {
        let mut m = machine();
        m.set_feedrate_override(0.5).expect("valid override");
        m.set_target(MoveTarget::single(AxisId::X, 0.05), Some(0.01));
        assert!((m.axis(AxisId::X).target_speed() - 0.005).abs() < 1e-12);
        // Default speed keeps the unscaled value.
        assert_eq!(m.default_speed(), 0.01);
        assert!(m.set_feedrate_override(0.0).is_err());
        assert!(m.set_feedrate_override(f64::NAN).is_err());
        assert_eq!(m.feedrate_override(), 0.5);
    }

    #[test]
    fn explicit_feed_becomes_default() {
        let mut m = machine();
        m.set_target(MoveTarget::single(AxisId::X, 0.01), Some(0.004));
        assert_eq!(m.default_speed(), 0.004);
        settle(&mut m);

        m.set_target(MoveTarget::single(AxisId::X, 0.02), None);
        assert!((m.axis(AxisId::X).target_speed() - 0.004).abs() < 1e-12);

        // Rejected feed leaves the default alone.
        assert!(!m.set_target(MoveTarget::single(AxisId::X, 0.0), Some(-1.0)));
        assert_eq!(m.default_speed(), 0.004);
    }

    #[test]
    fn extruder_only_and_empty_moves() {
        let mut m = machine();
        assert!(!m.set_target(MoveTarget::default(), Some(0.01)));
        assert!(!m.set_target(MoveTarget::single(AxisId::X, 0.0), Some(0.01)));

        assert!(m.set_target(MoveTarget::single(AxisId::E, 0.005), Some(0.002)));
        assert!((m.axis(AxisId::E).target_speed() - 0.002).abs() < 1e-12);
        settle(&mut m);
        assert!((m.positions()[3] - 0.005).abs() < 1e-9);
    }

    #[test]
    fn offset_shifts_virtual_coordinates() {
        let mut m = machine();
        m.apply_offset(MoveTarget::single(AxisId::Y, 0.01));
        assert!((m.positions()[1] - 0.01).abs() < 1e-12);
        assert_eq!(m.axis(AxisId::Y).physical_position(), 0.0);

        m.set_target(MoveTarget::single(AxisId::Y, 0.02), Some(0.01));
        settle(&mut m);
        assert!((m.axis(AxisId::Y).physical_position() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn flow_control_is_status_gated() {
        let mut m = machine();
        assert!(!m.pause());
        assert!(!m.resume());
        assert!(!m.abort());

        m.begin_file("part".to_string());
        assert_eq!(m.status(), MachineStatus::Working);
        assert!(!m.resume());
        assert!(m.pause());
        assert!(m.pause_requested());

        m.set_status(MachineStatus::Paused);
        assert!(!m.abort());
        assert!(m.resume());
        assert!(!m.pause_requested());

        m.set_status(MachineStatus::Working);
        assert!(m.abort());
        assert!(m.take_abort());
        assert!(!m.take_abort());

        m.finish_file();
        assert_eq!(m.status(), MachineStatus::Idle);
        assert_eq!(m.progress(), 100);
        assert_eq!(m.current_file(), None);
    }

    #[test]
    fn limit_setters_validate_before_applying() {
        let mut m = machine();
        assert!(matches!(
            m.set_axis_limits(AxisId::Z, 0.0, 0.1),
            Err(SimError::InvalidAxisLimit { field: "max_speed", .. })
        ));
        assert!(m.set_axis_limits(AxisId::Z, 0.02, f64::INFINITY).is_err());
        assert_eq!(m.axis(AxisId::Z).max_speed, 0.01);

        m.set_axis_limits(AxisId::Z, 0.02, 0.1).expect("valid limits");
        assert_eq!(m.axis(AxisId::Z).max_speed, 0.02);
        assert_eq!(m.axis(AxisId::Z).max_acc, 0.1);
    }

    #[test]
    fn limit_change_mid_move_replans_without_jump() {
        let mut m = machine();
        m.set_target(MoveTarget::single(AxisId::X, 0.1), Some(0.1));
        let mut t = 0.0;
        for _ in 0..8 {
            t += DT;
            m.run(t);
        }
        let before = m.positions()[0];
        m.set_axis_limits(AxisId::X, 0.02, 1.0).expect("valid limits");
        assert_eq!(m.positions()[0], before);

        t += DT;
        m.run(t);
        assert!(m.positions()[0] >= before);
        assert!(m.axis(AxisId::X).speed() <= 0.02 + 1e-12);
        settle(&mut m);
        assert!((m.positions()[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn heater_setters_and_snapshot() {
        let mut m = machine();
        m.set_heater_gains(HeaterId::Plate, 10.0, 0.5, None)
            .expect("valid gains");
        m.set_heater_settle(HeaterId::Plate, 0.5, 2.0)
            .expect("valid settle");
        assert!(m.set_heater_gains(HeaterId::Nozzle, -1.0, 0.5, None).is_err());
        assert!(m.set_heater_settle(HeaterId::Nozzle, 0.1, f64::NAN).is_err());

        m.heater_mut(HeaterId::Nozzle).set_set_point_temp(200.0);
        m.run(0.0);
        m.run(DT);

        let snap = m.snapshot();
        assert_eq!(snap.plate.kp, 10.0);
        assert_eq!(snap.plate.wind_up, None);
        assert_eq!(snap.plate.settle_time, 2.0);
        assert_eq!(snap.nozzle.kp, 20.0);
        assert_eq!(snap.nozzle.target, 200.0);
        assert!(snap.nozzle.power_in > 0.0);
        assert!(snap.nozzle.temperature > 25.0);
        assert_eq!(snap.time, DT);
        assert_eq!(snap.status_code(), 0);
        assert_eq!(m.temperatures().1, 25.0);
        assert!((snap.total_power - m.total_power()).abs() < 1e-12);
    }
}
