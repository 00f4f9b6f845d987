//! Cooperative G-code execution.
//!
//! [`MachineHandle`] shares one [`CncMachine`] between the tick loop and at
//! most one execution task. Every wait in here is a poll loop:
//!
//! - check the condition under the lock, release the lock,
//! - return if the condition holds or shutdown was requested,
//! - otherwise sleep one poll interval.
//!
//! The machine lock is never held across an `.await`. Shutdown is the only
//! cancellation path; it leaves axes and heaters wherever they are.

use crate::gcode::{self, GcodeCommand};
use crate::machine::{CncMachine, MoveTarget};
use cnc_common::consts::{HOMING_BACKOFF, HOMING_SETTLE_SPEED, HOMING_SPEED, MM_PER_M, SECS_PER_MIN};
use cnc_common::machine::EngineConfig;
use cnc_common::types::{AxisId, HeaterId, MachineStatus};
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Shared access to the machine plus the shutdown flag.
#[derive(Debug, Clone)]
pub struct MachineHandle {
    machine: Arc<Mutex<CncMachine>>,
    shutdown: Arc<AtomicBool>,
    resumed: Arc<Notify>,
    poll_interval: Duration,
    pause_poll: Duration,
}

impl MachineHandle {
    /// Wrap `machine` with the wait intervals from `config`.
    pub fn new(machine: CncMachine, config: &EngineConfig) -> Self {
        Self {
            machine: Arc::new(Mutex::new(machine)),
            shutdown: Arc::new(AtomicBool::new(false)),
            resumed: Arc::new(Notify::new()),
            poll_interval: config.poll_interval(),
            pause_poll: config.pause_poll(),
        }
    }

    /// Lock the machine. Do not hold the guard across an `.await`.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, CncMachine> {
        self.machine.lock()
    }

    /// Shutdown has been requested.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake any paused task.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }

    /// Request a pause. See [`CncMachine::pause`].
    pub fn pause(&self) -> bool {
        self.lock().pause()
    }

    /// Clear a pause and wake the paused task.
    pub fn resume(&self) -> bool {
        let resumed = self.lock().resume();
        if resumed {
            self.resumed.notify_waiters();
        }
        resumed
    }

    /// Request an abort. See [`CncMachine::abort`].
    pub fn abort(&self) -> bool {
        self.lock().abort()
    }

    /// Sleep in poll intervals until `done` holds or shutdown is requested.
    async fn wait_until(&self, done: impl Fn(&CncMachine) -> bool) {
        loop {
            if self.is_shutdown() {
                return;
            }
            let finished = done(&self.lock());
            if finished {
                return;
            }
            sleep(self.poll_interval).await;
        }
    }

    // ─── Motion ─────────────────────────────────────────────────────

    /// Plan a coordinated move and, if `blocking`, wait for every axis to stop.
    pub async fn set_target(&self, target: MoveTarget, speed: Option<f64>, blocking: bool) {
        self.lock().set_target(target, speed);
        if blocking {
            self.wait_until(|m| !m.is_moving()).await;
        }
    }

    async fn move_axis(&self, axis: AxisId, value: f64, speed: f64) {
        self.set_target(MoveTarget::single(axis, value), Some(speed), true)
            .await;
    }

    /// Home X, Y and Z in turn, always blocking.
    ///
    /// Each axis travels to physical zero, drops its offset, backs off and
    /// creeps back to zero. The default speed in force before homing is
    /// restored afterwards.
    pub async fn home(&self) {
        let saved_speed = self.lock().default_speed();
        info!("Homing started");

        for axis in AxisId::CARTESIAN {
            let zero = self.lock().axis(axis).physical_to_virtual(0.0);
            self.move_axis(axis, zero, HOMING_SPEED).await;
            if self.is_shutdown() {
                break;
            }
            self.lock().axis_mut(axis).clear_offset();
            self.move_axis(axis, HOMING_BACKOFF, HOMING_SPEED).await;
            self.move_axis(axis, 0.0, HOMING_SETTLE_SPEED).await;
            if self.is_shutdown() {
                break;
            }
            debug!("Axis {} homed", axis);
        }

        let completed = !self.is_shutdown();
        {
            let mut machine = self.lock();
            machine.set_default_speed(saved_speed);
            if completed {
                machine.set_homed(true);
            }
        }
        if completed {
            info!("Homing complete");
        } else {
            warn!("Homing interrupted by shutdown");
        }
    }

    // ─── Heaters ────────────────────────────────────────────────────

    /// Change a heater set point and, if `blocking`, wait until it settles.
    ///
    /// Switching a heater off (0 °C) never blocks.
    pub async fn set_heater_temp(&self, heater: HeaterId, celsius: f64, blocking: bool) {
        self.lock().heater_mut(heater).set_set_point_temp(celsius);
        if blocking && celsius != 0.0 {
            debug!("Waiting for {} to reach {:.1}°C", heater, celsius);
            self.wait_until(|m| m.heater(heater).temp_reached()).await;
        }
    }

    // ─── G-code ─────────────────────────────────────────────────────

    /// Execute one G-code line. Unparseable lines are skipped.
    pub async fn run_gcode_line(&self, line: &str) {
        let line = line.trim_end();
        self.lock().set_current_line(Some(line.to_string()));

        match gcode::parse_line(line) {
            Some(commands) => {
                for command in commands {
                    if self.is_shutdown() {
                        break;
                    }
                    self.dispatch(command).await;
                }
            }
            None => debug!("Skipping unparseable line {:?}", line),
        }

        self.lock().set_current_line(None);
    }

    async fn dispatch(&self, command: GcodeCommand) {
        debug!("Dispatch {:?}", command);
        match command {
            GcodeCommand::LinearMove { target, feed } => {
                let speed = feed.map(|f| f / MM_PER_M / SECS_PER_MIN);
                self.set_target(MoveTarget::from_mm(&target), speed, true)
                    .await;
            }
            GcodeCommand::SetOffset(words) => {
                self.lock().apply_offset(MoveTarget::from_mm(&words));
            }
            GcodeCommand::Home => self.home().await,
            GcodeCommand::SetNozzleTemp { celsius, wait } => {
                self.set_heater_temp(HeaterId::Nozzle, celsius, wait).await;
            }
            GcodeCommand::SetPlateTemp { celsius, wait } => {
                self.set_heater_temp(HeaterId::Plate, celsius, wait).await;
            }
        }
    }

    /// Execute a G-code file line by line.
    ///
    /// Progress runs from 10 to 90 % with the line index and ends at 100 %.
    /// Pause and abort requests are honoured between lines.
    pub async fn run_gcode_file(&self, path: &Path) {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read G-code file {}: {}", path.display(), e);
                return;
            }
        };
        let lines: Vec<&str> = text.lines().collect();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!("Running {} ({} lines)", path.display(), lines.len());
        self.lock().begin_file(name);

        let total = lines.len();
        for (i, line) in lines.iter().enumerate() {
            self.lock().set_progress(progress(i, total));
            self.run_gcode_line(line).await;

            let paused = self.lock().pause_requested();
            if paused {
                self.hang().await;
            }
            let aborted = self.lock().take_abort();
            if aborted {
                info!("Aborted {} at line {}", path.display(), i + 1);
                break;
            }
            if self.is_shutdown() {
                break;
            }
        }

        self.lock().finish_file();
        info!("Finished {}", path.display());
    }

    /// Stay paused until resumed or shut down.
    async fn hang(&self) {
        self.lock().set_status(MachineStatus::Paused);
        info!("Paused");

        loop {
            // Registered before the check so a resume in between is not lost.
            let resumed = self.resumed.notified();
            let still_paused = self.lock().pause_requested();
            if !still_paused || self.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = resumed => {}
                _ = sleep(self.pause_poll) => {}
            }
        }

        self.lock().set_status(MachineStatus::Working);
        info!("Resumed");
    }
}

/// File progress before executing line `index` of `total`.
fn progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    (10 + index * 80 / total) as u8
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_spans_ten_to_ninety() {
        assert_eq!(progress(0, 4), 10);
        assert_eq!(progress(1, 4), 30);
        assert_eq!(progress(3, 4), 70);
        assert_eq!(progress(99, 100), 89);
        assert_eq!(progress(0, 0), 10);
    }
}
