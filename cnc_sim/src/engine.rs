//! Tick loop and single-task admission control.
//!
//! The engine owns two kinds of activity over one shared machine:
//!
//! - the tick loop ([`Engine::run`]), advancing simulation time by
//!   `time_step` every `time_step / time_mult` wall seconds;
//! - at most one G-code execution task. A line or file requested while a
//!   task is in flight is dropped, not queued.
//!
//! Settings and state reads from outside go through short lock sections
//! between ticks.

use crate::error::SimResult;
use crate::executor::MachineHandle;
use crate::machine::CncMachine;
use cnc_common::consts::SETTINGS_BIN_LEN;
use cnc_common::machine::{EngineConfig, MachineConfig, SimConfig};
use cnc_common::types::{AxisId, HeaterId, MachineSnapshot};
use parking_lot::Mutex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

/// Tick loop statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickStats {
    /// Ticks executed.
    pub tick_count: u64,
    /// Sum of tick compute times [us].
    pub total_tick_time_us: u64,
    /// Longest tick compute time [us].
    pub max_tick_time_us: u64,
    /// Ticks whose compute time exceeded the tick period.
    pub overruns: u64,
}

/// Simulator engine. Cheap to clone; clones share the same machine.
#[derive(Debug, Clone)]
pub struct Engine {
    handle: MachineHandle,
    config: EngineConfig,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Engine {
    /// Validate `config` and build a machine at rest.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(&config.machine, config.engine.clone()))
    }

    /// Build from already validated parts.
    pub fn from_parts(machine: &MachineConfig, engine: EngineConfig) -> Self {
        Self {
            handle: MachineHandle::new(CncMachine::new(machine), &engine),
            config: engine,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared machine handle.
    pub fn handle(&self) -> &MachineHandle {
        &self.handle
    }

    /// Engine timing.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─── Tick loop ──────────────────────────────────────────────────

    /// Run ticks until shutdown is requested.
    pub async fn run(&self) -> TickStats {
        let period = self.config.tick_period();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = TickStats::default();

        info!(
            "Starting tick loop (time_step={}s, time_mult={}, period={}us)",
            self.config.time_step,
            self.config.time_mult,
            period.as_micros()
        );

        while !self.handle.is_shutdown() {
            ticker.tick().await;

            let tick_start = Instant::now();
            let time = {
                let mut machine = self.handle.lock();
                let time = machine.time() + self.config.time_step;
                machine.run(time);
                time
            };

            let tick_time_us = tick_start.elapsed().as_micros() as u64;
            stats.tick_count += 1;
            stats.total_tick_time_us += tick_time_us;
            stats.max_tick_time_us = stats.max_tick_time_us.max(tick_time_us);
            if tick_time_us > period.as_micros() as u64 {
                stats.overruns += 1;
            }

            if stats.tick_count % 1000 == 0 {
                debug!(
                    "Tick loop: {} ticks, sim time {:.2}s, avg={}us, max={}us, overruns={}",
                    stats.tick_count,
                    time,
                    stats.total_tick_time_us / stats.tick_count,
                    stats.max_tick_time_us,
                    stats.overruns
                );
            }
        }

        info!(
            "Tick loop stopped after {} ticks (overruns: {})",
            stats.tick_count, stats.overruns
        );
        stats
    }

    // ─── Execution ──────────────────────────────────────────────────

    fn try_spawn<F>(&self, what: &str, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Busy, dropping {}", what);
            return false;
        }
        *slot = Some(tokio::spawn(job));
        true
    }

    /// Start executing one G-code line. Returns `false` when busy.
    pub fn execute_line(&self, line: impl Into<String>) -> bool {
        let line = line.into();
        let handle = self.handle.clone();
        let what = format!("line {:?}", line);
        self.try_spawn(&what, async move { handle.run_gcode_line(&line).await })
    }

    /// Start executing a G-code file. Returns `false` when busy or when
    /// `path` is not a file.
    pub fn execute_file(&self, path: impl AsRef<Path>) -> bool {
        let path: PathBuf = path.as_ref().to_path_buf();
        if self.is_busy() {
            debug!("Busy, dropping file {}", path.display());
            return false;
        }
        if !path.is_file() {
            warn!("G-code file not found: {}", path.display());
            return false;
        }
        let handle = self.handle.clone();
        let what = format!("file {}", path.display());
        self.try_spawn(&what, async move { handle.run_gcode_file(&path).await })
    }

    /// An execution task is in flight.
    pub fn is_busy(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Wait until no execution task is in flight or shutdown is requested.
    pub async fn wait_idle(&self) {
        while self.is_busy() && !self.handle.is_shutdown() {
            sleep(self.config.poll_interval()).await;
        }
    }

    /// Pause the running file after its current line.
    pub fn pause(&self) -> bool {
        self.is_busy() && self.handle.pause()
    }

    /// Resume a paused file.
    pub fn resume(&self) -> bool {
        self.is_busy() && self.handle.resume()
    }

    /// Abort the running file after its current line.
    pub fn abort(&self) -> bool {
        self.is_busy() && self.handle.abort()
    }

    /// Request shutdown, then wait for the execution task to unwind.
    pub async fn close(&self) {
        info!("Shutdown requested");
        self.handle.request_shutdown();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Execution task ended abnormally: {}", e);
            }
        }
    }

    // ─── State & settings ───────────────────────────────────────────

    /// Copy of the machine state.
    pub fn snapshot(&self) -> MachineSnapshot {
        self.handle.lock().snapshot()
    }

    /// See [`CncMachine::set_feedrate_override`].
    pub fn set_feedrate_override(&self, value: f64) -> SimResult<()> {
        self.handle.lock().set_feedrate_override(value)
    }

    /// See [`CncMachine::set_axis_limits`].
    pub fn set_axis_limits(&self, axis: AxisId, max_speed: f64, max_acc: f64) -> SimResult<()> {
        self.handle.lock().set_axis_limits(axis, max_speed, max_acc)
    }

    /// See [`CncMachine::set_heater_gains`].
    pub fn set_heater_gains(
        &self,
        heater: HeaterId,
        kp: f64,
        ki: f64,
        wind_up: Option<f64>,
    ) -> SimResult<()> {
        self.handle.lock().set_heater_gains(heater, kp, ki, wind_up)
    }

    /// See [`CncMachine::set_heater_settle`].
    pub fn set_heater_settle(&self, heater: HeaterId, window: f64, time: f64) -> SimResult<()> {
        self.handle.lock().set_heater_settle(heater, window, time)
    }

    /// Axis limits as JSON.
    pub fn settings_json(&self) -> SimResult<String> {
        self.handle.lock().settings_json()
    }

    /// Axis limits as the binary blob.
    pub fn settings_bin(&self) -> [u8; SETTINGS_BIN_LEN] {
        self.handle.lock().settings_bin()
    }

    /// Apply a JSON settings document.
    pub fn apply_settings_json(&self, json: &str) -> SimResult<()> {
        self.handle.lock().apply_settings_json(json)
    }

    /// Apply the binary settings blob.
    pub fn apply_settings_bin(&self, bytes: &[u8]) -> SimResult<()> {
        self.handle.lock().apply_settings_bin(bytes)
    }
}
