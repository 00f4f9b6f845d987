//! Simulator configuration types.
//!
//! - `SimConfig` - Root document loaded from `cnc_sim.toml`
//! - `EngineConfig` - Tick loop and wait timing
//! - `MachineConfig` - Ambient conditions and the six simulated components
//! - `AxisConfig` / `HeaterConfig` - Per-component parameters
//!
//! Every field has a default, so an empty file describes the stock machine.
//! A partial component section overrides only the fields it names; the rest
//! keep that component's stock values:
//!
//! ```toml
//! [engine]
//! time_step = 0.05
//! time_mult = 4.0
//!
//! [machine.z]
//! max_speed = 0.02
//!
//! [machine.nozzle]
//! kp = 25.0
//! ```

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_ENV_TEMP, DEFAULT_PAUSE_POLL_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SPEED,
    DEFAULT_TIME_STEP,
};
use crate::types::{AxisId, HeaterId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_time_step() -> f64 {
    DEFAULT_TIME_STEP
}

fn default_time_mult() -> f64 {
    1.0
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_pause_poll_ms() -> u64 {
    DEFAULT_PAUSE_POLL_MS
}

fn default_env_temp() -> f64 {
    DEFAULT_ENV_TEMP
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Logging and instance name.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Tick loop timing.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Machine parameters.
    #[serde(default)]
    pub machine: MachineConfig,
}

impl SimConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.engine.validate()?;
        self.machine.validate()
    }
}

/// Tick loop and blocking-wait timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simulated seconds advanced per tick.
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Simulation speed relative to wall time. A tick fires every
    /// `time_step / time_mult` wall seconds.
    #[serde(default = "default_time_mult")]
    pub time_mult: f64,

    /// Poll interval of move, homing and temperature waits [ms].
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Longest a paused file sleeps before re-checking [ms].
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            time_mult: default_time_mult(),
            poll_interval_ms: default_poll_interval_ms(),
            pause_poll_ms: default_pause_poll_ms(),
        }
    }
}

impl EngineConfig {
    /// Wall-clock period between ticks. Non-zero once [`Self::validate`] passes.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(self.time_step / self.time_mult)
    }

    /// Poll interval of blocking waits.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll interval while paused.
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    /// Reject zero or non-finite timings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("engine.time_step", self.time_step)?;
        require_positive("engine.time_mult", self.time_mult)?;
        match Duration::try_from_secs_f64(self.time_step / self.time_mult) {
            Ok(period) if !period.is_zero() => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "engine.time_step / engine.time_mult must give a tick period of at least 1ns (got {}s)",
                    self.time_step / self.time_mult
                )));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.pause_poll_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.pause_poll_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of one motion axis. Lengths in m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Lower travel bound (reported only, not enforced).
    pub min_pos: f64,
    /// Upper travel bound (reported only, not enforced).
    pub max_pos: f64,
    /// Speed limit [m/s].
    pub max_speed: f64,
    /// Acceleration limit [m/s²].
    pub max_acc: f64,
    /// Moving mass [kg].
    pub mass: f64,
    /// Friction force [N].
    pub friction: f64,
}

impl AxisConfig {
    /// Stock parameters of a machine axis.
    pub fn stock(id: AxisId) -> Self {
        match id {
            AxisId::X => Self {
                min_pos: 0.0,
                max_pos: 0.2,
                max_speed: 0.1,
                max_acc: 1.0,
                mass: 0.5,
                friction: 15.0,
            },
            AxisId::Y => Self {
                min_pos: 0.0,
                max_pos: 0.2,
                max_speed: 0.1,
                max_acc: 1.0,
                mass: 0.5,
                friction: 13.0,
            },
            AxisId::Z => Self {
                min_pos: 0.0,
                max_pos: 0.2,
                max_speed: 0.01,
                max_acc: 0.05,
                mass: 1.5,
                friction: 30.0,
            },
            AxisId::E => Self {
                min_pos: 0.0,
                max_pos: 0.0,
                max_speed: 0.01,
                max_acc: 0.05,
                mass: 0.1,
                friction: 100.0,
            },
        }
    }

    fn validate(&self, id: AxisId) -> Result<(), ConfigError> {
        require_positive(&format!("machine.{id}.max_speed"), self.max_speed)?;
        require_positive(&format!("machine.{id}.max_acc"), self.max_acc)?;
        require_non_negative(&format!("machine.{id}.mass"), self.mass)?;
        require_non_negative(&format!("machine.{id}.friction"), self.friction)
    }
}

/// Parameters of one heated body and its PI controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    /// Heated mass [kg].
    pub mass: f64,
    /// Surface exposed to the environment [m²].
    pub surface: f64,
    /// Maximum heater power [W].
    pub h_power: f64,
    /// Specific heat capacity [J/(kg K)].
    pub c_heat: f64,
    /// Conduction/convection coefficient [W/(m² K)].
    pub k_heat: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Integral clamp (absolute); `None` disables it.
    pub wind_up: Option<f64>,
    /// Settle band half-width [°C].
    pub settle_window: f64,
    /// Residency required inside the band [s].
    pub settle_time: f64,
}

impl HeaterConfig {
    /// Stock parameters of a machine heater.
    pub fn stock(id: HeaterId) -> Self {
        match id {
            HeaterId::Nozzle => Self {
                mass: 0.02,
                surface: 0.001,
                h_power: 120.0,
                c_heat: 420.0,
                k_heat: 25.0,
                kp: 20.0,
                ki: 1.0,
                wind_up: Some(10.0),
                settle_window: 0.1,
                settle_time: 0.1,
            },
            HeaterId::Plate => Self {
                mass: 0.3,
                surface: 0.04,
                h_power: 240.0,
                c_heat: 420.0,
                k_heat: 15.0,
                kp: 20.0,
                ki: 2.0,
                wind_up: Some(30.0),
                settle_window: 0.1,
                settle_time: 0.1,
            },
        }
    }

    fn validate(&self, id: HeaterId) -> Result<(), ConfigError> {
        require_positive(&format!("machine.{id}.mass"), self.mass)?;
        require_positive(&format!("machine.{id}.c_heat"), self.c_heat)?;
        require_positive(&format!("machine.{id}.h_power"), self.h_power)?;
        require_non_negative(&format!("machine.{id}.surface"), self.surface)?;
        require_non_negative(&format!("machine.{id}.settle_window"), self.settle_window)?;
        require_non_negative(&format!("machine.{id}.settle_time"), self.settle_time)?;
        if let Some(wind_up) = self.wind_up {
            require_non_negative(&format!("machine.{id}.wind_up"), wind_up)?;
        }
        Ok(())
    }
}

/// Fields of an `[machine.<axis>]` section; absent ones keep the stock value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct AxisSection {
    min_pos: Option<f64>,
    max_pos: Option<f64>,
    max_speed: Option<f64>,
    max_acc: Option<f64>,
    mass: Option<f64>,
    friction: Option<f64>,
}

impl AxisSection {
    fn resolve(self, id: AxisId) -> AxisConfig {
        let stock = AxisConfig::stock(id);
        AxisConfig {
            min_pos: self.min_pos.unwrap_or(stock.min_pos),
            max_pos: self.max_pos.unwrap_or(stock.max_pos),
            max_speed: self.max_speed.unwrap_or(stock.max_speed),
            max_acc: self.max_acc.unwrap_or(stock.max_acc),
            mass: self.mass.unwrap_or(stock.mass),
            friction: self.friction.unwrap_or(stock.friction),
        }
    }
}

/// Fields of an `[machine.<heater>]` section; absent ones keep the stock value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct HeaterSection {
    mass: Option<f64>,
    surface: Option<f64>,
    h_power: Option<f64>,
    c_heat: Option<f64>,
    k_heat: Option<f64>,
    kp: Option<f64>,
    ki: Option<f64>,
    wind_up: Option<f64>,
    settle_window: Option<f64>,
    settle_time: Option<f64>,
}

impl HeaterSection {
    fn resolve(self, id: HeaterId) -> HeaterConfig {
        let stock = HeaterConfig::stock(id);
        HeaterConfig {
            mass: self.mass.unwrap_or(stock.mass),
            surface: self.surface.unwrap_or(stock.surface),
            h_power: self.h_power.unwrap_or(stock.h_power),
            c_heat: self.c_heat.unwrap_or(stock.c_heat),
            k_heat: self.k_heat.unwrap_or(stock.k_heat),
            kp: self.kp.unwrap_or(stock.kp),
            ki: self.ki.unwrap_or(stock.ki),
            wind_up: self.wind_up.or(stock.wind_up),
            settle_window: self.settle_window.unwrap_or(stock.settle_window),
            settle_time: self.settle_time.unwrap_or(stock.settle_time),
        }
    }
}

/// `[machine]` as written in the file.
#[derive(Debug, Clone, Deserialize)]
struct MachineSection {
    #[serde(default = "default_env_temp")]
    env_temp: f64,
    #[serde(default = "default_speed")]
    default_speed: f64,
    #[serde(default)]
    x: AxisSection,
    #[serde(default)]
    y: AxisSection,
    #[serde(default)]
    z: AxisSection,
    #[serde(default)]
    e: AxisSection,
    #[serde(default)]
    nozzle: HeaterSection,
    #[serde(default)]
    plate: HeaterSection,
}

impl From<MachineSection> for MachineConfig {
    fn from(section: MachineSection) -> Self {
        Self {
            env_temp: section.env_temp,
            default_speed: section.default_speed,
            x: section.x.resolve(AxisId::X),
            y: section.y.resolve(AxisId::Y),
            z: section.z.resolve(AxisId::Z),
            e: section.e.resolve(AxisId::E),
            nozzle: section.nozzle.resolve(HeaterId::Nozzle),
            plate: section.plate.resolve(HeaterId::Plate),
        }
    }
}

/// Machine parameters: ambient conditions plus the six components.
///
/// Fields missing from a component section keep that component's stock
/// value (`AxisConfig::stock` / `HeaterConfig::stock`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MachineSection")]
pub struct MachineConfig {
    /// Ambient temperature [°C].
    pub env_temp: f64,

    /// Feed used by moves without an F word until one is given [m/s].
    pub default_speed: f64,

    /// X axis.
    pub x: AxisConfig,
    /// Y axis.
    pub y: AxisConfig,
    /// Z axis.
    pub z: AxisConfig,
    /// Extruder.
    pub e: AxisConfig,

    /// Hot end.
    pub nozzle: HeaterConfig,
    /// Build plate.
    pub plate: HeaterConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            env_temp: default_env_temp(),
            default_speed: default_speed(),
            x: AxisConfig::stock(AxisId::X),
            y: AxisConfig::stock(AxisId::Y),
            z: AxisConfig::stock(AxisId::Z),
            e: AxisConfig::stock(AxisId::E),
            nozzle: HeaterConfig::stock(HeaterId::Nozzle),
            plate: HeaterConfig::stock(HeaterId::Plate),
        }
    }
}

impl MachineConfig {
    /// Configuration of one axis.
    pub fn axis(&self, id: AxisId) -> &AxisConfig {
        match id {
            AxisId::X => &self.x,
            AxisId::Y => &self.y,
            AxisId::Z => &self.z,
            AxisId::E => &self.e,
        }
    }

    /// Configuration of one heater.
    pub fn heater(&self, id: HeaterId) -> &HeaterConfig {
        match id {
            HeaterId::Nozzle => &self.nozzle,
            HeaterId::Plate => &self.plate,
        }
    }

    /// Validate ambient values and every component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.env_temp.is_finite() {
            return Err(ConfigError::ValidationError(
                "machine.env_temp must be finite".to_string(),
            ));
        }
        require_positive("machine.default_speed", self.default_speed)?;
        for id in AxisId::ALL {
            self.axis(id).validate(id)?;
        }
        self.nozzle.validate(HeaterId::Nozzle)?;
        self.plate.validate(HeaterId::Plate)
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be a positive number (got {value})"
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be a non-negative number (got {value})"
        )))
    }
}
