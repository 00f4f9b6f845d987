//! Heated body driven by a PI-controlled electric heater.
//!
//! Heat balance per tick:
//!
//! ```text
//! P_in  = PI(T)                      clamped to [0, h_power]; 0 when set point is 0
//! P_out = A · [ k·(T − T_env) + σ·((T + 273.15)⁴ − (T_env + 273.15)⁴) ]
//! T    += (P + P_prev) / 2 · dt / (c · m)        with P = P_in − P_out
//! ```
//!
//! The body reports `temp_reached` once its temperature has stayed inside
//! `±settle_window` of the set point for longer than `settle_time`.

use super::pi::PiRegulator;
use cnc_common::consts::{KELVIN_OFFSET, STEFAN_BOLTZMANN};
use cnc_common::machine::HeaterConfig;
use tracing::{debug, trace};

/// Thermal plant plus its controller.
#[derive(Debug, Clone)]
pub struct HeatingBody {
    name: &'static str,
    /// Ambient temperature [°C].
    pub env_temp: f64,
    /// Heated mass [kg].
    pub mass: f64,
    /// Exposed surface [m²].
    pub surface: f64,
    /// Heater power limit [W].
    pub h_power: f64,
    /// Specific heat capacity [J/(kg K)].
    pub c_heat: f64,
    /// Conduction/convection coefficient [W/(m² K)].
    pub k_heat: f64,
    /// Settle band half-width [°C].
    pub settle_window: f64,
    /// Residency required inside the band [s].
    pub settle_time: f64,
    /// Temperature controller.
    pub control: PiRegulator,

    temperature: f64,
    set_point: f64,
    power: f64,
    power_in: f64,
    power_out: f64,
    last_power: f64,
    last_time: Option<f64>,
    temp_reached: bool,
    settle_timer: f64,
}

impl HeatingBody {
    /// Create a body at ambient temperature with the heater off.
    pub fn new(name: &'static str, env_temp: f64, config: &HeaterConfig) -> Self {
        let control = PiRegulator::new(config.kp, config.ki, 0.0)
            .with_output_limits(0.0, config.h_power)
            .with_wind_up(config.wind_up);

        Self {
            name,
            env_temp,
            mass: config.mass,
            surface: config.surface,
            h_power: config.h_power,
            c_heat: config.c_heat,
            k_heat: config.k_heat,
            settle_window: config.settle_window,
            settle_time: config.settle_time,
            control,
            temperature: env_temp,
            set_point: 0.0,
            power: 0.0,
            power_in: 0.0,
            power_out: 0.0,
            last_power: 0.0,
            last_time: None,
            temp_reached: false,
            settle_timer: 0.0,
        }
    }

    /// Advance the body to simulation time `time`.
    pub fn run(&mut self, time: f64) {
        let dt = self.last_time.map_or(0.0, |last| time - last);

        self.power_in = if self.set_point != 0.0 {
            self.control.run(time, self.temperature).clamp(0.0, self.h_power)
        } else {
            // Heater off: keep the controller from integrating an idle error.
            self.control.reset();
            0.0
        };

        self.power_out = self.heat_loss(self.temperature);
        self.power = self.power_in - self.power_out;
        self.temperature += (self.power + self.last_power) * dt / 2.0 / (self.c_heat * self.mass);
        self.last_power = self.power;

        self.track_settle(dt);
        self.last_time = Some(time);

        trace!(
            "Heater {}: T={:.3} sp={:.1} P_in={:.3} P_out={:.3}",
            self.name, self.temperature, self.set_point, self.power_in, self.power_out
        );
    }

    /// Heat lost to the environment at `temp` [W].
    pub fn heat_loss(&self, temp: f64) -> f64 {
        let conduction = (temp - self.env_temp) * self.k_heat;
        let radiation = ((temp + KELVIN_OFFSET).powi(4) - (self.env_temp + KELVIN_OFFSET).powi(4))
            * STEFAN_BOLTZMANN;
        self.surface * (conduction + radiation)
    }

    fn track_settle(&mut self, dt: f64) {
        if (self.temperature - self.set_point).abs() < self.settle_window {
            self.settle_timer += dt;
            if self.settle_timer > self.settle_time {
                if !self.temp_reached {
                    debug!("Heater {}: settled at {:.2}°C", self.name, self.temperature);
                }
                self.temp_reached = true;
            }
        } else {
            self.temp_reached = false;
            self.settle_timer = 0.0;
        }
    }

    /// Change the set point and restart settle detection.
    ///
    /// The flag and timer are cleared even when `value` equals the current
    /// set point.
    pub fn set_set_point_temp(&mut self, value: f64) {
        self.set_point = value;
        self.control.set_set_point(value);
        self.temp_reached = false;
        self.settle_timer = 0.0;
        debug!("Heater {}: set point {:.1}°C", self.name, value);
    }

    /// Set point [°C]; 0 means off.
    #[inline]
    pub fn set_point_temp(&self) -> f64 {
        self.set_point
    }

    /// Current temperature [°C].
    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Net power into the body [W].
    #[inline]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Electrical heater power [W].
    #[inline]
    pub fn power_in(&self) -> f64 {
        self.power_in
    }

    /// Power lost to the environment [W].
    #[inline]
    pub fn power_out(&self) -> f64 {
        self.power_out
    }

    /// Set point reached and held for the settle window.
    #[inline]
    pub fn temp_reached(&self) -> bool {
        self.temp_reached
    }

    /// Heater name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
