//! # CNC Simulator Library
//!
//! Simulated 3D-printer style machine: four trapezoidal-profile axes, two
//! PI-controlled heated bodies and a G-code interpreter that drives them.
//!
//! # Module Structure
//!
//! - [`physics`] - PI regulator, single-axis planner, heated body
//! - [`gcode`] - G-code subset parser
//! - [`machine`] - Machine state, coordinated moves, flow-control flags
//! - [`settings`] - Axis limit settings as JSON and binary blob
//! - [`executor`] - Cooperative blocking waits and G-code execution
//! - [`engine`] - Tick loop and single-task admission control
//! - [`error`] - Error types
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Engine                                │
//! │  ┌──────────────┐                      ┌───────────────────┐  │
//! │  │  Tick loop   │──── run(time) ──┐    │  Execution task   │  │
//! │  │  (interval)  │                 │    │  (at most one)    │  │
//! │  └──────────────┘                 ▼    └─────────┬─────────┘  │
//! │                        ┌────────────────────┐    │            │
//! │                        │ Mutex<CncMachine>  │◄───┘ set_target │
//! │                        │  X Y Z E  nozzle   │      heaters    │
//! │                        │  plate             │      status     │
//! │                        └────────────────────┘                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use cnc_sim::Engine;
//! use cnc_common::prelude::*;
//!
//! # async fn demo() -> cnc_sim::SimResult<()> {
//! let engine = Engine::new(&SimConfig::default())?;
//! let ticker = engine.clone();
//! tokio::spawn(async move { ticker.run().await });
//!
//! engine.execute_line("G1 X50 F600");
//! engine.wait_idle().await;
//! engine.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod executor;
pub mod gcode;
pub mod machine;
pub mod physics;
pub mod settings;

// Re-export key types for convenience
pub use crate::engine::{Engine, TickStats};
pub use crate::error::{SimError, SimResult};
pub use crate::executor::MachineHandle;
pub use crate::gcode::{GcodeCommand, parse_line};
pub use crate::machine::{CncMachine, MoveTarget};
pub use crate::settings::SettingsDocument;
