//! CNC Simulator Common Library
//!
//! This crate provides shared constants, configuration loading and the
//! plain data types exchanged between the simulator core and the layers
//! that observe or drive it.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading trait and shared fields
//! - [`consts`] - Unit conversions, poll intervals and limits
//! - [`machine`] - Machine, axis, heater and engine configuration
//! - [`types`] - Axis/heater identifiers, status codes, snapshots
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cnc_common::prelude::*;
//!
//! let config = SimConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod machine;
pub mod prelude;
pub mod types;
