//! Physical models: single-axis motion, PI regulation, heated bodies.
//!
//! All models advance on absolute simulation time passed to `run(time)`;
//! none of them reads a wall clock.

pub mod axis;
pub mod pi;
pub mod thermal;

pub use axis::{MotionPhase, SingleAxis};
pub use pi::PiRegulator;
pub use thermal::HeatingBody;
