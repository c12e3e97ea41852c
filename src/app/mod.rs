//! Application core: device resolution, intensity mapping and orchestration.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer testable without real torches.  The
//! PWM engine it drives lives in [`crate::pwm`].

pub mod catalog;
pub mod commands;
pub mod events;
pub mod mapper;
pub mod model;
pub mod ports;
pub mod service;
pub mod status;
