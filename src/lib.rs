//! Torch intensity control.
//!
//! Turns a fractional intensity request into the best mode a torch LED
//! supports: native strength levels where the hardware has them, a
//! software PWM loop where it only switches on and off.
//!
//! ```text
//!  rpc (JSON lines) ──▶ app::service::IntensityController ──▶ app::ports::HardwareSink
//!                         │ catalog · mapper · status            ▲
//!                         └──▶ pwm::PwmEngine (worker thread) ───┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pwm;
pub mod rpc;

pub use app::model::{DeviceRecord, IntensityRequest, ResolvedMode, StatusReport};
pub use app::service::IntensityController;
pub use error::{ControlError, SinkError};
