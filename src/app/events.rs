//! Outbound application events.
//!
//! The [`IntensityController`](super::service::IntensityController) and the
//! PWM engine emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them.

use super::model::ResolvedMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A request was applied to a device.
    ModeApplied { device_id: String, mode: ResolvedMode },

    /// Native strength was rejected; the device was switched fully on instead.
    FallbackToBinary { device_id: String, level: u32 },

    /// The PWM engine started cycling (or picked up a new duty).
    PwmArmed { device_id: String, on_time_ms: u32 },

    /// The PWM engine was asked to stop.
    PwmDisarmed,

    /// The PWM engine stopped itself after too many failed phases.
    PwmAutoDisarmed { device_id: String, failures: u32 },

    /// The hardware confirmed a torch state change.
    HardwareStateChanged { device_id: String, on: bool },

    /// The controller was torn down.
    Shutdown,
}
