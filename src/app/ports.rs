//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IntensityController (domain)
//! ```
//!
//! Driven adapters (sysfs LEDs, GPIO torches, simulators, event sinks)
//! implement these traits.  The controller and the PWM engine share one
//! sink across threads, so every port takes `&self` and is `Send + Sync`;
//! adapters keep their own interior mutability.

use std::time::Duration;

use crate::error::SinkError;

use super::events::AppEvent;
use super::model::{DeviceRecord, HostInfo};

// ───────────────────────────────────────────────────────────────
// Hardware sink (driven adapter: domain → torch hardware)
// ───────────────────────────────────────────────────────────────

/// Low-level torch control.
///
/// `set_level` is only called for devices whose record claims graduated
/// control.  A sink that cannot honour it anyway (stale capability data)
/// returns [`SinkError::Unsupported`] and the controller falls back to
/// `set_binary(id, true)` once.
pub trait HardwareSink: Send + Sync {
    /// Enumerate torch-capable devices.
    fn probe(&self) -> Result<Vec<DeviceRecord>, SinkError>;

    /// Switch a device fully on or off.
    fn set_binary(&self, id: &str, on: bool) -> Result<(), SinkError>;

    /// Set a native strength level.
    fn set_level(&self, _id: &str, _level: u32) -> Result<(), SinkError> {
        Err(SinkError::Unsupported)
    }

    /// Describe a device id the probe did not list (extended probe).
    fn describe(&self, _id: &str) -> Option<DeviceRecord> {
        None
    }

    /// Raw `key = value` characteristics of one device, for diagnostics.
    fn characteristics(&self, _id: &str) -> Result<Vec<String>, SinkError> {
        Ok(Vec::new())
    }

    /// Informational host metadata.
    fn host_info(&self) -> HostInfo {
        HostInfo::default()
    }

    /// Register the receiver of asynchronous torch state notifications.
    /// Sinks without a notification channel ignore it.
    fn set_state_listener(&self, _listener: Box<dyn StateListener>) {}
}

// ───────────────────────────────────────────────────────────────
// State listener (driven adapter → domain notification)
// ───────────────────────────────────────────────────────────────

/// Receives hardware-confirmed torch state changes.  May be called from any
/// thread, including the PWM worker and platform callback threads.
pub trait StateListener: Send + Sync {
    fn on_state_changed(&self, id: &str, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AppEvent);
}

/// Sink that drops every event.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &AppEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Sleeper (PWM hold primitive)
// ───────────────────────────────────────────────────────────────

/// Blocks the calling thread for one PWM phase.
///
/// Only ever called on the PWM worker thread.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}
