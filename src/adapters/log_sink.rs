//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr through `env_logger` in `torchd`).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::ModeApplied { device_id, mode } => {
                info!("MODE  | id={} | {}", device_id, mode);
            }
            AppEvent::FallbackToBinary { device_id, level } => {
                warn!("MODE  | id={} | level {} rejected, full on", device_id, level);
            }
            AppEvent::PwmArmed {
                device_id,
                on_time_ms,
            } => {
                info!("PWM   | armed id={} on={}ms", device_id, on_time_ms);
            }
            AppEvent::PwmDisarmed => {
                info!("PWM   | disarmed");
            }
            AppEvent::PwmAutoDisarmed {
                device_id,
                failures,
            } => {
                warn!(
                    "PWM   | auto-disarmed id={} after {} consecutive failures",
                    device_id, failures
                );
            }
            AppEvent::HardwareStateChanged { device_id, on } => {
                debug!("TORCH | id={} {}", device_id, if *on { "ON" } else { "OFF" });
            }
            AppEvent::Shutdown => {
                info!("STOP  | controller shut down");
            }
        }
    }
}
