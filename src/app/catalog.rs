//! Capability catalog: picks the device a request is applied to.
//!
//! Selection tiers, first match wins:
//!
//! 1. the requested id, if the probe lists it (capabilities ignored);
//! 2. the first back-facing device with binary control;
//! 3. the first device with binary control, any facing;
//! 4. otherwise [`ControlError::NoDeviceFound`].
//!
//! Resolution is a pure function of the probe snapshot passed in.

use log::debug;

use crate::config::DeviceOverride;
use crate::error::ControlError;

use super::model::{DeviceRecord, Facing};
use super::ports::HardwareSink;

/// Resolve the target device for a request.
pub fn resolve_device(
    probe: &[DeviceRecord],
    requested_id: Option<&str>,
) -> Result<DeviceRecord, ControlError> {
    resolve_device_with(probe, requested_id, DeviceOverride::Probe)
}

/// [`resolve_device`] with an explicit policy for requested ids that the
/// probe does not list.
pub fn resolve_device_with(
    probe: &[DeviceRecord],
    requested_id: Option<&str>,
    policy: DeviceOverride,
) -> Result<DeviceRecord, ControlError> {
    if let Some(id) = requested_id {
        if let Some(found) = probe.iter().find(|d| d.id == id) {
            return Ok(found.clone());
        }
        match policy {
            DeviceOverride::Trust => {
                debug!("catalog: trusting unlisted device '{}'", id);
                return Ok(DeviceRecord::assumed_binary(id));
            }
            DeviceOverride::Probe => {
                debug!("catalog: requested device '{}' not in probe", id);
            }
        }
    }

    probe
        .iter()
        .find(|d| d.facing == Facing::Back && d.has_binary_control)
        .or_else(|| probe.iter().find(|d| d.has_binary_control))
        .cloned()
        .ok_or(ControlError::NoDeviceFound)
}

// ───────────────────────────────────────────────────────────────
// Extended probe
// ───────────────────────────────────────────────────────────────

/// Probe wrapper that also asks the sink about numeric ids `0..=max_id`
/// the platform listing left out.  Some vendor firmware hides working
/// torches from the listing; this is a workaround, kept out of the
/// selection policy above.
pub struct ExtendedProbe<'a> {
    sink: &'a dyn HardwareSink,
    max_id: u32,
}

impl<'a> ExtendedProbe<'a> {
    pub fn new(sink: &'a dyn HardwareSink, max_id: u32) -> Self {
        Self { sink, max_id }
    }

    /// Reported devices first, then any hidden numeric ids, in id order.
    pub fn run(&self, reported: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
        let mut devices = reported;
        for n in 0..=self.max_id {
            let id = n.to_string();
            if devices.iter().any(|d| d.id == id) {
                continue;
            }
            if let Some(found) = self.sink.describe(&id) {
                debug!("extended probe: found hidden device '{}'", id);
                devices.push(found);
            }
        }
        devices
    }
}

/// One-line probe summary, e.g. `IDs: 0:⚡m10, 1:m0`.
pub fn scan_summary(devices: &[DeviceRecord]) -> String {
    let entries: Vec<String> = devices
        .iter()
        .map(|d| {
            format!(
                "{}:{}m{}",
                d.id,
                if d.has_binary_control { "⚡" } else { "" },
                d.max_level
            )
        })
        .collect();
    format!("IDs: {}", entries.join(", "))
}
