//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the JSON command
//! boundary, a UI, tests) that the
//! [`IntensityController`](super::service::IntensityController) acts upon.

use super::model::IntensityRequest;

/// Device dumped by `DumpAllCharacteristics` when none is named.
pub const DEFAULT_DUMP_DEVICE: &str = "0";

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Set the torch to a fractional intensity.
    SetIntensity(IntensityRequest),

    /// Return the device probe, host metadata and torch status.
    GetFlashHardwareInfo,

    /// Re-probe every device (extended probe included) and summarise.
    DeepScan,

    /// Dump raw characteristics of one device (`None` = [`DEFAULT_DUMP_DEVICE`]).
    DumpAllCharacteristics { device_id: Option<String> },
}
