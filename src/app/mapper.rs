//! Intensity mapper: continuous request to discrete hardware mode.
//!
//! Rules, in order:
//!
//! | # | Condition                                   | Mode                          |
//! |---|---------------------------------------------|-------------------------------|
//! | 1 | forced level on a graduated device          | `NativeLevel(forced)`         |
//! | 2 | no value, or value <= 0                     | `Off`                         |
//! | 3 | value >= 1                                  | `BinaryOn` / `NativeLevel(max)` |
//! | 4 | 0 < value < 1, graduated with max > 1       | `NativeLevel(round(v * max))` |
//! | 4 | 0 < value < 1, otherwise                    | `Pwm(value)`                  |
//!
//! Forced levels pass through unclamped; they are a diagnostics escape hatch.

use crate::error::ControlError;

use super::model::{DeviceRecord, IntensityRequest, ResolvedMode};

/// Map a request onto the capabilities of `device`.
pub fn map_intensity(req: &IntensityRequest, device: &DeviceRecord) -> ResolvedMode {
    if let Some(level) = req.forced_level {
        if device.has_graduated_control {
            return ResolvedMode::NativeLevel(level);
        }
    }

    let value = match req.value {
        Some(v) if v > 0.0 => v,
        _ => return ResolvedMode::Off,
    };

    if value >= 1.0 {
        return if device.has_graduated_control {
            ResolvedMode::NativeLevel(device.max_level)
        } else {
            ResolvedMode::BinaryOn
        };
    }

    if device.has_graduated_control && device.max_level > 1 && !req.prefer_pwm {
        // f64::round is half-away-from-zero.
        let level = (value * f64::from(device.max_level)).round() as u32;
        return ResolvedMode::NativeLevel(level.clamp(1, device.max_level));
    }

    ResolvedMode::Pwm(value)
}

/// Reject requests that carry no usable intensity.
///
/// Run once before device resolution (`device = None`) and once after it,
/// when a forced level turns out to be unusable on the resolved device.
pub fn validate_request(
    req: &IntensityRequest,
    device: Option<&DeviceRecord>,
) -> Result<(), ControlError> {
    if req.value.is_some_and(f64::is_nan) {
        return Err(ControlError::InvalidRequest("intensity is NaN"));
    }
    match (req.value, req.forced_level, device) {
        (None, None, _) => Err(ControlError::InvalidRequest(
            "neither intensity nor forced level given",
        )),
        (None, Some(_), Some(d)) if !d.has_graduated_control => Err(
            ControlError::InvalidRequest("forced level needs graduated control and no intensity given"),
        ),
        _ => Ok(()),
    }
}
