//! Controller configuration parameters
//!
//! Runtime-tunable knobs for device resolution, PWM failure containment and
//! the hardware backend.  Loaded from a JSON file by the `torchd` binary;
//! every field has a default so an empty object is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::model::{DeviceRecord, Facing};
use crate::error::ConfigError;

/// Software PWM period in milliseconds (50 Hz).
///
/// Fixed at build time, not derived from requests.
pub const PWM_PERIOD_MS: u32 = 20;

/// How a caller-supplied device id is treated when the probe does not list it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOverride {
    /// Fall through to the ordinary selection tiers.
    #[default]
    Probe,
    /// Use the id anyway as a binary-only device of unknown facing.
    Trust,
}

/// Which hardware sink the binary drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Linux LED class devices under `sysfs_root`.
    #[default]
    Sysfs,
    /// In-memory devices from `sim_devices`.
    Sim,
}

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Device resolution ---
    /// Policy for requested ids missing from the probe.
    pub device_override: DeviceOverride,
    /// Also try numeric ids `0..=n` the platform did not report.
    pub extended_probe_max_id: Option<u32>,

    // --- PWM ---
    /// Consecutive failed PWM phases before the engine disarms itself
    /// (0 = keep cycling forever).
    pub pwm_failure_limit: u32,
    /// Stack size of the PWM worker thread.
    pub worker_stack_kb: usize,

    // --- Backend ---
    pub backend: Backend,
    /// Root of the LED class directory.
    pub sysfs_root: PathBuf,
    /// Only LED names containing one of these substrings are probed
    /// (empty = every LED).
    pub sysfs_name_filter: Vec<String>,
    /// Devices exposed by the simulated backend.
    pub sim_devices: Vec<DeviceRecord>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_override: DeviceOverride::Probe,
            extended_probe_max_id: None,

            pwm_failure_limit: 50, // ~1 s of failures at 50 Hz
            worker_stack_kb: 32,

            backend: Backend::Sysfs,
            sysfs_root: PathBuf::from("/sys/class/leds"),
            sysfs_name_filter: vec!["torch".into(), "flash".into()],
            sim_devices: vec![
                DeviceRecord {
                    id: "0".into(),
                    has_binary_control: true,
                    has_graduated_control: true,
                    max_level: 10,
                    facing: Facing::Back,
                },
                DeviceRecord {
                    id: "1".into(),
                    has_binary_control: false,
                    has_graduated_control: false,
                    max_level: 0,
                    facing: Facing::Front,
                },
            ],
        }
    }
}

impl ControllerConfig {
    /// Load and validate a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check fields.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_stack_kb < 8 {
            return Err(ConfigError::ValidationFailed(
                "worker_stack_kb must be at least 8",
            ));
        }
        if self.extended_probe_max_id.is_some_and(|n| n > 255) {
            return Err(ConfigError::ValidationFailed(
                "extended_probe_max_id must be at most 255",
            ));
        }
        if self.backend == Backend::Sim && self.sim_devices.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "sim backend needs at least one sim device",
            ));
        }
        if self
            .sim_devices
            .iter()
            .any(|d| d.has_graduated_control && d.max_level == 0)
        {
            return Err(ConfigError::ValidationFailed(
                "graduated sim device needs max_level > 0",
            ));
        }
        Ok(())
    }
}
