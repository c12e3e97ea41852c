//! Domain value types shared by the catalog, mapper, engine and controller.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which way a device points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Back,
    Front,
    External,
    #[default]
    Unknown,
}

/// Immutable snapshot of one torch-capable device, as reported by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    /// Plain on/off control (the platform's "has flash" flag).
    #[serde(rename = "hasFlash")]
    pub has_binary_control: bool,
    /// Native intermediate strength levels.
    #[serde(default)]
    pub has_graduated_control: bool,
    /// Highest strength level; 1 on binary-only torches, 0 without a torch.
    #[serde(default)]
    pub max_level: u32,
    #[serde(default)]
    pub facing: Facing,
}

impl DeviceRecord {
    /// Record for an id the caller insists on but the probe never listed.
    pub fn assumed_binary(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            has_binary_control: true,
            has_graduated_control: false,
            max_level: 1,
            facing: Facing::Unknown,
        }
    }
}

/// One `set_intensity` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensityRequest {
    /// Fractional intensity in `[0, 1]`; `<= 0` means off.
    pub value: Option<f64>,
    /// Target device; `None` lets the catalog choose.
    pub device_id: Option<String>,
    /// Raw strength level passed straight to graduated hardware.
    pub forced_level: Option<u32>,
    /// Dim with software PWM even when native levels exist.
    pub prefer_pwm: bool,
}

impl IntensityRequest {
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn forced(level: u32) -> Self {
        Self {
            forced_level: Some(level),
            ..Self::default()
        }
    }

    pub fn on_device(mut self, id: &str) -> Self {
        self.device_id = Some(id.to_owned());
        self
    }

    pub fn with_pwm(mut self) -> Self {
        self.prefer_pwm = true;
        self
    }
}

/// How a request is realised on the hardware.  Computed per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedMode {
    Off,
    BinaryOn,
    NativeLevel(u32),
    /// Software dimming at the given duty fraction.
    Pwm(f64),
}

impl fmt::Display for ResolvedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::BinaryOn => write!(f, "binary_on"),
            Self::NativeLevel(n) => write!(f, "native_level({n})"),
            Self::Pwm(duty) => write!(f, "pwm({duty:.2})"),
        }
    }
}

/// Outcome of a successful `set_intensity`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub device_id: String,
    pub mode: ResolvedMode,
    /// Last hardware confirmation seen (`ID:0 ON`), best effort.
    pub hardware_status: String,
}

impl StatusReport {
    /// Human-readable status line for the command boundary.  The PWM
    /// percentage is truncated, so 0.29 reads as 28%.
    pub fn status_line(&self) -> String {
        match self.mode {
            ResolvedMode::Pwm(duty) => format!("PWM ACTIVE ({}%)", (duty * 100.0) as u32),
            _ => self.hardware_status.clone(),
        }
    }
}

/// Informational host metadata for `getFlashHardwareInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            manufacturer: "unknown".into(),
            model: "unknown".into(),
            os_version: "unknown".into(),
        }
    }
}

/// Probe plus host metadata and current status.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareInfo {
    pub devices: Vec<DeviceRecord>,
    pub host: HostInfo,
    pub torch_status: String,
    pub scan_result: String,
}
