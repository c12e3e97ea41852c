//! JSON wire types for the line protocol.
//!
//! ```text
//! → {"cmd":"setIntensity","intensity":0.35,"cameraId":"0","usePWM":false}
//! ← {"success":true,"id":"0","status":"ID:0 ON","mode":"native_level(4)"}
//! ← {"success":false,"error":"no torch device found","status":"Unknown"}
//! ```

use serde::{Deserialize, Serialize};

use crate::app::commands::AppCommand;
use crate::app::model::{DeviceRecord, HardwareInfo, IntensityRequest, StatusReport};

// ── Requests ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Request {
    SetIntensity(SetIntensityArgs),
    GetFlashHardwareInfo,
    DeepScan,
    #[serde(rename_all = "camelCase")]
    DumpAllCharacteristics {
        #[serde(default)]
        camera_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIntensityArgs {
    #[serde(default)]
    pub intensity: Option<f64>,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub force_level: Option<u32>,
    #[serde(default, rename = "usePWM")]
    pub use_pwm: bool,
}

impl From<Request> for AppCommand {
    fn from(req: Request) -> Self {
        match req {
            Request::SetIntensity(args) => AppCommand::SetIntensity(IntensityRequest {
                value: args.intensity,
                device_id: args.camera_id,
                forced_level: args.force_level,
                prefer_pwm: args.use_pwm,
            }),
            Request::GetFlashHardwareInfo => AppCommand::GetFlashHardwareInfo,
            Request::DeepScan => AppCommand::DeepScan,
            Request::DumpAllCharacteristics { camera_id } => AppCommand::DumpAllCharacteristics {
                device_id: camera_id,
            },
        }
    }
}

// ── Responses ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Intensity(IntensityResponse),
    HardwareInfo(HardwareInfoResponse),
    Scan(ScanResponse),
    Characteristics(CharacteristicsResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityResponse {
    pub success: bool,
    pub id: String,
    pub status: String,
    pub mode: String,
}

impl From<StatusReport> for IntensityResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            success: true,
            status: report.status_line(),
            mode: report.mode.to_string(),
            id: report.device_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareInfoResponse {
    pub success: bool,
    #[serde(rename = "cameras")]
    pub devices: Vec<DeviceRecord>,
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
    pub torch_status: String,
    pub scan_result: String,
}

impl From<HardwareInfo> for HardwareInfoResponse {
    fn from(info: HardwareInfo) -> Self {
        Self {
            success: true,
            devices: info.devices,
            manufacturer: info.host.manufacturer,
            model: info.host.model,
            os_version: info.host.os_version,
            torch_status: info.torch_status,
            scan_result: info.scan_result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicsResponse {
    pub success: bool,
    pub id: String,
    #[serde(rename = "data")]
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub status: String,
}

impl Response {
    pub fn error(error: impl Into<String>, status: String) -> Self {
        Self::Error(ErrorResponse {
            success: false,
            error: error.into(),
            status,
        })
    }
}
