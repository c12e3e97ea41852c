//! Line dispatcher: one JSON request in, one JSON response out.

use std::sync::Arc;

use log::{debug, warn};

use crate::app::commands::DEFAULT_DUMP_DEVICE;
use crate::app::ports::HardwareSink;
use crate::app::service::{CommandReply, IntensityController};

use super::wire::{CharacteristicsResponse, Request, Response, ScanResponse};

pub struct Dispatcher<S: HardwareSink + 'static> {
    controller: Arc<IntensityController<S>>,
}

impl<S: HardwareSink + 'static> Dispatcher<S> {
    pub fn new(controller: Arc<IntensityController<S>>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &IntensityController<S> {
        &self.controller
    }

    /// Handle one request line.  Malformed input yields an error response.
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Request>(line.trim()) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("rejecting request: {}", e);
                Response::error(format!("malformed request: {e}"), self.controller.status())
            }
        };
        encode(&response)
    }

    pub fn handle(&self, request: Request) -> Response {
        debug!("request: {:?}", request);
        let dump_id = match &request {
            Request::DumpAllCharacteristics { camera_id } => camera_id.clone(),
            _ => None,
        };

        match self.controller.handle_command(request.into()) {
            Ok(CommandReply::Intensity(report)) => Response::Intensity(report.into()),
            Ok(CommandReply::HardwareInfo(info)) => Response::HardwareInfo(info.into()),
            Ok(CommandReply::Scan(result)) => Response::Scan(ScanResponse {
                success: true,
                result,
            }),
            Ok(CommandReply::Characteristics(characteristics)) => {
                Response::Characteristics(CharacteristicsResponse {
                    success: true,
                    id: dump_id.unwrap_or_else(|| DEFAULT_DUMP_DEVICE.into()),
                    characteristics,
                })
            }
            Err(e) => {
                warn!("command failed: {}", e);
                Response::error(e.to_string(), self.controller.status())
            }
        }
    }
}

fn encode(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"error":"encode failed: {e}","status":"Unknown"}}"#)
    })
}
