//! In-memory torch simulator.
//!
//! Backs `torchd --sim` and host development.  Devices come from
//! [`ControllerConfig::sim_devices`](crate::config::ControllerConfig);
//! every accepted write notifies the registered state listener, so the
//! status string behaves as it does on real hardware.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::model::{DeviceRecord, HostInfo};
use crate::app::ports::{HardwareSink, StateListener};
use crate::error::SinkError;

/// Simulated output of one device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTorch {
    pub on: bool,
    /// Last native level, 0 while off or after a binary write.
    pub level: u32,
}

pub struct SimSink {
    devices: Vec<DeviceRecord>,
    /// Present on the hardware but missing from the probe listing.
    hidden: Vec<DeviceRecord>,
    torches: Mutex<HashMap<String, SimTorch>>,
    listener: Mutex<Option<Box<dyn StateListener>>>,
}

impl SimSink {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices,
            hidden: Vec::new(),
            torches: Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
        }
    }

    /// Add devices that only an extended probe can find.
    pub fn with_hidden(mut self, hidden: Vec<DeviceRecord>) -> Self {
        self.hidden = hidden;
        self
    }

    /// Current simulated output of `id`.
    pub fn torch(&self, id: &str) -> SimTorch {
        lock(&self.torches).get(id).copied().unwrap_or_default()
    }

    fn record(&self, id: &str) -> Result<&DeviceRecord, SinkError> {
        self.devices
            .iter()
            .chain(&self.hidden)
            .find(|d| d.id == id)
            .ok_or_else(|| SinkError::UnknownDevice(id.to_owned()))
    }

    fn write(&self, id: &str, torch: SimTorch) {
        lock(&self.torches).insert(id.to_owned(), torch);
        debug!("sim: '{}' -> on={} level={}", id, torch.on, torch.level);
        if let Some(listener) = lock(&self.listener).as_ref() {
            listener.on_state_changed(id, torch.on);
        }
    }
}

impl HardwareSink for SimSink {
    fn probe(&self) -> Result<Vec<DeviceRecord>, SinkError> {
        Ok(self.devices.clone())
    }

    fn set_binary(&self, id: &str, on: bool) -> Result<(), SinkError> {
        let record = self.record(id)?;
        if !record.has_binary_control {
            return Err(SinkError::Device(format!("'{id}' has no torch")));
        }
        self.write(id, SimTorch { on, level: 0 });
        Ok(())
    }

    fn set_level(&self, id: &str, level: u32) -> Result<(), SinkError> {
        let record = self.record(id)?;
        if !record.has_graduated_control {
            return Err(SinkError::Unsupported);
        }
        self.write(
            id,
            SimTorch {
                on: level > 0,
                level,
            },
        );
        Ok(())
    }

    fn describe(&self, id: &str) -> Option<DeviceRecord> {
        self.hidden.iter().find(|d| d.id == id).cloned()
    }

    fn characteristics(&self, id: &str) -> Result<Vec<String>, SinkError> {
        let record = self.record(id)?;
        let torch = self.torch(id);
        Ok(vec![
            format!("facing = {:?}", record.facing),
            format!("flash_available = {}", record.has_binary_control),
            format!("graduated_control = {}", record.has_graduated_control),
            format!("max_strength_level = {}", record.max_level),
            format!("torch_on = {}", torch.on),
            format!("torch_level = {}", torch.level),
        ])
    }

    fn host_info(&self) -> HostInfo {
        HostInfo {
            manufacturer: "torchdim".into(),
            model: "simulator".into(),
            os_version: std::env::consts::OS.into(),
        }
    }

    fn set_state_listener(&self, listener: Box<dyn StateListener>) {
        *lock(&self.listener) = Some(listener);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
