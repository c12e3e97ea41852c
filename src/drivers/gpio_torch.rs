//! GPIO torch driver.
//!
//! A torch LED switched by a single output pin: binary control only, so
//! every fractional intensity on it is dimmed by the PWM engine.  Generic
//! over [`embedded_hal::digital::OutputPin`] so any HAL pin type (or a
//! Linux GPIO character device wrapper) can back it.

use std::sync::{Mutex, PoisonError};

use embedded_hal::digital::{Error as _, OutputPin};
use log::debug;

use crate::app::model::{DeviceRecord, Facing};
use crate::app::ports::{HardwareSink, StateListener};
use crate::error::SinkError;

pub struct GpioTorch<P> {
    id: String,
    facing: Facing,
    /// `true` when the LED lights with the pin driven low.
    active_low: bool,
    pin: Mutex<P>,
    listener: Mutex<Option<Box<dyn StateListener>>>,
}

impl<P: OutputPin + Send> GpioTorch<P> {
    pub fn new(id: &str, facing: Facing, pin: P) -> Self {
        Self {
            id: id.to_owned(),
            facing,
            active_low: false,
            pin: Mutex::new(pin),
            listener: Mutex::new(None),
        }
    }

    pub fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }
}

impl<P: OutputPin + Send> HardwareSink for GpioTorch<P> {
    fn probe(&self) -> Result<Vec<DeviceRecord>, SinkError> {
        Ok(vec![DeviceRecord {
            id: self.id.clone(),
            has_binary_control: true,
            has_graduated_control: false,
            max_level: 1,
            facing: self.facing,
        }])
    }

    fn set_binary(&self, id: &str, on: bool) -> Result<(), SinkError> {
        if id != self.id {
            return Err(SinkError::UnknownDevice(id.to_owned()));
        }
        {
            let mut pin = self.pin.lock().unwrap_or_else(PoisonError::into_inner);
            let high = on != self.active_low;
            let res = if high { pin.set_high() } else { pin.set_low() };
            res.map_err(|e| SinkError::Device(format!("gpio: {:?}", e.kind())))?;
        }
        debug!("gpio torch '{}' -> {}", id, if on { "ON" } else { "OFF" });

        if let Some(listener) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            listener.on_state_changed(id, on);
        }
        Ok(())
    }

    fn set_state_listener(&self, listener: Box<dyn StateListener>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }
}
