//! Application service: the hexagonal core.
//!
//! [`IntensityController`] owns the hardware sink, the PWM engine and the
//! best-effort status string.  It exposes the single `set_intensity` entry
//! point plus the diagnostic queries of the command boundary.
//!
//! ```text
//!  request ──▶ catalog ──▶ mapper ──▶ ┌──────────────────────┐ ──▶ HardwareSink
//!                                      │ IntensityController  │
//!                       StatusReport ◀─│  apply · PWM · status │ ──▶ PwmEngine ──▶ HardwareSink
//!                                      └──────────────────────┘
//! ```
//!
//! One controller per sink, constructed at host start and torn down with
//! [`IntensityController::shutdown`] (also run on drop).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::adapters::time::ThreadSleeper;
use crate::config::{ControllerConfig, PWM_PERIOD_MS};
use crate::error::{ControlError, Result};
use crate::pwm::{PwmEngine, PwmOptions, PwmState, PwmStats};

use super::catalog::{ExtendedProbe, resolve_device_with, scan_summary};
use super::commands::{AppCommand, DEFAULT_DUMP_DEVICE};
use super::events::AppEvent;
use super::mapper::{map_intensity, validate_request};
use super::model::{DeviceRecord, HardwareInfo, IntensityRequest, ResolvedMode, StatusReport};
use super::ports::{EventSink, HardwareSink, Sleeper};
use super::status::StatusHandle;

/// Result of an [`AppCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Intensity(StatusReport),
    HardwareInfo(HardwareInfo),
    Scan(String),
    Characteristics(Vec<String>),
}

/// What was last applied, for diagnostics.
#[derive(Debug, Default)]
struct Active {
    device_id: Option<String>,
    mode: Option<ResolvedMode>,
}

// ───────────────────────────────────────────────────────────────
// IntensityController
// ───────────────────────────────────────────────────────────────

pub struct IntensityController<S: HardwareSink + 'static> {
    sink: Arc<S>,
    engine: PwmEngine,
    status: StatusHandle,
    events: Arc<dyn EventSink>,
    config: ControllerConfig,
    probe_cache: Mutex<Option<Vec<DeviceRecord>>>,
    last_scan: Mutex<String>,
    /// Serialises the apply step; the last request through wins.
    active: Mutex<Active>,
    shut_down: AtomicBool,
}

impl<S: HardwareSink + 'static> IntensityController<S> {
    /// Construct the controller and start its PWM worker (idle).
    pub fn new(sink: Arc<S>, config: ControllerConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        Self::with_sleeper(sink, config, events, Arc::new(ThreadSleeper))
    }

    /// As [`new`](Self::new) with a custom PWM hold primitive.
    pub fn with_sleeper(
        sink: Arc<S>,
        config: ControllerConfig,
        events: Arc<dyn EventSink>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let status = StatusHandle::new(Arc::clone(&events));
        sink.set_state_listener(Box::new(status.clone()));

        let engine_sink: Arc<dyn HardwareSink> = sink.clone();
        let engine = PwmEngine::start(
            engine_sink,
            sleeper,
            Arc::clone(&events),
            PwmOptions {
                period_ms: PWM_PERIOD_MS,
                failure_limit: config.pwm_failure_limit,
                stack_kb: config.worker_stack_kb,
            },
        )?;

        info!(
            "IntensityController started (period={}ms, override={:?}, failure_limit={})",
            PWM_PERIOD_MS, config.device_override, config.pwm_failure_limit
        );

        Ok(Self {
            sink,
            engine,
            status,
            events,
            config,
            probe_cache: Mutex::new(None),
            last_scan: Mutex::new(String::new()),
            active: Mutex::new(Active::default()),
            shut_down: AtomicBool::new(false),
        })
    }

    // ── Entry point ───────────────────────────────────────────

    /// Resolve a device, map the request and apply it.
    pub fn set_intensity(&self, req: &IntensityRequest) -> Result<StatusReport> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(ControlError::Worker("controller shut down".into()));
        }
        validate_request(req, None)?;

        // 1. Device
        let probe = self.probe()?;
        let device = resolve_device_with(&probe, req.device_id.as_deref(), self.config.device_override)?;
        validate_request(req, Some(&device))?;

        // 2. Mode
        let mode = map_intensity(req, &device);

        // 3. Apply
        let mut active = lock(&self.active);
        let applied = match self.apply(&device.id, mode) {
            Ok(applied) => applied,
            Err(e) => {
                // The engine may already be disarmed; the hardware state is
                // unknown.
                *active = Active::default();
                return Err(e);
            }
        };
        active.device_id = Some(device.id.clone());
        active.mode = Some(applied);
        drop(active);

        info!("intensity: '{}' -> {}", device.id, applied);
        self.events.emit(&AppEvent::ModeApplied {
            device_id: device.id.clone(),
            mode: applied,
        });

        // 4. Report
        Ok(StatusReport {
            device_id: device.id,
            mode: applied,
            hardware_status: self.status.get(),
        })
    }

    /// Dispatch an [`AppCommand`].
    pub fn handle_command(&self, cmd: AppCommand) -> Result<CommandReply> {
        match cmd {
            AppCommand::SetIntensity(req) => self.set_intensity(&req).map(CommandReply::Intensity),
            AppCommand::GetFlashHardwareInfo => self.hardware_info().map(CommandReply::HardwareInfo),
            AppCommand::DeepScan => self.deep_scan().map(CommandReply::Scan),
            AppCommand::DumpAllCharacteristics { device_id } => self
                .characteristics(device_id.as_deref().unwrap_or(DEFAULT_DUMP_DEVICE))
                .map(CommandReply::Characteristics),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Probe snapshot, host metadata and current torch status.
    pub fn hardware_info(&self) -> Result<HardwareInfo> {
        Ok(HardwareInfo {
            devices: self.probe()?,
            host: self.sink.host_info(),
            torch_status: self.status.get(),
            scan_result: lock(&self.last_scan).clone(),
        })
    }

    /// Re-probe (extended probe included) and refresh the cached snapshot.
    pub fn deep_scan(&self) -> Result<String> {
        let devices = self.fresh_probe()?;
        let summary = scan_summary(&devices);
        *lock(&self.probe_cache) = Some(devices);
        *lock(&self.last_scan) = summary.clone();
        info!("deep scan: {}", summary);
        Ok(summary)
    }

    /// Raw characteristics of one device.
    pub fn characteristics(&self, device_id: &str) -> Result<Vec<String>> {
        self.sink
            .characteristics(device_id)
            .map_err(|source| ControlError::HardwareCallFailed {
                device_id: device_id.to_owned(),
                source,
            })
    }

    /// Best-effort hardware status, e.g. `ID:0 ON`.
    pub fn status(&self) -> String {
        self.status.get()
    }

    /// Listener for platforms that deliver torch notifications outside the
    /// sink.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Device and mode of the last applied request.  `None` after a failed
    /// apply, and for a PWM mode once the engine has stopped on its own.
    pub fn active_mode(&self) -> Option<(String, ResolvedMode)> {
        let active = lock(&self.active);
        let mode = active.mode?;
        if matches!(mode, ResolvedMode::Pwm(_)) && !self.engine.is_armed() {
            return None;
        }
        active.device_id.clone().map(|id| (id, mode))
    }

    pub fn pwm_state(&self) -> Option<PwmState> {
        self.engine.state()
    }

    pub fn pwm_stats(&self) -> PwmStats {
        self.engine.stats()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Disarm PWM, stop the worker and switch the PWM device off.
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let _active = lock(&self.active);
        let pwm = self.engine.state();
        self.engine.shutdown();
        if let Some(state) = pwm {
            self.release(&state.device_id);
        }
        self.events.emit(&AppEvent::Shutdown);
        info!("IntensityController shut down");
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate a mode into sink / engine calls.  Returns the mode that was
    /// actually applied (a native level may degrade to `BinaryOn`).
    fn apply(&self, device_id: &str, mode: ResolvedMode) -> Result<ResolvedMode> {
        let pwm_before = self.engine.state();
        let other_pwm_device = pwm_before
            .as_ref()
            .map(|s| s.device_id.as_str())
            .filter(|id| *id != device_id);

        if !matches!(mode, ResolvedMode::Pwm(_)) || other_pwm_device.is_some() {
            self.engine.disarm();
        }
        if let Some(previous) = other_pwm_device {
            self.release(previous);
        }

        match mode {
            ResolvedMode::Off => self.binary(device_id, false).map(|()| mode),
            ResolvedMode::BinaryOn => self.binary(device_id, true).map(|()| mode),
            ResolvedMode::NativeLevel(level) => self.native(device_id, level),
            ResolvedMode::Pwm(duty) => self.engine.arm(device_id, duty).map(|_| mode),
        }
    }

    fn binary(&self, device_id: &str, on: bool) -> Result<()> {
        self.sink
            .set_binary(device_id, on)
            .map_err(|source| ControlError::HardwareCallFailed {
                device_id: device_id.to_owned(),
                source,
            })
    }

    /// Native strength with exactly one graduated→binary fallback.
    fn native(&self, device_id: &str, level: u32) -> Result<ResolvedMode> {
        match self.sink.set_level(device_id, level) {
            Ok(()) => Ok(ResolvedMode::NativeLevel(level)),
            Err(e) => {
                warn!(
                    "native level {} rejected on '{}' ({}), falling back to full on",
                    level, device_id, e
                );
                self.events.emit(&AppEvent::FallbackToBinary {
                    device_id: device_id.to_owned(),
                    level,
                });
                self.binary(device_id, true).map(|()| ResolvedMode::BinaryOn)
            }
        }
    }

    /// Switch a device off that is no longer the target; failures are only
    /// logged.
    fn release(&self, device_id: &str) {
        if let Err(e) = self.sink.set_binary(device_id, false) {
            warn!("could not switch '{}' off: {}", device_id, e);
        }
    }

    fn probe(&self) -> Result<Vec<DeviceRecord>> {
        let mut cache = lock(&self.probe_cache);
        if let Some(devices) = cache.as_ref() {
            return Ok(devices.clone());
        }
        let devices = self.fresh_probe()?;
        *cache = Some(devices.clone());
        Ok(devices)
    }

    fn fresh_probe(&self) -> Result<Vec<DeviceRecord>> {
        let reported = self.sink.probe().map_err(ControlError::Probe)?;
        Ok(match self.config.extended_probe_max_id {
            Some(max_id) => ExtendedProbe::new(self.sink.as_ref(), max_id).run(reported),
            None => reported,
        })
    }
}

impl<S: HardwareSink + 'static> Drop for IntensityController<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
