//! Mock hardware adapter for integration tests.
//!
//! Records every sink call so tests can assert on the full command
//! history without touching real LEDs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use torchdim::app::events::AppEvent;
use torchdim::app::model::{DeviceRecord, Facing};
use torchdim::app::ports::{EventSink, HardwareSink, Sleeper, StateListener};
use torchdim::SinkError;

// ── Sink call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Probe,
    Binary { id: String, on: bool },
    Level { id: String, level: u32 },
}

pub fn binary(id: &str, on: bool) -> SinkCall {
    SinkCall::Binary { id: id.into(), on }
}

pub fn level(id: &str, level: u32) -> SinkCall {
    SinkCall::Level { id: id.into(), level }
}

// ── Probe fixtures ────────────────────────────────────────────

/// Graduated back torch "0" (max 10) and torchless front camera "1".
pub fn phone_probe() -> Vec<DeviceRecord> {
    vec![
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
    ]
}

/// Binary-only back torch "0".
pub fn binary_probe() -> Vec<DeviceRecord> {
    vec![DeviceRecord {
        id: "0".into(),
        has_binary_control: true,
        has_graduated_control: false,
        max_level: 1,
        facing: Facing::Back,
    }]
}

// ── MockSink ──────────────────────────────────────────────────

pub struct MockSink {
    pub devices: Vec<DeviceRecord>,
    pub hidden: Vec<DeviceRecord>,
    calls: Mutex<Vec<SinkCall>>,
    /// Every `set_level` returns `Unsupported`.
    pub reject_levels: AtomicBool,
    /// Every `set_binary` fails with an I/O error.
    pub fail_binary: AtomicBool,
    pub probes: AtomicUsize,
    listener: Mutex<Option<Box<dyn StateListener>>>,
}

#[allow(dead_code)]
impl MockSink {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices,
            hidden: Vec::new(),
            calls: Mutex::new(Vec::new()),
            reject_levels: AtomicBool::new(false),
            fail_binary: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
            listener: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than probes.
    pub fn writes(&self) -> Vec<SinkCall> {
        self.calls()
            .into_iter()
            .filter(|c| *c != SinkCall::Probe)
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn last_write(&self) -> Option<SinkCall> {
        self.writes().pop()
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn notify(&self, id: &str, on: bool) {
        if let Some(listener) = self.listener.lock().unwrap().as_ref() {
            listener.on_state_changed(id, on);
        }
    }
}

impl HardwareSink for MockSink {
    fn probe(&self) -> Result<Vec<DeviceRecord>, SinkError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.push(SinkCall::Probe);
        Ok(self.devices.clone())
    }

    fn set_binary(&self, id: &str, on: bool) -> Result<(), SinkError> {
        self.push(binary(id, on));
        if self.fail_binary.load(Ordering::SeqCst) {
            return Err(SinkError::Io("mock failure".into()));
        }
        self.notify(id, on);
        Ok(())
    }

    fn set_level(&self, id: &str, lvl: u32) -> Result<(), SinkError> {
        self.push(level(id, lvl));
        if self.reject_levels.load(Ordering::SeqCst) {
            return Err(SinkError::Unsupported);
        }
        self.notify(id, lvl > 0);
        Ok(())
    }

    fn describe(&self, id: &str) -> Option<DeviceRecord> {
        self.hidden.iter().find(|d| d.id == id).cloned()
    }

    fn characteristics(&self, id: &str) -> Result<Vec<String>, SinkError> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| vec![format!("max_level = {}", d.max_level)])
            .ok_or_else(|| SinkError::UnknownDevice(id.into()))
    }

    fn set_state_listener(&self, listener: Box<dyn StateListener>) {
        *self.listener.lock().unwrap() = Some(listener);
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, pred: impl Fn(&AppEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(pred)
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Sleeper ───────────────────────────────────────────────────

/// Records requested holds and sleeps only a fraction of them so PWM
/// tests cycle quickly.
#[derive(Default)]
pub struct FastSleeper {
    holds: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl FastSleeper {
    pub fn holds(&self) -> Vec<u64> {
        self.holds.lock().unwrap().clone()
    }
}

impl Sleeper for FastSleeper {
    fn sleep(&self, duration: Duration) {
        self.holds.lock().unwrap().push(duration.as_millis() as u64);
        std::thread::sleep(Duration::from_micros(200));
    }
}

/// Poll `cond` until it holds or two seconds pass.
#[allow(dead_code)]
pub fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ── Harness ───────────────────────────────────────────────────

pub struct Rig {
    pub sink: Arc<MockSink>,
    pub events: Arc<EventLog>,
    pub sleeper: Arc<FastSleeper>,
    pub controller: torchdim::IntensityController<MockSink>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self::with(MockSink::new(devices), torchdim::config::ControllerConfig::default())
    }

    pub fn with(sink: MockSink, config: torchdim::config::ControllerConfig) -> Self {
        let sink = Arc::new(sink);
        let events = Arc::new(EventLog::default());
        let sleeper = Arc::new(FastSleeper::default());
        let controller = torchdim::IntensityController::with_sleeper(
            Arc::clone(&sink),
            config,
            events.clone(),
            sleeper.clone(),
        )
        .expect("controller starts");
        Self {
            sink,
            events,
            sleeper,
            controller,
        }
    }
}
