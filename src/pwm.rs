//! Software PWM engine.
//!
//! Emulates dimming on torches that only switch on and off by toggling
//! them at a fixed period from a dedicated worker thread.
//!
//! ```text
//!            arm()                 arm() (new duty)
//!   ┌──────┐ ────▶ ┌───────┐ ◀──────────────────┐
//!   │ Idle │       │ Armed │ ───────────────────┘
//!   └──────┘ ◀──── └───────┘
//!            disarm() / failure limit
//!
//!   one cycle:  ├── on_time_ms ──┤├──── period - on_time_ms ────┤
//!               set_binary(true)  set_binary(false)
//! ```
//!
//! ## Timing and ownership rules
//!
//! - The worker is the only thread that toggles the device while armed.
//! - `on_time_ms` and `armed` are read at the top of each phase, so a duty
//!   update never cuts a phase short.
//! - Each phase's hardware call is issued while holding the state lock, so
//!   once [`PwmEngine::disarm`] returns no further toggle can start.  The
//!   phase already sleeping is allowed to run out.
//! - A failed hardware call skips that phase; the loop keeps its period.
//!   After `failure_limit` consecutive failures the engine disarms itself.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HardwareSink, Sleeper};
use crate::config::PWM_PERIOD_MS;
use crate::drivers::worker::spawn_worker;
use crate::error::{ControlError, SinkError};

/// Live PWM parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwmState {
    pub device_id: String,
    pub period_ms: u32,
    /// Always `<= period_ms`.
    pub on_time_ms: u32,
    pub armed: bool,
}

/// Engine construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct PwmOptions {
    pub period_ms: u32,
    /// Consecutive failed phases before auto-disarm (0 = never).
    pub failure_limit: u32,
    pub stack_kb: usize,
}

impl Default for PwmOptions {
    fn default() -> Self {
        Self {
            period_ms: PWM_PERIOD_MS,
            failure_limit: 50,
            stack_kb: 32,
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PwmStats {
    /// Completed on+off cycles.
    pub cycles: u64,
    /// Failed hardware calls inside the loop.
    pub failures: u64,
    pub auto_disarms: u32,
}

/// `round(period * duty)`, with duty clamped into `[0, 1]`.
pub fn on_time_ms(period_ms: u32, duty: f64) -> u32 {
    if duty.is_nan() {
        return 0;
    }
    let on = (f64::from(period_ms) * duty.clamp(0.0, 1.0)).round() as u32;
    on.min(period_ms)
}

// ═══════════════════════════════════════════════════════════════
//  Shared state
// ═══════════════════════════════════════════════════════════════

struct Control {
    pwm: PwmState,
    shutdown: bool,
    consecutive_failures: u32,
}

struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
    cycles: AtomicU64,
    failures: AtomicU64,
    auto_disarms: AtomicU32,
    failure_limit: u32,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Book-keep one phase's hardware call.  Returns an event to emit once
    /// the lock is released.
    fn record(&self, ctl: &mut Control, result: Result<(), SinkError>) -> Option<AppEvent> {
        let Err(e) = result else {
            ctl.consecutive_failures = 0;
            return None;
        };

        self.failures.fetch_add(1, Ordering::Relaxed);
        ctl.consecutive_failures = ctl.consecutive_failures.saturating_add(1);
        if ctl.consecutive_failures == 1 {
            warn!(
                "pwm: hardware call failed on '{}': {} (continuing)",
                ctl.pwm.device_id, e
            );
        } else {
            debug!(
                "pwm: failure #{} on '{}': {}",
                ctl.consecutive_failures, ctl.pwm.device_id, e
            );
        }

        if self.failure_limit > 0 && ctl.consecutive_failures >= self.failure_limit {
            ctl.pwm.armed = false;
            self.auto_disarms.fetch_add(1, Ordering::Relaxed);
            warn!(
                "pwm: {} consecutive failures on '{}', disarming",
                ctl.consecutive_failures, ctl.pwm.device_id
            );
            return Some(AppEvent::PwmAutoDisarmed {
                device_id: ctl.pwm.device_id.clone(),
                failures: ctl.consecutive_failures,
            });
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

/// Handle to the PWM worker.  Dropping it stops and joins the worker.
pub struct PwmEngine {
    shared: Arc<Shared>,
    events: Arc<dyn EventSink>,
    period_ms: u32,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PwmEngine {
    /// Spawn the worker thread.  It idles until the first [`arm`](Self::arm).
    pub fn start(
        sink: Arc<dyn HardwareSink>,
        sleeper: Arc<dyn Sleeper>,
        events: Arc<dyn EventSink>,
        options: PwmOptions,
    ) -> Result<Self, ControlError> {
        let period_ms = options.period_ms.max(1);
        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                pwm: PwmState {
                    device_id: String::new(),
                    period_ms,
                    on_time_ms: 0,
                    armed: false,
                },
                shutdown: false,
                consecutive_failures: 0,
            }),
            wake: Condvar::new(),
            cycles: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            auto_disarms: AtomicU32::new(0),
            failure_limit: options.failure_limit,
        });

        let worker_shared = Arc::clone(&shared);
        let worker_events = Arc::clone(&events);
        let handle = spawn_worker("torch-pwm", options.stack_kb, move || {
            run_loop(&worker_shared, sink.as_ref(), sleeper.as_ref(), worker_events.as_ref());
        })
        .map_err(|e| ControlError::Worker(e.to_string()))?;

        Ok(Self {
            shared,
            events,
            period_ms,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Start cycling `device_id` at `duty`, or update a running loop in
    /// place.  Never waits for a loop iteration.  Returns the on-time.
    pub fn arm(&self, device_id: &str, duty: f64) -> Result<u32, ControlError> {
        let on = on_time_ms(self.period_ms, duty);
        let was_armed = {
            let mut ctl = self.shared.lock();
            if ctl.shutdown {
                return Err(ControlError::Worker("engine shut down".into()));
            }
            let was_armed = ctl.pwm.armed;
            if ctl.pwm.device_id != device_id {
                ctl.pwm.device_id = device_id.to_owned();
            }
            ctl.pwm.on_time_ms = on;
            ctl.pwm.armed = true;
            ctl.consecutive_failures = 0;
            was_armed
        };

        if was_armed {
            debug!("pwm: duty update on '{}' -> {}ms/{}ms", device_id, on, self.period_ms);
        } else {
            self.shared.wake.notify_one();
            info!("pwm: armed '{}' at {}ms/{}ms", device_id, on, self.period_ms);
        }
        self.events.emit(&AppEvent::PwmArmed {
            device_id: device_id.to_owned(),
            on_time_ms: on,
        });
        Ok(on)
    }

    /// Stop cycling after the current phase.  Makes no final hardware call;
    /// the caller sets the terminal state.  Returns whether it was armed.
    pub fn disarm(&self) -> bool {
        let was_armed = {
            let mut ctl = self.shared.lock();
            std::mem::replace(&mut ctl.pwm.armed, false)
        };
        if was_armed {
            info!("pwm: disarmed");
            self.events.emit(&AppEvent::PwmDisarmed);
        }
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.shared.lock().pwm.armed
    }

    /// Current parameters, `None` while idle.
    pub fn state(&self) -> Option<PwmState> {
        let ctl = self.shared.lock();
        ctl.pwm.armed.then(|| ctl.pwm.clone())
    }

    pub fn stats(&self) -> PwmStats {
        PwmStats {
            cycles: self.shared.cycles.load(Ordering::Relaxed),
            failures: self.shared.failures.load(Ordering::Relaxed),
            auto_disarms: self.shared.auto_disarms.load(Ordering::Relaxed),
        }
    }

    /// Disarm, stop the worker and wait for it.  Idempotent.
    pub fn shutdown(&self) {
        {
            let mut ctl = self.shared.lock();
            ctl.pwm.armed = false;
            ctl.shutdown = true;
        }
        self.shared.wake.notify_all();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("pwm: worker panicked");
            }
        }
    }
}

impl Drop for PwmEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Worker loop
// ═══════════════════════════════════════════════════════════════

fn run_loop(shared: &Shared, sink: &dyn HardwareSink, sleeper: &dyn Sleeper, events: &dyn EventSink) {
    loop {
        // ── On phase ─────────────────────────────────────────
        let (hold, event) = {
            let mut ctl = shared.lock();
            while !ctl.pwm.armed && !ctl.shutdown {
                ctl = shared
                    .wake
                    .wait(ctl)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if ctl.shutdown {
                break;
            }
            let on = ctl.pwm.on_time_ms;
            let event = if on > 0 {
                let result = sink.set_binary(&ctl.pwm.device_id, true);
                shared.record(&mut ctl, result)
            } else {
                None
            };
            (on, event)
        };
        if let Some(event) = event {
            events.emit(&event);
        }
        if hold > 0 {
            sleeper.sleep(Duration::from_millis(u64::from(hold)));
        }

        // ── Off phase ────────────────────────────────────────
        let (hold, event) = {
            let mut ctl = shared.lock();
            if !ctl.pwm.armed || ctl.shutdown {
                continue;
            }
            let on = ctl.pwm.on_time_ms;
            let period = ctl.pwm.period_ms;
            let event = if on < period {
                let result = sink.set_binary(&ctl.pwm.device_id, false);
                shared.record(&mut ctl, result)
            } else {
                None
            };
            (period - on, event)
        };
        if let Some(event) = event {
            events.emit(&event);
        }
        if hold > 0 {
            sleeper.sleep(Duration::from_millis(u64::from(hold)));
        }

        shared.cycles.fetch_add(1, Ordering::Relaxed);
    }
    debug!("pwm: worker exiting");
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
