//! Best-effort hardware status string.
//!
//! Written by whatever thread delivers torch state notifications, read on
//! the request path.  Reads never wait for a writer: if the lock is busy
//! the previous snapshot is returned instead.

use core::fmt::Write as _;
use std::sync::{Arc, Mutex, TryLockError};

use super::events::AppEvent;
use super::ports::{EventSink, StateListener};

const STATUS_CAPACITY: usize = 64;

/// Fits `ID:<id> OFF`; longer ids are shortened.
pub type StatusText = heapless::String<STATUS_CAPACITY>;

const UNKNOWN: &str = "Unknown";

#[derive(Clone)]
pub struct StatusHandle {
    inner: Arc<Inner>,
}

struct Inner {
    current: Mutex<StatusText>,
    /// Copy served while `current` is being written.
    snapshot: Mutex<StatusText>,
    events: Arc<dyn EventSink>,
}

impl StatusHandle {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        let mut text = StatusText::new();
        let _ = text.push_str(UNKNOWN);
        Self {
            inner: Arc::new(Inner {
                current: Mutex::new(text.clone()),
                snapshot: Mutex::new(text),
                events,
            }),
        }
    }

    /// Latest known status, e.g. `ID:0 ON`.
    pub fn get(&self) -> String {
        match self.inner.current.try_lock() {
            Ok(text) => text.as_str().to_owned(),
            Err(TryLockError::Poisoned(p)) => p.into_inner().as_str().to_owned(),
            Err(TryLockError::WouldBlock) => self
                .inner
                .snapshot
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .as_str()
                .to_owned(),
        }
    }

    fn set(&self, text: StatusText) {
        {
            let mut snapshot = self
                .inner
                .snapshot
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *snapshot = text.clone();
        }
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *current = text;
    }
}

/// `ID:<id> ON|OFF`; over-long ids are cut on a char boundary so the state
/// word always fits.
fn status_text(id: &str, on: bool) -> StatusText {
    const PREFIX: &str = "ID:";
    let state = if on { " ON" } else { " OFF" };
    let room = STATUS_CAPACITY - PREFIX.len() - state.len();

    let mut end = id.len().min(room);
    while !id.is_char_boundary(end) {
        end -= 1;
    }

    let mut text = StatusText::new();
    // Cannot overflow: the parts were sized to the capacity above.
    let _ = write!(text, "{}{}{}", PREFIX, &id[..end], state);
    text
}

impl StateListener for StatusHandle {
    fn on_state_changed(&self, id: &str, on: bool) {
        self.set(status_text(id, on));
        self.inner.events.emit(&AppEvent::HardwareStateChanged {
            device_id: id.to_owned(),
            on,
        });
    }
}
