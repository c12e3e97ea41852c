//! Host time adapter.
//!
//! [`ThreadSleeper`] holds PWM phases with `std::thread::sleep`.  Timing
//! accuracy is whatever the OS scheduler gives a normal thread, which is
//! enough for a 50 Hz visual dimming loop.

use std::time::Duration;

use crate::app::ports::Sleeper;

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
