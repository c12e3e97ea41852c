//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                 |
//! |-------------|---------------|-----------------------------|
//! | `log_sink`  | EventSink     | `log` facade                |
//! | `sim`       | HardwareSink  | In-memory torch simulator   |
//! | `sysfs_led` | HardwareSink  | Linux `/sys/class/leds`     |
//! | `time`      | Sleeper       | `std::thread::sleep`        |
//!
//! The GPIO torch lives in [`crate::drivers::gpio_torch`].

pub mod log_sink;
pub mod sim;
pub mod sysfs_led;
pub mod time;
