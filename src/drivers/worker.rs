//! Named worker thread spawning.
//!
//! The PWM loop runs on its own thread so toggle timing never depends on
//! what the request thread is doing.  Spawn failures are returned, not
//! panicked on: the controller reports them as
//! [`ControlError::Worker`](crate::error::ControlError::Worker).

use std::io;
use std::thread::JoinHandle;

/// Spawn a named thread with an explicit stack size.
pub fn spawn_worker(
    name: &str,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    log::info!("Spawning '{}' (stack={}KB)", name, stack_kb);

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
