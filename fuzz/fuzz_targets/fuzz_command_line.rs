//! Fuzz target: `Dispatcher::handle_line`
//!
//! Drives arbitrary text into the JSON line dispatcher over the simulated
//! sink and asserts that every line gets a JSON answer carrying a
//! `success` flag, never a panic.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use std::sync::{Arc, OnceLock};

use libfuzzer_sys::fuzz_target;
use torchdim::adapters::sim::SimSink;
use torchdim::app::ports::NullEventSink;
use torchdim::config::ControllerConfig;
use torchdim::rpc::Dispatcher;
use torchdim::IntensityController;

fn dispatcher() -> &'static Dispatcher<SimSink> {
    static DISPATCHER: OnceLock<Dispatcher<SimSink>> = OnceLock::new();
    DISPATCHER.get_or_init(|| {
        let config = ControllerConfig::default();
        let sink = Arc::new(SimSink::new(config.sim_devices.clone()));
        let controller = IntensityController::new(sink, config, Arc::new(NullEventSink))
            .expect("controller starts");
        Dispatcher::new(Arc::new(controller))
    })
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let response = dispatcher().handle_line(line);
    let json: serde_json::Value =
        serde_json::from_str(&response).expect("dispatcher answers with JSON");
    assert!(json["success"].is_boolean(), "missing success flag: {response}");
});
