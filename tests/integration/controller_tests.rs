//! Integration tests for the request → catalog → mapper → sink pipeline.
//!
//! These run on the host and drive a real `IntensityController` against
//! the recording `MockSink`.

use std::sync::atomic::Ordering;
use std::time::Duration;

use torchdim::app::events::AppEvent;
use torchdim::app::model::{DeviceRecord, Facing, IntensityRequest, ResolvedMode};
use torchdim::config::{ControllerConfig, DeviceOverride};
use torchdim::{ControlError, SinkError};

use super::mock_hw::{MockSink, Rig, SinkCall, binary, binary_probe, level, phone_probe, wait_for};

// ── Native levels ─────────────────────────────────────────────

#[test]
fn fraction_on_graduated_torch_uses_native_level() {
    let rig = Rig::new(phone_probe());

    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.35))
        .unwrap();

    assert_eq!(report.device_id, "0");
    assert_eq!(report.mode, ResolvedMode::NativeLevel(4));
    assert_eq!(rig.sink.writes(), vec![level("0", 4)]);
    assert_eq!(report.hardware_status, "ID:0 ON");
    assert_eq!(report.status_line(), "ID:0 ON");
}

#[test]
fn full_intensity_uses_max_level() {
    let rig = Rig::new(phone_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0))
        .unwrap();
    assert_eq!(report.mode, ResolvedMode::NativeLevel(10));
    assert_eq!(rig.sink.last_write(), Some(level("0", 10)));
}

#[test]
fn zero_switches_off() {
    let rig = Rig::new(phone_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(1.0))
        .unwrap();
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.0))
        .unwrap();
    assert_eq!(report.mode, ResolvedMode::Off);
    assert_eq!(rig.sink.last_write(), Some(binary("0", false)));
    assert_eq!(rig.controller.status(), "ID:0 OFF");
}

#[test]
fn binary_only_torch_full_on() {
    let rig = Rig::new(binary_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0))
        .unwrap();
    assert_eq!(report.mode, ResolvedMode::BinaryOn);
    assert_eq!(rig.sink.writes(), vec![binary("0", true)]);
}

// ── Fallback and failures ─────────────────────────────────────

#[test]
fn rejected_level_falls_back_to_binary_once() {
    let sink = MockSink::new(phone_probe());
    sink.reject_levels.store(true, Ordering::SeqCst);
    let rig = Rig::with(sink, ControllerConfig::default());

    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.35))
        .unwrap();

    assert_eq!(report.mode, ResolvedMode::BinaryOn);
    assert_eq!(rig.sink.writes(), vec![level("0", 4), binary("0", true)]);
    assert!(rig.events.contains(|e| matches!(
        e,
        AppEvent::FallbackToBinary { device_id, level: 4 } if device_id == "0"
    )));
}

#[test]
fn failed_fallback_is_reported_without_retry() {
    let sink = MockSink::new(phone_probe());
    sink.reject_levels.store(true, Ordering::SeqCst);
    sink.fail_binary.store(true, Ordering::SeqCst);
    let rig = Rig::with(sink, ControllerConfig::default());

    let err = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap_err();

    assert_eq!(
        err,
        ControlError::HardwareCallFailed {
            device_id: "0".into(),
            source: SinkError::Io("mock failure".into()),
        }
    );
    assert_eq!(rig.sink.writes().len(), 2);
}

#[test]
fn binary_failure_is_reported() {
    let sink = MockSink::new(binary_probe());
    sink.fail_binary.store(true, Ordering::SeqCst);
    let rig = Rig::with(sink, ControllerConfig::default());

    let err = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0))
        .unwrap_err();
    assert!(matches!(err, ControlError::HardwareCallFailed { .. }));
    assert_eq!(rig.controller.status(), "Unknown");
}

#[test]
fn failed_off_after_pwm_clears_active_mode() {
    let rig = Rig::new(binary_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    assert!(wait_for(|| rig.controller.pwm_stats().cycles >= 1));
    assert_eq!(
        rig.controller.active_mode(),
        Some(("0".into(), ResolvedMode::Pwm(0.5)))
    );

    rig.sink.fail_binary.store(true, Ordering::SeqCst);
    let err = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.0))
        .unwrap_err();

    assert!(matches!(err, ControlError::HardwareCallFailed { .. }));
    assert!(rig.controller.pwm_state().is_none());
    assert_eq!(rig.controller.active_mode(), None);
}

#[test]
fn pwm_auto_disarm_clears_active_mode() {
    let config = ControllerConfig {
        pwm_failure_limit: 3,
        ..ControllerConfig::default()
    };
    let rig = Rig::with(MockSink::new(binary_probe()), config);
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();

    rig.sink.fail_binary.store(true, Ordering::SeqCst);
    assert!(wait_for(|| rig.controller.pwm_state().is_none()));
    assert_eq!(rig.controller.active_mode(), None);
}

// ── Device resolution ─────────────────────────────────────────

#[test]
fn no_torch_anywhere_is_not_found() {
    let front_only = vec![DeviceRecord {
        id: "1".into(),
        has_binary_control: false,
        has_graduated_control: false,
        max_level: 0,
        facing: Facing::Front,
    }];
    let rig = Rig::new(front_only);
    assert_eq!(
        rig.controller.set_intensity(&IntensityRequest::value(1.0)),
        Err(ControlError::NoDeviceFound)
    );
    assert!(rig.sink.writes().is_empty());
}

#[test]
fn requested_device_is_honoured() {
    let rig = Rig::new(phone_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0).on_device("1"))
        .unwrap();
    assert_eq!(report.device_id, "1");
    assert_eq!(rig.sink.writes(), vec![binary("1", true)]);
}

#[test]
fn unlisted_device_falls_through_by_default() {
    let rig = Rig::new(phone_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0).on_device("7"))
        .unwrap();
    assert_eq!(report.device_id, "0");
}

#[test]
fn unlisted_device_trusted_when_configured() {
    let config = ControllerConfig {
        device_override: DeviceOverride::Trust,
        ..ControllerConfig::default()
    };
    let rig = Rig::with(MockSink::new(phone_probe()), config);
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0).on_device("7"))
        .unwrap();
    assert_eq!(report.device_id, "7");
    assert_eq!(report.mode, ResolvedMode::BinaryOn);
    assert_eq!(rig.sink.writes(), vec![binary("7", true)]);
}

#[test]
fn long_trusted_id_keeps_state_in_status() {
    let config = ControllerConfig {
        device_override: DeviceOverride::Trust,
        ..ControllerConfig::default()
    };
    let rig = Rig::with(MockSink::new(phone_probe()), config);
    let id = "x".repeat(58);

    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.0).on_device(&id))
        .unwrap();

    assert_eq!(report.device_id, id);
    assert!(report.hardware_status.ends_with(" OFF"), "{}", report.hardware_status);
}

// ── Forced levels and validation ──────────────────────────────

#[test]
fn forced_level_passes_through() {
    let rig = Rig::new(phone_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::forced(7))
        .unwrap();
    assert_eq!(report.mode, ResolvedMode::NativeLevel(7));
    assert_eq!(rig.sink.writes(), vec![level("0", 7)]);
}

#[test]
fn forced_level_without_value_on_binary_torch_is_invalid() {
    let rig = Rig::new(binary_probe());
    let err = rig
        .controller
        .set_intensity(&IntensityRequest::forced(7))
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidRequest(_)));
    assert!(rig.sink.writes().is_empty());
}

#[test]
fn forced_level_on_binary_torch_uses_value() {
    let rig = Rig::new(binary_probe());
    let mut req = IntensityRequest::forced(7);
    req.value = Some(1.0);
    let report = rig.controller.set_intensity(&req).unwrap();
    assert_eq!(report.mode, ResolvedMode::BinaryOn);
}

#[test]
fn empty_request_is_rejected_before_probing() {
    let rig = Rig::new(phone_probe());
    let err = rig
        .controller
        .set_intensity(&IntensityRequest::default())
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidRequest(_)));
    assert_eq!(rig.sink.probes.load(Ordering::SeqCst), 0);
}

// ── Probe cache and diagnostics ───────────────────────────────

#[test]
fn probe_runs_once_until_deep_scan() {
    let rig = Rig::new(phone_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(1.0))
        .unwrap();
    rig.controller
        .set_intensity(&IntensityRequest::value(0.0))
        .unwrap();
    assert_eq!(rig.sink.probes.load(Ordering::SeqCst), 1);

    let summary = rig.controller.deep_scan().unwrap();
    assert_eq!(summary, "IDs: 0:⚡m10, 1:m0");
    assert_eq!(rig.sink.probes.load(Ordering::SeqCst), 2);
}

#[test]
fn deep_scan_finds_hidden_devices() {
    let mut sink = MockSink::new(phone_probe());
    sink.hidden = vec![DeviceRecord::assumed_binary("2")];
    let config = ControllerConfig {
        extended_probe_max_id: Some(3),
        ..ControllerConfig::default()
    };
    let rig = Rig::with(sink, config);

    let summary = rig.controller.deep_scan().unwrap();
    assert_eq!(summary, "IDs: 0:⚡m10, 1:m0, 2:⚡m1");

    let info = rig.controller.hardware_info().unwrap();
    assert_eq!(info.devices.len(), 3);
    assert_eq!(info.scan_result, summary);
}

#[test]
fn hardware_info_reports_probe_and_status() {
    let rig = Rig::new(phone_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    let info = rig.controller.hardware_info().unwrap();
    assert_eq!(info.devices, phone_probe());
    assert_eq!(info.torch_status, "ID:0 ON");
    assert_eq!(info.host.manufacturer, "unknown");
}

#[test]
fn characteristics_of_unknown_device_fail() {
    let rig = Rig::new(phone_probe());
    assert_eq!(
        rig.controller.characteristics("0").unwrap(),
        vec!["max_level = 10"]
    );
    assert!(matches!(
        rig.controller.characteristics("9"),
        Err(ControlError::HardwareCallFailed { .. })
    ));
}

// ── Software PWM ──────────────────────────────────────────────

#[test]
fn fraction_on_binary_torch_arms_pwm() {
    let rig = Rig::new(binary_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.35))
        .unwrap();

    assert_eq!(report.mode, ResolvedMode::Pwm(0.35));
    assert_eq!(report.status_line(), "PWM ACTIVE (35%)");
    let state = rig.controller.pwm_state().unwrap();
    assert_eq!(state.on_time_ms, 7);
    assert_eq!(state.period_ms, 20);

    assert!(wait_for(|| {
        let writes = rig.sink.writes();
        writes.contains(&binary("0", true)) && writes.contains(&binary("0", false))
    }));
}

#[test]
fn pwm_hint_dims_graduated_torch_in_software() {
    let rig = Rig::new(phone_probe());
    let report = rig
        .controller
        .set_intensity(&IntensityRequest::value(0.35).with_pwm())
        .unwrap();
    assert_eq!(report.mode, ResolvedMode::Pwm(0.35));
    assert!(wait_for(|| rig.controller.pwm_stats().cycles >= 1));
    assert!(rig.sink.writes().iter().all(|c| matches!(c, SinkCall::Binary { .. })));
}

#[test]
fn off_after_pwm_stops_toggling() {
    let rig = Rig::new(binary_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    assert!(wait_for(|| rig.controller.pwm_stats().cycles >= 2));

    rig.controller
        .set_intensity(&IntensityRequest::value(0.0))
        .unwrap();
    assert!(rig.controller.pwm_state().is_none());
    assert_eq!(rig.sink.last_write(), Some(binary("0", false)));

    let settled = rig.sink.writes().len();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rig.sink.writes().len(), settled);
}

#[test]
fn native_request_disarms_pwm() {
    let rig = Rig::new(phone_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5).with_pwm())
        .unwrap();
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    assert!(rig.controller.pwm_state().is_none());
    assert_eq!(rig.sink.last_write(), Some(level("0", 5)));
    assert!(rig.events.contains(|e| *e == AppEvent::PwmDisarmed));
}

#[test]
fn switching_pwm_device_turns_previous_off() {
    let mut probe = binary_probe();
    probe.push(DeviceRecord {
        id: "2".into(),
        facing: Facing::External,
        ..DeviceRecord::assumed_binary("2")
    });
    let rig = Rig::new(probe);

    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    assert!(wait_for(|| rig.controller.pwm_stats().cycles >= 1));

    rig.controller
        .set_intensity(&IntensityRequest::value(0.5).on_device("2"))
        .unwrap();
    assert_eq!(rig.controller.pwm_state().unwrap().device_id, "2");
    assert!(rig.sink.writes().contains(&binary("0", false)));
    assert!(wait_for(|| rig.sink.writes().contains(&binary("2", true))));
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn shutdown_disarms_and_switches_off() {
    let rig = Rig::new(binary_probe());
    rig.controller
        .set_intensity(&IntensityRequest::value(0.5))
        .unwrap();
    assert!(wait_for(|| rig.controller.pwm_stats().cycles >= 1));

    rig.controller.shutdown();
    rig.controller.shutdown();

    assert!(rig.controller.pwm_state().is_none());
    assert_eq!(rig.sink.last_write(), Some(binary("0", false)));
    let shutdowns = rig
        .events
        .events()
        .into_iter()
        .filter(|e| *e == AppEvent::Shutdown)
        .count();
    assert_eq!(shutdowns, 1);
    assert!(rig
        .controller
        .set_intensity(&IntensityRequest::value(1.0))
        .is_err());
}

#[test]
fn last_request_wins_across_threads() {
    let rig = Rig::new(phone_probe());
    std::thread::scope(|s| {
        for i in 1..=8u32 {
            let controller = &rig.controller;
            s.spawn(move || {
                controller
                    .set_intensity(&IntensityRequest::value(f64::from(i) / 10.0))
                    .unwrap();
            });
        }
    });

    // Whatever ran last is what the controller recorded and the sink saw.
    let (id, mode) = rig.controller.active_mode().unwrap();
    assert_eq!(id, "0");
    let ResolvedMode::NativeLevel(n) = mode else {
        panic!("expected a native level, got {mode:?}");
    };
    assert_eq!(rig.sink.last_write(), Some(level("0", n)));
}
