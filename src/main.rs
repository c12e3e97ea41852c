//! `torchd`: torch intensity daemon.
//!
//! Reads one JSON request per line on stdin and answers on stdout.
//!
//! ```text
//! torchd [--sim] [CONFIG.json]
//! ```
//!
//! The config path may also come from `TORCHD_CONFIG`.  Logging goes to
//! stderr and is filtered with `RUST_LOG` (default `info`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use torchdim::adapters::log_sink::LogEventSink;
use torchdim::adapters::sim::SimSink;
use torchdim::adapters::sysfs_led::SysfsLedSink;
use torchdim::app::ports::HardwareSink;
use torchdim::config::{Backend, ControllerConfig};
use torchdim::rpc::Dispatcher;
use torchdim::IntensityController;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  torchd v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut force_sim = false;
    let mut config_path = std::env::var_os("TORCHD_CONFIG").map(PathBuf::from);
    for arg in std::env::args_os().skip(1) {
        if arg == "--sim" {
            force_sim = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let mut config = match &config_path {
        Some(path) => ControllerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            info!("No config given, using defaults");
            ControllerConfig::default()
        }
    };
    if force_sim {
        config.backend = Backend::Sim;
        config.validate().context("sim backend")?;
    }

    match config.backend {
        Backend::Sim => {
            let sink = SimSink::new(config.sim_devices.clone());
            serve(Arc::new(sink), config)
        }
        Backend::Sysfs => {
            let sink = SysfsLedSink::new(&config.sysfs_root, config.sysfs_name_filter.clone());
            serve(Arc::new(sink), config)
        }
    }
}

fn serve<S: HardwareSink + 'static>(sink: Arc<S>, config: ControllerConfig) -> Result<()> {
    let controller = Arc::new(
        IntensityController::new(sink, config, Arc::new(LogEventSink::new()))
            .context("starting controller")?,
    );
    let dispatcher = Dispatcher::new(Arc::clone(&controller));

    info!("Ready. Reading requests from stdin.");
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = dispatcher.handle_line(&line);
        writeln!(stdout, "{response}").context("writing response")?;
        stdout.flush().context("flushing response")?;
    }

    controller.shutdown();
    let stats = controller.pwm_stats();
    info!(
        "Exit: {} PWM cycles, {} failed phases, {} auto-disarms",
        stats.cycles, stats.failures, stats.auto_disarms
    );
    Ok(())
}
