//! Linux LED class adapter.
//!
//! Each torch is a directory under `/sys/class/leds` holding a
//! `max_brightness` and a writable `brightness` file.  Devices are given
//! numeric ids in directory-name order at probe time:
//!
//! | `max_brightness` | Record                               |
//! |------------------|--------------------------------------|
//! | 0                | no torch                             |
//! | 1                | binary only                          |
//! | n > 1            | graduated, `max_level = n`           |
//!
//! The kernel offers no change notification for these files, so the
//! adapter reports its own successful writes to the state listener.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::app::model::{DeviceRecord, Facing, HostInfo};
use crate::app::ports::{HardwareSink, StateListener};
use crate::error::SinkError;

pub const FILE_BRIGHTNESS: &str = "brightness";
pub const FILE_MAX_BRIGHTNESS: &str = "max_brightness";

const DMI_VENDOR: &str = "/sys/class/dmi/id/sys_vendor";
const DMI_PRODUCT: &str = "/sys/class/dmi/id/product_name";
const OS_RELEASE: &str = "/proc/sys/kernel/osrelease";

#[derive(Debug, Clone)]
struct LedDir {
    path: PathBuf,
    max: u32,
}

pub struct SysfsLedSink {
    root: PathBuf,
    name_filter: Vec<String>,
    /// Indexed by numeric device id; refreshed on every probe.
    leds: Mutex<Vec<LedDir>>,
    listener: Mutex<Option<Box<dyn StateListener>>>,
}

impl SysfsLedSink {
    pub fn new(root: impl Into<PathBuf>, name_filter: Vec<String>) -> Self {
        Self {
            root: root.into(),
            name_filter,
            leds: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    fn accepts(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.name_filter.is_empty()
            || self
                .name_filter
                .iter()
                .any(|f| name.contains(&f.to_ascii_lowercase()))
    }

    fn scan(&self) -> Result<Vec<LedDir>, SinkError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.accepts(n))
            })
            .collect();
        paths.sort();

        let mut leds = Vec::with_capacity(paths.len());
        for path in paths {
            match read_u32(&path.join(FILE_MAX_BRIGHTNESS)) {
                Ok(max) => leds.push(LedDir { path, max }),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        Ok(leds)
    }

    fn led(&self, id: &str) -> Result<LedDir, SinkError> {
        let unknown = || SinkError::UnknownDevice(id.to_owned());
        let index: usize = id.parse().map_err(|_| unknown())?;
        let mut leds = lock(&self.leds);
        if leds.is_empty() {
            *leds = self.scan()?;
        }
        leds.get(index).cloned().ok_or_else(unknown)
    }

    fn write_brightness(&self, id: &str, led: &LedDir, value: u32) -> Result<(), SinkError> {
        fs::write(led.path.join(FILE_BRIGHTNESS), value.to_string())?;
        debug!("{} <- {}", led.path.display(), value);
        if let Some(listener) = lock(&self.listener).as_ref() {
            listener.on_state_changed(id, value > 0);
        }
        Ok(())
    }
}

impl HardwareSink for SysfsLedSink {
    fn probe(&self) -> Result<Vec<DeviceRecord>, SinkError> {
        let leds = self.scan()?;
        let records = leds
            .iter()
            .enumerate()
            .map(|(i, led)| DeviceRecord {
                id: i.to_string(),
                has_binary_control: led.max > 0,
                has_graduated_control: led.max > 1,
                max_level: led.max,
                facing: facing_of(&led.path),
            })
            .collect::<Vec<_>>();
        info!("sysfs probe: {} LED(s) under {}", records.len(), self.root.display());
        *lock(&self.leds) = leds;
        Ok(records)
    }

    fn set_binary(&self, id: &str, on: bool) -> Result<(), SinkError> {
        let led = self.led(id)?;
        if led.max == 0 {
            return Err(SinkError::Device(format!("'{id}' has no torch")));
        }
        self.write_brightness(id, &led, if on { led.max } else { 0 })
    }

    fn set_level(&self, id: &str, level: u32) -> Result<(), SinkError> {
        let led = self.led(id)?;
        if led.max <= 1 {
            return Err(SinkError::Unsupported);
        }
        // The kernel clamps values above max_brightness itself.
        self.write_brightness(id, &led, level)
    }

    fn characteristics(&self, id: &str) -> Result<Vec<String>, SinkError> {
        let led = self.led(id)?;
        let mut names: Vec<String> = fs::read_dir(&led.path)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| match fs::read_to_string(led.path.join(&name)) {
                Ok(value) => format!("{} = {}", name, value.trim()),
                Err(_) => format!("{} = <unreadable>", name),
            })
            .collect())
    }

    fn host_info(&self) -> HostInfo {
        let fallback = HostInfo::default();
        HostInfo {
            manufacturer: read_trimmed(Path::new(DMI_VENDOR)).unwrap_or(fallback.manufacturer),
            model: read_trimmed(Path::new(DMI_PRODUCT)).unwrap_or(fallback.model),
            os_version: read_trimmed(Path::new(OS_RELEASE)).unwrap_or(fallback.os_version),
        }
    }

    fn set_state_listener(&self, listener: Box<dyn StateListener>) {
        *lock(&self.listener) = Some(listener);
    }
}

fn facing_of(path: &Path) -> Facing {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if name.contains("front") {
        Facing::Front
    } else if name.contains("rear") || name.contains("back") {
        Facing::Back
    } else {
        Facing::Unknown
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn read_u32(path: &Path) -> Result<u32, SinkError> {
    let raw = fs::read_to_string(path)?;
    raw.trim()
        .parse()
        .map_err(|_| SinkError::Io(format!("{}: not a number: {:?}", path.display(), raw.trim())))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
