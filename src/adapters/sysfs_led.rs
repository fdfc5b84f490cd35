//! Linux LED class adapter.
//!
//! Maps the `{State, DutyOn, Period}` property model onto
//! `/sys/class/leds/<name>/`:
//!
//! | State | trigger | other files                                   |
//! |-------|---------|-----------------------------------------------|
//! | Off   | `none`  | `brightness = 0`                              |
//! | On    | `none`  | `brightness = max_brightness`                 |
//! | Blink | `timer` | `delay_on`, `delay_off` from DutyOn / Period  |
//!
//! The kernel only exposes the delay files while the timer trigger is
//! active, so DutyOn/Period writes are cached and applied when the LED
//! enters Blink (or immediately if it already blinks).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{LedError, LedProperty, PhysicalLedPort, PropertyValue};
use crate::layout::LedState;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/leds";

const DEFAULT_DUTY_ON: u8 = 50;
const DEFAULT_PERIOD_MS: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timing {
    duty_on: u8,
    period_ms: u16,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duty_on: DEFAULT_DUTY_ON,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

impl Timing {
    /// `(delay_on, delay_off)` in milliseconds.
    fn delays(self) -> (u32, u32) {
        let period = u32::from(self.period_ms);
        let on = period * u32::from(self.duty_on) / 100;
        (on, period - on)
    }
}

pub struct SysfsLedAdapter {
    root: PathBuf,
    timing: HashMap<String, Timing>,
}

impl SysfsLedAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("SysfsLedAdapter: {}", root.display());
        Self {
            root,
            timing: HashMap::new(),
        }
    }

    fn led_dir(&self, led: &str) -> Result<PathBuf, LedError> {
        if led.is_empty() || led.contains('/') || led == "." || led == ".." {
            return Err(LedError::NotFound);
        }
        let dir = self.root.join(led);
        if dir.is_dir() { Ok(dir) } else { Err(LedError::NotFound) }
    }

    fn state(&self, dir: &Path) -> Result<LedState, LedError> {
        if active_trigger(&read_attr(dir, "trigger")?) == "timer" {
            return Ok(LedState::Blink);
        }
        let brightness: u32 = parse_attr(dir, "brightness")?;
        Ok(if brightness > 0 { LedState::On } else { LedState::Off })
    }

    /// Cached timing, else derived from the live delay files, else defaults.
    fn timing(&self, led: &str, dir: &Path) -> Timing {
        if let Some(t) = self.timing.get(led) {
            return *t;
        }
        // Kernel delays are unsigned long; widen before summing.
        let on: Result<u64, _> = parse_attr(dir, "delay_on");
        let off: Result<u64, _> = parse_attr(dir, "delay_off");
        match (on, off) {
            (Ok(on), Ok(off)) => {
                let period = on.saturating_add(off);
                if period == 0 {
                    return Timing::default();
                }
                Timing {
                    duty_on: (u128::from(on) * 100 / u128::from(period)) as u8,
                    period_ms: period.min(u64::from(u16::MAX)) as u16,
                }
            }
            _ => Timing::default(),
        }
    }

    fn write_state(&self, led: &str, dir: &Path, state: LedState) -> Result<(), LedError> {
        match state {
            LedState::Off => {
                write_attr(dir, "trigger", "none")?;
                write_attr(dir, "brightness", "0")
            }
            LedState::On => {
                let max: u32 = parse_attr(dir, "max_brightness").unwrap_or(1);
                write_attr(dir, "trigger", "none")?;
                write_attr(dir, "brightness", &max.to_string())
            }
            LedState::Blink => {
                write_attr(dir, "trigger", "timer")?;
                self.write_delays(dir, self.timing(led, dir))
            }
        }
    }

    fn write_delays(&self, dir: &Path, timing: Timing) -> Result<(), LedError> {
        let (on, off) = timing.delays();
        write_attr(dir, "delay_on", &on.to_string())?;
        write_attr(dir, "delay_off", &off.to_string())
    }

    fn update_timing(&mut self, led: &str, dir: &Path, update: impl FnOnce(&mut Timing)) -> Result<(), LedError> {
        let mut timing = self.timing(led, dir);
        update(&mut timing);
        self.timing.insert(led.to_owned(), timing);
        if self.state(dir)? == LedState::Blink {
            self.write_delays(dir, timing)?;
        }
        Ok(())
    }
}

impl PhysicalLedPort for SysfsLedAdapter {
    fn get(&self, led: &str, property: LedProperty) -> Result<PropertyValue, LedError> {
        let dir = self.led_dir(led)?;
        Ok(match property {
            LedProperty::State => PropertyValue::State(self.state(&dir)?),
            LedProperty::DutyOn => PropertyValue::DutyOn(self.timing(led, &dir).duty_on),
            LedProperty::Period => PropertyValue::Period(self.timing(led, &dir).period_ms),
        })
    }

    fn set(&mut self, led: &str, value: PropertyValue) -> Result<(), LedError> {
        let dir = self.led_dir(led)?;
        debug!("sysfs {} <- {:?}", led, value);
        match value {
            PropertyValue::State(state) => self.write_state(led, &dir, state),
            PropertyValue::DutyOn(duty_on) => {
                if duty_on > 100 {
                    return Err(LedError::InvalidValue);
                }
                self.update_timing(led, &dir, |t| t.duty_on = duty_on)
            }
            PropertyValue::Period(period_ms) => self.update_timing(led, &dir, |t| t.period_ms = period_ms),
        }
    }
}

// ── sysfs attribute helpers ───────────────────────────────────

fn read_attr(dir: &Path, attr: &str) -> Result<String, LedError> {
    fs::read_to_string(dir.join(attr)).map_err(|e| attr_error(&e))
}

fn parse_attr<T: std::str::FromStr>(dir: &Path, attr: &str) -> Result<T, LedError> {
    read_attr(dir, attr)?
        .trim()
        .parse()
        .map_err(|_| LedError::Io(format!("unparsable {attr}")))
}

fn write_attr(dir: &Path, attr: &str, value: &str) -> Result<(), LedError> {
    fs::write(dir.join(attr), value).map_err(|e| attr_error(&e))
}

fn attr_error(e: &std::io::Error) -> LedError {
    match e.kind() {
        ErrorKind::NotFound => LedError::Unsupported,
        _ => LedError::Io(e.to_string()),
    }
}

/// The selected trigger: the bracketed entry of the kernel's list, or
/// the whole value when there is no list.
fn active_trigger(raw: &str) -> &str {
    raw.split_whitespace()
        .find_map(|t| t.strip_prefix('[').and_then(|t| t.strip_suffix(']')))
        .unwrap_or_else(|| raw.trim())
}
