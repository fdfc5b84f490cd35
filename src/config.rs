//! Daemon configuration.
//!
//! Loaded once at startup through a [`ConfigPort`](crate::app::ports::ConfigPort).
//! Every field has a default, so a partial file only overrides what it names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapters::sysfs_led::DEFAULT_SYSFS_ROOT;
use crate::app::overrides::IdentifyTarget;
use crate::app::ports::ConfigError;
use crate::layout::{LedAction, LedState};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ledmanager/config.json";

/// Core daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Group → LED layout file.
    pub layout_path: PathBuf,
    /// Directory holding the persisted group record.
    pub storage_dir: PathBuf,
    /// Where physical LED writes go.
    pub led_backend: LedBackend,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Pending requests the dispatch queue holds before producers block.
    pub queue_depth: usize,
    /// Groups handled by identify fan-out instead of arbitration.
    pub overrides: Vec<IdentifyOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedBackend {
    /// Linux LED class devices under `root`.
    Sysfs { root: PathBuf },
    /// In-memory LEDs; nothing is lit.
    Simulated,
}

/// One identify group and the LEDs it fans out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyOverride {
    pub group: String,
    pub leds: Vec<String>,
    #[serde(default = "default_override_state")]
    pub action: LedState,
    #[serde(default = "default_duty_on")]
    pub duty_on: u8,
    #[serde(default = "default_period_ms")]
    pub period_ms: u16,
}

impl IdentifyOverride {
    pub fn target(&self) -> IdentifyTarget {
        IdentifyTarget {
            leds: self.leds.clone(),
            action: LedAction::from_parts(self.action, self.duty_on, self.period_ms),
        }
    }
}

fn default_override_state() -> LedState {
    LedState::Blink
}

fn default_duty_on() -> u8 {
    50
}

fn default_period_ms() -> u16 {
    1000
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            layout_path: PathBuf::from("/usr/share/ledmanager/led-groups.json"),
            storage_dir: PathBuf::from("/var/lib/ledmanager"),
            led_backend: LedBackend::Sysfs {
                root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            },
            log_level: "info".to_owned(),
            queue_depth: 32,
            overrides: Vec::new(),
        }
    }
}

impl ManagerConfig {
    /// Range and consistency checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("layout_path must not be empty"));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("storage_dir must not be empty"));
        }
        if let LedBackend::Sysfs { root } = &self.led_backend {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed("sysfs root must not be empty"));
            }
        }
        if !(1..=4096).contains(&self.queue_depth) {
            return Err(ConfigError::ValidationFailed("queue_depth must be 1–4096"));
        }
        for o in &self.overrides {
            if o.group.is_empty() {
                return Err(ConfigError::ValidationFailed("override group must not be empty"));
            }
            if o.leds.is_empty() {
                return Err(ConfigError::ValidationFailed("override must list at least one LED"));
            }
            if o.duty_on > 100 {
                return Err(ConfigError::ValidationFailed("override duty_on must be 0–100"));
            }
        }
        Ok(())
    }
}
