//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`].  A missing file yields the defaults; a
//! malformed or out-of-range file is an error rather than a silent
//! fallback, so a typo never starts the daemon against the wrong LEDs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ManagerConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<ManagerConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonConfigFile: {} absent, using defaults", self.path.display());
                return Ok(ManagerConfig::default());
            }
            Err(e) => return Err(ConfigError::IoError(e.to_string())),
        };

        let config: ManagerConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        config.validate()?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &ManagerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|e| ConfigError::IoError(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        fs::write(&self.path, text).map_err(|e| ConfigError::IoError(e.to_string()))
    }
}
