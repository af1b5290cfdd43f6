//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] by reading a JSON document from disk. Keys
//! that are absent take their defaults; unknown keys are ignored.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ControllerConfig;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            warn!("Config: cannot read {}: {}", self.path.display(), e);
            match e.kind() {
                ErrorKind::NotFound => ConfigError::NotFound,
                _ => ConfigError::IoError,
            }
        })?;
        let config = ControllerConfig::from_json_str(&raw)?;
        info!("Config: loaded {}", self.path.display());
        Ok(config)
    }
}
