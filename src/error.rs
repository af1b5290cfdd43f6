//! Unified error types for the climate controller.
//!
//! Nothing here is fatal to the process: every variant maps to either
//! "skip this evaluation" or "reject this configuration". The decision
//! engine logs the error and waits for the next trigger.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A sensor needed by the evaluation has no entity id configured.
    ConfigurationIncomplete(&'static str),
    /// A sensor reading was missing or not a number.
    SensorUnavailable { sensor: Sensor, cause: SensorError },
    /// Configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationIncomplete(what) => write!(f, "configuration incomplete: {what}"),
            Self::SensorUnavailable { sensor, cause } => write!(f, "{sensor} sensor: {cause}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Which of the two control inputs failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Temperature,
    Humidity,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Humidity => write!(f, "humidity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The host has no state for the entity (offline, unknown id).
    Unavailable,
    /// The state exists but is not a finite number.
    NotNumeric,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "state unavailable"),
            Self::NotNumeric => write!(f, "state is not a valid number"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
