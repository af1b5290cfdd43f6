//! Port traits — the boundary between the decision engine and the host
//! automation layer.
//!
//! ```text
//!   Host adapter ──▶ Port trait ──▶ ClimateController (domain)
//! ```
//!
//! The host (a home-automation bridge, a simulator, a test mock)
//! implements these traits. The
//! [`ClimateController`](super::service::ClimateController) consumes them
//! via generics, so the engine never touches a real switch or sensor.
//!
//! ## Contract notes
//!
//! - **SensorPort** must report missing and non-numeric states as errors,
//!   never as a default value; the engine relies on that to fail fast.
//! - **RelayPort::set_relay** is fire-and-forget and assumed idempotent.
//!   Failures are the host's to log; the engine reissues the command on the
//!   next evaluation if the mismatch persists.
//! - **Clock** must be monotonic.

use crate::config::ControllerConfig;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (host → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// Read the current numeric state of a sensor entity.
    fn read_sensor(&mut self, entity: &str) -> Result<f32, SensorError>;
}

/// Parse a string entity state the way most automation hosts report it.
///
/// `None`, `"unavailable"` and `"unknown"` are [`SensorError::Unavailable`];
/// anything that is not a finite number is [`SensorError::NotNumeric`].
pub fn parse_sensor_state(raw: Option<&str>) -> Result<f32, SensorError> {
    let raw = raw.map(str::trim).ok_or(SensorError::Unavailable)?;
    if raw.is_empty() || raw.eq_ignore_ascii_case("unavailable") || raw.eq_ignore_ascii_case("unknown") {
        return Err(SensorError::Unavailable);
    }
    match raw.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SensorError::NotNumeric),
    }
}

// ───────────────────────────────────────────────────────────────
// Relay port (domain ↔ host)
// ───────────────────────────────────────────────────────────────

/// Observed state of a switched actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
    /// The host could not say (offline, never reported, bad id).
    Unknown,
}

impl RelayState {
    pub fn from_on(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// `Some(true/false)` for a known state.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }
}

pub trait RelayPort {
    /// Last state the host observed for the relay.
    fn relay_state(&self, entity: &str) -> RelayState;

    /// Switch the relay. Idempotent, best-effort.
    fn set_relay(&mut self, entity: &str, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Monotonic milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`ClimateEvent`](super::events::ClimateEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ClimateEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (scheduler → control loop)
// ───────────────────────────────────────────────────────────────

/// What kind of schedule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring schedule reached its interval.
    Periodic,
    /// A one-shot delay elapsed.
    OneShot,
}

/// Callback interface for the [`Scheduler`](crate::scheduler::Scheduler).
///
/// The control loop implements this to turn schedule fires into
/// [`Trigger`](crate::triggers::Trigger)s without the scheduler knowing
/// about the decision engine.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads controller configuration.
///
/// Implementations MUST run [`ControllerConfig::validate`] and reject
/// invalid values with [`ConfigError::ValidationFailed`] rather than
/// clamping them.
pub trait ConfigPort {
    fn load(&self) -> Result<ControllerConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No configuration source found.
    NotFound,
    /// Configuration could not be parsed.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing store.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
