//! Safety supervisor.
//!
//! The supervisor runs **every evaluation before the cooler decision** and
//! latches a bitmask of hard failsafe conditions. The decision engine reads
//! the mask to override normal control:
//!
//! - [`Failsafe::TemperatureHigh`]: cooler forced ON, PID ignored.
//! - [`Failsafe::TemperatureLow`]: cooler forced OFF, PID ignored.
//! - [`Failsafe::HumidityHigh`]: both dehumidifiers forced ON.
//!
//! Conditions are re-evaluated from scratch every time; a bit clears as
//! soon as its reading is back inside the limit. Raising and clearing are
//! each logged once per transition. When both temperature bits are set
//! (misconfigured limits) the high limit wins.

use core::fmt;

use log::{error, info};

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Failsafe {
    /// Temperature at or above `upper_limit`.
    TemperatureHigh = 0b0000_0001,
    /// Temperature at or below `lower_limit`.
    TemperatureLow = 0b0000_0010,
    /// Humidity above `hum_failsafe_limit`.
    HumidityHigh = 0b0000_0100,
}

impl Failsafe {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Failsafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemperatureHigh => write!(f, "temperature at/above upper limit"),
            Self::TemperatureLow => write!(f, "temperature at/below lower limit"),
            Self::HumidityHigh => write!(f, "humidity above failsafe limit"),
        }
    }
}

/// What the failsafes demand of the cooler this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolerOverride {
    ForceOn,
    ForceOff,
    /// No failsafe active; normal PID control applies.
    None,
}

pub struct SafetySupervisor {
    upper_limit: f32,
    lower_limit: f32,
    hum_failsafe_limit: f32,
    /// Latched failsafe bitmask.
    active: u8,
}

impl SafetySupervisor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            upper_limit: config.upper_limit,
            lower_limit: config.lower_limit,
            hum_failsafe_limit: config.hum_failsafe_limit,
            active: 0,
        }
    }

    /// Pick up new limits after a configuration change. Latched bits are
    /// re-evaluated on the next call to [`evaluate`](Self::evaluate).
    pub fn reconfigure(&mut self, config: &ControllerConfig) {
        self.upper_limit = config.upper_limit;
        self.lower_limit = config.lower_limit;
        self.hum_failsafe_limit = config.hum_failsafe_limit;
    }

    /// Evaluate every limit against the latest reading.
    /// Returns the updated bitmask.
    pub fn evaluate(&mut self, temperature: f32, humidity: f32) -> u8 {
        self.eval_failsafe(Failsafe::TemperatureHigh, temperature >= self.upper_limit);
        self.eval_failsafe(Failsafe::TemperatureLow, temperature <= self.lower_limit);
        self.eval_failsafe(Failsafe::HumidityHigh, humidity > self.hum_failsafe_limit);
        self.active
    }

    pub fn cooler_override(&self) -> CoolerOverride {
        if self.is_active(Failsafe::TemperatureHigh) {
            CoolerOverride::ForceOn
        } else if self.is_active(Failsafe::TemperatureLow) {
            CoolerOverride::ForceOff
        } else {
            CoolerOverride::None
        }
    }

    /// Current failsafe bitmask.
    pub fn active(&self) -> u8 {
        self.active
    }

    pub fn is_active(&self, failsafe: Failsafe) -> bool {
        self.active & failsafe.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    fn eval_failsafe(&mut self, failsafe: Failsafe, condition: bool) {
        if condition {
            if self.active & failsafe.mask() == 0 {
                error!("FAILSAFE RAISED: {failsafe}");
            }
            self.active |= failsafe.mask();
        } else {
            if self.active & failsafe.mask() != 0 {
                info!("FAILSAFE CLEARED: {failsafe}");
            }
            self.active &= !failsafe.mask();
        }
    }
}
