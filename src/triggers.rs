//! Coalescing trigger queue.
//!
//! Triggers are produced by:
//! - sensor state-change callbacks (temperature, humidity)
//! - the periodic control schedule
//! - manual requests (CLI, tests)
//!
//! and consumed by the control loop, which runs one evaluation per drain.
//!
//! ```text
//! ┌──────────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │ Sensor callbacks │────▶│               │     │                  │
//! │ Periodic timer   │────▶│ TriggerQueue  │────▶│  Control loop    │
//! │ Manual           │────▶│ (coalescing)  │     │  evaluate(...)   │
//! └──────────────────┘     └───────────────┘     └──────────────────┘
//! ```
//!
//! Every evaluation reads fresh sensor values, so a burst of triggers that
//! arrives while an evaluation is in flight carries no more information
//! than one. The queue therefore keeps a bitmask of pending kinds rather
//! than a FIFO, and a drain clears all of them at once.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// Why an evaluation was requested, ordered by priority.
/// Lower discriminant = reported first when several are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Trigger {
    /// Temperature sensor reported a new state.
    TemperatureChanged = 0b0000_0001,
    /// Humidity sensor reported a new state.
    HumidityChanged = 0b0000_0010,
    /// Periodic control schedule fired.
    Periodic = 0b0000_0100,
    /// Explicit request (operator, test harness).
    Manual = 0b0000_1000,
}

const ALL: [Trigger; 4] = [
    Trigger::TemperatureChanged,
    Trigger::HumidityChanged,
    Trigger::Periodic,
    Trigger::Manual,
];

impl Trigger {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemperatureChanged => write!(f, "temperature changed"),
            Self::HumidityChanged => write!(f, "humidity changed"),
            Self::Periodic => write!(f, "periodic control callback"),
            Self::Manual => write!(f, "manual request"),
        }
    }
}

/// Set of triggers taken from the queue in one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingTriggers(u8);

impl PendingTriggers {
    pub fn contains(self, trigger: Trigger) -> bool {
        self.0 & trigger.mask() != 0
    }

    /// Highest-priority trigger in the set.
    pub fn primary(self) -> Option<Trigger> {
        ALL.into_iter().find(|t| self.contains(*t))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Lock-free pending-trigger set. Producers may live on any thread
/// (wrap in an `Arc`); the control loop is the single consumer.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: AtomicU8,
}

impl TriggerQueue {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
        }
    }

    /// Mark a trigger as pending. Returns `false` if it was already
    /// pending (coalesced).
    pub fn push(&self, trigger: Trigger) -> bool {
        let prev = self.pending.fetch_or(trigger.mask(), Ordering::AcqRel);
        prev & trigger.mask() == 0
    }

    /// Take every pending trigger, leaving the queue empty.
    pub fn drain(&self) -> PendingTriggers {
        PendingTriggers(self.pending.swap(0, Ordering::AcqRel))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }
}
