//! Short-cycle protection: minimum on/off dwell for a relay.
//!
//! A compressor that is switched off and straight back on again wears out
//! fast. The guard remembers when the relay entered its current state and
//! refuses a transition until the minimum dwell for that state has passed.
//! When the entry time is unknown (first observation, or a state the host
//! reported as unknown) the transition is allowed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dwell {
    on: bool,
    /// `None` when the relay was already in this state when first seen.
    since_ms: Option<u64>,
}

/// Outcome of a dwell check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellCheck {
    Permitted,
    /// Transition refused; this many milliseconds of dwell remain.
    Held { remaining_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct ShortCycleGuard {
    min_on_ms: u64,
    min_off_ms: u64,
    dwell: Option<Dwell>,
}

impl ShortCycleGuard {
    pub fn new(min_on_secs: u32, min_off_secs: u32) -> Self {
        Self {
            min_on_ms: u64::from(min_on_secs) * 1000,
            min_off_ms: u64::from(min_off_secs) * 1000,
            dwell: None,
        }
    }

    pub fn set_limits(&mut self, min_on_secs: u32, min_off_secs: u32) {
        self.min_on_ms = u64::from(min_on_secs) * 1000;
        self.min_off_ms = u64::from(min_off_secs) * 1000;
    }

    /// Record the relay state reported by the host. A change the guard did
    /// not command itself starts a new dwell at `now_ms`.
    pub fn observe(&mut self, on: bool, now_ms: u64) {
        match self.dwell {
            None => self.dwell = Some(Dwell { on, since_ms: None }),
            Some(d) if d.on != on => {
                self.dwell = Some(Dwell {
                    on,
                    since_ms: Some(now_ms),
                });
            }
            Some(_) => {}
        }
    }

    /// Record a transition the engine just commanded.
    pub fn record(&mut self, on: bool, now_ms: u64) {
        self.dwell = Some(Dwell {
            on,
            since_ms: Some(now_ms),
        });
    }

    /// May the relay be switched to `target_on` at `now_ms`?
    pub fn check(&self, target_on: bool, now_ms: u64) -> DwellCheck {
        let Some(dwell) = self.dwell else {
            return DwellCheck::Permitted;
        };
        if dwell.on == target_on {
            return DwellCheck::Permitted;
        }
        let Some(since) = dwell.since_ms else {
            return DwellCheck::Permitted;
        };
        let min = if dwell.on { self.min_on_ms } else { self.min_off_ms };
        let elapsed = now_ms.saturating_sub(since);
        if elapsed >= min {
            DwellCheck::Permitted
        } else {
            DwellCheck::Held {
                remaining_ms: min - elapsed,
            }
        }
    }

    /// Forget everything, e.g. after the host reported an unknown state.
    pub fn forget(&mut self) {
        self.dwell = None;
    }
}
