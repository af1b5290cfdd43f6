//! Cooling load tracker.
//!
//! Measures how long the cooler has been running without a break and
//! reports when that run exceeds the configured threshold. The tracker only
//! observes; the decision engine acts on [`LoadStatus::Exceeded`] by forcing
//! the cooler off.

/// Result of one tracker update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Cooler not running and nothing tracked.
    Idle,
    /// Cooler seen running for the first time; tracking started.
    Started,
    /// Cooler still running, under the threshold.
    Running { elapsed_ms: u64 },
    /// Threshold exceeded. Tracking has been cleared so this fires once
    /// per run.
    Exceeded { elapsed_ms: u64 },
    /// Cooler seen stopped after a tracked run.
    Stopped { ran_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct CoolingLoadTracker {
    threshold_ms: u64,
    started_ms: Option<u64>,
}

impl CoolingLoadTracker {
    pub fn new(threshold_secs: u32) -> Self {
        Self {
            threshold_ms: u64::from(threshold_secs) * 1000,
            started_ms: None,
        }
    }

    pub fn set_threshold(&mut self, threshold_secs: u32) {
        self.threshold_ms = u64::from(threshold_secs) * 1000;
    }

    /// Feed the cooler's observed state at `now_ms`.
    pub fn update(&mut self, cooler_on: bool, now_ms: u64) -> LoadStatus {
        match (cooler_on, self.started_ms) {
            (true, None) => {
                self.started_ms = Some(now_ms);
                LoadStatus::Started
            }
            (true, Some(start)) => {
                let elapsed_ms = now_ms.saturating_sub(start);
                if elapsed_ms > self.threshold_ms {
                    self.started_ms = None;
                    LoadStatus::Exceeded { elapsed_ms }
                } else {
                    LoadStatus::Running { elapsed_ms }
                }
            }
            (false, Some(start)) => {
                self.started_ms = None;
                LoadStatus::Stopped {
                    ran_ms: now_ms.saturating_sub(start),
                }
            }
            (false, None) => LoadStatus::Idle,
        }
    }

    /// Start of the current tracked run, if any.
    pub fn started_ms(&self) -> Option<u64> {
        self.started_ms
    }

    /// Length of the current tracked run at `now_ms`, zero when idle.
    pub fn running_for_ms(&self, now_ms: u64) -> u64 {
        self.started_ms.map_or(0, |s| now_ms.saturating_sub(s))
    }

    pub fn clear(&mut self) {
        self.started_ms = None;
    }
}
