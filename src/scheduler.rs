//! Timer/scheduler engine.
//!
//! Host-side trigger source for the periodic control callback. The
//! scheduler notifies a [`SchedulerDelegate`] when schedules fire; the
//! control loop implements the delegate to push into the
//! [`TriggerQueue`](crate::triggers::TriggerQueue).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌─────────────────┐   ┌───────────────┐   ┌──────────────┐  │
//! │  │ Sensor changes  │   │ Periodic      │   │ One-shot     │  │
//! │  │ (host callback) │   │ schedule      │   │ (startup)    │  │
//! │  └────────┬────────┘   └───────┬───────┘   └──────┬───────┘  │
//! │           │                    │                  │          │
//! │           │                    ▼                  ▼          │
//! │           │          ┌────────────────────────────────────┐  │
//! │           │          │        SchedulerDelegate           │  │
//! │           │          └─────────────────┬──────────────────┘  │
//! │           ▼                            ▼                     │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    TriggerQueue                        │  │
//! │  └───────────────────────────┬────────────────────────────┘  │
//! │                              ▼                               │
//! │                 ClimateController.evaluate()                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "control").
    pub label: &'static str,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub enum ScheduleKind {
    /// Fire every `interval_secs` seconds, first fire one interval in.
    Periodic { interval_secs: u32 },
    /// Fire once after `delay_secs`, then auto-disable.
    OneShot { delay_secs: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Milliseconds elapsed since last fire (Periodic) or since added
    /// (OneShot).
    elapsed_ms: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule. Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed_ms: 0,
                });
                return Some(i);
            }
        }
        None
    }

    /// Advance the scheduler by `elapsed_ms`.
    ///
    /// When a schedule fires, `delegate.on_schedule_fired()` is called
    /// with the schedule label and fire kind. A periodic schedule fires at
    /// most once per call even if the step spans several intervals.
    pub fn tick(&mut self, elapsed_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for slot in &mut self.schedules {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            entry.elapsed_ms = entry.elapsed_ms.saturating_add(elapsed_ms);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_secs } => {
                    let interval_ms = u64::from(interval_secs) * 1000;
                    if entry.elapsed_ms >= interval_ms {
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Periodic);
                        entry.elapsed_ms = 0;
                    }
                }
                ScheduleKind::OneShot { delay_secs } => {
                    if entry.elapsed_ms >= u64::from(delay_secs) * 1000 {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {}s)",
                            entry.schedule.label, delay_secs
                        );
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::OneShot);
                        entry.schedule.enabled = false; // Auto-disable.
                    }
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
