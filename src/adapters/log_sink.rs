//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured climate events through
//! the `log` facade. A bridge to an automation host's event bus would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::ClimateEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ClimateEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn opt_on(state: Option<bool>) -> &'static str {
    match state {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => "?",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ClimateEvent) {
        match event {
            ClimateEvent::RelayCommanded(cmd) => {
                info!(
                    "RELAY | {} -> {} ({:?})",
                    cmd.relay,
                    if cmd.on { "ON" } else { "OFF" },
                    cmd.reason
                );
            }
            ClimateEvent::EvaluationSkipped { trigger, reason } => {
                warn!("SKIP  | trigger={} | {}", trigger, reason);
            }
            ClimateEvent::CoolingCutoff { ran_secs } => {
                warn!("CUTOFF| cooler ran {}s, forced OFF", ran_secs);
            }
            ClimateEvent::CoolerHeld {
                wanted_on,
                remaining_ms,
            } => {
                info!(
                    "HOLD  | cooler wanted {} | {:.1}s of dwell left",
                    if *wanted_on { "ON" } else { "OFF" },
                    *remaining_ms as f32 / 1000.0
                );
            }
            ClimateEvent::Summary(s) => {
                info!(
                    "SUMRY | T={:.1}\u{00b0}F RH={:.1}% | VPD={} | cooler={} ({}s) heater={} \
                     dehum={}/{} | pid out={:.1} i={:.2} | failsafes=0b{:03b} | evals={} skipped={}",
                    s.reading.temperature,
                    s.reading.humidity,
                    match (s.vpd_kpa, s.vpd_in_band) {
                        (Some(v), Some(true)) => format!("{v:.2}kPa in band"),
                        (Some(v), _) => format!("{v:.2}kPa out of band"),
                        (None, _) => "n/a".to_string(),
                    },
                    opt_on(s.cooler_on),
                    s.cooler_running_secs,
                    opt_on(s.heater_on),
                    opt_on(s.dehumidifiers_on.0),
                    opt_on(s.dehumidifiers_on.1),
                    s.pid.output,
                    s.pid.integral,
                    s.failsafes,
                    s.evaluations,
                    s.skipped,
                );
            }
            ClimateEvent::EnabledChanged(enabled) => {
                info!("STATE | controller {}", if *enabled { "enabled" } else { "disabled" });
            }
        }
    }
}
