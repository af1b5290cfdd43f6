//! Outbound application events and evaluation reports.
//!
//! The [`ClimateController`](super::service::ClimateController) emits
//! [`ClimateEvent`]s through the [`EventSink`](super::ports::EventSink)
//! port and returns an [`EvaluationReport`] from every completed
//! evaluation. Adapters decide what to do with the events: log them,
//! publish them, drop them.

use core::fmt;

use crate::control::hysteresis::{HeaterSignals, SwitchDecision};
use crate::control::pid::PidSnapshot;
use crate::triggers::Trigger;

/// Most relay commands one evaluation can issue: heater, cooler, cutoff
/// and both dehumidifiers, with headroom.
pub const MAX_COMMANDS_PER_EVALUATION: usize = 8;

/// The four relays the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Cooler,
    Heater,
    DehumidifierA,
    DehumidifierB,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooler => write!(f, "Cooler"),
            Self::Heater => write!(f, "Heater"),
            Self::DehumidifierA => write!(f, "Dehumidifier 1"),
            Self::DehumidifierB => write!(f, "Dehumidifier 2"),
        }
    }
}

/// Why a relay command was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReason {
    HeaterActivate,
    HeaterDeactivate,
    TemperatureUpperLimit,
    TemperatureLowerLimit,
    PidDemand,
    CoolingLoadCutoff,
    HumidityFailsafe,
    HumidityLowerLimit,
}

/// One `set_relay` call made during an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    pub relay: Relay,
    pub on: bool,
    pub reason: CommandReason,
}

/// How the cooler was decided this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolerDecision {
    /// Temperature at/above the upper limit.
    ForcedOn,
    /// Temperature at/below the lower limit.
    ForcedOff,
    /// PID output compared against the demand threshold.
    Pid { on: bool },
    /// PID wanted a change that short-cycle protection refused.
    Held { wanted_on: bool, remaining_ms: u64 },
}

/// A temperature/humidity pair that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
}

/// Everything one completed evaluation decided and did.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub trigger: Trigger,
    pub at_ms: u64,
    pub reading: Reading,
    pub heater: HeaterSignals,
    pub heater_decision: SwitchDecision,
    pub cooler: CoolerDecision,
    pub pid: PidSnapshot,
    pub dehumidifier_decision: SwitchDecision,
    /// Cooling load cutoff fired this evaluation.
    pub cutoff_fired: bool,
    /// Active failsafe bitmask (see [`Failsafe`](crate::safety::Failsafe)).
    pub failsafes: u8,
    pub commands: heapless::Vec<RelayCommand, MAX_COMMANDS_PER_EVALUATION>,
}

impl EvaluationReport {
    /// Commands issued to a particular relay, in order.
    pub fn commands_for(&self, relay: Relay) -> impl Iterator<Item = &RelayCommand> {
        self.commands.iter().filter(move |c| c.relay == relay)
    }
}

/// Periodic summary of the enclosure.
#[derive(Debug, Clone)]
pub struct ClimateSummary {
    pub reading: Reading,
    /// Informational only; VPD never drives a relay.
    pub vpd_kpa: Option<f32>,
    /// Whether `vpd_kpa` lies in `[target_vpd_low, target_vpd_high]`.
    pub vpd_in_band: Option<bool>,
    pub cooler_on: Option<bool>,
    pub heater_on: Option<bool>,
    pub dehumidifiers_on: (Option<bool>, Option<bool>),
    pub cooler_running_secs: u64,
    pub pid: PidSnapshot,
    pub failsafes: u8,
    pub evaluations: u64,
    pub skipped: u64,
}

/// Structured events emitted by the decision engine.
#[derive(Debug, Clone)]
pub enum ClimateEvent {
    /// A relay was switched.
    RelayCommanded(RelayCommand),
    /// An evaluation was abandoned before any actuation.
    EvaluationSkipped { trigger: Trigger, reason: String },
    /// The cooler ran past the cooling threshold and was cut off.
    CoolingCutoff { ran_secs: u64 },
    /// Short-cycle protection refused a PID-driven cooler change.
    CoolerHeld { wanted_on: bool, remaining_ms: u64 },
    /// Periodic summary.
    Summary(ClimateSummary),
    /// The controller was enabled or disabled at runtime.
    EnabledChanged(bool),
}
