//! Decision engine — the hexagonal core.
//!
//! [`ClimateController`] owns the configuration and every piece of state
//! that persists between evaluations ([`ControllerState`]). It exposes a
//! single [`evaluate`](ClimateController::evaluate) entry point; all I/O
//! flows through port traits injected at the call site, so the engine is
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │       ClimateController      │
//!   RelayPort ◀──▶│ heater · cooler/PID · load   │
//!       Clock ──▶ │ tracker · dehumidifiers      │
//!                 └──────────────────────────────┘
//! ```
//!
//! Per evaluation, in this order:
//!
//! 1. read temperature and humidity; any failure aborts with no actuation
//! 2. latch failsafes
//! 3. heater hysteresis
//! 4. cooler: hard limits, else PID demand gated by short-cycle protection
//! 5. cooling load tracking on the cooler's post-command state
//! 6. dehumidifier band
//! 7. periodic summary

use log::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::control::cooling_load::{CoolingLoadTracker, LoadStatus};
use crate::control::hysteresis::{HeaterSignals, SwitchDecision, dehumidifier_decision, heater_signals};
use crate::control::pid::{PidController, PidSnapshot};
use crate::control::short_cycle::{DwellCheck, ShortCycleGuard};
use crate::error::{Error, Result, Sensor, SensorError};
use crate::safety::{CoolerOverride, SafetySupervisor};
use crate::triggers::Trigger;

use super::commands::ControllerCommand;
use super::events::{
    ClimateEvent, ClimateSummary, CommandReason, CoolerDecision, EvaluationReport, Reading, Relay,
    RelayCommand,
};
use super::ports::{Clock, ConfigError, EventSink, RelayPort, RelayState, SensorPort};

/// PID output above which the cooler is demanded on. Midpoint of the
/// default `[0, 100]` output range; not configurable.
pub const COOLER_DEMAND_THRESHOLD: f32 = 50.0;

// ───────────────────────────────────────────────────────────────
// ControllerState
// ───────────────────────────────────────────────────────────────

/// State that survives between evaluations. One per enclosure.
pub struct ControllerState {
    pid: PidController,
    safety: SafetySupervisor,
    cooling_load: CoolingLoadTracker,
    cooler_guard: ShortCycleGuard,
    last_evaluation_ms: Option<u64>,
    next_summary_ms: Option<u64>,
    evaluations: u64,
    skipped: u64,
}

impl ControllerState {
    pub fn new(config: &ControllerConfig) -> Self {
        let mut pid = PidController::new(config.kp, config.ki, config.kd, config.target_temp);
        pid.set_limits(config.output_min, config.output_max);
        Self {
            pid,
            safety: SafetySupervisor::new(config),
            cooling_load: CoolingLoadTracker::new(config.cooling_threshold),
            cooler_guard: ShortCycleGuard::new(config.min_on_time, config.min_off_time),
            last_evaluation_ms: None,
            next_summary_ms: None,
            evaluations: 0,
            skipped: 0,
        }
    }

    /// Apply new tuning without discarding history.
    fn retune(&mut self, config: &ControllerConfig) {
        self.pid.set_gains(config.kp, config.ki, config.kd);
        self.pid.set_limits(config.output_min, config.output_max);
        self.pid.set_target(config.target_temp);
        self.safety.reconfigure(config);
        self.cooling_load.set_threshold(config.cooling_threshold);
        if !config.cooling_load_tracking || config.cooler_entity.is_none() {
            self.cooling_load.clear();
        }
        self.cooler_guard.set_limits(config.min_on_time, config.min_off_time);
    }
}

/// Result of a call to [`ClimateController::evaluate`] that did not fail.
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// The controller is disabled; nothing was read or switched.
    Disabled,
    Completed(EvaluationReport),
}

impl Evaluation {
    pub fn report(&self) -> Option<&EvaluationReport> {
        match self {
            Self::Disabled => None,
            Self::Completed(r) => Some(r),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ClimateController
// ───────────────────────────────────────────────────────────────

pub struct ClimateController {
    config: ControllerConfig,
    state: ControllerState,
}

impl ClimateController {
    /// Construct the controller. Rejects invalid configuration; suspicious
    /// settings are logged and accepted.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        for w in config.warnings() {
            warn!("Config: {}", w);
        }
        let state = ControllerState::new(&config);
        info!(
            "ClimateController ready: target={:.1}\u{00b0}F limits=[{:.1}, {:.1}] \
             humidity band=[{:.1}, {:.1}]",
            config.target_temp,
            config.lower_limit,
            config.upper_limit,
            config.hum_lower_limit,
            config.hum_failsafe_limit,
        );
        Ok(Self { config, state })
    }

    // ── Per-trigger orchestration ─────────────────────────────

    /// Run one full evaluation.
    ///
    /// The `host` parameter satisfies [`SensorPort`], [`RelayPort`] **and**
    /// [`Clock`]; this avoids juggling several mutable borrows of the same
    /// host while keeping the port boundary explicit.
    ///
    /// Errors mean the evaluation was skipped before any relay was touched.
    pub fn evaluate<H>(
        &mut self,
        trigger: Trigger,
        host: &mut H,
        sink: &mut impl EventSink,
    ) -> Result<Evaluation>
    where
        H: SensorPort + RelayPort + Clock,
    {
        if !self.config.enabled {
            debug!("Controller is disabled. Skipping control actions ({trigger}).");
            return Ok(Evaluation::Disabled);
        }
        info!("Evaluation triggered: {trigger}");

        let now = host.now_ms();

        // 1. Inputs. Fail fast: nothing below runs without both readings.
        let reading = match self.read_inputs(host) {
            Ok(r) => r,
            Err(e) => {
                self.state.skipped += 1;
                warn!("Skipping evaluation: {e}");
                sink.emit(&ClimateEvent::EvaluationSkipped {
                    trigger,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let dt = match self.state.last_evaluation_ms {
            Some(prev) => now.saturating_sub(prev) as f32 / 1000.0,
            None => self.config.control_interval as f32,
        };
        self.state.last_evaluation_ms = Some(now);
        self.state.evaluations += 1;

        // 2. Failsafes
        let failsafes = self.state.safety.evaluate(reading.temperature, reading.humidity);

        let mut report = EvaluationReport {
            trigger,
            at_ms: now,
            reading,
            heater: HeaterSignals {
                should_activate: false,
                should_deactivate: false,
            },
            heater_decision: SwitchDecision::Hold,
            cooler: CoolerDecision::Pid { on: false },
            pid: PidSnapshot::default(),
            dehumidifier_decision: SwitchDecision::Hold,
            cutoff_fired: false,
            failsafes,
            commands: heapless::Vec::new(),
        };

        // 3–6. Fixed rule order
        self.control_heater(reading, host, sink, &mut report);
        self.control_cooler(reading, dt, now, host, sink, &mut report);
        self.track_cooling_load(now, host, sink, &mut report);
        self.control_dehumidifiers(reading, host, sink, &mut report);

        // 7. Summary
        self.summarize_if_due(reading, now, host, sink);

        Ok(Evaluation::Completed(report))
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a runtime command between evaluations.
    pub fn handle_command(&mut self, cmd: ControllerCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            ControllerCommand::Enable => {
                if !self.config.enabled {
                    self.config.enabled = true;
                    info!("Controller enabled");
                    sink.emit(&ClimateEvent::EnabledChanged(true));
                }
            }
            ControllerCommand::Disable => {
                if self.config.enabled {
                    self.config.enabled = false;
                    info!("Controller disabled");
                    sink.emit(&ClimateEvent::EnabledChanged(false));
                }
            }
            ControllerCommand::SetHeaterEnabled(enabled) => {
                self.config.heater_enabled = enabled;
                info!("Heater control {}", if enabled { "enabled" } else { "disabled" });
            }
            ControllerCommand::SetTargetTemperature(target) => {
                if !target.is_finite() {
                    return Err(Error::Config(ConfigError::ValidationFailed(
                        "target_temp must be finite",
                    )));
                }
                self.config.target_temp = target;
                self.state.pid.set_target(target);
                info!("Target temperature set to {:.1}\u{00b0}F", target);
            }
            ControllerCommand::ResetPid => {
                self.state.pid.reset();
                info!("PID history cleared");
            }
            ControllerCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                for w in new_config.warnings() {
                    warn!("Config: {}", w);
                }
                self.state.retune(&new_config);
                self.config = new_config;
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Read-only view of the PID loop.
    pub fn inspect_pid(&self) -> PidSnapshot {
        self.state.pid.inspect()
    }

    /// Start of the current tracked cooler run.
    pub fn cooler_run_started_ms(&self) -> Option<u64> {
        self.state.cooling_load.started_ms()
    }

    /// Active failsafe bitmask.
    pub fn failsafes(&self) -> u8 {
        self.state.safety.active()
    }

    /// Completed evaluations since construction.
    pub fn evaluations(&self) -> u64 {
        self.state.evaluations
    }

    /// Evaluations abandoned because of missing input.
    pub fn skipped(&self) -> u64 {
        self.state.skipped
    }

    /// Build a summary from the latest state plus fresh relay readings.
    pub fn summary(
        &self,
        reading: Reading,
        now_ms: u64,
        host: &mut (impl SensorPort + RelayPort),
    ) -> ClimateSummary {
        let vpd_kpa = self
            .config
            .vpd_sensor
            .as_deref()
            .and_then(|id| host.read_sensor(id).ok());
        let host = &*host;
        ClimateSummary {
            reading,
            vpd_kpa,
            vpd_in_band: vpd_kpa
                .map(|v| v >= self.config.target_vpd_low && v <= self.config.target_vpd_high),
            cooler_on: relay_on(host, self.config.cooler_entity.as_deref()),
            heater_on: relay_on(host, self.config.heater_entity.as_deref()),
            dehumidifiers_on: (
                relay_on(host, self.config.dehum_1.as_deref()),
                relay_on(host, self.config.dehum_2.as_deref()),
            ),
            cooler_running_secs: self.state.cooling_load.running_for_ms(now_ms) / 1000,
            pid: self.state.pid.inspect(),
            failsafes: self.state.safety.active(),
            evaluations: self.state.evaluations,
            skipped: self.state.skipped,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_inputs(&self, host: &mut impl SensorPort) -> Result<Reading> {
        let temp_id = self
            .config
            .temp_sensor
            .as_deref()
            .ok_or(Error::ConfigurationIncomplete("temp_sensor"))?;
        let hum_id = self
            .config
            .hum_sensor
            .as_deref()
            .ok_or(Error::ConfigurationIncomplete("hum_sensor"))?;

        let temperature = read_finite(host, temp_id, Sensor::Temperature)?;
        let humidity = read_finite(host, hum_id, Sensor::Humidity)?;

        Ok(Reading {
            temperature,
            humidity,
        })
    }

    fn control_heater(
        &self,
        reading: Reading,
        host: &mut impl RelayPort,
        sink: &mut impl EventSink,
        report: &mut EvaluationReport,
    ) {
        let Reading {
            temperature: t,
            humidity: h,
        } = reading;
        let th = self.config.heater_thresholds();
        let signals = heater_signals(t, h, &th);

        if signals.should_activate {
            info!(
                "Heater activation condition met: Humidity={h}% >= {}% OR Temperature={t}\u{00b0}F < {}\u{00b0}F",
                th.activate_hum, th.activate_temp
            );
        }
        if signals.should_deactivate {
            info!(
                "Heater deactivation condition met: Humidity={h}% < {}% OR Temperature={t}\u{00b0}F > {}\u{00b0}F",
                th.deactivate_hum, th.deactivate_temp
            );
        }

        let decision = signals.decision();
        report.heater = signals;
        report.heater_decision = decision;

        let (on, reason) = match decision {
            SwitchDecision::TurnOn => (true, CommandReason::HeaterActivate),
            SwitchDecision::TurnOff => (false, CommandReason::HeaterDeactivate),
            SwitchDecision::Hold => {
                debug!("No change in heater state. Current Temperature={t}\u{00b0}F, Humidity={h}%");
                return;
            }
        };

        match (self.config.heater_enabled, self.config.heater_entity.as_deref()) {
            (true, Some(entity)) => {
                drive_relay(host, sink, report, Relay::Heater, entity, on, reason);
            }
            _ => info!("Heater is not enabled or heater_entity is not configured."),
        }
    }

    fn control_cooler(
        &mut self,
        reading: Reading,
        dt: f32,
        now: u64,
        host: &mut impl RelayPort,
        sink: &mut impl EventSink,
        report: &mut EvaluationReport,
    ) {
        let t = reading.temperature;
        let cooler = self.config.cooler_entity.as_deref();

        // Keep the dwell guard in step with what the host reports.
        if let Some(entity) = cooler {
            match host.relay_state(entity).as_bool() {
                Some(on) => self.state.cooler_guard.observe(on, now),
                None => self.state.cooler_guard.forget(),
            }
        }

        // The PID runs every evaluation, failsafe or not, so its history
        // reflects the temperature the enclosure actually saw.
        let output = self.state.pid.compute(t, dt);
        let pid = self.state.pid.inspect();
        report.pid = pid;
        debug!(
            "PID Calculations: Error={:.2}, Proportional={:.2}, Integral={:.2}, Derivative={:.2}, Output={:.2}",
            pid.error, pid.proportional_term, pid.integral_term, pid.derivative_term, pid.output
        );

        let (decision, command) = match self.state.safety.cooler_override() {
            CoolerOverride::ForceOn => {
                info!(
                    "Temperature={t}\u{00b0}F >= upper_limit={}\u{00b0}F. Turning cooler ON.",
                    self.config.upper_limit
                );
                (
                    CoolerDecision::ForcedOn,
                    Some((true, CommandReason::TemperatureUpperLimit)),
                )
            }
            CoolerOverride::ForceOff => {
                info!(
                    "Temperature={t}\u{00b0}F <= lower_limit={}\u{00b0}F. Turning cooler OFF.",
                    self.config.lower_limit
                );
                (
                    CoolerDecision::ForcedOff,
                    Some((false, CommandReason::TemperatureLowerLimit)),
                )
            }
            CoolerOverride::None => {
                let want_on = output > COOLER_DEMAND_THRESHOLD;
                if want_on {
                    info!("PID output={output:.2} > {COOLER_DEMAND_THRESHOLD}. Turning cooler ON.");
                } else {
                    info!("PID output={output:.2} <= {COOLER_DEMAND_THRESHOLD}. Turning cooler OFF.");
                }
                match self.state.cooler_guard.check(want_on, now) {
                    DwellCheck::Permitted => (
                        CoolerDecision::Pid { on: want_on },
                        Some((want_on, CommandReason::PidDemand)),
                    ),
                    DwellCheck::Held { remaining_ms } => {
                        info!(
                            "Short-cycle protection: cooler stays {} for another {:.1}s",
                            on_off(!want_on),
                            remaining_ms as f32 / 1000.0
                        );
                        sink.emit(&ClimateEvent::CoolerHeld {
                            wanted_on: want_on,
                            remaining_ms,
                        });
                        (
                            CoolerDecision::Held {
                                wanted_on: want_on,
                                remaining_ms,
                            },
                            None,
                        )
                    }
                }
            }
        };
        report.cooler = decision;

        let Some((on, reason)) = command else {
            return;
        };
        match cooler {
            Some(entity) => {
                if drive_relay(host, sink, report, Relay::Cooler, entity, on, reason) {
                    self.state.cooler_guard.record(on, now);
                }
            }
            None => info!("Cooler entity is not configured."),
        }
    }

    fn track_cooling_load(
        &mut self,
        now: u64,
        host: &mut impl RelayPort,
        sink: &mut impl EventSink,
        report: &mut EvaluationReport,
    ) {
        if !self.config.cooling_load_tracking {
            return;
        }
        let Some(entity) = self.config.cooler_entity.as_deref() else {
            return;
        };

        let cooler_on = host.relay_state(entity) == RelayState::On;
        match self.state.cooling_load.update(cooler_on, now) {
            LoadStatus::Idle => {}
            LoadStatus::Started => {
                info!("Cooling Load Tracking: Cooler turned ON at t={now}ms");
            }
            LoadStatus::Running { elapsed_ms } => {
                debug!(
                    "Cooling Load Tracking: Cooler has been ON for {:.2} seconds",
                    elapsed_ms as f32 / 1000.0
                );
            }
            LoadStatus::Exceeded { elapsed_ms } => {
                warn!(
                    "Cooling Load Tracking: Cooler has exceeded threshold of {} seconds. Turning it OFF.",
                    self.config.cooling_threshold
                );
                if drive_relay(
                    host,
                    sink,
                    report,
                    Relay::Cooler,
                    entity,
                    false,
                    CommandReason::CoolingLoadCutoff,
                ) {
                    self.state.cooler_guard.record(false, now);
                }
                report.cutoff_fired = true;
                sink.emit(&ClimateEvent::CoolingCutoff {
                    ran_secs: elapsed_ms / 1000,
                });
            }
            LoadStatus::Stopped { ran_ms } => {
                info!(
                    "Cooling Load Tracking: Cooler turned OFF after {:.0} seconds",
                    ran_ms as f32 / 1000.0
                );
            }
        }
    }

    fn control_dehumidifiers(
        &self,
        reading: Reading,
        host: &mut impl RelayPort,
        sink: &mut impl EventSink,
        report: &mut EvaluationReport,
    ) {
        let h = reading.humidity;
        let decision =
            dehumidifier_decision(h, self.config.hum_failsafe_limit, self.config.hum_lower_limit);
        report.dehumidifier_decision = decision;

        let (on, reason) = match decision {
            SwitchDecision::TurnOn => {
                info!(
                    "Humidity={h}% exceeds failsafe limit={}%. Activating dehumidifiers.",
                    self.config.hum_failsafe_limit
                );
                (true, CommandReason::HumidityFailsafe)
            }
            SwitchDecision::TurnOff => {
                info!(
                    "Humidity={h}% below lower limit={}%. Turning off dehumidifiers.",
                    self.config.hum_lower_limit
                );
                (false, CommandReason::HumidityLowerLimit)
            }
            SwitchDecision::Hold => return,
        };

        match (self.config.dehum_1.as_deref(), self.config.dehum_2.as_deref()) {
            (Some(a), Some(b)) => {
                drive_relay(host, sink, report, Relay::DehumidifierA, a, on, reason);
                drive_relay(host, sink, report, Relay::DehumidifierB, b, on, reason);
            }
            _ => info!("Dehumidifier entities are not configured."),
        }
    }

    fn summarize_if_due(
        &mut self,
        reading: Reading,
        now: u64,
        host: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        let interval = u64::from(self.config.summary_interval) * 1000;
        match self.state.next_summary_ms {
            None => {
                self.state.next_summary_ms = Some(now + interval);
                return;
            }
            Some(due) if now < due => return,
            Some(_) => self.state.next_summary_ms = Some(now + interval),
        }
        let summary = self.summary(reading, now, host);
        sink.emit(&ClimateEvent::Summary(summary));
    }
}

// ───────────────────────────────────────────────────────────────
// Relay helper
// ───────────────────────────────────────────────────────────────

/// Switch `entity` to `on` unless the host already reports that state.
/// Returns `true` if `set_relay` was called.
fn drive_relay(
    host: &mut impl RelayPort,
    sink: &mut impl EventSink,
    report: &mut EvaluationReport,
    relay: Relay,
    entity: &str,
    on: bool,
    reason: CommandReason,
) -> bool {
    if host.relay_state(entity) == RelayState::from_on(on) {
        debug!("{relay} {entity} is already {}", on_off(on));
        return false;
    }
    host.set_relay(entity, on);
    info!("{relay} {entity} turned {}", on_off(on));

    let cmd = RelayCommand { relay, on, reason };
    sink.emit(&ClimateEvent::RelayCommanded(cmd.clone()));
    if report.commands.push(cmd).is_err() {
        warn!("Command log full; {relay} command not recorded in report");
    }
    true
}

/// Read one control input. Non-finite values are rejected here as well as
/// by [`parse_sensor_state`](super::ports::parse_sensor_state); a NaN that
/// reached the PID would poison its integral.
fn read_finite(host: &mut impl SensorPort, entity: &str, sensor: Sensor) -> Result<f32> {
    match host.read_sensor(entity) {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(Error::SensorUnavailable {
            sensor,
            cause: SensorError::NotNumeric,
        }),
        Err(cause) => Err(Error::SensorUnavailable { sensor, cause }),
    }
}

fn relay_on(host: &impl RelayPort, entity: Option<&str>) -> Option<bool> {
    entity.and_then(|e| host.relay_state(e).as_bool())
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
