//! Integration tests for the ClimateController → ports pipeline.
//!
//! These drive full evaluations against the mock host and assert on the
//! relay calls it recorded and the events the controller emitted.

use crate::mock_hw::*;

use tentclimate::app::commands::ControllerCommand;
use tentclimate::app::events::{ClimateEvent, CommandReason, CoolerDecision, EvaluationReport, Relay};
use tentclimate::app::service::{ClimateController, Evaluation};
use tentclimate::config::ControllerConfig;
use tentclimate::control::hysteresis::SwitchDecision;
use tentclimate::error::{Error, Sensor, SensorError};
use tentclimate::safety::Failsafe;
use tentclimate::triggers::Trigger;

fn make(config: ControllerConfig) -> (ClimateController, MockHost, RecordingSink) {
    let controller = ClimateController::new(config).expect("valid config");
    (controller, MockHost::new(), RecordingSink::new())
}

fn run(c: &mut ClimateController, host: &mut MockHost, sink: &mut RecordingSink) -> EvaluationReport {
    match c.evaluate(Trigger::Manual, host, sink) {
        Ok(Evaluation::Completed(report)) => report,
        other => panic!("expected a completed evaluation, got {:?}", other),
    }
}

/// Proportional-only PID, so the cooler's demand follows the current
/// temperature and nothing else.
fn p_only() -> ControllerConfig {
    ControllerConfig {
        ki: 0.0,
        ..wired_config()
    }
}

// ── Heater hysteresis ─────────────────────────────────────────

#[test]
fn heater_activates_when_cold_then_deactivates_when_warm() {
    let (mut c, mut host, mut sink) = make(wired_config());

    host.set_climate(50.0, 50.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(report.heater.should_activate);
    assert_eq!(report.heater_decision, SwitchDecision::TurnOn);
    assert!(host.is_on(HEATER));

    host.advance_secs(5);
    host.set_climate(60.0, 50.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(report.heater.should_deactivate);
    assert!(!report.heater.should_activate);
    assert_eq!(report.heater_decision, SwitchDecision::TurnOff);
    assert!(!host.is_on(HEATER));

    assert_eq!(host.calls_for(HEATER), vec![true, false]);
    let reasons: Vec<_> = report.commands_for(Relay::Heater).map(|c| c.reason).collect();
    assert_eq!(reasons, vec![CommandReason::HeaterDeactivate]);
}

#[test]
fn heater_commands_skipped_when_disabled() {
    let (mut c, mut host, mut sink) = make(wired_config());
    c.handle_command(ControllerCommand::SetHeaterEnabled(false), &mut sink)
        .unwrap();

    host.set_climate(50.0, 50.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.heater_decision, SwitchDecision::TurnOn);
    assert!(host.calls_for(HEATER).is_empty());
}

// ── Cooler ────────────────────────────────────────────────────

#[test]
fn cooler_forced_on_above_upper_limit_regardless_of_pid() {
    let (mut c, mut host, mut sink) = make(wired_config());

    host.set_climate(63.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);

    assert_eq!(report.cooler, CoolerDecision::ForcedOn);
    assert!(report.pid.output <= 50.0, "PID alone would not demand cooling");
    assert!(host.is_on(COOLER));
    assert_eq!(host.calls, vec![(COOLER.to_string(), true)]);
    assert_eq!(
        report.commands_for(Relay::Cooler).next().map(|c| c.reason),
        Some(CommandReason::TemperatureUpperLimit)
    );
    assert_ne!(report.failsafes & Failsafe::TemperatureHigh.mask(), 0);
}

#[test]
fn cooler_forced_off_at_lower_limit() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.force_relay(COOLER, true);

    host.set_climate(55.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);

    assert_eq!(report.cooler, CoolerDecision::ForcedOff);
    assert!(!host.is_on(COOLER));
    assert_ne!(c.failsafes() & Failsafe::TemperatureLow.mask(), 0);
}

#[test]
fn short_cycle_guard_holds_pid_transition() {
    let (mut c, mut host, mut sink) = make(p_only());

    // Failsafe switches the cooler on at t=0.
    host.set_climate(63.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    assert!(host.is_on(COOLER));

    // PID wants it off 5 s later; min_on_time is 30 s.
    host.advance_secs(5);
    host.set_climate(60.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(
        report.cooler,
        CoolerDecision::Held {
            wanted_on: false,
            remaining_ms: 25_000
        }
    );
    assert!(host.is_on(COOLER));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        ClimateEvent::CoolerHeld {
            wanted_on: false,
            ..
        }
    )));

    // Dwell satisfied.
    host.advance_secs(25);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.cooler, CoolerDecision::Pid { on: false });
    assert_eq!(host.calls_for(COOLER), vec![true, false]);
}

#[test]
fn hard_failsafe_bypasses_short_cycle_guard() {
    let (mut c, mut host, mut sink) = make(p_only());

    host.set_climate(63.0, 60.0);
    run(&mut c, &mut host, &mut sink);

    host.advance_secs(30);
    host.set_climate(60.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    assert!(!host.is_on(COOLER));

    // 5 s into a 20 s min-off dwell.
    host.advance_secs(5);
    host.set_climate(63.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.cooler, CoolerDecision::ForcedOn);
    assert_eq!(host.calls_for(COOLER), vec![true, false, true]);
}

#[test]
fn unknown_cooler_state_is_still_commanded() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.remove_relay(COOLER);

    host.set_climate(63.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    assert_eq!(host.calls_for(COOLER), vec![true]);
}

// ── Cooling load ──────────────────────────────────────────────

#[test]
fn cooling_load_cutoff_fires_exactly_once() {
    let (mut c, mut host, mut sink) = make(wired_config());

    host.set_climate(63.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    assert_eq!(c.cooler_run_started_ms(), Some(0));

    // Exactly at the threshold: not yet.
    host.advance_secs(600);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(!report.cutoff_fired);
    assert!(host.is_on(COOLER));

    host.advance_secs(1);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(report.cutoff_fired);
    assert!(!host.is_on(COOLER));
    assert_eq!(c.cooler_run_started_ms(), None);
    assert_eq!(
        report.commands_for(Relay::Cooler).last().map(|c| c.reason),
        Some(CommandReason::CoolingLoadCutoff)
    );
    assert_eq!(sink.cutoffs(), 1);

    // Re-evaluate straight away with the cooler off.
    host.set_climate(60.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(!report.cutoff_fired);
    assert!(!host.is_on(COOLER));
    assert_eq!(sink.cutoffs(), 1);
    assert_eq!(host.calls_for(COOLER), vec![true, false]);
}

#[test]
fn cooling_load_tracking_can_be_disabled() {
    let config = ControllerConfig {
        cooling_load_tracking: false,
        ..wired_config()
    };
    let (mut c, mut host, mut sink) = make(config);

    host.set_climate(63.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    host.advance_secs(3600);
    let report = run(&mut c, &mut host, &mut sink);

    assert!(!report.cutoff_fired);
    assert!(host.is_on(COOLER));
    assert_eq!(c.cooler_run_started_ms(), None);
}

// ── Dehumidifiers ─────────────────────────────────────────────

#[test]
fn humidity_band_drives_both_dehumidifiers() {
    let (mut c, mut host, mut sink) = make(p_only());

    host.set_climate(60.0, 63.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.dehumidifier_decision, SwitchDecision::TurnOn);
    assert!(host.is_on(DEHUM_1) && host.is_on(DEHUM_2));
    assert_ne!(report.failsafes & Failsafe::HumidityHigh.mask(), 0);

    host.advance_secs(5);
    host.set_climate(60.0, 58.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.dehumidifier_decision, SwitchDecision::TurnOff);
    assert!(!host.is_on(DEHUM_1) && !host.is_on(DEHUM_2));

    host.advance_secs(5);
    host.set_climate(60.0, 60.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert_eq!(report.dehumidifier_decision, SwitchDecision::Hold);
    assert_eq!(report.commands_for(Relay::DehumidifierA).count(), 0);

    assert_eq!(host.calls_for(DEHUM_1), vec![true, false]);
    assert_eq!(host.calls_for(DEHUM_2), vec![true, false]);
}

#[test]
fn dehumidifiers_need_both_entities() {
    let config = ControllerConfig {
        dehum_2: None,
        ..p_only()
    };
    let (mut c, mut host, mut sink) = make(config);

    host.set_climate(60.0, 70.0);
    run(&mut c, &mut host, &mut sink);
    assert!(host.calls_for(DEHUM_1).is_empty());
    assert!(host.calls_for(DEHUM_2).is_empty());
}

// ── Input failures ────────────────────────────────────────────

#[test]
fn missing_humidity_reading_aborts_without_actuation() {
    let (mut c, mut host, mut sink) = make(wired_config());
    // Would force the cooler on if the cycle ran.
    host.set_sensor(TEMP, "70");

    let res = c.evaluate(Trigger::TemperatureChanged, &mut host, &mut sink);
    assert_eq!(
        res.unwrap_err(),
        Error::SensorUnavailable {
            sensor: Sensor::Humidity,
            cause: SensorError::Unavailable,
        }
    );
    assert!(host.calls.is_empty());
    assert_eq!(sink.skips(), 1);
    assert_eq!(c.skipped(), 1);
    assert_eq!(c.evaluations(), 0);
}

#[test]
fn non_numeric_temperature_aborts_without_actuation() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.set_sensor(TEMP, "unavailable");
    host.set_sensor(HUM, "70");

    let err = c
        .evaluate(Trigger::HumidityChanged, &mut host, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SensorUnavailable {
            sensor: Sensor::Temperature,
            ..
        }
    ));

    host.set_sensor(TEMP, "toasty");
    let err = c
        .evaluate(Trigger::HumidityChanged, &mut host, &mut sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::SensorUnavailable {
            sensor: Sensor::Temperature,
            cause: SensorError::NotNumeric,
        }
    );
    assert!(host.calls.is_empty());
}

#[test]
fn non_finite_values_from_host_abort_and_leave_pid_alone() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.set_climate(60.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    host.force_relay(COOLER, true);
    let before = c.inspect_pid();
    let calls_before = host.calls.len();

    host.advance_secs(5);
    host.set_raw_value(TEMP, f32::NAN);
    let err = c
        .evaluate(Trigger::TemperatureChanged, &mut host, &mut sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::SensorUnavailable {
            sensor: Sensor::Temperature,
            cause: SensorError::NotNumeric,
        }
    );

    host.set_raw_value(TEMP, 60.0);
    host.set_raw_value(HUM, f32::INFINITY);
    let err = c
        .evaluate(Trigger::HumidityChanged, &mut host, &mut sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::SensorUnavailable {
            sensor: Sensor::Humidity,
            cause: SensorError::NotNumeric,
        }
    );

    assert_eq!(host.calls.len(), calls_before);
    assert!(host.is_on(COOLER));
    assert_eq!(c.inspect_pid(), before);
    assert_eq!(c.skipped(), 2);

    // Next valid reading is evaluated normally.
    host.set_raw_value(HUM, 60.0);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(report.pid.integral.is_finite());
    assert!(report.pid.output.is_finite());
}

#[test]
fn unconfigured_sensor_id_aborts() {
    let config = ControllerConfig {
        temp_sensor: None,
        ..wired_config()
    };
    let (mut c, mut host, mut sink) = make(config);
    host.set_climate(70.0, 70.0);

    let err = c
        .evaluate(Trigger::Periodic, &mut host, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::ConfigurationIncomplete("temp_sensor"));
    assert!(host.calls.is_empty());
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn repeated_evaluation_issues_no_extra_calls() {
    let (mut c, mut host, mut sink) = make(wired_config());

    host.set_climate(63.0, 63.0);
    run(&mut c, &mut host, &mut sink);
    let after_first = host.calls.len();
    assert_eq!(after_first, 3, "cooler and both dehumidifiers");

    host.advance_secs(5);
    let report = run(&mut c, &mut host, &mut sink);
    assert!(report.commands.is_empty());
    assert_eq!(host.calls.len(), after_first);
}

// ── Summary ───────────────────────────────────────────────────

#[test]
fn summary_follows_interval_from_first_evaluation() {
    let (mut c, mut host, mut sink) = make(p_only());
    host.set_climate(60.0, 60.0);
    host.set_sensor(VPD, "1.1");

    for _ in 0..=24 {
        run(&mut c, &mut host, &mut sink);
        host.advance_secs(5);
    }
    // Evaluations at 0..=120 s with a 60 s interval.
    assert_eq!(sink.summaries(), 2);

    let first = sink.events.iter().find_map(|e| match e {
        ClimateEvent::Summary(s) => Some(s.clone()),
        _ => None,
    });
    let first = first.unwrap();
    assert_eq!(first.vpd_kpa, Some(1.1));
    assert_eq!(first.vpd_in_band, Some(true));
    assert_eq!(first.cooler_on, Some(false));
    assert_eq!(first.evaluations, 13);
}

// ── Runtime commands ──────────────────────────────────────────

#[test]
fn disabled_controller_does_nothing() {
    let (mut c, mut host, mut sink) = make(wired_config());
    c.handle_command(ControllerCommand::Disable, &mut sink).unwrap();
    assert!(!c.is_enabled());

    host.set_climate(70.0, 70.0);
    let res = c.evaluate(Trigger::Periodic, &mut host, &mut sink).unwrap();
    assert!(matches!(res, Evaluation::Disabled));
    assert!(host.calls.is_empty());

    c.handle_command(ControllerCommand::Enable, &mut sink).unwrap();
    run(&mut c, &mut host, &mut sink);
    assert!(host.is_on(COOLER));

    let toggles: Vec<bool> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            ClimateEvent::EnabledChanged(on) => Some(*on),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![false, true]);
}

#[test]
fn config_update_keeps_pid_history() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.set_climate(60.0, 60.0);
    run(&mut c, &mut host, &mut sink);
    let integral = c.inspect_pid().integral;
    assert!(integral > 0.0);

    let update = ControllerConfig {
        kp: 2.0,
        target_temp: 66.0,
        ..wired_config()
    };
    c.handle_command(ControllerCommand::UpdateConfig(update), &mut sink)
        .unwrap();
    assert_eq!(c.inspect_pid().integral, integral);
    assert_eq!(c.config().kp, 2.0);

    let bad = ControllerConfig {
        output_min: 100.0,
        output_max: 0.0,
        ..wired_config()
    };
    assert!(
        c.handle_command(ControllerCommand::UpdateConfig(bad), &mut sink)
            .is_err()
    );
    assert_eq!(c.config().kp, 2.0);
}

#[test]
fn target_and_reset_commands() {
    let (mut c, mut host, mut sink) = make(wired_config());
    host.set_climate(60.0, 60.0);
    run(&mut c, &mut host, &mut sink);

    c.handle_command(ControllerCommand::SetTargetTemperature(68.0), &mut sink)
        .unwrap();
    assert_eq!(c.config().target_temp, 68.0);
    assert!(c.inspect_pid().integral > 0.0);

    c.handle_command(ControllerCommand::ResetPid, &mut sink).unwrap();
    assert_eq!(c.inspect_pid().integral, 0.0);
}
