//! Mock automation host for integration tests.
//!
//! Holds raw sensor states the way a home-automation host reports them
//! (strings, possibly `"unavailable"`), tracks relay states, and records
//! every `set_relay` call so tests can assert on the full command history.

use std::collections::HashMap;

use tentclimate::app::events::ClimateEvent;
use tentclimate::app::ports::{
    Clock, EventSink, RelayPort, RelayState, SensorPort, parse_sensor_state,
};
use tentclimate::config::ControllerConfig;
use tentclimate::error::SensorError;

pub const TEMP: &str = "sensor.tent_temp";
pub const HUM: &str = "sensor.tent_rh";
pub const VPD: &str = "sensor.tent_vpd";
pub const COOLER: &str = "switch.cooler";
pub const HEATER: &str = "switch.heater";
pub const DEHUM_1: &str = "switch.dehum_1";
pub const DEHUM_2: &str = "switch.dehum_2";

/// Default configuration with every entity wired to the mock host.
pub fn wired_config() -> ControllerConfig {
    ControllerConfig {
        temp_sensor: Some(TEMP.into()),
        hum_sensor: Some(HUM.into()),
        vpd_sensor: Some(VPD.into()),
        cooler_entity: Some(COOLER.into()),
        heater_entity: Some(HEATER.into()),
        dehum_1: Some(DEHUM_1.into()),
        dehum_2: Some(DEHUM_2.into()),
        ..ControllerConfig::default()
    }
}

// ── MockHost ──────────────────────────────────────────────────

pub struct MockHost {
    sensors: HashMap<String, String>,
    /// Numeric values returned as-is, bypassing string parsing.
    raw_values: HashMap<String, f32>,
    relays: HashMap<String, bool>,
    pub calls: Vec<(String, bool)>,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl MockHost {
    /// Host with every relay reported OFF.
    pub fn new() -> Self {
        let relays = [COOLER, HEATER, DEHUM_1, DEHUM_2]
            .into_iter()
            .map(|e| (e.to_string(), false))
            .collect();
        Self {
            sensors: HashMap::new(),
            raw_values: HashMap::new(),
            relays,
            calls: Vec::new(),
            now_ms: 0,
        }
    }

    pub fn set_climate(&mut self, temperature: f32, humidity: f32) {
        self.set_sensor(TEMP, &temperature.to_string());
        self.set_sensor(HUM, &humidity.to_string());
    }

    pub fn set_sensor(&mut self, entity: &str, raw: &str) {
        self.sensors.insert(entity.to_string(), raw.to_string());
    }

    /// Report `value` for `entity` without going through
    /// `parse_sensor_state`, like a host with a numeric API would.
    pub fn set_raw_value(&mut self, entity: &str, value: f32) {
        self.raw_values.insert(entity.to_string(), value);
    }

    pub fn remove_sensor(&mut self, entity: &str) {
        self.sensors.remove(entity);
    }

    /// Change relay state behind the controller's back (manual switch).
    pub fn force_relay(&mut self, entity: &str, on: bool) {
        self.relays.insert(entity.to_string(), on);
    }

    pub fn remove_relay(&mut self, entity: &str) {
        self.relays.remove(entity);
    }

    pub fn is_on(&self, entity: &str) -> bool {
        self.relays.get(entity).copied().unwrap_or(false)
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.now_ms += secs * 1000;
    }

    pub fn calls_for(&self, entity: &str) -> Vec<bool> {
        self.calls
            .iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, on)| *on)
            .collect()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHost {
    fn read_sensor(&mut self, entity: &str) -> Result<f32, SensorError> {
        if let Some(v) = self.raw_values.get(entity) {
            return Ok(*v);
        }
        parse_sensor_state(self.sensors.get(entity).map(String::as_str))
    }
}

impl RelayPort for MockHost {
    fn relay_state(&self, entity: &str) -> RelayState {
        self.relays
            .get(entity)
            .map_or(RelayState::Unknown, |on| RelayState::from_on(*on))
    }

    fn set_relay(&mut self, entity: &str, on: bool) {
        self.calls.push((entity.to_string(), on));
        self.relays.insert(entity.to_string(), on);
    }
}

impl Clock for MockHost {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

// ── Recording sink ────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<ClimateEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn cutoffs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ClimateEvent::CoolingCutoff { .. }))
            .count()
    }

    pub fn summaries(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ClimateEvent::Summary(_)))
            .count()
    }

    pub fn skips(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ClimateEvent::EvaluationSkipped { .. }))
            .count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ClimateEvent) {
        self.events.push(event.clone());
    }
}
