//! Simulated grow tent.
//!
//! A crude first-order thermal/moisture model that implements
//! [`SensorPort`], [`RelayPort`] and [`Clock`] so the controller can run
//! on a desktop. Temperature and humidity relax toward ambient; each
//! running appliance pushes them at a fixed rate.
//!
//! Sensors report to 0.1 resolution, like most hobby hygrometers, so
//! [`SimulatedTent::advance`] can tell the caller which sensors would have
//! fired a state-change callback.

use std::collections::HashMap;

use log::{debug, warn};

use crate::app::ports::{Clock, RelayPort, RelayState, SensorPort};
use crate::config::ControllerConfig;
use crate::error::SensorError;

pub const TEMP_SENSOR: &str = "sensor.tent_temperature";
pub const HUM_SENSOR: &str = "sensor.tent_humidity";
pub const VPD_SENSOR: &str = "sensor.tent_vpd";
pub const COOLER: &str = "switch.tent_cooler";
pub const HEATER: &str = "switch.tent_heater";
pub const DEHUM_1: &str = "switch.tent_dehumidifier_1";
pub const DEHUM_2: &str = "switch.tent_dehumidifier_2";

/// Fraction of the gap to ambient closed per minute.
const TEMP_RELAX_PER_MIN: f32 = 0.05;
const HUM_RELAX_PER_MIN: f32 = 0.04;

/// Appliance effects, per minute of runtime.
const COOLER_F_PER_MIN: f32 = -1.2;
const HEATER_F_PER_MIN: f32 = 0.8;
const HEATER_RH_PER_MIN: f32 = -0.6;
const DEHUM_RH_PER_MIN: f32 = -0.5;

/// Which sensors changed their reported value during an
/// [`advance`](SimulatedTent::advance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorChanges {
    pub temperature: bool,
    pub humidity: bool,
}

pub struct SimulatedTent {
    temp_f: f32,
    hum_pct: f32,
    ambient_temp_f: f32,
    ambient_hum_pct: f32,
    relays: HashMap<&'static str, bool>,
    now_ms: u64,
}

impl SimulatedTent {
    /// Start at ambient with every appliance off.
    pub fn new(ambient_temp_f: f32, ambient_hum_pct: f32) -> Self {
        let relays = [COOLER, HEATER, DEHUM_1, DEHUM_2]
            .into_iter()
            .map(|e| (e, false))
            .collect();
        Self {
            temp_f: ambient_temp_f,
            hum_pct: ambient_hum_pct,
            ambient_temp_f,
            ambient_hum_pct,
            relays,
            now_ms: 0,
        }
    }

    /// Override the current enclosure state.
    pub fn set_climate(&mut self, temp_f: f32, hum_pct: f32) {
        self.temp_f = temp_f;
        self.hum_pct = hum_pct.clamp(0.0, 100.0);
    }

    /// Fill every entity id the configuration leaves unset with this
    /// tent's ids.
    pub fn wire(config: &mut ControllerConfig) {
        fn fill(slot: &mut Option<String>, id: &str) {
            if slot.is_none() {
                *slot = Some(id.to_string());
            }
        }
        fill(&mut config.temp_sensor, TEMP_SENSOR);
        fill(&mut config.hum_sensor, HUM_SENSOR);
        fill(&mut config.vpd_sensor, VPD_SENSOR);
        fill(&mut config.cooler_entity, COOLER);
        fill(&mut config.heater_entity, HEATER);
        fill(&mut config.dehum_1, DEHUM_1);
        fill(&mut config.dehum_2, DEHUM_2);
    }

    fn is_on(&self, entity: &str) -> bool {
        self.relays.get(entity).copied().unwrap_or(false)
    }

    /// Step the model forward by `dt_ms`.
    pub fn advance(&mut self, dt_ms: u64) -> SensorChanges {
        let before = (round1(self.temp_f), round1(self.hum_pct));
        let minutes = dt_ms as f32 / 60_000.0;

        let mut d_temp = (self.ambient_temp_f - self.temp_f) * TEMP_RELAX_PER_MIN;
        let mut d_hum = (self.ambient_hum_pct - self.hum_pct) * HUM_RELAX_PER_MIN;
        if self.is_on(COOLER) {
            d_temp += COOLER_F_PER_MIN;
        }
        if self.is_on(HEATER) {
            d_temp += HEATER_F_PER_MIN;
            d_hum += HEATER_RH_PER_MIN;
        }
        for dehum in [DEHUM_1, DEHUM_2] {
            if self.is_on(dehum) {
                d_hum += DEHUM_RH_PER_MIN;
            }
        }

        self.temp_f += d_temp * minutes;
        self.hum_pct = (self.hum_pct + d_hum * minutes).clamp(0.0, 100.0);
        self.now_ms += dt_ms;

        let after = (round1(self.temp_f), round1(self.hum_pct));
        SensorChanges {
            temperature: before.0 != after.0,
            humidity: before.1 != after.1,
        }
    }

    /// Vapour pressure deficit in kPa (Tetens).
    pub fn vpd_kpa(&self) -> f32 {
        vpd_kpa(self.temp_f, self.hum_pct)
    }
}

/// Vapour pressure deficit for a Fahrenheit temperature and relative
/// humidity, in kPa.
pub fn vpd_kpa(temp_f: f32, hum_pct: f32) -> f32 {
    let c = (temp_f - 32.0) * 5.0 / 9.0;
    let svp = 0.6108 * (17.27 * c / (c + 237.3)).exp();
    svp * (1.0 - hum_pct / 100.0)
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

impl SensorPort for SimulatedTent {
    fn read_sensor(&mut self, entity: &str) -> Result<f32, SensorError> {
        match entity {
            TEMP_SENSOR => Ok(round1(self.temp_f)),
            HUM_SENSOR => Ok(round1(self.hum_pct)),
            VPD_SENSOR => Ok((self.vpd_kpa() * 100.0).round() / 100.0),
            _ => Err(SensorError::Unavailable),
        }
    }
}

impl RelayPort for SimulatedTent {
    fn relay_state(&self, entity: &str) -> RelayState {
        self.relays
            .get(entity)
            .map_or(RelayState::Unknown, |on| RelayState::from_on(*on))
    }

    fn set_relay(&mut self, entity: &str, on: bool) {
        match self.relays.get_mut(entity) {
            Some(state) => {
                *state = on;
                debug!("Sim: {} <- {}", entity, on);
            }
            None => warn!("Sim: no such relay '{}'", entity),
        }
    }
}

impl Clock for SimulatedTent {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
