//! Controller configuration parameters
//!
//! All tunable parameters for one managed enclosure. The serialised form is
//! a flat key-value object; every key is optional and falls back to the
//! defaults below. Temperatures are in °F, humidity in %RH, durations in
//! seconds.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::hysteresis::HeaterThresholds;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Master switches ---
    /// Run the decision engine at all
    pub enabled: bool,
    /// Allow heater commands
    pub heater_enabled: bool,

    // --- Timing ---
    /// Periodic evaluation interval (seconds)
    pub control_interval: u32,
    /// Summary report interval (seconds)
    pub summary_interval: u32,

    // --- Temperature PID ---
    /// Desired temperature (°F)
    pub target_temp: f32,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Lower PID output bound
    pub output_min: f32,
    /// Upper PID output bound
    pub output_max: f32,

    // --- Humidity ---
    pub target_humidity: f32,
    pub hum_upper_limit: f32,
    /// Dehumidifiers are switched off below this humidity
    pub hum_lower_limit: f32,
    /// Dehumidifiers are switched on above this humidity
    pub hum_failsafe_limit: f32,

    // --- VPD (reported only, never used for control) ---
    /// Lower edge of the VPD band (kPa)
    pub target_vpd_low: f32,
    /// Upper edge of the VPD band (kPa)
    pub target_vpd_high: f32,
    pub vpd_kp: f32,
    pub vpd_ki: f32,
    pub vpd_kd: f32,

    // --- Temperature failsafe ---
    /// Cooler forced ON at or above this temperature
    pub upper_limit: f32,
    /// Cooler forced OFF at or below this temperature
    pub lower_limit: f32,

    // --- Short-cycle protection ---
    /// Minimum cooler ON dwell before a PID-driven switch-off (seconds)
    pub min_on_time: u32,
    /// Minimum cooler OFF dwell before a PID-driven switch-on (seconds)
    pub min_off_time: u32,

    // --- Cooling load tracking ---
    pub cooling_load_tracking: bool,
    /// Continuous cooler run time that triggers a cutoff (seconds)
    pub cooling_threshold: u32,

    // --- Entities ---
    pub cooler_entity: Option<String>,
    pub heater_entity: Option<String>,
    pub dehum_1: Option<String>,
    pub dehum_2: Option<String>,

    // --- Sensors ---
    pub temp_sensor: Option<String>,
    pub hum_sensor: Option<String>,
    pub vpd_sensor: Option<String>,

    // --- Heater thresholds ---
    /// Heater ON at or above this humidity
    pub activate_hum_threshold: f32,
    /// Heater OFF below this humidity
    pub deactivate_hum_threshold: f32,
    /// Heater ON below this temperature
    pub activate_temp_threshold: f32,
    /// Heater OFF above this temperature
    pub deactivate_temp_threshold: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heater_enabled: true,

            // Timing
            control_interval: 5,
            summary_interval: 60,

            // Temperature PID
            target_temp: 65.0,
            kp: 1.5,
            ki: 0.4,
            kd: 0.2,
            output_min: 0.0,
            output_max: 100.0,

            // Humidity
            target_humidity: 60.0,
            hum_upper_limit: 61.0,
            hum_lower_limit: 59.0,
            hum_failsafe_limit: 62.0,

            // VPD
            target_vpd_low: 0.8,
            target_vpd_high: 1.2,
            vpd_kp: 1.5,
            vpd_ki: 0.3,
            vpd_kd: 0.05,

            // Temperature failsafe
            upper_limit: 62.0,
            lower_limit: 55.0,

            // Short-cycle protection
            min_on_time: 30,
            min_off_time: 20,

            // Cooling load
            cooling_load_tracking: true,
            cooling_threshold: 600, // 10 min

            cooler_entity: None,
            heater_entity: None,
            dehum_1: None,
            dehum_2: None,

            temp_sensor: None,
            hum_sensor: None,
            vpd_sensor: None,

            activate_hum_threshold: 65.0,
            deactivate_hum_threshold: 62.0,
            activate_temp_threshold: 55.0,
            deactivate_temp_threshold: 58.0,
        }
    }
}

impl ControllerConfig {
    /// Parse a flat JSON object. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            warn!("Config: parse error: {}", e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Heater hysteresis thresholds as a single value.
    pub fn heater_thresholds(&self) -> HeaterThresholds {
        HeaterThresholds {
            activate_hum: self.activate_hum_threshold,
            deactivate_hum: self.deactivate_hum_threshold,
            activate_temp: self.activate_temp_threshold,
            deactivate_temp: self.deactivate_temp_threshold,
        }
    }

    /// Reject values the engine cannot run with.
    ///
    /// Threshold ordering is not enforced here; see
    /// [`warnings`](Self::warnings).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            self.target_temp,
            self.kp,
            self.ki,
            self.kd,
            self.output_min,
            self.output_max,
            self.hum_lower_limit,
            self.hum_failsafe_limit,
            self.upper_limit,
            self.lower_limit,
            self.activate_hum_threshold,
            self.deactivate_hum_threshold,
            self.activate_temp_threshold,
            self.deactivate_temp_threshold,
        ];
        if floats.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("non-finite numeric value"));
        }
        if self.output_min >= self.output_max {
            return Err(ConfigError::ValidationFailed(
                "output_min must be below output_max",
            ));
        }
        if self.control_interval == 0 {
            return Err(ConfigError::ValidationFailed("control_interval must be > 0"));
        }
        if self.summary_interval == 0 {
            return Err(ConfigError::ValidationFailed("summary_interval must be > 0"));
        }
        if self.cooling_load_tracking && self.cooling_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "cooling_threshold must be > 0 while tracking is enabled",
            ));
        }
        Ok(())
    }

    /// Suspicious but accepted settings, reported once at load time.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.deactivate_hum_threshold >= self.activate_hum_threshold {
            out.push("deactivate_hum_threshold >= activate_hum_threshold: heater may oscillate");
        }
        if self.deactivate_temp_threshold <= self.activate_temp_threshold {
            out.push("deactivate_temp_threshold <= activate_temp_threshold: heater may oscillate");
        }
        if self.lower_limit >= self.upper_limit {
            out.push("lower_limit >= upper_limit: upper failsafe takes precedence");
        }
        if self.hum_lower_limit >= self.hum_failsafe_limit {
            out.push("hum_lower_limit >= hum_failsafe_limit: dehumidifier band is empty");
        }
        if self.temp_sensor.is_none() || self.hum_sensor.is_none() {
            out.push("temp_sensor or hum_sensor not configured: every evaluation will be skipped");
        }
        out
    }
}
