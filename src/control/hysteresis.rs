//! Hysteresis evaluators for the heater and the dehumidifiers.
//!
//! Pure functions: no state, no I/O. Separate activate/deactivate
//! thresholds keep the relays from toggling around a single setpoint. The
//! functions do not check that the thresholds are ordered sensibly; an
//! inverted pair simply makes both signals true more often, and activation
//! wins.

/// Heater activate/deactivate thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterThresholds {
    pub activate_hum: f32,
    pub deactivate_hum: f32,
    pub activate_temp: f32,
    pub deactivate_temp: f32,
}

/// Raw hysteresis signals, both computed every time for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaterSignals {
    pub should_activate: bool,
    pub should_deactivate: bool,
}

/// What the engine should do with a two-state actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    TurnOn,
    TurnOff,
    /// Leave the actuator as it is.
    Hold,
}

impl HeaterSignals {
    /// Activation takes precedence over deactivation.
    pub fn decision(self) -> SwitchDecision {
        if self.should_activate {
            SwitchDecision::TurnOn
        } else if self.should_deactivate {
            SwitchDecision::TurnOff
        } else {
            SwitchDecision::Hold
        }
    }
}

/// Evaluate the heater thresholds against the current reading.
pub fn heater_signals(temperature: f32, humidity: f32, t: &HeaterThresholds) -> HeaterSignals {
    HeaterSignals {
        should_activate: humidity >= t.activate_hum || temperature < t.activate_temp,
        should_deactivate: humidity < t.deactivate_hum || temperature > t.deactivate_temp,
    }
}

/// Dehumidifier band: on above the failsafe limit, off below the lower
/// limit, untouched in between.
pub fn dehumidifier_decision(humidity: f32, failsafe_limit: f32, lower_limit: f32) -> SwitchDecision {
    if humidity > failsafe_limit {
        SwitchDecision::TurnOn
    } else if humidity < lower_limit {
        SwitchDecision::TurnOff
    } else {
        SwitchDecision::Hold
    }
}
