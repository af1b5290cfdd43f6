//! Inbound commands to the decision engine.
//!
//! These represent runtime requests from the outside world (operator UI,
//! automation bridge, CLI) that the
//! [`ClimateController`](super::service::ClimateController) applies between
//! evaluations.

use crate::config::ControllerConfig;

#[derive(Debug, Clone)]
pub enum ControllerCommand {
    /// Resume evaluations.
    Enable,

    /// Suspend evaluations. Relays are left as they are.
    Disable,

    /// Allow or forbid heater commands.
    SetHeaterEnabled(bool),

    /// Re-seed the temperature setpoint. PID history is kept.
    SetTargetTemperature(f32),

    /// Clear PID integral and derivative history.
    ResetPid,

    /// Replace the configuration. Validated first; PID history, cooling
    /// load tracking and dwell timers survive.
    UpdateConfig(ControllerConfig),
}
