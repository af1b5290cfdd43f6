//! Control primitives used by the decision engine.
//!
//! Each submodule is self-contained and free of I/O: the PID loop, the
//! hysteresis evaluators, the cooling load tracker and the short-cycle
//! guard. [`ClimateController`](crate::app::service::ClimateController)
//! wires them together.

pub mod cooling_load;
pub mod hysteresis;
pub mod pid;
pub mod short_cycle;
