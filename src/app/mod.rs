//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the climate controller:
//! per-trigger orchestration of heater, cooler, cooling load and
//! dehumidifier rules. All interaction with sensors and switches happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without a real automation host.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
