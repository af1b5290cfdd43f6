//! Grow-tent climate controller.
//!
//! Decision engine for an enclosure with a cooler, a heater and a pair of
//! dehumidifiers. Exposes the pure-logic modules for integration testing
//! and for embedding in an automation host; the `tentclimate` binary
//! drives them against a simulated tent.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod safety;
pub mod scheduler;
pub mod triggers;
