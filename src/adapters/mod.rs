//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements             | Connects to              |
//! |---------------|------------------------|--------------------------|
//! | `config_file` | ConfigPort             | JSON file on disk        |
//! | `log_sink`    | EventSink              | `log` facade             |
//! | `sim`         | SensorPort, RelayPort, | Simulated grow tent      |
//! |               | Clock                  |                          |
//!
//! A home-automation bridge implements the same ports against the host's
//! entity registry.

pub mod config_file;
pub mod log_sink;
pub mod sim;
