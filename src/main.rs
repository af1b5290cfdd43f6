//! tentclimate — run the climate controller against a simulated tent.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedTent             LogEventSink      JsonFileConfig    │
//! │  (Sensor+Relay+Clock)      (EventSink)       (ConfigPort)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ClimateController (pure logic)              │    │
//! │  │  Heater · Cooler/PID · Cooling load · Dehumidifiers    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · TriggerQueue (coalescing)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use tentclimate::adapters::config_file::JsonFileConfig;
use tentclimate::adapters::log_sink::LogEventSink;
use tentclimate::adapters::sim::SimulatedTent;
use tentclimate::app::ports::{Clock, ConfigError, ConfigPort, ScheduleFiredKind, SchedulerDelegate};
use tentclimate::app::service::ClimateController;
use tentclimate::config::ControllerConfig;
use tentclimate::scheduler::{Schedule, ScheduleKind, Scheduler};
use tentclimate::triggers::{Trigger, TriggerQueue};

#[derive(Parser, Debug)]
#[command(name = "tentclimate", about = "Grow-tent climate controller, simulated.")]
struct Cli {
    /// Path to a JSON config file (missing keys take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated minutes to run
    #[arg(short, long, default_value_t = 60)]
    minutes: u32,

    /// Ambient temperature outside the tent (°F)
    #[arg(long, default_value_t = 72.0)]
    ambient_temp: f32,

    /// Ambient relative humidity outside the tent (%)
    #[arg(long, default_value_t = 65.0)]
    ambient_humidity: f32,

    /// Starting temperature inside the tent (°F); defaults to ambient
    #[arg(long)]
    start_temp: Option<f32>,

    /// Starting relative humidity inside the tent (%); defaults to ambient
    #[arg(long)]
    start_humidity: Option<f32>,

    /// Simulation step in milliseconds
    #[arg(long, default_value_t = 1000)]
    step_ms: u64,
}

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the controller)
// to the trigger queue.

struct QueueDelegate<'a> {
    queue: &'a TriggerQueue,
}

impl SchedulerDelegate for QueueDelegate<'_> {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        log::debug!("Schedule fired: '{}' ({:?})", label, kind);
        self.queue.push(Trigger::Periodic);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(ControllerConfig::default());
    };
    match JsonFileConfig::new(&path).load() {
        Ok(c) => Ok(c),
        Err(ConfigError::NotFound) => {
            warn!("{} not found, using defaults", path.display());
            Ok(ControllerConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("loading {}", path.display())),
    }
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    let env = Env::default()
        .filter_or("TENTCLIMATE_LOG", "info")
        .write_style_or("TENTCLIMATE_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let cli = Cli::parse();
    info!("tentclimate v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config + adapters ──────────────────────────────────
    let mut config = load_config(cli.config)?;
    SimulatedTent::wire(&mut config);

    let mut tent = SimulatedTent::new(cli.ambient_temp, cli.ambient_humidity);
    tent.set_climate(
        cli.start_temp.unwrap_or(cli.ambient_temp),
        cli.start_humidity.unwrap_or(cli.ambient_humidity),
    );
    let mut sink = LogEventSink::new();

    let control_interval = config.control_interval;
    let mut controller = ClimateController::new(config).context("invalid controller configuration")?;

    // ── 3. Trigger sources ────────────────────────────────────
    let queue = TriggerQueue::new();
    let mut delegate = QueueDelegate { queue: &queue };
    let mut scheduler = Scheduler::new();
    scheduler.add(Schedule {
        label: "control",
        kind: ScheduleKind::Periodic {
            interval_secs: control_interval,
        },
        enabled: true,
    });
    scheduler.add(Schedule {
        label: "startup",
        kind: ScheduleKind::OneShot { delay_secs: 0 },
        enabled: true,
    });

    // ── 4. Main loop ──────────────────────────────────────────
    let end_ms = u64::from(cli.minutes) * 60_000;
    let step_ms = cli.step_ms.max(1);
    while tent.now_ms() < end_ms {
        let changes = tent.advance(step_ms);
        if changes.temperature {
            queue.push(Trigger::TemperatureChanged);
        }
        if changes.humidity {
            queue.push(Trigger::HumidityChanged);
        }
        scheduler.tick(step_ms, &mut delegate);

        let pending = queue.drain();
        let Some(trigger) = pending.primary() else {
            continue;
        };
        if let Err(e) = controller.evaluate(trigger, &mut tent, &mut sink) {
            warn!("Evaluation failed: {}", e);
        }
    }

    info!(
        "Simulation finished after {} min: {} evaluations, {} skipped, failsafes=0b{:03b}",
        cli.minutes,
        controller.evaluations(),
        controller.skipped(),
        controller.failsafes()
    );
    Ok(())
}
