//! Presence Plug: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   SolarDaylight   SystemClock  │
//! │  (Sensor+Outlet)   (EventSink)    (DaylightPort)  (TimePort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  OccupancyController · OutletGate · DaylightGate       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SIGINT/SIGTERM ──▶ shutdown flag ──▶ final off                │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use presence_plug::adapters::gpio::SensorBank;
use presence_plug::adapters::hardware::HardwareAdapter;
use presence_plug::adapters::log_sink::LogEventSink;
use presence_plug::adapters::outlet::Outlet;
use presence_plug::adapters::time::SystemClock;
use presence_plug::app::service::AppService;
use presence_plug::config::SystemConfig;
use presence_plug::{shutdown, solar};

#[derive(Parser)]
#[command(name = "presence-plug", version)]
#[command(about = "Switch a smart plug on presence, outside daylight hours")]
struct Cli {
    /// JSON configuration file (defaults are used when absent)
    #[arg(long, env = "PRESENCE_PLUG_CONFIG")]
    config: Option<PathBuf>,

    /// Log outlet commands instead of running the outlet program
    #[arg(long)]
    dry_run: bool,

    /// Override the poll interval
    #[arg(long)]
    poll_interval_ms: Option<u32>,

    /// Override the grace period after presence ends
    #[arg(long)]
    turn_off_after_secs: Option<u32>,

    /// Override the spacing of repeated off commands
    #[arg(long)]
    periodic_off_interval_secs: Option<u32>,

    /// Silence all log output
    #[arg(long, short)]
    quiet: bool,
}

impl Cli {
    fn apply(&self, config: &mut SystemConfig) {
        if let Some(v) = self.poll_interval_ms {
            config.poll_interval_ms = v;
        }
        if let Some(v) = self.turn_off_after_secs {
            config.turn_off_after_secs = v;
        }
        if let Some(v) = self.periodic_off_interval_secs {
            config.periodic_off_interval_secs = v;
        }
        if self.quiet {
            config.logging = false;
        }
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Configuration ──────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => SystemConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SystemConfig::default(),
    };
    cli.apply(&mut config);

    init_logger();
    if !config.logging {
        log::set_max_level(LevelFilter::Off);
    }
    info!("Presence Plug v{}", env!("CARGO_PKG_VERSION"));

    config.validate().context("invalid configuration")?;
    info!(
        "grace {} s, re-off every {} s, poll {} ms",
        config.turn_off_after_secs, config.periodic_off_interval_secs, config.poll_interval_ms
    );

    // ── 2. Adapters ───────────────────────────────────────────
    let sensors = SensorBank::open(&config.sensors).context("opening presence sensors")?;
    info!("{} presence sensor(s) ready", sensors.len());
    let outlet = Outlet::from_command(&config.outlet.command, cli.dry_run);
    let mut hw = HardwareAdapter::new(sensors, outlet);
    let mut daylight = solar::from_config(&config.daylight.source);
    let mut clock = SystemClock::new();
    let mut sink = LogEventSink::new();

    shutdown::install_signal_handlers().context("installing signal handlers")?;

    // ── 3. Poll loop ──────────────────────────────────────────
    let mut service = AppService::new(&config);
    service.run(
        &mut hw,
        &mut daylight,
        &mut clock,
        &mut sink,
        shutdown::shutdown_flag(),
    )?;

    info!("exited cleanly after {} ticks", service.tick_count());
    Ok(())
}
