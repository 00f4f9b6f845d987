//! # CNC Simulator Binary
//!
//! Runs the machine tick loop, executes G-code given on the command line and
//! logs a status line once per second.
//!
//! # Usage
//!
//! ```bash
//! # Idle machine with stock parameters, stop with Ctrl+C
//! cnc_sim
//!
//! # Home, heat and run a file, then exit
//! cnc_sim --config config/cnc_sim.toml -l "G28" -l "M109 S200" --file part.gcode --exit-when-done
//!
//! # Faster than real time, JSON logs
//! cnc_sim --time-mult 20 --json -v
//! ```

use clap::Parser;
use cnc_common::config::ConfigLoader;
use cnc_common::consts::MM_PER_M;
use cnc_common::machine::SimConfig;
use cnc_common::types::{AxisId, MachineSnapshot};
use cnc_sim::Engine;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// CNC Simulator - trapezoidal motion, PI heaters and G-code execution
#[derive(Parser, Debug)]
#[command(name = "cnc_sim")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Multi-axis CNC/3D-printer simulator")]
#[command(long_about = None)]
struct Args {
    /// Path to simulator configuration (TOML). Stock machine when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Axis settings document (JSON) applied at startup
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// G-code line to execute (can be specified multiple times, run in order)
    #[arg(short, long = "line", action = clap::ArgAction::Append)]
    lines: Vec<String>,

    /// G-code file to execute after the lines
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Exit once all lines and the file have completed
    #[arg(long)]
    exit_when_done: bool,

    /// Override engine.time_mult
    #[arg(long, value_name = "FACTOR")]
    time_mult: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        // No-op when the subscriber is already installed.
        let _ = tracing_subscriber::fmt().try_init();
        error!("Simulator failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(time_mult) = args.time_mult {
        config.engine.time_mult = time_mult;
    }

    setup_tracing(&args, config.shared.log_level.as_level());

    info!(
        "CNC simulator v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let engine = Engine::new(&config)?;

    if let Some(path) = &args.settings {
        let json = std::fs::read_to_string(path)?;
        engine.apply_settings_json(&json)?;
        info!("Axis settings loaded from {}", path.display());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(simulate(engine, &args))?;

    info!("CNC simulator shutdown complete");
    Ok(())
}

async fn simulate(engine: Engine, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let ticker = engine.clone();
    let tick_task = tokio::spawn(async move { ticker.run().await });

    let reporter = engine.clone();
    let report_task = tokio::spawn(async move {
        let mut every_second = interval(Duration::from_secs(1));
        while !reporter.handle().is_shutdown() {
            every_second.tick().await;
            info!("{}", status_line(&reporter.snapshot()));
        }
    });

    let jobs = async {
        for line in &args.lines {
            if engine.execute_line(line.as_str()) {
                engine.wait_idle().await;
            }
        }
        if let Some(file) = &args.file {
            if engine.execute_file(file) {
                engine.wait_idle().await;
            }
        }
    };

    if args.exit_when_done {
        tokio::select! {
            _ = jobs => info!("All G-code done"),
            res = signal::ctrl_c() => {
                res?;
                info!("Received shutdown signal (Ctrl+C)");
            }
        }
    } else {
        jobs.await;
        info!("G-code done, press Ctrl+C to exit");
        signal::ctrl_c().await?;
        info!("Received shutdown signal (Ctrl+C)");
    }

    engine.close().await;
    let stats = tick_task.await?;
    report_task.await?;
    info!(
        "Ran {} ticks (max tick {}us)",
        stats.tick_count, stats.max_tick_time_us
    );
    Ok(())
}

/// One-line summary: positions/targets in mm, temperatures, status, file.
fn status_line(snap: &MachineSnapshot) -> String {
    let mut out = format!("t:{:.1}", snap.time);
    for id in AxisId::ALL {
        let axis = snap.axis(id);
        out.push_str(&format!(
            " {}:{:.1}/{:.1}",
            id.letter().to_ascii_lowercase(),
            axis.position * MM_PER_M,
            axis.target * MM_PER_M
        ));
    }
    out.push_str(&format!(
        " Nozzle:{:.1}/{:.1} Plate:{:.1}/{:.1} Status: {}",
        snap.nozzle.temperature, snap.nozzle.target, snap.plate.temperature, snap.plate.target, snap.status
    ));
    if let Some(file) = &snap.current_file {
        out.push_str(&format!(" - {} - {}%", file, snap.progress));
    }
    if let Some(line) = &snap.current_line {
        out.push_str(&format!(" - {}", line));
    }
    out
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
