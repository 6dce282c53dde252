//! quake-debris-sim binary
//!
//! Loads a building layout (or a prediction response), collapses it, runs
//! the frame loop until the debris settles, and writes the occupancy matrix.
//! Events stream to stdout as JSON lines.
//!
//! ## Configuration (TOML file and/or env via `config` crate)
//!
//! | Key                      | Env                          | Default | Description                   |
//! |--------------------------|------------------------------|---------|-------------------------------|
//! | `meters_per_unit`        | `QUAKE_METERS_PER_UNIT`      | `2.0`   | Scene units → meters          |
//! | `debris.fragment_edge`   | `QUAKE_DEBRIS__FRAGMENT_EDGE`| `0.5`   | Target fragment edge length   |
//! | `debris.max_fragments`   | `QUAKE_DEBRIS__MAX_FRAGMENTS`| `20000` | Fragment cap per building     |
//! | `grid.rows` / `grid.cols`| `QUAKE_GRID__ROWS` / `__COLS`| `50`    | Occupancy resolution          |
//! | `kick_duration_ms`       | `QUAKE_KICK_DURATION_MS`     | `6000`  | Initial debris kick window    |
//! | `physics_dt`             | `QUAKE_PHYSICS_DT`           | `1/60`  | Integration step (s)          |
//! | `seed`                   | `QUAKE_SEED`                 | `42`    | Debris RNG seed               |

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use quake_debris::{
    protocol::{subjects, OccupancyUpdated, SimEvent},
    runner::{publish, Published, RunnerConfig, SimRunner},
    BallisticHost, CollapseSession, CollapseTrigger, SimConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "quake-debris-sim", about = "Headless seismic collapse simulator", version)]
struct Args {
    /// Layout file (JSON array of buildings)
    #[arg(long, env = "QUAKE_LAYOUT", conflicts_with = "prediction")]
    layout: Option<PathBuf>,

    /// Prediction service response (JSON)
    #[arg(long, env = "QUAKE_PREDICTION")]
    prediction: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long, env = "QUAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Session name stamped on every event
    #[arg(long, env = "QUAKE_SESSION", default_value = "default")]
    session: String,

    /// Override the debris RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Frame rate (Hz) when pacing in real time
    #[arg(long, env = "QUAKE_TICK_RATE_HZ", default_value_t = 60.0)]
    tick_rate_hz: f32,

    /// Frame cap for the run
    #[arg(long, env = "QUAKE_MAX_FRAMES", default_value_t = 3600)]
    max_frames: u64,

    /// Pace frames at the tick rate instead of free-running
    #[arg(long)]
    realtime: bool,

    /// Collapse only buildings within --radius of this point
    #[arg(long, requires_all = ["epicenter_z", "radius"])]
    epicenter_x: Option<f32>,

    #[arg(long, requires_all = ["epicenter_x", "radius"])]
    epicenter_z: Option<f32>,

    #[arg(long)]
    radius: Option<f32>,

    /// Where to write the occupancy matrix
    #[arg(long, default_value = "damageMatrix.json")]
    matrix_out: PathBuf,

    /// Where to write the final session snapshot
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
}

impl Args {
    fn trigger(&self) -> CollapseTrigger {
        match (self.epicenter_x, self.epicenter_z, self.radius) {
            (Some(x), Some(z), Some(radius)) => CollapseTrigger::Epicenter { x, z, radius },
            _ => CollapseTrigger::All,
        }
    }
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("QUAKE")
            .prefix_separator("_")
            .separator("__"),
    );

    let mut sim: SimConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;
    if let Some(seed) = args.seed {
        sim.seed = seed;
    }
    Ok(sim)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quake_debris=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let host = BallisticHost::new(config.host.clone());
    let mut session = CollapseSession::new(config)?;

    match (&args.layout, &args.prediction) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read layout {}", path.display()))?;
            session.load_layout_json(&json)?;
        }
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read predictions {}", path.display()))?;
            session.load_prediction_json(&json)?;
        }
        (None, None) => bail!("one of --layout or --prediction is required"),
    }

    log::info!(
        "Starting quake-debris-sim (session='{}', buildings={}, seed={})",
        args.session,
        session.buildings().len(),
        session.config().seed,
    );

    // Event sink: JSON lines on stdout
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Published>();
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            println!(
                "{}",
                serde_json::json!({ "subject": msg.subject, "event": msg.payload })
            );
        }
    });

    let occupancy = session.occupancy();
    publish(
        &tx,
        subjects::OCCUPANCY_UPDATED,
        SimEvent::new(
            args.session.as_str(),
            0,
            OccupancyUpdated {
                rows: occupancy.row_count(),
                cols: occupancy.col_count(),
                blocked_cells: occupancy.blocked_count(),
            },
        ),
    );

    let triggered = session.trigger(args.trigger());
    publish(
        &tx,
        subjects::COLLAPSE_TRIGGERED,
        SimEvent::new(args.session.as_str(), 0, triggered),
    );

    let session = Arc::new(Mutex::new(session));
    let runner = SimRunner::new(
        RunnerConfig {
            session: args.session.clone(),
            tick_rate_hz: args.tick_rate_hz,
            max_frames: args.max_frames,
            realtime: args.realtime,
        },
        session.clone(),
        host,
    );

    // Run until settled, the frame cap, or Ctrl-C
    let mut run_handle = tokio::spawn(runner.run(tx.clone()));
    tokio::select! {
        joined = &mut run_handle => {
            let summary = joined.context("Frame loop panicked")??;
            log::info!(
                "Run complete: {} frames, settled={}, {} of {} fragments frozen",
                summary.frames,
                summary.settled,
                summary.stats.settled_fragments,
                summary.stats.fragments,
            );
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("quake-debris-sim interrupted (SIGINT), resetting");
            run_handle.abort();
            let reset = session.lock().reset();
            publish(&tx, subjects::COLLAPSE_RESET, SimEvent::new(args.session.as_str(), 0, reset));
        }
    }

    // Outputs
    {
        let session = session.lock();
        let matrix = session.occupancy().to_json()?;
        std::fs::write(&args.matrix_out, matrix)
            .with_context(|| format!("Failed to write {}", args.matrix_out.display()))?;
        log::info!("Occupancy matrix written to {}", args.matrix_out.display());

        if let Some(path) = &args.snapshot_out {
            let snapshot = session.snapshot();
            std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            publish(
                &tx,
                subjects::SNAPSHOT,
                SimEvent::new(args.session.as_str(), session.stats().total_frames, snapshot),
            );
        }
    }

    // Drop the last sender so the writer drains and exits.
    drop(tx);
    writer.await.context("Event writer panicked")?;
    Ok(())
}
