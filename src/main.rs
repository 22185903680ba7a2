use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use uav_chase::config::{ControllerKind, Formation, NeighborStrategy};
use uav_chase::terrain::TerrainGenerator;
use uav_chase::{ScenarioConfig, Simulation};

const CONFIG_ENV: &str = "UAV_CHASE_CONFIG";

/// uav-chase - drone vs. bird flock simulator
#[derive(Parser, Debug)]
#[command(name = "uav-chase")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a pursuit scenario and print JSON frame reports
    Run(RunArgs),

    /// Generate a terrain heightmap and print its summary
    Terrain(TerrainArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scenario file (TOML); defaults to $UAV_CHASE_CONFIG when set
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pursuit controller
    #[arg(long, value_enum)]
    controller: Option<ControllerKind>,

    /// Number of frames to simulate
    #[arg(short, long)]
    frames: Option<u64>,

    /// Number of birds at start
    #[arg(short, long)]
    birds: Option<usize>,

    /// Initial flock layout
    #[arg(long, value_enum)]
    formation: Option<Formation>,

    /// Neighbour search strategy
    #[arg(long, value_enum)]
    neighbors: Option<NeighborStrategy>,

    /// Random seed
    #[arg(long, env = "UAV_CHASE_SEED")]
    seed: Option<u64>,

    /// Thermals dropped at random positions
    #[arg(long)]
    thermals: Option<usize>,

    /// Enable the flock-wide drift
    #[arg(long)]
    swarm_drift: bool,

    /// Print a frame report every N frames (0 = summary only)
    #[arg(long)]
    report_every: Option<u64>,
}

#[derive(Args, Debug)]
struct TerrainArgs {
    /// Side length of the square terrain
    #[arg(long, default_value_t = 100.0)]
    size: f32,

    /// Grid points per side
    #[arg(long, default_value_t = 50)]
    resolution: usize,

    /// Random seed for the gradient table and tree placement
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl RunArgs {
    fn load(&self) -> Result<ScenarioConfig> {
        let path = self
            .config
            .clone()
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match &path {
            Some(path) => ScenarioConfig::from_file(path)
                .with_context(|| format!("loading scenario {}", path.display()))?,
            None => ScenarioConfig::default(),
        };

        if let Some(controller) = self.controller {
            config.uav.controller = controller;
        }
        if let Some(frames) = self.frames {
            config.run.frames = frames;
        }
        if let Some(birds) = self.birds {
            config.flock.birds = birds;
        }
        if let Some(formation) = self.formation {
            config.flock.formation = formation;
        }
        if let Some(neighbors) = self.neighbors {
            config.flock.neighbors = neighbors;
        }
        if let Some(seed) = self.seed {
            config.run.seed = seed;
        }
        if let Some(thermals) = self.thermals {
            config.world.random_thermals = thermals;
        }
        if self.swarm_drift {
            config.flock.swarm_drift = true;
        }
        if let Some(every) = self.report_every {
            config.run.report_every = every;
        }

        config.validate().context("invalid scenario")?;
        Ok(config)
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = args.load()?;
    info!(seed = config.run.seed, "using RNG seed");

    let mut sim = Simulation::from_config(&config).context("building simulation")?;
    if sim.flock().is_empty() {
        warn!("flock is empty; the drone will only patrol");
    }

    let every = config.run.report_every;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;

    let summary = sim.run(config.run.frames, |report| {
        if every == 0 || report.frame % every != 0 || write_error.is_some() {
            return;
        }
        let line = serde_json::to_string(report)
            .map_err(anyhow::Error::from)
            .and_then(|line| writeln!(out, "{line}").map_err(anyhow::Error::from));
        if let Err(e) = line {
            write_error = Some(e);
        }
    });

    if let Some(e) = write_error {
        return Err(e.context("writing frame report"));
    }

    serde_json::to_writer_pretty(&mut out, &summary).context("writing run summary")?;
    writeln!(out)?;
    Ok(())
}

fn terrain(args: &TerrainArgs) -> Result<()> {
    anyhow::ensure!(args.size > 0.0, "terrain size must be positive");
    anyhow::ensure!(args.resolution > 0, "terrain resolution must be positive");

    let terrain = TerrainGenerator::new(args.size, args.resolution, args.seed);
    let summary = terrain.summary();
    info!(
        min = summary.min_height,
        max = summary.max_height,
        trees = summary.trees.len(),
        "terrain generated"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &summary).context("writing terrain summary")?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match &cli.command {
        Commands::Run(args) => run(args),
        Commands::Terrain(args) => terrain(args),
    }
}
