//! # Rally-copilot CLI
//!
//! Command-line interface for the rally-copilot library.
//! Loads a route, then calls out each maneuver as the car approaches it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{debug, error, LevelFilter};
use rally_copilot::{
    extract, preview_callouts, DisplaySink, LogSpeechEngine, NavigationConfig,
    NavigationController, PositionSource, Route, RouteSummary, SpeechQueue,
};
use tokio::sync::Notify;

mod cli;

/// Command-line interface for rally-copilot
#[derive(Parser)]
#[command(name = "rally-copilot")]
#[command(about = "Rally pace-note callouts from turn-by-turn routes and GPS fixes")]
#[command(long_about = "Calls out each maneuver of a route in rally terms as you approach it:
  rally-copilot route.json                       # Simulated replay of the first waypoints
  rally-copilot route.json --dry-run             # Print every callout and exit
  rally-copilot response.json --directions       # Full directions response instead of a bare route
  rally-copilot route.json --positions gps.jsonl # Live positions, one JSON object per line
  gpsd-bridge | rally-copilot route.json --positions -

Position lines look like {\"lat\": 52.2855, \"lon\": -1.5373}.")]
#[command(version = env!("RALLY_VERSION"))]
struct Cli {
    /// Route document to navigate
    route: PathBuf,

    /// Treat the route file as a full directions response (status + routes)
    #[arg(long)]
    directions: bool,

    /// Replay the first waypoints at a fixed cadence (default without --positions)
    #[arg(long, conflicts_with = "positions")]
    simulate: bool,

    /// Read JSON-line position updates from a file, or "-" for stdin
    #[arg(long, value_name = "FILE")]
    positions: Option<PathBuf>,

    /// Proximity threshold in meters
    #[arg(long, value_name = "M")]
    threshold: Option<f64>,

    /// Seconds between simulated positions
    #[arg(long, value_name = "SECS")]
    interval: Option<f64>,

    /// Seconds before the first simulated position
    #[arg(long, value_name = "SECS")]
    start_delay: Option<f64>,

    /// Number of waypoints the simulated replay visits
    #[arg(long, value_name = "N")]
    max_simulated: Option<usize>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the callouts for the whole route and exit
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Why the navigation loop ended
#[derive(Debug, PartialEq)]
enum Outcome {
    RouteComplete,
    SourceExhausted,
    Interrupted,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_module("rally_copilot", LevelFilter::Debug);
    }
    logger.target(env_logger::Target::Stderr).init();

    if cli.verbose {
        eprintln!("🏎️  Rally-copilot v{} starting...", env!("RALLY_VERSION"));
    }

    let config = resolve_config(&cli)?;
    let route = rally_copilot::load_route(&cli.route, cli.directions)
        .with_context(|| format!("failed to load route from {}", cli.route.display()))?;
    let waypoints = extract(&route).context("route has no usable legs")?;

    show_route_info(&route);

    if cli.dry_run {
        eprintln!("🔍 [DRY RUN] {} callouts", waypoints.len());
        for callout in preview_callouts(&waypoints) {
            println!("{callout}");
        }
        return Ok(());
    }

    if waypoints.is_empty() {
        eprintln!("🏁 Route has no waypoints, nothing to call out");
        return Ok(());
    }

    navigate(&cli, config, &route, waypoints.len()).await
}

/// Defaults, then the config file, then individual flags
fn resolve_config(cli: &Cli) -> anyhow::Result<NavigationConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NavigationConfig::default(),
    };

    if let Some(threshold) = cli.threshold {
        config.proximity_threshold_m = threshold;
    }
    if let Some(secs) = cli.interval {
        config.simulation_interval = seconds(secs, "--interval")?;
    }
    if let Some(secs) = cli.start_delay {
        config.simulation_start_delay = seconds(secs, "--start-delay")?;
    }
    if let Some(max) = cli.max_simulated {
        config.simulation_max_waypoints = max;
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> anyhow::Result<NavigationConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    NavigationConfig::from_json(&json)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn seconds(secs: f64, flag: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{flag} must be a non-negative number of seconds"))
}

/// Show the route summary
fn show_route_info(route: &Route) {
    match RouteSummary::from_route(route) {
        Ok(summary) => {
            for line in summary.to_string().lines() {
                eprintln!("🗺️  {line}");
            }
        }
        Err(e) => debug!("No route summary: {e}"),
    }
}

/// Run the controller until the route completes, the source runs dry, or Ctrl-C
async fn navigate(
    args: &Cli,
    config: NavigationConfig,
    route: &Route,
    waypoint_count: usize,
) -> anyhow::Result<()> {
    let progress = Arc::new(cli::RouteProgress::new(
        waypoint_count as u64,
        "🏁 Navigation started",
    ));
    let route_done = Arc::new(Notify::new());

    let display = {
        let progress = Arc::clone(&progress);
        let route_done = Arc::clone(&route_done);
        move |callout: &str| {
            progress.display(callout);
            if progress.pb.position() >= waypoint_count as u64 {
                route_done.notify_one();
            }
        }
    };

    let speech = SpeechQueue::spawn(Arc::new(LogSpeechEngine))?;
    let controller = NavigationController::new(config, Arc::new(speech), Arc::new(display))?;
    controller.set_route(route)?;

    let (source, feed) = match (&args.positions, args.simulate) {
        (Some(path), false) => {
            let (rx, task) = cli::spawn_position_feed(path.clone());
            (PositionSource::Live(rx), Some(task))
        }
        _ => (PositionSource::Simulated, None),
    };

    let driver = controller.start(source)?;

    let outcome = tokio::select! {
        result = driver => {
            result.context("navigation driver failed")?;
            Outcome::SourceExhausted
        }
        _ = route_done.notified() => Outcome::RouteComplete,
        _ = tokio::signal::ctrl_c() => Outcome::Interrupted,
    };

    controller.stop();
    progress.finish();
    debug!("Navigation ended: {outcome:?}");

    if let Some(feed) = feed {
        if outcome == Outcome::SourceExhausted {
            let sent = feed
                .await
                .context("position feed task failed")?
                .context("failed to read positions")?;
            debug!("Position feed delivered {sent} updates");
        } else {
            // Might still be parked on an idle stdin
            feed.abort();
        }
    }

    let snapshot = controller.snapshot();
    eprintln!(
        "📍 Reached {}/{} waypoints",
        snapshot.next_index, snapshot.waypoint_count
    );

    Ok(())
}
