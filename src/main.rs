use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roadwatch::{
    engine::EngineBuilder,
    rng::RngManager,
    scenario::ScenarioLoader,
    signal::StopSignal,
    sink::{ArtifactPaths, FileSink, MemorySink},
    summary::RunReport,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Traffic violation simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/downtown.yaml")]
    scenario: PathBuf,

    /// Stop after this many ticks (runs until interrupted when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the violation log, frames and payment codes
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the delay between ticks in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Keep violation records in memory instead of writing artifacts
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Trigger `stop` on Ctrl+C or when `q` is entered on stdin.
fn watch_for_quit(stop: StopSignal) {
    let on_interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current tick");
            on_interrupt.trigger();
        }
    });
    // Blocking stdin reads cannot be cancelled, so the reader lives on a
    // detached thread that exits with the process.
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                info!("quit requested, stopping after the current tick");
                stop.trigger();
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    if let Some(pacing_ms) = cli.pacing_ms {
        scenario.pacing_ms = pacing_ms;
    }
    if let Some(dir) = cli.output_dir {
        scenario.output.dir = dir;
    }
    init_tracing(&scenario.logging.level);

    let mut rng = RngManager::new(scenario.seed);
    let world = scenario
        .build_world(&mut rng)
        .with_context(|| format!("Failed to build scenario '{}'", scenario.name))?;
    let ledger = scenario.ledger();
    let builder = EngineBuilder::new(scenario.engine_settings(), world);
    let mut engine = if cli.dry_run {
        builder.with_sink(MemorySink::new(ledger.clone())).build()
    } else {
        let paths = ArtifactPaths::under(&scenario.output.dir);
        let sink = FileSink::new(ledger.clone(), paths)?;
        builder.with_sink(sink).build()
    };

    let stop = StopSignal::new();
    watch_for_quit(stop.clone());
    info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        output = %scenario.output.dir.display(),
        "press q + Enter or Ctrl+C to stop"
    );

    let max_ticks = cli.ticks;
    let run = tokio::task::spawn_blocking(move || engine.run(&stop, max_ticks))
        .await
        .map_err(|err| anyhow!("simulation task failed: {err}"))??;

    let report = RunReport::new(&run, &ledger);
    if report.sink_failures > 0 {
        warn!(failures = report.sink_failures, "some violation artifacts were not written");
    }
    if let Some(path) = &cli.summary {
        report.write(path)?;
    }

    println!(
        "Scenario '{}' stopped after {} ticks: {} violations, {} in fines.",
        report.scenario, report.ticks, report.total_violations, report.total_fines
    );
    for kind in &report.by_kind {
        println!("  {:<17} {}", kind.violation_type.as_str(), kind.count);
    }
    Ok(())
}
