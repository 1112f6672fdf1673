use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use climate_automaton::scenario::ScenarioLoader;

#[derive(Debug, Parser)]
#[command(author, version, about = "Climate cellular automaton runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/small_world.yaml")]
    scenario: PathBuf,

    /// Override generation count (uses scenario default when omitted)
    #[arg(long)]
    generations: Option<u64>,

    /// Override the scenario's log level (e.g. "debug", "climate_automaton=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Print the final grid snapshot as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("Invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut automaton = loader.build_automaton(&scenario)?;
    let generations = scenario.generations(cli.generations);

    for _ in 0..generations {
        automaton.step();
        let census = automaton.snapshot().census();
        debug!(
            generation = automaton.generation(),
            kinds = ?census.kinds,
            mean_temperature = census.mean_temperature,
            mean_air_pollution = census.mean_air_pollution,
            "census"
        );
    }

    let snapshot = automaton.snapshot();
    let census = snapshot.census();
    info!(
        scenario = %scenario.name,
        generations,
        kinds = ?census.kinds,
        winds = census.winds,
        clouds = census.clouds,
        mean_temperature = census.mean_temperature,
        mean_air_pollution = census.mean_air_pollution,
        "run.completed"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!(
            "Scenario '{}' completed for {} generations. Mean temperature: {:.2}, mean air pollution: {:.3}",
            scenario.name, generations, census.mean_temperature, census.mean_air_pollution
        );
    }
    Ok(())
}
