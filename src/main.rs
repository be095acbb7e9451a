use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexworld::{scenario::ScenarioLoader, world::WorldMapData, Generator};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hex-grid procedural world generator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/earthlike.yaml")]
    scenario: PathBuf,

    /// Override the world seed
    #[arg(long, conflicts_with_all = ["string_seed", "randomize"])]
    seed: Option<u64>,

    /// Derive the seed from text instead
    #[arg(long, conflicts_with = "randomize")]
    string_seed: Option<String>,

    /// Draw a fresh random seed
    #[arg(long)]
    randomize: bool,

    /// Print the world summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = ScenarioLoader::new(".").load(&cli.scenario)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level)),
        )
        .init();

    let mut args = scenario.world.clone();
    if let Some(seed) = cli.seed {
        args.world_seed = seed;
        args.use_string_seed = false;
        args.randomize_seed = false;
    }
    if let Some(text) = cli.string_seed {
        args.string_seed = Some(text);
        args.use_string_seed = true;
        args.randomize_seed = false;
    }
    if cli.randomize {
        args.randomize_seed = true;
    }

    let mut generator = Generator::from_args(args)?;
    let mut progress = generator.subscribe();
    info!(
        scenario = %scenario.name,
        stages = generator.stage_count(),
        "starting world generation"
    );

    let handle = tokio::task::spawn_blocking(move || -> Result<WorldMapData> {
        generator.run()?;
        Ok(generator.into_world())
    });

    // The sender is dropped with the generator, which ends this loop on failure.
    while progress.changed().await.is_ok() {
        let update = progress.borrow_and_update().clone();
        info!(
            percent = (update.progress * 100.0).round(),
            stage = update.stage.as_deref().unwrap_or("-"),
            "generation progress"
        );
        if update.done {
            break;
        }
    }

    let world = handle.await.context("generation task panicked")??;
    let summary = world.summary();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Scenario '{}' generated a {}x{} world from seed {}",
            scenario.name, summary.size_x, summary.size_z, summary.seed
        );
        println!(
            "  plates: {} ({} oceanic), land tiles: {}, river tiles: {}",
            summary.plates, summary.oceanic_plates, summary.land_tiles, summary.river_tiles
        );
        println!(
            "  elevation: {}..{}, max precipitation: {:.1}",
            summary.min_elevation, summary.max_elevation, summary.max_precipitation
        );
        for (terrain, count) in &summary.terrain {
            println!("  {terrain:<28}{count:>6}");
        }
    }
    Ok(())
}
