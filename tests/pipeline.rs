use std::collections::HashSet;

use hexworld::{
    engine::{SystemContext, SEED_STAGE},
    hex::{CubeCoord, OffsetCoord},
    rng::SystemRng,
    scenario::ScenarioLoader,
    systems::{classify, GridSystem},
    world::{TerrainType, WorldMapData, SENTINEL_ELEVATION},
    GenerationProgress, Generator, GeneratorBuilder, StepOutcome, WorldArgs,
};

fn tiny_args() -> WorldArgs {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/tiny.yaml")
        .expect("tiny scenario should load")
        .world
}

fn generate(args: WorldArgs) -> WorldMapData {
    let mut generator = Generator::from_args(args).expect("valid args");
    generator.run().expect("generation succeeds");
    generator.into_world()
}

#[test]
fn pipeline_completes_every_stage() {
    let mut generator = Generator::from_args(tiny_args()).unwrap();
    assert_eq!(generator.stage_count(), 9);

    let mut seen = Vec::new();
    generator
        .run_with_hook(|progress| seen.push(progress.clone()))
        .unwrap();

    let stages: Vec<&str> = seen.iter().filter_map(|p| p.stage.as_deref()).collect();
    assert_eq!(
        stages,
        [
            SEED_STAGE,
            "tiles",
            "tectonics",
            "temperature",
            "humidity",
            "wind",
            "precipitation",
            "biomes",
            "rivers"
        ]
    );
    for (i, progress) in seen.iter().enumerate() {
        let expected = (i + 1) as f32 / 9.0;
        assert!((progress.progress - expected).abs() < 1e-6);
        assert_eq!(progress.done, i == 8);
    }

    assert!(generator.is_done());
    assert_eq!(generator.progress(), 1.0);
    assert_eq!(generator.seed(), Some(42));
    assert_eq!(generator.step().unwrap(), StepOutcome::Complete);

    let world = generator.world();
    assert_eq!(world.seed(), 42);
    assert_eq!(world.tile_count(), 100);
    assert_eq!(world.plates().len(), 3);
    for tile in world.tiles() {
        assert_ne!(tile.elevation, SENTINEL_ELEVATION);
        assert_ne!(tile.terrain, TerrainType::None);
        assert!(tile.plate.is_some());
        assert!(tile.humidity >= 0.0);
        assert!(tile.precipitation >= 0.0);
    }
}

#[test]
fn same_seed_same_world() {
    let a = generate(tiny_args());
    let b = generate(tiny_args());
    assert_eq!(a.tiles(), b.tiles());
    assert_eq!(a.plates(), b.plates());

    let other = generate(WorldArgs {
        world_seed: 7,
        ..tiny_args()
    });
    let elevations = |w: &WorldMapData| w.tiles().iter().map(|t| t.elevation).collect::<Vec<_>>();
    assert_ne!(elevations(&a), elevations(&other));
}

#[test]
fn string_seed_is_reproducible() {
    let args = WorldArgs {
        string_seed: Some("archipelago".into()),
        use_string_seed: true,
        ..tiny_args()
    };
    let a = generate(args.clone());
    let b = generate(args);
    assert_eq!(a.seed(), b.seed());
    assert_ne!(a.seed(), 42);
    assert_eq!(a.tiles(), b.tiles());
}

#[test]
fn plates_partition_the_grid_after_tectonics() {
    let mut generator = Generator::from_args(tiny_args()).unwrap();
    for _ in 0..3 {
        generator.step().unwrap();
    }
    let world = generator.world();

    let mut claimed = HashSet::new();
    for (index, plate) in world.plates().iter().enumerate() {
        for &id in &plate.tiles {
            assert!(claimed.insert(id));
            assert_eq!(world.tiles()[id].plate, Some(index));
            assert!(plate.clamp.contains(world.tiles()[id].elevation));
        }
        for id in &plate.boundary_tiles {
            assert!(plate.tiles.contains(id));
        }
    }
    assert_eq!(claimed.len(), world.tile_count());
}

#[test]
fn equator_is_the_warmest_band() {
    let world = generate(tiny_args());
    let row = world.size_z() as i32 / 2;
    for col in (0..world.size_x() as i32).step_by(2) {
        let tile = world
            .tile(CubeCoord::from_offset(OffsetCoord::new(col, row)))
            .unwrap();
        assert_eq!(tile.temperature, 30.0);
    }
    assert!(world.tiles().iter().all(|t| t.temperature <= 30.0));
}

#[test]
fn moisture_is_conserved() {
    let world = generate(tiny_args());
    let ledger = world.moisture();
    let remaining: f64 = world
        .tiles()
        .iter()
        .map(|t| t.humidity as f64 + t.precipitation as f64)
        .sum();
    let total = remaining + ledger.edge_loss;
    assert!(ledger.injected > 0.0);
    assert!(
        (total - ledger.injected).abs() / ledger.injected < 1e-3,
        "injected {} but accounted for {}",
        ledger.injected,
        total
    );
}

#[test]
fn rivers_are_well_formed() {
    let world = generate(WorldArgs {
        size_chunks_x: 4,
        size_chunks_z: 4,
        num_plates: 5,
        ..tiny_args()
    });
    for (id, tile) in world.tiles().iter().enumerate() {
        match &tile.river {
            Some(river) => {
                assert!(river.size >= 1);
                if river.inbound.is_some() || river.outbound.is_some() {
                    assert_ne!(river.inbound, river.outbound);
                }
                for (dir, _) in river.flow() {
                    assert!(world.neighbor(id, dir).is_some());
                }
            }
            None => {
                assert_eq!(tile.terrain, classify(tile.temperature, tile.precipitation, tile.elevation));
            }
        }
    }
}

#[test]
fn summary_reflects_the_world() {
    let world = generate(tiny_args());
    let summary = world.summary();
    assert_eq!(summary.seed, 42);
    assert_eq!(summary.plates, 3);
    assert_eq!(summary.terrain.values().sum::<usize>(), 100);
    assert_eq!(summary.max_precipitation, world.max_precipitation());
    assert!(summary.min_elevation <= summary.max_elevation);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["size_x"], 10);
}

struct Flatten;

impl hexworld::engine::System for Flatten {
    fn name(&self) -> &str {
        "flatten"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        _world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn custom_stage_lists_are_supported() {
    let mut builder = GeneratorBuilder::new(tiny_args()).with_system(GridSystem::new());
    builder.push_system(Flatten);
    let mut generator = builder.build().unwrap();
    assert_eq!(generator.stage_count(), 3);
    generator.run().unwrap();
    assert!(generator.is_done());
    assert!(generator
        .world()
        .tiles()
        .iter()
        .all(|t| t.elevation == SENTINEL_ELEVATION));
}

#[tokio::test]
async fn completion_is_observable_from_async_code() {
    let mut generator = Generator::from_args(tiny_args()).unwrap();
    let mut progress = generator.subscribe();
    assert_eq!(*progress.borrow(), GenerationProgress::default());

    let handle = tokio::task::spawn_blocking(move || {
        generator.run().unwrap();
        generator
    });

    let last = progress
        .wait_for(|p| p.done)
        .await
        .expect("generator is still alive")
        .clone();
    assert_eq!(last.progress, 1.0);
    assert_eq!(last.stage.as_deref(), Some("rivers"));

    let generator = handle.await.unwrap();
    assert!(generator.is_done());
}
