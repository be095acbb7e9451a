use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{ConfigError, WorldArgs};
use crate::rng::{RngManager, SystemRng};
use crate::systems::{
    BiomeSystem, GridSystem, HumiditySystem, PrecipitationSystem, RiverSystem, TectonicsSystem,
    TemperatureSystem, WindSystem,
};
use crate::world::WorldMapData;

/// Name reported for the checkpoint that resolves the seed.
pub const SEED_STAGE: &str = "seed";

pub struct SystemContext<'a> {
    pub stage: usize,
    pub stage_count: usize,
    pub seed: u64,
    pub args: &'a WorldArgs,
}

/// One stage of the generation pipeline.
pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldMapData,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationProgress {
    /// Fraction of checkpoints passed, in [0, 1].
    pub progress: f32,
    /// Last stage that finished.
    pub stage: Option<String>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Advanced { stage: String, progress: f32 },
    Complete,
}

pub struct GeneratorBuilder {
    args: WorldArgs,
    systems: Vec<Box<dyn System>>,
}

impl GeneratorBuilder {
    pub fn new(args: WorldArgs) -> Self {
        Self {
            args,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Tiles, tectonics, temperature, humidity, wind, precipitation, biomes, rivers.
    pub fn with_default_stages(self) -> Self {
        self.with_system(GridSystem::new())
            .with_system(TectonicsSystem::new())
            .with_system(TemperatureSystem::new())
            .with_system(HumiditySystem::new())
            .with_system(WindSystem::new())
            .with_system(PrecipitationSystem::new())
            .with_system(BiomeSystem::new())
            .with_system(RiverSystem::new())
    }

    pub fn build(self) -> Result<Generator, ConfigError> {
        self.args.validate()?;
        let (progress_tx, _) = watch::channel(GenerationProgress::default());
        Ok(Generator {
            args: self.args,
            systems: self.systems,
            rng: None,
            world: WorldMapData::default(),
            completed: 0,
            progress_tx,
        })
    }
}

/// Pull-driven world generator. Every call to [`Generator::step`] runs exactly
/// one stage; the caller decides when (and whether) to continue.
pub struct Generator {
    args: WorldArgs,
    systems: Vec<Box<dyn System>>,
    rng: Option<RngManager>,
    world: WorldMapData,
    completed: usize,
    progress_tx: watch::Sender<GenerationProgress>,
}

impl Generator {
    /// Validates `args` and sets up the standard stage list.
    pub fn from_args(args: WorldArgs) -> Result<Self, ConfigError> {
        GeneratorBuilder::new(args).with_default_stages().build()
    }

    pub fn args(&self) -> &WorldArgs {
        &self.args
    }

    /// Seed checkpoint plus one per system.
    pub fn stage_count(&self) -> usize {
        self.systems.len() + 1
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng.as_ref().map(RngManager::seed)
    }

    pub fn progress(&self) -> f32 {
        if self.is_done() {
            1.0
        } else {
            self.completed as f32 / self.stage_count() as f32
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.stage_count()
    }

    /// Receiver that observes every checkpoint; `wait_for(|p| p.done)` resolves
    /// once generation has finished.
    pub fn subscribe(&self) -> watch::Receiver<GenerationProgress> {
        self.progress_tx.subscribe()
    }

    pub fn world(&self) -> &WorldMapData {
        &self.world
    }

    pub fn into_world(self) -> WorldMapData {
        self.world
    }

    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.is_done() {
            return Ok(StepOutcome::Complete);
        }

        let start = Instant::now();
        let stage = if self.completed == 0 {
            let seed = self.args.resolve_seed();
            self.rng = Some(RngManager::new(seed));
            debug!(seed, "resolved world seed");
            SEED_STAGE.to_string()
        } else {
            let stage_count = self.stage_count();
            let system = &mut self.systems[self.completed - 1];
            let rng = self
                .rng
                .as_mut()
                .context("seed checkpoint has not run")?;
            let ctx = SystemContext {
                stage: self.completed,
                stage_count,
                seed: rng.seed(),
                args: &self.args,
            };
            system.run(&ctx, &mut self.world, &mut rng.stream())?;
            system.name().to_string()
        };

        self.completed += 1;
        let progress = self.progress();
        let done = self.is_done();
        info!(
            stage = %stage,
            progress,
            elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0,
            "generation stage finished"
        );
        self.progress_tx.send_replace(GenerationProgress {
            progress,
            stage: Some(stage.clone()),
            done,
        });
        Ok(StepOutcome::Advanced { stage, progress })
    }

    pub fn run(&mut self) -> Result<()> {
        self.run_with_hook(|_| {})
    }

    pub fn run_with_hook<F>(&mut self, mut hook: F) -> Result<()>
    where
        F: FnMut(&GenerationProgress),
    {
        while let StepOutcome::Advanced { stage, progress } = self.step()? {
            hook(&GenerationProgress {
                progress,
                stage: Some(stage),
                done: self.is_done(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSystem {
        calls: u32,
    }

    impl System for CountingSystem {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(
            &mut self,
            ctx: &SystemContext,
            _world: &mut WorldMapData,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            assert_eq!(ctx.stage, 1);
            self.calls += 1;
            Ok(())
        }
    }

    struct FailingSystem;

    impl System for FailingSystem {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(
            &mut self,
            _ctx: &SystemContext,
            _world: &mut WorldMapData,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            anyhow::bail!("stage refused to run")
        }
    }

    fn small_args() -> WorldArgs {
        WorldArgs {
            size_chunks_x: 1,
            size_chunks_z: 1,
            num_plates: 2,
            ..WorldArgs::default()
        }
    }

    #[test]
    fn test_steps_report_fractional_progress() {
        let mut generator = GeneratorBuilder::new(small_args())
            .with_system(CountingSystem { calls: 0 })
            .build()
            .unwrap();
        assert_eq!(generator.stage_count(), 2);
        assert_eq!(generator.progress(), 0.0);
        assert_eq!(generator.seed(), None);

        assert_eq!(
            generator.step().unwrap(),
            StepOutcome::Advanced {
                stage: SEED_STAGE.into(),
                progress: 0.5
            }
        );
        assert_eq!(generator.seed(), Some(0));
        assert!(!generator.is_done());

        assert_eq!(
            generator.step().unwrap(),
            StepOutcome::Advanced {
                stage: "counting".into(),
                progress: 1.0
            }
        );
        assert!(generator.is_done());
        assert_eq!(generator.step().unwrap(), StepOutcome::Complete);
    }

    #[test]
    fn test_invalid_args_are_rejected_up_front() {
        let args = WorldArgs {
            num_plates: 0,
            ..small_args()
        };
        assert!(Generator::from_args(args).is_err());
    }

    #[test]
    fn test_stage_errors_propagate_without_advancing() {
        let mut generator = GeneratorBuilder::new(small_args())
            .with_system(FailingSystem)
            .build()
            .unwrap();
        generator.step().unwrap();
        let err = generator.step().unwrap_err();
        assert_eq!(err.to_string(), "stage refused to run");
        assert_eq!(generator.progress(), 0.5);
        assert!(!generator.is_done());
        assert!(generator.run().is_err());
    }

    #[test]
    fn test_subscriber_sees_completion() {
        let mut generator = GeneratorBuilder::new(small_args())
            .with_system(CountingSystem { calls: 0 })
            .build()
            .unwrap();
        let rx = generator.subscribe();
        generator.run().unwrap();
        let latest = rx.borrow().clone();
        assert!(latest.done);
        assert_eq!(latest.progress, 1.0);
        assert_eq!(latest.stage.as_deref(), Some("counting"));
    }
}
