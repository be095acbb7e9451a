use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::WorldMapData,
};

/// Lays out a fresh tile grid, replacing whatever the generator held before.
pub struct GridSystem;

impl GridSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GridSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for GridSystem {
    fn name(&self) -> &str {
        "tiles"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        *world = WorldMapData::new(ctx.args.size_x(), ctx.args.size_z(), ctx.seed);
        debug!(
            size_x = world.size_x(),
            size_z = world.size_z(),
            tiles = world.tile_count(),
            "created tile grid"
        );
        Ok(())
    }
}
