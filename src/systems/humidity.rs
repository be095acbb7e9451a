use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::WorldMapData,
};

const OCEAN_EVAPORATION: f32 = 4.5;
const LAND_EVAPORATION: f32 = 0.175;

/// Air holds more water when warm; below freezing it still carries a little.
pub(crate) fn vapor_capacity(temperature: f32) -> f32 {
    if temperature > 5.0 {
        temperature * 1.1
    } else {
        5.5
    }
}

/// Seeds humidity from evaporation: oceans evaporate far more than land.
pub struct HumiditySystem;

impl HumiditySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HumiditySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HumiditySystem {
    fn name(&self) -> &str {
        "humidity"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut injected = 0.0_f64;
        for tile in &mut world.tiles {
            let rate = if tile.is_underwater() {
                OCEAN_EVAPORATION
            } else {
                LAND_EVAPORATION
            };
            tile.humidity = rate * vapor_capacity(tile.temperature);
            injected += tile.humidity as f64;
        }
        world.moisture.injected = injected;
        world.moisture.edge_loss = 0.0;

        debug!(injected, "humidity seeded");
        Ok(())
    }
}
