use anyhow::Result;
use tracing::debug;

use super::lerp;
use crate::{
    engine::{System, SystemContext},
    hex::{CubeCoord, HexDirection},
    rng::SystemRng,
    world::{TileId, WorldMapData},
};

const EQUATOR_TEMPERATURE: f32 = 30.0;
const POLAR_TEMPERATURE: f32 = -45.0;
/// Tiles this close to the equator keep the equator temperature.
const TROPIC_WIDTH: u32 = 4;

const HIGHLAND_ELEVATION: i32 = 36;
const HIGHLAND_OFFSET: i32 = 34;
const HIGHLAND_CHILL: f32 = -40.0;
const DEEP_WATER_ELEVATION: i32 = -20;
const DEEP_WATER_CHILL: f32 = -7.5;

/// Latitude banding from a central equator line, adjusted for altitude.
pub struct TemperatureSystem;

impl TemperatureSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemperatureSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TemperatureSystem {
    fn name(&self) -> &str {
        "temperature"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let equator = equator_tiles(world);
        let mut on_equator = vec![false; world.tile_count()];
        for &id in &equator {
            on_equator[id] = true;
        }

        let decay = ctx.args.temperature_decay;
        let elevation_decay = ctx.args.temperature_elevation_decay;
        for id in 0..world.tile_count() {
            if on_equator[id] {
                world.tiles[id].temperature = EQUATOR_TEMPERATURE;
                continue;
            }
            let coords = world.tiles[id].coords;
            let distance = equator
                .iter()
                .map(|&e| coords.distance(world.tiles[e].coords))
                .min()
                .unwrap_or(0);
            let latitude = latitude_temperature(distance, decay);
            let altitude = altitude_adjustment(world.tiles[id].elevation, elevation_decay);
            world.tiles[id].temperature = latitude + altitude;
        }

        debug!(equator_tiles = equator.len(), "temperature assigned");
        Ok(())
    }
}

/// Walks the middle row in steps of two columns, collecting each point along
/// with its NE and SE neighbours.
pub(crate) fn equator_tiles(world: &WorldMapData) -> Vec<TileId> {
    let step = CubeCoord::new(2, -1, -1);
    let mut tiles = Vec::new();
    let mut cursor = CubeCoord::ORIGIN + HexDirection::N.delta().scale((world.size_z() / 2) as i32);
    while let Some(id) = world.index_of(cursor) {
        tiles.push(id);
        for dir in [HexDirection::NE, HexDirection::SE] {
            if let Some(n) = world.neighbor(id, dir) {
                if !tiles.contains(&n) {
                    tiles.push(n);
                }
            }
        }
        cursor = cursor + step;
    }
    tiles
}

fn latitude_temperature(distance: u32, decay: f32) -> f32 {
    if distance < TROPIC_WIDTH {
        EQUATOR_TEMPERATURE
    } else {
        lerp(POLAR_TEMPERATURE, EQUATOR_TEMPERATURE, decay.powi(distance as i32))
    }
}

/// Highlands cool sharply above the treeline; deep water cools gently.
fn altitude_adjustment(elevation: i32, decay: f32) -> f32 {
    if elevation > HIGHLAND_ELEVATION {
        lerp(HIGHLAND_CHILL, 0.0, decay.powi(elevation - HIGHLAND_OFFSET))
    } else if elevation < DEEP_WATER_ELEVATION {
        lerp(
            DEEP_WATER_CHILL,
            0.0,
            decay.powi(elevation.abs() + DEEP_WATER_ELEVATION),
        )
    } else {
        0.0
    }
}
