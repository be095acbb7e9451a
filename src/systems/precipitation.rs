//! Weather simulation: humidity is blown downwind, diffused between
//! neighbours and periodically condensed into precipitation over land.
//!
//! Every pass reads the current humidity and writes a scratch buffer, so the
//! result does not depend on tile iteration order. Humidity is only ever
//! moved, never created: whatever leaves the grid edge is booked in the
//! world's moisture ledger.

use anyhow::Result;
use tracing::{debug, trace};

use super::lerp;
use crate::{
    engine::{System, SystemContext},
    hex::HexDirection,
    rng::SystemRng,
    world::{TileId, WorldMapData},
};

const MIN_EFFECTIVE_WIND: f32 = 10.0;
const ADVECTION_RATE: f32 = 0.15;
/// Each neighbour exchanges this fraction of the humidity difference.
const DIFFUSION_SHARE: f32 = 1.0 / 7.0;
/// Extra humidity wrung out on top of the excess when a tile condenses.
const CONDENSATION_EXTRA: f32 = 0.1;

/// Splits a heading into two adjacent hex edges. Each 45° sector lists the
/// two edges and the weight of the second one at the sector's start and end.
const SECTORS: [(HexDirection, HexDirection, f32, f32); 8] = [
    (HexDirection::N, HexDirection::NE, 0.0, 1.0),
    (HexDirection::NE, HexDirection::SE, 0.0, 0.5),
    (HexDirection::NE, HexDirection::SE, 0.5, 1.0),
    (HexDirection::SE, HexDirection::S, 0.0, 1.0),
    (HexDirection::S, HexDirection::SW, 0.0, 1.0),
    (HexDirection::SW, HexDirection::NW, 0.0, 0.5),
    (HexDirection::SW, HexDirection::NW, 0.5, 1.0),
    (HexDirection::NW, HexDirection::N, 0.0, 1.0),
];

pub struct PrecipitationSystem;

impl PrecipitationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PrecipitationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PrecipitationSystem {
    fn name(&self) -> &str {
        "precipitation"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.max_precipitation = 0.0;
        for tile in &mut world.tiles {
            tile.precipitation = 0.0;
        }

        let mut scratch = Vec::with_capacity(world.tile_count());
        for pass in 0..ctx.args.weather_passes {
            weather_pass(world, pass, ctx.args.condensation_interval, &mut scratch);
        }
        let dumped = condense(world);

        debug!(
            passes = ctx.args.weather_passes,
            final_dump = dumped,
            max_precipitation = world.max_precipitation,
            edge_loss = world.moisture.edge_loss,
            "weather simulated"
        );
        Ok(())
    }
}

/// One advection and diffusion step, condensing on every `interval`-th pass
/// starting from pass 1.
pub(crate) fn weather_pass(
    world: &mut WorldMapData,
    pass: u32,
    interval: u32,
    scratch: &mut Vec<f32>,
) {
    advect(world, scratch);
    diffuse(world, scratch);
    if pass % interval == 1 % interval {
        let condensed = condense(world);
        trace!(pass, condensed, "condensation");
    }
}

fn outflow_fraction(magnitude: f32) -> f32 {
    (magnitude.max(MIN_EFFECTIVE_WIND) / 100.0 * ADVECTION_RATE).clamp(0.0, 1.0)
}

/// Edges a wind heading feeds and the share each one receives.
pub(crate) fn downwind_split(direction: f32) -> [(HexDirection, f32); 2] {
    let heading = direction.rem_euclid(360.0);
    let sector = ((heading / 45.0) as usize).min(SECTORS.len() - 1);
    let t = (heading - sector as f32 * 45.0) / 45.0;
    let (first, second, from, to) = SECTORS[sector];
    let weight = lerp(from, to, t);
    [(first, 1.0 - weight), (second, weight)]
}

fn advect(world: &mut WorldMapData, next: &mut Vec<f32>) {
    next.clear();
    next.extend(world.tiles.iter().map(|tile| tile.humidity));

    let mut lost = 0.0_f64;
    for id in 0..world.tile_count() {
        let tile = &world.tiles[id];
        let outflow = tile.humidity * outflow_fraction(tile.wind.magnitude);
        if outflow <= 0.0 {
            continue;
        }
        next[id] -= outflow;
        for (dir, weight) in downwind_split(tile.wind.direction) {
            let share = outflow * weight;
            match world.neighbor(id, dir) {
                Some(target) => next[target] += share,
                None => lost += share as f64,
            }
        }
    }

    world.moisture.edge_loss += lost;
    for (tile, &humidity) in world.tiles.iter_mut().zip(next.iter()) {
        tile.humidity = humidity.max(0.0);
    }
}

fn diffuse(world: &mut WorldMapData, next: &mut Vec<f32>) {
    next.clear();
    for id in 0..world.tile_count() {
        let own = world.tiles[id].humidity;
        let exchange: f32 = world
            .neighbors(id)
            .map(|(_, n)| world.tiles[n].humidity - own)
            .sum();
        next.push(own + exchange * DIFFUSION_SHARE);
    }
    for (tile, &humidity) in world.tiles.iter_mut().zip(next.iter()) {
        tile.humidity = humidity.max(0.0);
    }
}

fn condensation_threshold(temperature: f32) -> f32 {
    if temperature > 10.0 {
        temperature * 1.1
    } else {
        11.0
    }
}

/// Turns excess humidity over land into precipitation. Returns the amount
/// condensed.
fn condense(world: &mut WorldMapData) -> f64 {
    let mut total = 0.0_f64;
    for id in 0..world.tile_count() {
        if let Some(amount) = condense_tile(world, id) {
            world.note_precipitation(id);
            total += amount as f64;
        }
    }
    total
}

fn condense_tile(world: &mut WorldMapData, id: TileId) -> Option<f32> {
    let tile = &mut world.tiles[id];
    if tile.is_underwater() {
        return None;
    }
    let limit = condensation_threshold(tile.temperature);
    if tile.humidity <= limit {
        return None;
    }
    let amount = (tile.humidity - limit) + CONDENSATION_EXTRA * limit;
    tile.humidity -= amount;
    tile.precipitation += amount;
    Some(amount)
}
