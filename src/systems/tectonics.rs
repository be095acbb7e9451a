//! Plate tectonics: plate seeding, flood-fill assignment, boundary pressure,
//! smoothing and interior extrapolation of elevation.

use std::collections::VecDeque;

use anyhow::Result;
use rand::Rng;
use tracing::debug;

use super::coserp;
use crate::{
    config::{ElevationRange, WorldArgs},
    engine::{System, SystemContext},
    hex::{CubeCoord, HexDirection, OffsetCoord},
    rng::SystemRng,
    world::{Plate, PlateId, TileId, WorldMapData, SENTINEL_ELEVATION},
};

const SMOOTHING_PASSES: usize = 4;
/// A neighbour this much lower (or more) is left out of the smoothing average.
const SMOOTHING_DROP_LIMIT: i32 = -52;
const BOUNDARY_SAMPLES: usize = 4;

const CONTINENTAL_COLLISION: f32 = 1.55;
const OCEANIC_COLLISION: f32 = 0.25;
const SUBDUCTING_OCEANIC: f32 = 0.1;
const OVERRIDING_CONTINENTAL: f32 = 0.2;
const RIFT_MIXED_OCEANIC: f32 = 0.15;
const RIFT_MIXED_CONTINENTAL: f32 = 0.1;
const RIFT_OCEANIC: f32 = 0.05;
const RIFT_CONTINENTAL: f32 = 0.2;

pub struct TectonicsSystem;

impl TectonicsSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TectonicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TectonicsSystem {
    fn name(&self) -> &str {
        "tectonics"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldMapData,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.plates = seed_plates(world, ctx.args, rng);
        assign_plates(world, ctx.args.plate_spread_chance, rng);
        find_boundaries(world);
        apply_pressure(world);
        smooth_boundaries(world);
        extrapolate_interior(world, ctx.args.uplift_decay);

        debug!(
            plates = world.plates.len(),
            oceanic = world.plates.iter().filter(|p| p.oceanic).count(),
            boundary_tiles = world
                .plates
                .iter()
                .map(|p| p.boundary_tiles.len())
                .sum::<usize>(),
            "plates settled"
        );
        Ok(())
    }
}

fn random_coords<R: Rng>(world: &WorldMapData, rng: &mut R) -> CubeCoord {
    let col = rng.gen_range(0..world.size_x() as i32);
    let row = rng.gen_range(0..world.size_z() as i32);
    CubeCoord::from_offset(OffsetCoord::new(col, row))
}

fn seed_plates<R: Rng>(world: &WorldMapData, args: &WorldArgs, rng: &mut R) -> Vec<Plate> {
    let mut plates: Vec<Plate> = Vec::with_capacity(args.num_plates as usize);
    for _ in 0..args.num_plates {
        let mut origin = random_coords(world, rng);
        while plates.iter().any(|plate| plate.origin == origin) {
            origin = random_coords(world, rng);
        }

        let oceanic = rng.gen::<f32>() < args.ocean_frequency;
        let (desired, clamp) = if oceanic {
            (args.elevation.oceanic_desired, args.elevation.oceanic_clamp)
        } else {
            (
                args.elevation.continental_desired,
                args.elevation.continental_clamp,
            )
        };
        let desired_elevation = rng.gen_range(desired.min..=desired.max);

        let mut drift_axis = origin;
        while drift_axis == origin {
            drift_axis = random_coords(world, rng);
        }
        let motion = origin.lerp(drift_axis, args.plate_motion_scale) - origin;

        plates.push(Plate {
            origin,
            tiles: Vec::new(),
            boundary_tiles: Vec::new(),
            oceanic,
            desired_elevation,
            drift_axis,
            motion,
            clamp,
        });
    }
    plates
}

/// Randomized multi-source flood fill. Plates take turns in index order; each
/// turn succeeds with `spread_chance` and claims at most one frontier tile.
fn assign_plates<R: Rng>(world: &mut WorldMapData, spread_chance: f32, rng: &mut R) {
    let total = world.tile_count();
    let plate_count = world.plates.len();
    let mut frontiers: Vec<VecDeque<TileId>> = Vec::with_capacity(plate_count);
    let mut queued = vec![vec![false; total]; plate_count];
    for (plate, queued) in world.plates.iter().zip(queued.iter_mut()) {
        let origin = world
            .index_of(plate.origin)
            .expect("plate origins are sampled inside the grid");
        queued[origin] = true;
        frontiers.push(VecDeque::from([origin]));
    }

    let mut claimed = 0;
    while claimed < total && frontiers.iter().any(|frontier| !frontier.is_empty()) {
        for plate in 0..plate_count {
            if !rng.gen_bool(spread_chance as f64) {
                continue;
            }
            let Some(id) = frontiers[plate].pop_front() else {
                continue;
            };
            if world.tiles[id].plate.is_some() {
                continue;
            }
            world.tiles[id].plate = Some(plate);
            world.plates[plate].tiles.push(id);
            claimed += 1;

            for (_, neighbor) in world.neighbors(id) {
                if !queued[plate][neighbor] && world.tiles[neighbor].plate.is_none() {
                    queued[plate][neighbor] = true;
                    frontiers[plate].push_back(neighbor);
                }
            }
        }
    }
    debug_assert_eq!(claimed, total, "flood fill left tiles unclaimed");
}

fn find_boundaries(world: &mut WorldMapData) {
    let mut boundaries: Vec<(PlateId, TileId)> = Vec::new();
    for id in 0..world.tile_count() {
        let Some(plate) = world.tiles[id].plate else {
            continue;
        };
        if world
            .neighbors(id)
            .any(|(_, n)| world.tiles[n].plate != Some(plate))
        {
            boundaries.push((plate, id));
        }
    }
    for (plate, id) in boundaries {
        world.plates[plate].boundary_tiles.push(id);
    }
}

#[derive(Clone, Copy)]
struct PlateParams {
    oceanic: bool,
    desired: i32,
    motion: CubeCoord,
    clamp: ElevationRange,
}

impl From<&Plate> for PlateParams {
    fn from(plate: &Plate) -> Self {
        Self {
            oceanic: plate.oceanic,
            desired: plate.desired_elevation,
            motion: plate.motion,
            clamp: plate.clamp,
        }
    }
}

/// Relative motion summed over the axes that `dir` moves along. A cheap
/// stand-in for projecting onto the boundary normal.
fn pressure(dir: HexDirection, own_motion: CubeCoord, other_motion: CubeCoord) -> i32 {
    let relative = own_motion - other_motion;
    let step = dir.delta();
    let mut pressure = 0;
    if step.x != 0 {
        pressure += relative.x;
    }
    if step.y != 0 {
        pressure += relative.y;
    }
    if step.z != 0 {
        pressure += relative.z;
    }
    pressure
}

fn scaled(pressure: i32, factor: f32) -> i32 {
    (pressure as f32 * factor) as i32
}

fn fold_pressure(current: i32, pressure: i32, own: PlateParams, other: PlateParams) -> i32 {
    let highest = own.desired.max(other.desired);
    let lowest = own.desired.min(other.desired);
    let mean = (own.desired + other.desired) / 2;

    if pressure > 0 {
        match (own.oceanic, other.oceanic) {
            (false, false) => highest + scaled(pressure, CONTINENTAL_COLLISION),
            (true, true) => highest + scaled(pressure, OCEANIC_COLLISION),
            (true, false) => lowest + scaled(pressure, SUBDUCTING_OCEANIC),
            (false, true) => highest + scaled(pressure, OVERRIDING_CONTINENTAL),
        }
    } else if pressure < 0 && current == SENTINEL_ELEVATION {
        match (own.oceanic, other.oceanic) {
            (true, false) => mean + scaled(pressure, RIFT_MIXED_OCEANIC).abs(),
            (false, true) => mean + scaled(pressure, RIFT_MIXED_CONTINENTAL).abs(),
            (true, true) => highest + scaled(pressure.abs(), RIFT_OCEANIC),
            (false, false) => mean + scaled(pressure, RIFT_CONTINENTAL),
        }
    } else {
        mean
    }
}

fn apply_pressure(world: &mut WorldMapData) {
    let params: Vec<PlateParams> = world.plates.iter().map(PlateParams::from).collect();
    for (plate, own) in params.iter().enumerate() {
        let boundary = world.plates[plate].boundary_tiles.clone();
        for id in boundary {
            let mut elevation = world.tiles[id].elevation;
            for (dir, neighbor) in world.neighbors(id) {
                let Some(other) = world.tiles[neighbor].plate else {
                    continue;
                };
                if other == plate {
                    continue;
                }
                let other = params[other];
                let p = pressure(dir, own.motion, other.motion);
                elevation = fold_pressure(elevation, p, *own, other);
            }
            world.tiles[id].elevation = own.clamp.clamp(elevation);
        }
    }
}

/// Averages boundary tiles above sea level with neighbours that are not
/// drastically lower, leaving trenches sharp.
fn smooth_boundaries(world: &mut WorldMapData) {
    for _ in 0..SMOOTHING_PASSES {
        for plate in 0..world.plates.len() {
            let clamp = world.plates[plate].clamp;
            for b in 0..world.plates[plate].boundary_tiles.len() {
                let id = world.plates[plate].boundary_tiles[b];
                let own = world.tiles[id].elevation;
                if own < 0 {
                    continue;
                }
                let mut sum = own;
                let mut count = 1;
                for (_, neighbor) in world.neighbors(id) {
                    let elevation = world.tiles[neighbor].elevation;
                    if elevation != SENTINEL_ELEVATION && elevation - own > SMOOTHING_DROP_LIMIT {
                        sum += elevation;
                        count += 1;
                    }
                }
                world.tiles[id].elevation = clamp.clamp(sum / count);
            }
        }
    }
}

/// Fills every tile still at the sentinel by easing from the plate's resting
/// elevation towards the mean of its nearest boundary tiles.
fn extrapolate_interior(world: &mut WorldMapData, uplift_decay: f32) {
    for id in 0..world.tile_count() {
        if world.tiles[id].elevation != SENTINEL_ELEVATION {
            continue;
        }
        let Some(plate) = world.tiles[id].plate else {
            continue;
        };
        let plate = &world.plates[plate];
        let coords = world.tiles[id].coords;

        let mut nearest: Vec<(u32, TileId)> = plate
            .boundary_tiles
            .iter()
            .map(|&b| (coords.distance(world.tiles[b].coords), b))
            .collect();
        nearest.sort_by_key(|&(distance, _)| distance);
        nearest.truncate(BOUNDARY_SAMPLES);

        let elevation = if nearest.is_empty() {
            plate.desired_elevation
        } else {
            let count = nearest.len() as i32;
            let distance = nearest.iter().map(|&(d, _)| d as i32).sum::<i32>() / count;
            let boundary = nearest
                .iter()
                .map(|&(_, b)| world.tiles[b].elevation)
                .sum::<i32>()
                / count;
            let t = uplift_decay.powi(distance);
            coserp(plate.desired_elevation as f32, boundary as f32, t).round() as i32
        };
        let clamp = plate.clamp;
        world.tiles[id].elevation = clamp.clamp(elevation);
    }
}
