//! Rivers from water particles that roll downhill over an erosion map.

use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{River, TileId, WorldMapData},
};

/// Erosion removed from a tile each time a particle leaves it.
const EROSION_STEP: f32 = 0.1;

/// Tiles one particle passed through, with the water it carried on arrival,
/// and the underwater tile it drained into if it reached the sea.
#[derive(Debug, Default)]
struct ParticlePath {
    tiles: Vec<(TileId, f32)>,
    outlet: Option<TileId>,
}

pub struct RiverSystem;

impl RiverSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RiverSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RiverSystem {
    fn name(&self) -> &str {
        "rivers"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut erosion: Vec<f32> = world.tiles.iter().map(|t| t.elevation as f32).collect();

        let mut sources: Vec<TileId> = (0..world.tile_count())
            .filter(|&id| world.tiles[id].elevation >= 0)
            .collect();
        sources.sort_by(|&a, &b| world.tiles[b].elevation.cmp(&world.tiles[a].elevation));

        let mut particles = 0;
        let mut reached_sea = 0;
        let mut peak_discharge = 0.0_f32;
        for source in sources {
            if world.tiles[source].precipitation <= 0.0 {
                continue;
            }
            let path = trace_particle(world, &mut erosion, source);
            particles += 1;
            if path.outlet.is_some() {
                reached_sea += 1;
            }
            if let Some(&(_, water)) = path.tiles.last() {
                peak_discharge = peak_discharge.max(water);
            }
            carve(world, &path);
        }

        apply_erosion(world, &erosion);

        debug!(
            particles,
            reached_sea,
            peak_discharge,
            river_tiles = world.tiles.iter().filter(|t| t.river.is_some()).count(),
            "rivers carved"
        );
        Ok(())
    }
}

/// Follows steepest descent from `source` while on land, picking the lowest
/// unvisited neighbour that is not above the current tile. Ties go to the
/// wetter tile, then to direction order.
fn trace_particle(world: &WorldMapData, erosion: &mut [f32], source: TileId) -> ParticlePath {
    let mut path = ParticlePath::default();
    let mut visited = HashSet::new();
    let mut water = 0.0_f32;
    let mut current = source;

    while world.tiles[current].elevation >= 0 {
        water += world.tiles[current].precipitation;
        path.tiles.push((current, water));
        visited.insert(current);

        let next = world
            .neighbors(current)
            .map(|(_, n)| n)
            .filter(|n| !visited.contains(n) && erosion[*n] <= erosion[current])
            .min_by(|&a, &b| {
                erosion[a].total_cmp(&erosion[b]).then_with(|| {
                    world.tiles[b]
                        .precipitation
                        .total_cmp(&world.tiles[a].precipitation)
                })
            });
        let Some(next) = next else {
            // local minimum; water pools here
            return path;
        };
        erosion[current] -= EROSION_STEP;
        current = next;
    }

    path.outlet = Some(current);
    path
}

fn carve(world: &mut WorldMapData, path: &ParticlePath) {
    for (i, &(id, _)) in path.tiles.iter().enumerate() {
        let coords = world.tiles[id].coords;
        let upstream = i
            .checked_sub(1)
            .and_then(|prev| coords.direction_to(world.tiles[path.tiles[prev].0].coords));
        let downstream = path
            .tiles
            .get(i + 1)
            .map(|&(next, _)| next)
            .or(path.outlet)
            .and_then(|next| coords.direction_to(world.tiles[next].coords));

        let river = match world.tiles[id].river.take() {
            Some(mut river) => {
                river.size += 1;
                river
            }
            None => River::new(),
        };
        let river = world.tiles[id].river.insert(river);
        if let Some(dir) = upstream {
            river.set_inbound(dir);
        }
        if let Some(dir) = downstream {
            river.set_outbound(dir);
        }
    }
}

/// River beds settle to the mean erosion of themselves and their neighbours.
fn apply_erosion(world: &mut WorldMapData, erosion: &[f32]) {
    let settled: Vec<(TileId, i32)> = (0..world.tile_count())
        .filter(|&id| world.tiles[id].river.is_some())
        .map(|id| {
            let (sum, count) = world
                .neighbors(id)
                .fold((erosion[id], 1), |(sum, count), (_, n)| {
                    (sum + erosion[n], count + 1)
                });
            (id, (sum / count as f32).round() as i32)
        })
        .collect();
    for (id, elevation) in settled {
        world.tiles[id].elevation = elevation;
    }
}
