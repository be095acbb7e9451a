use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ElevationRange;
use crate::hex::{CubeCoord, HexDirection, OffsetCoord};

/// Elevation carried by tiles that the tectonics stage has not reached yet.
pub const SENTINEL_ELEVATION: i32 = -1000;

pub type TileId = usize;
pub type PlateId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    None,
    Mountain,
    Hill,
    Sand,
    TropicalRainforest,
    TropicalForest,
    Savanna,
    SubtropicalDesert,
    TemperateRainforest,
    TemperateDeciduousForest,
    Woodland,
    Grassland,
    Shrubland,
    Taiga,
    Desert,
    Tundra,
}

impl TerrainType {
    pub fn as_str(self) -> &'static str {
        match self {
            TerrainType::None => "none",
            TerrainType::Mountain => "mountain",
            TerrainType::Hill => "hill",
            TerrainType::Sand => "sand",
            TerrainType::TropicalRainforest => "tropical_rainforest",
            TerrainType::TropicalForest => "tropical_forest",
            TerrainType::Savanna => "savanna",
            TerrainType::SubtropicalDesert => "subtropical_desert",
            TerrainType::TemperateRainforest => "temperate_rainforest",
            TerrainType::TemperateDeciduousForest => "temperate_deciduous_forest",
            TerrainType::Woodland => "woodland",
            TerrainType::Grassland => "grassland",
            TerrainType::Shrubland => "shrubland",
            TerrainType::Taiga => "taiga",
            TerrainType::Desert => "desert",
            TerrainType::Tundra => "tundra",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Heading in degrees, 0 = north, clockwise.
    pub direction: f32,
    pub magnitude: f32,
}

/// River passing through a tile: how many particles used it, and at most one
/// inbound and one outbound edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct River {
    pub size: u32,
    pub inbound: Option<HexDirection>,
    pub outbound: Option<HexDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    Inbound,
    Outbound,
}

impl River {
    pub fn new() -> Self {
        Self {
            size: 1,
            inbound: None,
            outbound: None,
        }
    }

    /// Records the upstream neighbour unless an edge is already set or the
    /// direction is taken by the outbound edge.
    pub fn set_inbound(&mut self, dir: HexDirection) {
        if self.inbound.is_none() && self.outbound != Some(dir) {
            self.inbound = Some(dir);
        }
    }

    pub fn set_outbound(&mut self, dir: HexDirection) {
        if self.outbound.is_none() && self.inbound != Some(dir) {
            self.outbound = Some(dir);
        }
    }

    pub fn flow(&self) -> impl Iterator<Item = (HexDirection, Flow)> + '_ {
        self.inbound
            .map(|dir| (dir, Flow::Inbound))
            .into_iter()
            .chain(self.outbound.map(|dir| (dir, Flow::Outbound)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coords: CubeCoord,
    pub elevation: i32,
    pub plate: Option<PlateId>,
    pub temperature: f32,
    pub humidity: f32,
    pub precipitation: f32,
    pub wind: Wind,
    pub terrain: TerrainType,
    pub river: Option<River>,
}

impl Tile {
    pub fn new(coords: CubeCoord) -> Self {
        Self {
            coords,
            elevation: SENTINEL_ELEVATION,
            plate: None,
            temperature: 0.0,
            humidity: 0.0,
            precipitation: 0.0,
            wind: Wind::default(),
            terrain: TerrainType::None,
            river: None,
        }
    }

    pub fn is_underwater(&self) -> bool {
        self.elevation < 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub origin: CubeCoord,
    pub tiles: Vec<TileId>,
    pub boundary_tiles: Vec<TileId>,
    pub oceanic: bool,
    pub desired_elevation: i32,
    pub drift_axis: CubeCoord,
    pub motion: CubeCoord,
    pub clamp: ElevationRange,
}

/// Humidity bookkeeping for the precipitation stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoistureLedger {
    /// Total humidity seeded before the weather simulation.
    pub injected: f64,
    /// Humidity blown past the grid edge.
    pub edge_loss: f64,
}

/// Tile and plate data for one generation run, indexed by row-major offset.
#[derive(Debug, Clone, Default)]
pub struct WorldMapData {
    seed: u64,
    size_x: u32,
    size_z: u32,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) plates: Vec<Plate>,
    pub(crate) max_precipitation: f32,
    pub(crate) moisture: MoistureLedger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSummary {
    pub seed: u64,
    pub size_x: u32,
    pub size_z: u32,
    pub plates: usize,
    pub oceanic_plates: usize,
    pub land_tiles: usize,
    pub river_tiles: usize,
    pub min_elevation: i32,
    pub max_elevation: i32,
    pub max_precipitation: f32,
    pub terrain: BTreeMap<String, usize>,
}

impl WorldMapData {
    pub fn new(size_x: u32, size_z: u32, seed: u64) -> Self {
        let mut tiles = Vec::with_capacity(size_x as usize * size_z as usize);
        for row in 0..size_z as i32 {
            for col in 0..size_x as i32 {
                tiles.push(Tile::new(CubeCoord::from_offset(OffsetCoord::new(col, row))));
            }
        }
        Self {
            seed,
            size_x,
            size_z,
            tiles,
            plates: Vec::new(),
            max_precipitation: 0.0,
            moisture: MoistureLedger::default(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn size_x(&self) -> u32 {
        self.size_x
    }

    pub fn size_z(&self) -> u32 {
        self.size_z
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    pub fn max_precipitation(&self) -> f32 {
        self.max_precipitation
    }

    pub fn moisture(&self) -> MoistureLedger {
        self.moisture
    }

    pub fn index_of(&self, coords: CubeCoord) -> Option<TileId> {
        let OffsetCoord { col, row } = coords.to_offset();
        if col < 0 || row < 0 || col >= self.size_x as i32 || row >= self.size_z as i32 {
            return None;
        }
        Some(row as usize * self.size_x as usize + col as usize)
    }

    pub fn tile(&self, coords: CubeCoord) -> Option<&Tile> {
        self.index_of(coords).map(|id| &self.tiles[id])
    }

    pub fn neighbor(&self, id: TileId, dir: HexDirection) -> Option<TileId> {
        self.index_of(self.tiles[id].coords.neighbor(dir))
    }

    /// In-grid neighbours of a tile, in direction order.
    pub fn neighbors(&self, id: TileId) -> impl Iterator<Item = (HexDirection, TileId)> + '_ {
        HexDirection::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(id, dir).map(|n| (dir, n)))
    }

    pub fn plate_of(&self, id: TileId) -> Option<&Plate> {
        self.tiles[id].plate.map(|plate| &self.plates[plate])
    }

    pub fn plate_by_origin(&self, origin: CubeCoord) -> Option<&Plate> {
        self.plates.iter().find(|plate| plate.origin == origin)
    }

    /// Raises the "max precipitation seen" watermark for land tiles.
    pub(crate) fn note_precipitation(&mut self, id: TileId) {
        let tile = &self.tiles[id];
        if !tile.is_underwater() && tile.precipitation > self.max_precipitation {
            self.max_precipitation = tile.precipitation;
        }
    }

    pub fn summary(&self) -> WorldSummary {
        let mut terrain = BTreeMap::new();
        for tile in &self.tiles {
            *terrain.entry(tile.terrain.as_str().to_string()).or_insert(0) += 1;
        }
        WorldSummary {
            seed: self.seed,
            size_x: self.size_x,
            size_z: self.size_z,
            plates: self.plates.len(),
            oceanic_plates: self.plates.iter().filter(|p| p.oceanic).count(),
            land_tiles: self.tiles.iter().filter(|t| !t.is_underwater()).count(),
            river_tiles: self.tiles.iter().filter(|t| t.river.is_some()).count(),
            min_elevation: self.tiles.iter().map(|t| t.elevation).min().unwrap_or(0),
            max_elevation: self.tiles.iter().map(|t| t.elevation).max().unwrap_or(0),
            max_precipitation: self.max_precipitation,
            terrain,
        }
    }
}
