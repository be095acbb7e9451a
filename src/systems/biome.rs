use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{TerrainType, WorldMapData},
};

const MOUNTAIN_ELEVATION: i32 = 48;
const HILL_ELEVATION: i32 = 42;

/// Whittaker-style lookup on temperature and precipitation, with elevation
/// taking precedence: peaks become mountains, foothills become hills and
/// anything below sea level is sand.
pub fn classify(temperature: f32, precipitation: f32, elevation: i32) -> TerrainType {
    if elevation > MOUNTAIN_ELEVATION {
        return TerrainType::Mountain;
    }
    if elevation > HILL_ELEVATION {
        return TerrainType::Hill;
    }
    if elevation < 0 {
        return TerrainType::Sand;
    }
    climate_biome(temperature, precipitation)
}

fn climate_biome(temperature: f32, precipitation: f32) -> TerrainType {
    let p = precipitation;
    if temperature > 20.0 {
        if p > 75.0 {
            TerrainType::TropicalRainforest
        } else if p > 30.0 {
            TerrainType::TropicalForest
        } else if p > 10.0 {
            TerrainType::Savanna
        } else {
            TerrainType::SubtropicalDesert
        }
    } else if temperature > 10.0 {
        if p > 65.0 {
            TerrainType::TemperateRainforest
        } else if p > 30.0 {
            TerrainType::TemperateDeciduousForest
        } else if p > 10.0 {
            TerrainType::Woodland
        } else {
            TerrainType::Grassland
        }
    } else if temperature > 4.0 {
        if p > 25.0 {
            TerrainType::TemperateDeciduousForest
        } else if p > 10.0 {
            TerrainType::Woodland
        } else {
            TerrainType::Grassland
        }
    } else if temperature > -5.0 {
        if p > 25.0 {
            TerrainType::Taiga
        } else if p > 10.0 {
            TerrainType::Shrubland
        } else {
            TerrainType::Desert
        }
    } else {
        TerrainType::Tundra
    }
}

pub struct BiomeSystem;

impl BiomeSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BiomeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BiomeSystem {
    fn name(&self) -> &str {
        "biomes"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for tile in &mut world.tiles {
            debug_assert!(
                tile.humidity >= 0.0,
                "negative humidity {} at {:?}",
                tile.humidity,
                tile.coords
            );
            tile.terrain = classify(tile.temperature, tile.precipitation, tile.elevation);
        }
        debug!(
            mountains = world
                .tiles
                .iter()
                .filter(|t| t.terrain == TerrainType::Mountain)
                .count(),
            "biomes classified"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_table() {
        assert_eq!(classify(25.0, 80.0, 10), TerrainType::TropicalRainforest);
        assert_eq!(classify(25.0, 40.0, 10), TerrainType::TropicalForest);
        assert_eq!(classify(25.0, 20.0, 10), TerrainType::Savanna);
        assert_eq!(classify(25.0, 5.0, 10), TerrainType::SubtropicalDesert);
        assert_eq!(classify(15.0, 70.0, 10), TerrainType::TemperateRainforest);
        assert_eq!(classify(15.0, 40.0, 10), TerrainType::TemperateDeciduousForest);
        assert_eq!(classify(15.0, 20.0, 10), TerrainType::Woodland);
        assert_eq!(classify(15.0, 0.0, 10), TerrainType::Grassland);
        assert_eq!(classify(8.0, 70.0, 10), TerrainType::TemperateDeciduousForest);
        assert_eq!(classify(8.0, 5.0, 10), TerrainType::Grassland);
        assert_eq!(classify(0.0, 30.0, 10), TerrainType::Taiga);
        assert_eq!(classify(0.0, 15.0, 10), TerrainType::Shrubland);
        assert_eq!(classify(0.0, 1.0, 10), TerrainType::Desert);
        assert_eq!(classify(-20.0, 500.0, 10), TerrainType::Tundra);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        assert_eq!(classify(20.0, 80.0, 10), TerrainType::TemperateRainforest);
        assert_eq!(classify(10.0, 70.0, 10), TerrainType::TemperateDeciduousForest);
        assert_eq!(classify(-5.0, 70.0, 10), TerrainType::Tundra);
        assert_eq!(classify(25.0, 75.0, 10), TerrainType::TropicalForest);
    }

    #[test]
    fn test_elevation_overrides_climate() {
        assert_eq!(classify(25.0, 80.0, 49), TerrainType::Mountain);
        assert_eq!(classify(25.0, 80.0, 48), TerrainType::Hill);
        assert_eq!(classify(25.0, 80.0, 43), TerrainType::Hill);
        assert_eq!(classify(25.0, 80.0, 42), TerrainType::TropicalRainforest);
        assert_eq!(classify(-30.0, 0.0, -1), TerrainType::Sand);
        assert_eq!(classify(25.0, 80.0, 0), TerrainType::TropicalRainforest);
    }
}
