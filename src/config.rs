use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::seed_from_str;

fn default_chunk_size() -> u32 {
    5
}

fn default_size_chunks() -> u32 {
    8
}

fn default_ocean_frequency() -> f32 {
    0.6
}

fn default_num_plates() -> u32 {
    10
}

fn default_plate_spread_chance() -> f32 {
    0.5
}

fn default_plate_motion_scale() -> f32 {
    0.3
}

fn default_uplift_decay() -> f32 {
    0.8
}

fn default_temperature_decay() -> f32 {
    0.92
}

fn default_temperature_elevation_decay() -> f32 {
    0.95
}

fn default_weather_passes() -> u32 {
    100
}

fn default_condensation_interval() -> u32 {
    20
}

/// Upper bound (exclusive) for seeds drawn when `randomize_seed` is set.
pub const RANDOM_SEED_LIMIT: u64 = 9_999_999;

/// Largest grid accepted; offset coordinates are `i32`.
pub const MAX_TILES: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    pub min: i32,
    pub max: i32,
}

impl ElevationRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, elevation: i32) -> i32 {
        elevation.clamp(self.min, self.max)
    }

    pub fn contains(&self, elevation: i32) -> bool {
        (self.min..=self.max).contains(&elevation)
    }
}

/// Elevation bounds for the two crust types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationConfig {
    #[serde(default = "ElevationConfig::default_oceanic_clamp")]
    pub oceanic_clamp: ElevationRange,
    #[serde(default = "ElevationConfig::default_continental_clamp")]
    pub continental_clamp: ElevationRange,
    #[serde(default = "ElevationConfig::default_oceanic_desired")]
    pub oceanic_desired: ElevationRange,
    #[serde(default = "ElevationConfig::default_continental_desired")]
    pub continental_desired: ElevationRange,
}

impl ElevationConfig {
    fn default_oceanic_clamp() -> ElevationRange {
        ElevationRange::new(-75, 80)
    }

    fn default_continental_clamp() -> ElevationRange {
        ElevationRange::new(0, 80)
    }

    fn default_oceanic_desired() -> ElevationRange {
        ElevationRange::new(-23, -6)
    }

    fn default_continental_desired() -> ElevationRange {
        ElevationRange::new(8, 19)
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            oceanic_clamp: Self::default_oceanic_clamp(),
            continental_clamp: Self::default_continental_clamp(),
            oceanic_desired: Self::default_oceanic_desired(),
            continental_desired: Self::default_continental_desired(),
        }
    }
}

/// Inputs for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldArgs {
    #[serde(default)]
    pub world_seed: u64,
    #[serde(default)]
    pub string_seed: Option<String>,
    #[serde(default)]
    pub use_string_seed: bool,
    #[serde(default)]
    pub randomize_seed: bool,

    #[serde(default = "default_size_chunks")]
    pub size_chunks_x: u32,
    #[serde(default = "default_size_chunks")]
    pub size_chunks_z: u32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size_x: u32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size_z: u32,

    #[serde(default = "default_ocean_frequency")]
    pub ocean_frequency: f32,
    #[serde(default = "default_num_plates")]
    pub num_plates: u32,
    #[serde(default = "default_plate_spread_chance")]
    pub plate_spread_chance: f32,
    #[serde(default = "default_plate_motion_scale")]
    pub plate_motion_scale: f32,
    #[serde(default = "default_uplift_decay")]
    pub uplift_decay: f32,
    #[serde(default)]
    pub elevation: ElevationConfig,

    #[serde(default = "default_temperature_decay")]
    pub temperature_decay: f32,
    #[serde(default = "default_temperature_elevation_decay")]
    pub temperature_elevation_decay: f32,
    #[serde(default = "default_weather_passes")]
    pub weather_passes: u32,
    #[serde(default = "default_condensation_interval")]
    pub condensation_interval: u32,
}

impl Default for WorldArgs {
    fn default() -> Self {
        Self {
            world_seed: 0,
            string_seed: None,
            use_string_seed: false,
            randomize_seed: false,
            size_chunks_x: default_size_chunks(),
            size_chunks_z: default_size_chunks(),
            chunk_size_x: default_chunk_size(),
            chunk_size_z: default_chunk_size(),
            ocean_frequency: default_ocean_frequency(),
            num_plates: default_num_plates(),
            plate_spread_chance: default_plate_spread_chance(),
            plate_motion_scale: default_plate_motion_scale(),
            uplift_decay: default_uplift_decay(),
            elevation: ElevationConfig::default(),
            temperature_decay: default_temperature_decay(),
            temperature_elevation_decay: default_temperature_elevation_decay(),
            weather_passes: default_weather_passes(),
            condensation_interval: default_condensation_interval(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        range: &'static str,
    },
    #[error("{plates} plates requested but the grid only has {tiles} tiles")]
    TooManyPlates { plates: u32, tiles: u32 },
    #[error("grid of {tiles} tiles is too small; at least {required} are needed")]
    GridTooSmall { tiles: u32, required: u32 },
    #[error("elevation range {field} is empty ({min} > {max})")]
    EmptyRange {
        field: &'static str,
        min: i32,
        max: i32,
    },
    #[error("desired elevation range {field} must lie inside its clamp range")]
    DesiredOutsideClamp { field: &'static str },
    #[error("grid of {size_x}x{size_z} tiles exceeds the limit of {limit} tiles")]
    GridTooLarge { size_x: u64, size_z: u64, limit: u64 },
    #[error("use_string_seed is set but no string_seed was given")]
    MissingStringSeed,
}

impl WorldArgs {
    /// Tile columns.
    pub fn size_x(&self) -> u32 {
        self.size_chunks_x.saturating_mul(self.chunk_size_x)
    }

    /// Tile rows.
    pub fn size_z(&self) -> u32 {
        self.size_chunks_z.saturating_mul(self.chunk_size_z)
    }

    pub fn tile_count(&self) -> u32 {
        self.size_x().saturating_mul(self.size_z())
    }

    /// Picks the seed for this run. Randomizing wins over everything, a
    /// string seed wins over the explicit integer.
    pub fn resolve_seed(&self) -> u64 {
        if self.randomize_seed {
            return rand::thread_rng().gen_range(0..RANDOM_SEED_LIMIT);
        }
        if self.use_string_seed {
            if let Some(text) = &self.string_seed {
                return seed_from_str(text);
            }
        }
        self.world_seed
    }

    /// Tile count, or `GridTooLarge` when it would not fit `MAX_TILES`.
    fn checked_tile_count(&self) -> Result<u32, ConfigError> {
        let size_x = self.size_chunks_x as u64 * self.chunk_size_x as u64;
        let size_z = self.size_chunks_z as u64 * self.chunk_size_z as u64;
        size_x
            .checked_mul(size_z)
            .filter(|&tiles| tiles <= MAX_TILES as u64)
            .map(|tiles| tiles as u32)
            .ok_or(ConfigError::GridTooLarge {
                size_x,
                size_z,
                limit: MAX_TILES as u64,
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("size_chunks_x", self.size_chunks_x),
            ("size_chunks_z", self.size_chunks_z),
            ("chunk_size_x", self.chunk_size_x),
            ("chunk_size_z", self.chunk_size_z),
            ("num_plates", self.num_plates),
            ("condensation_interval", self.condensation_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        let tiles = self.checked_tile_count()?;
        if tiles < 2 {
            return Err(ConfigError::GridTooSmall { tiles, required: 2 });
        }
        if self.num_plates > tiles {
            return Err(ConfigError::TooManyPlates {
                plates: self.num_plates,
                tiles,
            });
        }

        check_closed("ocean_frequency", self.ocean_frequency)?;
        check_closed("plate_motion_scale", self.plate_motion_scale)?;
        if !(self.plate_spread_chance > 0.0 && self.plate_spread_chance <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "plate_spread_chance",
                value: self.plate_spread_chance,
                range: "(0, 1]",
            });
        }
        check_open("uplift_decay", self.uplift_decay)?;
        check_open("temperature_decay", self.temperature_decay)?;
        check_open(
            "temperature_elevation_decay",
            self.temperature_elevation_decay,
        )?;

        let elevation = &self.elevation;
        for (field, range) in [
            ("oceanic_clamp", elevation.oceanic_clamp),
            ("continental_clamp", elevation.continental_clamp),
            ("oceanic_desired", elevation.oceanic_desired),
            ("continental_desired", elevation.continental_desired),
        ] {
            if range.min > range.max {
                return Err(ConfigError::EmptyRange {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        if !within(elevation.oceanic_desired, elevation.oceanic_clamp) {
            return Err(ConfigError::DesiredOutsideClamp {
                field: "oceanic_desired",
            });
        }
        if !within(elevation.continental_desired, elevation.continental_clamp) {
            return Err(ConfigError::DesiredOutsideClamp {
                field: "continental_desired",
            });
        }

        if self.use_string_seed && self.string_seed.is_none() && !self.randomize_seed {
            return Err(ConfigError::MissingStringSeed);
        }

        Ok(())
    }
}

fn within(inner: ElevationRange, outer: ElevationRange) -> bool {
    outer.contains(inner.min) && outer.contains(inner.max)
}

fn check_closed(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            range: "[0, 1]",
        })
    }
}

fn check_open(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            range: "(0, 1)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_are_valid() {
        let args = WorldArgs::default();
        assert_eq!(args.validate(), Ok(()));
        assert_eq!(args.size_x(), 40);
        assert_eq!(args.size_z(), 40);
    }

    #[test]
    fn test_rejects_zero_plates() {
        let args = WorldArgs {
            num_plates: 0,
            ..WorldArgs::default()
        };
        assert_eq!(
            args.validate(),
            Err(ConfigError::NotPositive {
                field: "num_plates"
            })
        );
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let args = WorldArgs {
            size_chunks_z: 0,
            ..WorldArgs::default()
        };
        assert!(matches!(
            args.validate(),
            Err(ConfigError::NotPositive {
                field: "size_chunks_z"
            })
        ));
    }

    #[test]
    fn test_rejects_more_plates_than_tiles() {
        let args = WorldArgs {
            size_chunks_x: 1,
            size_chunks_z: 1,
            num_plates: 26,
            ..WorldArgs::default()
        };
        assert_eq!(
            args.validate(),
            Err(ConfigError::TooManyPlates {
                plates: 26,
                tiles: 25
            })
        );
    }

    #[test]
    fn test_rejects_decay_outside_open_interval() {
        for bad in [0.0, 1.0, -0.2, 1.5] {
            let args = WorldArgs {
                uplift_decay: bad,
                ..WorldArgs::default()
            };
            assert!(
                matches!(
                    args.validate(),
                    Err(ConfigError::OutOfRange {
                        field: "uplift_decay",
                        ..
                    })
                ),
                "uplift_decay {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_inverted_elevation_range() {
        let mut args = WorldArgs::default();
        args.elevation.continental_clamp = ElevationRange::new(10, 0);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::EmptyRange {
                field: "continental_clamp",
                ..
            })
        ));
    }

    #[test]
    fn test_seed_precedence() {
        let mut args = WorldArgs {
            world_seed: 1234,
            string_seed: Some("pangaea".into()),
            ..WorldArgs::default()
        };
        assert_eq!(args.resolve_seed(), 1234);

        args.use_string_seed = true;
        assert_eq!(args.resolve_seed(), seed_from_str("pangaea"));

        args.randomize_seed = true;
        let seed = args.resolve_seed();
        assert!(seed < RANDOM_SEED_LIMIT);
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let args = WorldArgs {
            size_chunks_x: 70_000,
            chunk_size_x: 70_000,
            ..WorldArgs::default()
        };
        assert_eq!(
            args.validate(),
            Err(ConfigError::GridTooLarge {
                size_x: 4_900_000_000,
                size_z: 40,
                limit: MAX_TILES as u64,
            })
        );

        let args = WorldArgs {
            size_chunks_x: 50_000,
            size_chunks_z: 50_000,
            ..WorldArgs::default()
        };
        assert!(matches!(
            args.validate(),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_missing_string_seed() {
        let args = WorldArgs {
            use_string_seed: true,
            ..WorldArgs::default()
        };
        assert_eq!(args.validate(), Err(ConfigError::MissingStringSeed));
    }
}
