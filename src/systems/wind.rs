use anyhow::Result;
use tracing::debug;

use super::{coserp, inverse_lerp, lerp};
use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{Wind, WorldMapData},
};

const BAND_COUNT: u32 = 6;
const PEAK_MAGNITUDE: f32 = 100.0;

/// Heading at the start and end of each latitude band, south to north:
/// polar easterlies, westerlies, trade winds and back again.
const BAND_HEADINGS: [(f32, f32); BAND_COUNT as usize] = [
    (0.0, -75.0),
    (165.0, 105.0),
    (-15.0, -75.0),
    (270.0, 195.0),
    (75.0, 15.0),
    (270.0, 180.0),
];

pub struct WindSystem;

impl WindSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WindSystem {
    fn name(&self) -> &str {
        "wind"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut WorldMapData,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let size_z = world.size_z();
        let mut strongest = 0.0_f32;
        for tile in &mut world.tiles {
            let row = tile.coords.to_offset().row as u32;
            let mut wind = band_wind(row, size_z);
            wind.magnitude *= elevation_factor(tile.elevation);
            strongest = strongest.max(wind.magnitude);
            tile.wind = wind;
        }
        debug!(strongest, "wind assigned");
        Ok(())
    }
}

/// Wind for a row: heading sweeps across the band, speed peaks mid-band and
/// falls to zero at band edges.
pub(crate) fn band_wind(row: u32, size_z: u32) -> Wind {
    let band = (size_z / BAND_COUNT).max(1);
    let index = (0..BAND_COUNT)
        .filter(|i| i * band < row)
        .last()
        .unwrap_or(0);
    let start = index * band;
    let end = if index == BAND_COUNT - 1 {
        size_z
    } else {
        start + band
    };

    let t = inverse_lerp(start as f32, end as f32, row as f32);
    let (from, to) = BAND_HEADINGS[index as usize];
    Wind {
        direction: lerp(from, to, t),
        magnitude: coserp(0.0, PEAK_MAGNITUDE, 1.0 - (2.0 * t - 1.0).abs()),
    }
}

/// Exposed high ground gets stronger wind; water and lowlands a flat boost.
fn elevation_factor(elevation: i32) -> f32 {
    let elevation = elevation.max(0) as f32;
    if elevation < 4.0 {
        1.2
    } else if elevation < 30.0 {
        1.0 + inverse_lerp(4.0, 29.0, elevation) / 4.0
    } else {
        1.25 + inverse_lerp(30.0, 60.0, elevation) / 2.0
    }
}
