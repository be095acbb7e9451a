mod biome;
mod grid;
mod humidity;
mod precipitation;
mod rivers;
mod tectonics;
mod temperature;
mod wind;

pub use biome::{classify, BiomeSystem};
pub use grid::GridSystem;
pub use humidity::HumiditySystem;
pub use precipitation::PrecipitationSystem;
pub use rivers::RiverSystem;
pub use tectonics::TectonicsSystem;
pub use temperature::TemperatureSystem;
pub use wind::WindSystem;

/// Cosine interpolation between `a` and `b`.
pub(crate) fn coserp(a: f32, b: f32, t: f32) -> f32 {
    let t2 = (1.0 - (t * std::f32::consts::PI).cos()) / 2.0;
    a * (1.0 - t2) + b * t2
}

/// Linear interpolation with `t` clamped to [0, 1].
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Position of `value` between `a` and `b`, clamped to [0, 1]; 0 when `a == b`.
pub(crate) fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coserp_endpoints() {
        assert_eq!(coserp(-10.0, 30.0, 0.0), -10.0);
        assert!((coserp(-10.0, 30.0, 1.0) - 30.0).abs() < 1e-4);
        assert!((coserp(0.0, 100.0, 0.5) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_inverse_lerp_clamps() {
        assert_eq!(inverse_lerp(4.0, 29.0, 0.0), 0.0);
        assert_eq!(inverse_lerp(4.0, 29.0, 100.0), 1.0);
        assert_eq!(inverse_lerp(3.0, 3.0, 3.0), 0.0);
        assert_eq!(inverse_lerp(10.0, 0.0, 5.0), 0.5);
    }
}
