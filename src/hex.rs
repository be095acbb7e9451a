//! Hex grid math - cube coordinates on a flat-topped, odd-q offset layout

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// One of the six edges of a flat-topped hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    N,
    NE,
    SE,
    S,
    SW,
    NW,
}

impl HexDirection {
    pub const ALL: [HexDirection; 6] = [
        HexDirection::N,
        HexDirection::NE,
        HexDirection::SE,
        HexDirection::S,
        HexDirection::SW,
        HexDirection::NW,
    ];

    /// Unit step taken when moving one tile in this direction.
    pub fn delta(self) -> CubeCoord {
        match self {
            HexDirection::N => CubeCoord::new(0, -1, 1),
            HexDirection::NE => CubeCoord::new(1, -1, 0),
            HexDirection::SE => CubeCoord::new(1, 0, -1),
            HexDirection::S => CubeCoord::new(0, 1, -1),
            HexDirection::SW => CubeCoord::new(-1, 1, 0),
            HexDirection::NW => CubeCoord::new(-1, 0, 1),
        }
    }

    pub fn opposite(self) -> HexDirection {
        Self::ALL[(self as usize + 3) % 6]
    }
}

/// Cube coordinate with the invariant `x + y + z == 0`.
///
/// Differences of two coordinates are also represented as `CubeCoord`; such
/// motion vectors satisfy the invariant as well since both operands do.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Rectangular column/row address used for seeding loops and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetCoord {
    pub col: i32,
    pub row: i32,
}

impl CubeCoord {
    pub const ORIGIN: CubeCoord = CubeCoord { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Builds a coordinate from its x and z axes, deriving y.
    pub const fn from_xz(x: i32, z: i32) -> Self {
        Self { x, y: -x - z, z }
    }

    pub fn is_valid(self) -> bool {
        self.x + self.y + self.z == 0
    }

    pub fn scale(self, factor: i32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Component-wise interpolation towards `other`.
    ///
    /// x and z are rounded independently and y is re-derived, so the result
    /// is always a valid coordinate even though it may sit one step away from
    /// the exact fractional point.
    pub fn lerp(self, other: CubeCoord, t: f32) -> Self {
        let x = self.x + ((other.x - self.x) as f32 * t).round() as i32;
        let z = self.z + ((other.z - self.z) as f32 * t).round() as i32;
        Self::from_xz(x, z)
    }

    pub fn neighbor(self, dir: HexDirection) -> Self {
        self + dir.delta()
    }

    pub fn neighbors(self) -> impl Iterator<Item = (HexDirection, CubeCoord)> {
        HexDirection::ALL
            .into_iter()
            .map(move |dir| (dir, self.neighbor(dir)))
    }

    pub fn distance(self, other: CubeCoord) -> u32 {
        ((self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs())
            / 2
    }

    /// Direction that leads from `self` to an adjacent `other`.
    pub fn direction_to(self, other: CubeCoord) -> Option<HexDirection> {
        HexDirection::ALL
            .into_iter()
            .find(|dir| self.neighbor(*dir) == other)
    }

    /// Odd-q offset to cube conversion.
    pub fn from_offset(offset: OffsetCoord) -> Self {
        let x = offset.col;
        let z = offset.row - (offset.col - (offset.col & 1)) / 2;
        Self::from_xz(x, z)
    }

    pub fn to_offset(self) -> OffsetCoord {
        OffsetCoord {
            col: self.x,
            row: self.z + (self.x - (self.x & 1)) / 2,
        }
    }
}

impl OffsetCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl Add for CubeCoord {
    type Output = CubeCoord;

    fn add(self, rhs: CubeCoord) -> CubeCoord {
        CubeCoord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for CubeCoord {
    type Output = CubeCoord;

    fn sub(self, rhs: CubeCoord) -> CubeCoord {
        CubeCoord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
