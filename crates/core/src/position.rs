//! Block and world-space positions.

use serde::{Deserialize, Serialize};

/// Integer block coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position directly above this one.
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    /// World-space center of the block (`+0.5` on every axis).
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }

    /// World-space corner of the block (no offset).
    pub fn corner(self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Chunk column containing this block (16x16).
    pub const fn chunk(self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Create a new position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Floor every axis to the containing block.
    pub fn floor(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// Euclidean distance to another position.
    pub fn distance(self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_floor_round_trip() {
        let pos = BlockPos::new(-3, 64, 17);
        assert_eq!(pos.center(), Vec3::new(-2.5, 64.5, 17.5));
        assert_eq!(pos.center().floor(), pos);
    }

    #[test]
    fn negative_coordinates_map_to_negative_chunks() {
        assert_eq!(BlockPos::new(-1, 0, 15).chunk(), (-1, 0));
        assert_eq!(BlockPos::new(16, 0, -17).chunk(), (1, -2));
    }
}
