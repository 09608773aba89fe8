//! Chunk coordinates and axis helpers.
//!
//! A chunk is a 16×16 column of the infinite grid. Coordinates are signed and
//! unbounded; the dimension id keeps caches of different dimensions apart.

use serde::{Deserialize, Serialize};

/// Width of a chunk in blocks
pub const CHUNK_SIZE: i32 = 16;

/// Identifier of the dimension a chunk belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(pub u32);

/// Chunk coordinate, unique per dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub dimension: DimensionId,
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(dimension: DimensionId, x: i32, z: i32) -> Self {
        Self { dimension, x, z }
    }

    /// Coordinate displaced by (dx, dz) chunks in the same dimension
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            dimension: self.dimension,
            x: self.x.wrapping_add(dx),
            z: self.z.wrapping_add(dz),
        }
    }

    /// Adjacent coordinate in the given direction
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dz) = direction.delta();
        self.offset(dx, dz)
    }

    /// Block position of the chunk's (0, 0) corner
    pub fn block_origin(&self) -> (i32, i32) {
        (self.x.wrapping_mul(CHUNK_SIZE), self.z.wrapping_mul(CHUNK_SIZE))
    }

    /// Block position of the chunk center
    pub fn block_center(&self) -> (i32, i32) {
        let (bx, bz) = self.block_origin();
        (bx + CHUNK_SIZE / 2, bz + CHUNK_SIZE / 2)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]({},{})", self.dimension.0, self.x, self.z)
    }
}

/// One of the four axis directions on the chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    XMin,
    XMax,
    ZMin,
    ZMax,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::XMin, Direction::XMax, Direction::ZMin, Direction::ZMax];

    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::XMin => (-1, 0),
            Direction::XMax => (1, 0),
            Direction::ZMin => (0, -1),
            Direction::ZMax => (0, 1),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::XMin => Direction::XMax,
            Direction::XMax => Direction::XMin,
            Direction::ZMin => Direction::ZMax,
            Direction::ZMax => Direction::ZMin,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Direction::XMin | Direction::XMax => Orientation::X,
            Direction::ZMin | Direction::ZMax => Orientation::Z,
        }
    }
}

/// Axis along which a linear structure (bridge, corridor, highway) runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    X,
    Z,
}

impl Orientation {
    /// Direction pointing toward decreasing coordinates on this axis
    pub fn min_direction(&self) -> Direction {
        match self {
            Orientation::X => Direction::XMin,
            Orientation::Z => Direction::ZMin,
        }
    }

    pub fn max_direction(&self) -> Direction {
        self.min_direction().opposite()
    }

    pub fn perpendicular(&self) -> Orientation {
        match self {
            Orientation::X => Orientation::Z,
            Orientation::Z => Orientation::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_opposite_cancel() {
        let c = ChunkCoord::new(DimensionId(0), 3, -7);
        for d in Direction::ALL {
            assert_eq!(c.step(d).step(d.opposite()), c);
        }
    }

    #[test]
    fn test_block_center() {
        let c = ChunkCoord::new(DimensionId(0), -1, 2);
        assert_eq!(c.block_origin(), (-16, 32));
        assert_eq!(c.block_center(), (-8, 40));
    }

    #[test]
    fn test_dimension_separates_coords() {
        let a = ChunkCoord::new(DimensionId(0), 1, 1);
        let b = ChunkCoord::new(DimensionId(1), 1, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_orientation_directions() {
        assert_eq!(Orientation::X.min_direction(), Direction::XMin);
        assert_eq!(Orientation::Z.max_direction(), Direction::ZMax);
        assert_eq!(Direction::ZMin.orientation(), Orientation::Z);
    }
}
