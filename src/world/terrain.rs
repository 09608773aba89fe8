//! Terrain height source.
//!
//! The resolution engine never generates terrain itself. It samples heights
//! to bucket chunks into city levels, to detect void chunks on floating
//! islands, and to classify water for bridges and terrain blending.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::coords::{ChunkCoord, CHUNK_SIZE};

/// Read-only view of the terrain generator.
pub trait TerrainSource {
    /// Height of the terrain at a local block position (0..16) inside a chunk.
    fn height_at(&self, chunk: ChunkCoord, local_x: i32, local_z: i32) -> i32;

    /// Representative height of a chunk.
    fn average_height(&self, chunk: ChunkCoord) -> i32 {
        let mut total = 0;
        let mut count = 0;
        for x in (2..CHUNK_SIZE).step_by(3) {
            for z in (2..CHUNK_SIZE).step_by(3) {
                total += self.height_at(chunk, x, z);
                count += 1;
            }
        }
        total / count
    }

    /// Whether the chunk's main biome is ocean.
    fn is_ocean(&self, chunk: ChunkCoord) -> bool;

    /// Whether the chunk is water of any kind (ocean, river, lake).
    fn is_water(&self, chunk: ChunkCoord) -> bool;
}

/// Fractal noise terrain, used by the command line tools and as a reference
/// collaborator. Heights are sampled at world block coordinates so adjacent
/// chunks agree on their shared edge.
pub struct NoiseTerrain {
    fbm: Fbm<Perlin>,
    /// Height of the zero noise level
    pub base_height: f64,
    /// Noise amplitude in blocks
    pub amplitude: f64,
    /// Horizontal scale in blocks per noise unit
    pub scale: f64,
    /// Terrain at or below this height is water
    pub sea_level: i32,
}

impl NoiseTerrain {
    pub fn new(seed: u64, sea_level: i32) -> Self {
        let fbm = Fbm::<Perlin>::new(seed as u32).set_octaves(4).set_persistence(0.5);
        Self {
            fbm,
            base_height: 72.0,
            amplitude: 24.0,
            scale: 384.0,
            sea_level,
        }
    }
}

impl TerrainSource for NoiseTerrain {
    fn height_at(&self, chunk: ChunkCoord, local_x: i32, local_z: i32) -> i32 {
        let (bx, bz) = chunk.block_origin();
        let nx = (bx + local_x) as f64 / self.scale;
        let nz = (bz + local_z) as f64 / self.scale;
        let n = self.fbm.get([nx, nz]);
        (self.base_height + n * self.amplitude).round() as i32
    }

    fn is_ocean(&self, chunk: ChunkCoord) -> bool {
        self.average_height(chunk) < self.sea_level - 4
    }

    fn is_water(&self, chunk: ChunkCoord) -> bool {
        self.average_height(chunk) < self.sea_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DimensionId;

    #[test]
    fn test_noise_terrain_deterministic() {
        let a = NoiseTerrain::new(42, 63);
        let b = NoiseTerrain::new(42, 63);
        let c = ChunkCoord::new(DimensionId(0), 5, -3);
        assert_eq!(a.height_at(c, 4, 9), b.height_at(c, 4, 9));
        assert_eq!(a.average_height(c), b.average_height(c));
    }

    #[test]
    fn test_shared_edge_agrees() {
        let t = NoiseTerrain::new(7, 63);
        let left = ChunkCoord::new(DimensionId(0), 0, 0);
        let right = left.offset(1, 0);
        // Block x = 16 is local 16 of the left chunk and local 0 of the right one
        assert_eq!(t.height_at(left, 16, 5), t.height_at(right, 0, 5));
    }

    #[test]
    fn test_ocean_implies_water() {
        let t = NoiseTerrain::new(3, 63);
        for x in -10..10 {
            let c = ChunkCoord::new(DimensionId(0), x * 7, x * 3);
            if t.is_ocean(c) {
                assert!(t.is_water(c));
            }
        }
    }
}
