//! Explosion damage.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::coords::{ChunkCoord, CHUNK_SIZE};

/// A spherical explosion in block coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub radius: i32,
}

impl Explosion {
    /// Damage in 0..1 at a block position, 1 at the center.
    pub fn damage_at(&self, x: i32, y: i32, z: i32) -> f32 {
        if self.radius <= 0 {
            return 0.0;
        }
        let dx = (x - self.x) as f32;
        let dy = (y - self.y) as f32;
        let dz = (z - self.z) as f32;
        let d = (dx * dx + dy * dy + dz * dz).sqrt();
        (1.0 - d / self.radius as f32).max(0.0)
    }
}

/// Source of destruction applied over generated cities.
pub trait DamageSource {
    /// Damage in 0..1 at a block position inside a chunk.
    fn damage_at(&self, chunk: ChunkCoord, x: i32, y: i32, z: i32) -> f32;

    /// Explosions that affect the chunk.
    fn explosions(&self, chunk: ChunkCoord) -> Vec<Explosion>;
}

/// Explosions scattered at random, at most one centered in each chunk.
pub struct ScatteredExplosions {
    pub seed: u64,
    /// Chance that a chunk holds an explosion center
    pub chance: f32,
    pub min_radius: i32,
    pub max_radius: i32,
    /// Lowest and highest explosion height
    pub min_y: i32,
    pub max_y: i32,
}

impl ScatteredExplosions {
    pub fn new(seed: u64, chance: f32) -> Self {
        Self {
            seed,
            chance,
            min_radius: 8,
            max_radius: 24,
            min_y: 70,
            max_y: 120,
        }
    }

    fn explosion_centered_in(&self, chunk: ChunkCoord) -> Option<Explosion> {
        let seed = (self.seed as i64)
            .wrapping_add((chunk.z as i64).wrapping_mul(567_629_017))
            .wrapping_add((chunk.x as i64).wrapping_mul(391_239_631));
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        if rng.gen::<f32>() >= self.chance {
            return None;
        }
        let (bx, bz) = chunk.block_origin();
        Some(Explosion {
            x: bx + rng.gen_range(0..CHUNK_SIZE),
            y: rng.gen_range(self.min_y..=self.max_y.max(self.min_y)),
            z: bz + rng.gen_range(0..CHUNK_SIZE),
            radius: rng.gen_range(self.min_radius..=self.max_radius.max(self.min_radius)),
        })
    }

    fn reach(&self) -> i32 {
        self.max_radius.max(self.min_radius) / CHUNK_SIZE + 1
    }
}

impl DamageSource for ScatteredExplosions {
    fn damage_at(&self, chunk: ChunkCoord, x: i32, y: i32, z: i32) -> f32 {
        self.explosions(chunk)
            .iter()
            .map(|e| e.damage_at(x, y, z))
            .fold(0.0, f32::max)
    }

    fn explosions(&self, chunk: ChunkCoord) -> Vec<Explosion> {
        let reach = self.reach();
        let (bx, bz) = chunk.block_origin();
        let mut result = Vec::new();
        for dx in -reach..=reach {
            for dz in -reach..=reach {
                if let Some(e) = self.explosion_centered_in(chunk.offset(dx, dz)) {
                    // Keep explosions whose sphere reaches this chunk's footprint
                    let nx = e.x.clamp(bx, bx + CHUNK_SIZE - 1);
                    let nz = e.z.clamp(bz, bz + CHUNK_SIZE - 1);
                    let (ddx, ddz) = (nx - e.x, nz - e.z);
                    if ddx * ddx + ddz * ddz <= e.radius * e.radius {
                        result.push(e);
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DimensionId;

    #[test]
    fn test_explosion_falloff() {
        let e = Explosion { x: 0, y: 64, z: 0, radius: 10 };
        assert_eq!(e.damage_at(0, 64, 0), 1.0);
        assert!((e.damage_at(5, 64, 0) - 0.5).abs() < 1e-6);
        assert_eq!(e.damage_at(20, 64, 0), 0.0);
    }

    #[test]
    fn test_zero_chance_means_no_damage() {
        let d = ScatteredExplosions::new(1, 0.0);
        let c = ChunkCoord::new(DimensionId(0), 4, 4);
        assert!(d.explosions(c).is_empty());
        assert_eq!(d.damage_at(c, 72, 80, 72), 0.0);
    }

    #[test]
    fn test_certain_explosion_damages_own_chunk() {
        let d = ScatteredExplosions::new(9, 1.0);
        let c = ChunkCoord::new(DimensionId(0), 0, 0);
        let own = d.explosions(c);
        assert!(!own.is_empty());
        let centered = own
            .iter()
            .find(|e| (0..CHUNK_SIZE).contains(&e.x) && (0..CHUNK_SIZE).contains(&e.z))
            .unwrap();
        assert_eq!(d.damage_at(c, centered.x, centered.y, centered.z), 1.0);
    }
}
