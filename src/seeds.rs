//! Seeded random streams for chunk resolution
//!
//! Every chunk draws all of its randomness from one stream derived from the
//! world seed and its coordinate. The multipliers and the warm-up draws are
//! part of the output contract: changing either changes every chunk.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const BUILDING_Z_MULTIPLIER: i64 = 341_873_128_712;
const BUILDING_X_MULTIPLIER: i64 = 132_897_987_541;

const SPHERE_LEVEL_Z_MULTIPLIER: i64 = 817_505_771;
const SPHERE_LEVEL_X_MULTIPLIER: i64 = 217_645_177;

const OFFSET_Z_MULTIPLIER: i64 = 256_203_221;
const OFFSET_X_MULTIPLIER: i64 = 899_809_363;

/// Seed a stream and throw away the first `warmup` floats.
fn warmed_stream(seed: i64, warmup: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    for _ in 0..warmup {
        let _: f32 = rng.gen();
    }
    rng
}

fn mix(seed: i64, x: i32, z: i32, x_mul: i64, z_mul: i64) -> i64 {
    seed.wrapping_add((z as i64).wrapping_mul(z_mul))
        .wrapping_add((x as i64).wrapping_mul(x_mul))
}

/// The per-chunk stream used by both resolution passes.
pub fn building_rng(world_seed: u64, chunk_x: i32, chunk_z: i32) -> ChaCha8Rng {
    let seed = mix(world_seed as i64, chunk_x, chunk_z, BUILDING_X_MULTIPLIER, BUILDING_Z_MULTIPLIER);
    warmed_stream(seed, 2)
}

/// Stream used to jitter city levels inside city spheres.
pub fn sphere_level_rng(world_seed: u64, chunk_x: i32, chunk_z: i32) -> ChaCha8Rng {
    let seed = mix(world_seed as i64, chunk_x, chunk_z, SPHERE_LEVEL_X_MULTIPLIER, SPHERE_LEVEL_Z_MULTIPLIER);
    warmed_stream(seed, 2)
}

/// Uniform integer in `0..bound`. An empty range (`bound <= 0`) yields 0
/// without drawing, so the stream is left where it was.
pub fn next_int<R: Rng>(rng: &mut R, bound: i32) -> i32 {
    if bound <= 0 {
        0
    } else {
        rng.gen_range(0..bound)
    }
}

/// Seedless per-corner offset in `min..=max` for terrain blending.
pub fn randomized_offset(chunk_x: i32, chunk_z: i32, min: i32, max: i32) -> i32 {
    let mut rng = warmed_stream(mix(0, chunk_x, chunk_z, OFFSET_X_MULTIPLIER, OFFSET_Z_MULTIPLIER), 1);
    next_int(&mut rng, max - min + 1) + min
}

/// Jitter in `0..5` added to level-1 blend offsets.
pub fn height_offset_l1(chunk_x: i32, chunk_z: i32) -> i32 {
    let mut rng = warmed_stream(mix(0, chunk_x, chunk_z, BUILDING_X_MULTIPLIER, BUILDING_Z_MULTIPLIER), 1);
    next_int(&mut rng, 5)
}

/// Jitter in `0..5` added to level-2 blend offsets.
pub fn height_offset_l2(chunk_x: i32, chunk_z: i32) -> i32 {
    // Multipliers swapped relative to level 1
    let mut rng = warmed_stream(mix(0, chunk_x, chunk_z, BUILDING_Z_MULTIPLIER, BUILDING_X_MULTIPLIER), 1);
    next_int(&mut rng, 5)
}

/// Weighted pick from `(factor, value)` pairs.
///
/// Draws exactly one float when the list is non-empty and nothing otherwise,
/// so callers can rely on a stable draw count.
pub fn pick_weighted<'a, R: Rng, T>(rng: &mut R, list: &'a [(f32, T)]) -> Option<&'a T> {
    if list.is_empty() {
        return None;
    }
    let total: f32 = list.iter().map(|(f, _)| *f).sum();
    let mut r = rng.gen::<f32>() * total;
    for (factor, value) in list {
        r -= *factor;
        if r <= 0.0 {
            return Some(value);
        }
    }
    // Rounding left a sliver past the last weight
    list.last().map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_rng_deterministic() {
        let mut a = building_rng(12345, -4, 9);
        let mut b = building_rng(12345, -4, 9);
        for _ in 0..16 {
            assert_eq!(a.gen::<u32>(), b.gen::<u32>());
        }
    }

    #[test]
    fn test_neighbouring_chunks_decorrelate() {
        let a: u64 = building_rng(7, 0, 0).gen();
        let b: u64 = building_rng(7, 1, 0).gen();
        let c: u64 = building_rng(7, 0, 1).gen();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_randomized_offset_within_bounds() {
        for x in -20..20 {
            for z in -20..20 {
                let o = randomized_offset(x, z, -4, -3);
                assert!((-4..=-3).contains(&o));
                assert!((0..5).contains(&height_offset_l1(x, z)));
                assert!((0..5).contains(&height_offset_l2(x, z)));
            }
        }
    }

    #[test]
    fn test_pick_weighted_empty_draws_nothing() {
        let mut a = building_rng(1, 2, 3);
        let mut b = building_rng(1, 2, 3);
        let empty: Vec<(f32, &str)> = Vec::new();
        assert!(pick_weighted(&mut a, &empty).is_none());
        assert_eq!(a.gen::<u32>(), b.gen::<u32>());
    }

    #[test]
    fn test_pick_weighted_respects_zero_weight() {
        let list = vec![(0.0, "never"), (1.0, "always")];
        let mut rng = building_rng(99, 0, 0);
        for _ in 0..100 {
            assert_eq!(*pick_weighted(&mut rng, &list).unwrap(), "always");
        }
    }

    #[test]
    fn test_next_int_empty_range() {
        let mut rng = building_rng(0, 0, 0);
        let mut untouched = rng.clone();
        assert_eq!(next_int(&mut rng, 0), 0);
        assert_eq!(next_int(&mut rng, -3), 0);
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
        assert!((0..3).contains(&next_int(&mut rng, 3)));
    }
}
