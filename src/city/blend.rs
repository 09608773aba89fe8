//! Terrain blending toward city edges.
//!
//! Where city meets open land the terrain generator pulls the landscape
//! toward the city height. The target is computed at each chunk's (0,0)
//! corner and propagated outward twice with growing slack, so the landscape
//! ramps over a few chunks instead of forming a cliff.

use serde::Serialize;

use crate::error::Result;
use crate::seeds::{height_offset_l1, height_offset_l2, randomized_offset};

use super::neighbors::{ChunkRef, RING};

/// Corners at or above this height are treated as unconstrained
const MAX_FIXED_HEIGHT: i32 = 256;

/// Slack added per step for axis and diagonal neighbours
const AXIS_SLACK: i32 = 20;
const DIAGONAL_SLACK: i32 = 25;

/// Height range the terrain at a chunk corner should be pulled into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlendBounds {
    pub min: i32,
    pub max: i32,
}

impl BlendBounds {
    fn widen_into(target: &mut Option<BlendBounds>, min: i32, max: i32) {
        *target = Some(match *target {
            Some(b) => BlendBounds {
                min: b.min.min(min),
                max: b.max.min(max),
            },
            None => BlendBounds { min, max },
        });
    }
}

fn slack(dx: i32, dz: i32) -> i32 {
    if dx != 0 && dz != 0 {
        DIAGONAL_SLACK
    } else {
        AXIS_SLACK
    }
}

impl<'r> ChunkRef<'r> {
    pub fn is_ocean(&self) -> bool {
        if let Some(v) = self.memo.is_ocean.get() {
            return v;
        }
        let v = self.resolver().context().terrain.is_ocean(self.coord);
        self.memo.is_ocean.set(v);
        v
    }

    /// Height the landscape should meet at this chunk: city ground for city
    /// chunks, a little below ground for ocean, otherwise unconstrained.
    pub fn city_height(&self) -> Option<i32> {
        if self.is_city {
            Some(self.city_ground_level())
        } else if self.is_ocean() {
            Some(self.ground_level - 4)
        } else {
            None
        }
    }

    /// Lowest city height around this chunk's (0,0) corner. Unconstrained
    /// when the four chunks sharing the corner are all city or all land.
    pub fn lowest_city_height_at_corner(&self) -> Result<Option<i32>> {
        let corner = [self.clone(), self.xmin()?, self.zmin()?, self.adjacent(-1, -1)?];
        let cities = corner.iter().filter(|c| c.is_city).count();
        if cities == 0 || cities == corner.len() {
            return Ok(None);
        }
        Ok(corner.iter().filter_map(|c| c.city_height()).min())
    }

    /// First blending pass: fixed bounds at a constrained corner, otherwise
    /// bounds propagated from the eight surrounding corners.
    pub fn blend_bounds_l1(&self) -> Result<Option<BlendBounds>> {
        if let Some(v) = self.memo.blend_l1.get() {
            return Ok(v);
        }
        let (cx, cz) = (self.coord.x, self.coord.z);
        let profile = &self.profile;
        let v = match self.lowest_city_height_at_corner()? {
            Some(h) if h < MAX_FIXED_HEIGHT => Some(BlendBounds {
                min: h + randomized_offset(
                    cx,
                    cz,
                    profile.terrain_fix_lower_min_offset,
                    profile.terrain_fix_lower_max_offset,
                ),
                max: h + randomized_offset(
                    cx,
                    cz,
                    profile.terrain_fix_upper_min_offset,
                    profile.terrain_fix_upper_max_offset,
                ),
            }),
            _ => {
                let mut bounds = None;
                for &(dx, dz) in RING.iter() {
                    let n = self.adjacent(dx, dz)?;
                    if let Some(h) = n.lowest_city_height_at_corner()? {
                        let offs = slack(dx, dz) + height_offset_l1(cx + dx, cz + dz);
                        BlendBounds::widen_into(&mut bounds, h - offs, h + offs);
                    }
                }
                bounds
            }
        };
        self.memo.blend_l1.set(v);
        Ok(v)
    }

    /// Final blending bounds at this chunk's (0,0) corner: the first pass
    /// when it is fixed, otherwise propagated from the neighbours' first pass.
    pub fn blend_bounds(&self) -> Result<Option<BlendBounds>> {
        if let Some(v) = self.memo.blend_l2.get() {
            return Ok(v);
        }
        let (cx, cz) = (self.coord.x, self.coord.z);
        let v = match self.blend_bounds_l1()? {
            Some(b) if b.min < MAX_FIXED_HEIGHT => Some(b),
            _ => {
                let mut bounds = None;
                for &(dx, dz) in RING.iter() {
                    let n = self.adjacent(dx, dz)?;
                    if let Some(b) = n.blend_bounds_l1()? {
                        let offs = slack(dx, dz) + height_offset_l2(cx + dx, cz + dz);
                        BlendBounds::widen_into(&mut bounds, b.min - offs, b.max + offs);
                    }
                }
                bounds
            }
        };
        self.memo.blend_l2.set(v);
        Ok(v)
    }
}
