//! First resolution pass: the cheap, per-chunk facts every later pass
//! builds on.
//!
//! Characteristics decide whether a chunk is city, which part of a 2x2
//! building it is, its city level, whether it may hold a building, its city
//! style and which building it would hold. The raw predicates in this module
//! never touch the cache, so they are safe to call while the cache is being
//! filled.

use std::rc::Rc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::assets::{BuildingId, CityStyleId, MultiBuildingId};
use crate::coords::ChunkCoord;
use crate::error::Result;
use crate::profile::Profile;
use crate::seeds::{building_rng, next_int, sphere_level_rng};
use crate::world::{DimensionContext, RailChunkType};

use super::multibuilding::{multi_building_section, Section};
use super::CityResolver;

/// Sample points used to probe floating islands for void
const ISLAND_SAMPLES: [(i32, i32); 5] = [(8, 8), (3, 3), (12, 3), (3, 12), (12, 12)];

/// Resolved first-pass facts about a chunk. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkCharacteristics {
    pub is_city: bool,
    /// Part of a 2x2 building, if any
    pub section: Option<Section>,
    pub city_level: i32,
    pub could_have_building: bool,
    pub city_style: CityStyleId,
    pub multi_building: Option<MultiBuildingId>,
    /// Building this chunk holds if it ends up with one
    pub building: BuildingId,
}

/// Floating worlds have no city over chunks that are partly void.
pub(crate) fn is_void_chunk(ctx: &DimensionContext, coord: ChunkCoord) -> bool {
    ctx.profile.is_floating()
        && ISLAND_SAMPLES
            .iter()
            .any(|&(x, z)| ctx.terrain.height_at(coord, x, z) <= 0)
}

/// City test that does not use the cache.
pub(crate) fn is_city_raw(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    if is_void_chunk(ctx, coord) {
        return false;
    }
    if ctx.profile.is_space() {
        if ctx.spheres.on_border(coord) {
            return false;
        }
        if !ctx.profile.citysphere_landscape_outside && !ctx.spheres.fully_inside(coord) {
            return false;
        }
        if ctx.spheres.has_monorail_station(coord) {
            return false;
        }
    }
    ctx.city.city_factor(coord, profile) > profile.city_threshold
}

pub(crate) fn has_highway(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    ctx.transit.highway_x_level(coord, profile) >= 0 || ctx.transit.highway_z_level(coord, profile) >= 0
}

pub(crate) fn has_railway(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    ctx.transit.rail_info(coord, profile).kind != RailChunkType::None
}

/// City level from terrain (or sphere position), without the cache.
pub(crate) fn city_level_raw(ctx: &DimensionContext, coord: ChunkCoord) -> i32 {
    let profile = &ctx.profile;
    if profile.is_space() {
        if ctx.spheres.intersects(coord) {
            let dist = ctx.spheres.relative_distance_to_center(coord);
            let mut rng = sphere_level_rng(ctx.seed, coord.x, coord.z);
            if dist < 0.3 {
                2 + next_int(&mut rng, 2)
            } else if dist < 0.4 {
                1 + next_int(&mut rng, 2)
            } else if dist < 0.6 {
                next_int(&mut rng, 2)
            } else {
                0
            }
        } else {
            ctx.outside_profile().level_for_height(ctx.terrain.average_height(coord))
        }
    } else if profile.is_floating() || profile.is_cavern() {
        profile.level_for_height(island_height(ctx, coord))
    } else {
        profile.level_for_height(ctx.terrain.average_height(coord))
    }
}

/// Average of the island samples that are above the void.
fn island_height(ctx: &DimensionContext, coord: ChunkCoord) -> i32 {
    let solid: Vec<i32> = ISLAND_SAMPLES
        .iter()
        .map(|&(x, z)| ctx.terrain.height_at(coord, x, z))
        .filter(|&h| h > 1)
        .collect();
    if solid.is_empty() {
        0
    } else {
        solid.iter().sum::<i32>() / solid.len() as i32
    }
}

/// Whether a city chunk may hold a building. Always makes the first draw.
fn check_building_possibility(
    ctx: &DimensionContext,
    coord: ChunkCoord,
    profile: &Profile,
    section: Option<Section>,
    city_level: i32,
    rng: &mut ChaCha8Rng,
) -> bool {
    let bc: f32 = rng.gen();
    if ctx.predefined.building_at(coord).is_some() {
        return true;
    }
    if ctx.predefined.street_at(coord) {
        return false;
    }
    if section.is_some() {
        return true;
    }
    if bc >= profile.building_chance {
        return false;
    }
    if has_highway(ctx, coord, profile) {
        let max_highway = ctx
            .transit
            .highway_x_level(coord, profile)
            .max(ctx.transit.highway_z_level(coord, profile));
        // Buildings only fit above the highway plus one level
        return city_level > max_highway + 1;
    }
    let rail = ctx.transit.rail_info(coord, profile);
    match rail.kind {
        RailChunkType::None => true,
        RailChunkType::StationUnderground => false,
        _ => city_level > rail.level + 1,
    }
}

/// Majority style over the 3x3 neighbourhood, the center counted twice.
/// Ties go to the style reached first scanning x outer, z inner.
fn street_city_style(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> Result<CityStyleId> {
    let mut counts: Vec<(CityStyleId, u32)> = Vec::with_capacity(9);
    for cx in -1..=1 {
        for cz in -1..=1 {
            let style = ctx
                .city
                .city_style(coord.offset(cx, cz), profile, &ctx.assets, ctx.world_style)?;
            let weight = if cx == 0 && cz == 0 { 2 } else { 1 };
            match counts.iter_mut().find(|(s, _)| *s == style) {
                Some(entry) => entry.1 += weight,
                None => counts.push((style, weight)),
            }
        }
    }
    let mut best = counts[0];
    for &entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    Ok(best.0)
}

/// Build the characteristics of a chunk. Only the anchor of a 2x2 building
/// is requested from the resolver.
pub(crate) fn build(resolver: &CityResolver, coord: ChunkCoord) -> Result<ChunkCharacteristics> {
    let ctx = resolver.context();
    let assets = &ctx.assets;
    let profile: &Profile = ctx.profile_for(coord);

    let is_city = is_city_raw(ctx, coord, profile);
    let section = multi_building_section(ctx, coord, profile);
    let anchor: Option<Rc<ChunkCharacteristics>> = match section {
        Some(s) if !s.is_anchor() => Some(resolver.characteristics(s.anchor_of(coord))?),
        _ => None,
    };
    let city_level = match &anchor {
        Some(a) => a.city_level,
        None => city_level_raw(ctx, coord),
    };

    let mut rng = building_rng(ctx.seed, coord.x, coord.z);
    let mut could_have_building =
        is_city && check_building_possibility(ctx, coord, profile, section, city_level, &mut rng);
    if profile.is_space() && section.is_none() && ctx.spheres.relative_distance_to_center(coord) > 0.7 {
        // Keep the rim of a sphere city open
        could_have_building = false;
    }

    let city_style = if is_city && !could_have_building {
        street_city_style(ctx, coord, profile)?
    } else {
        ctx.city.city_style(coord, profile, assets, ctx.world_style)?
    };
    let style = assets.city_style(city_style);
    let predefined = ctx.predefined.building_at(coord);

    let (multi_building, building) = match (section, &anchor) {
        (Some(s), Some(anchor)) => match anchor.multi_building {
            Some(multi) => {
                let (x, z) = s.footprint_position();
                (Some(multi), assets.multi_building(multi).building_at(x, z)?)
            }
            None => (None, anchor.building),
        },
        (Some(_), None) => {
            let drawn = style.random_multi_building(&mut rng);
            let multi = match predefined.filter(|p| p.multi) {
                Some(p) => assets.multi_building_id(&p.building)?,
                None => drawn?,
            };
            (Some(multi), assets.multi_building(multi).building_at(0, 0)?)
        }
        (None, _) => {
            let drawn = style.random_building(&mut rng);
            let building = match predefined {
                Some(p) => assets.building_id(&p.building)?,
                None => drawn?,
            };
            (None, building)
        }
    };

    log::trace!(
        "characteristics {}: city={} section={:?} level={} building={}",
        coord,
        is_city,
        section,
        city_level,
        could_have_building
    );

    Ok(ChunkCharacteristics {
        is_city,
        section,
        city_level,
        could_have_building,
        city_style,
        multi_building,
        building,
    })
}
