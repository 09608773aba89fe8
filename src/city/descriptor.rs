//! Second resolution pass: the full description of a chunk.
//!
//! A descriptor is built once per coordinate from its characteristics and
//! one seeded stream. The order of draws from that stream is fixed; every
//! field is drawn whether or not the chunk ends up using it, so changing one
//! branch never shifts the values of another.
//!
//! Derived values that depend on neighbours (bridges, corridors, stairs,
//! terrain blending) are not computed here. They live in memo slots next to
//! the immutable fields and are filled on demand through [`ChunkRef`].
//!
//! [`ChunkRef`]: super::neighbors::ChunkRef

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::assets::{
    AssetRegistry, Building, BuildingId, CityStyle, CityStyleId, ConditionContext, MultiBuildingId, PaletteId,
    PartId,
};
use crate::coords::{ChunkCoord, Direction, Orientation};
use crate::error::{ResolveError, Result};
use crate::profile::Profile;
use crate::seeds::{building_rng, next_int};
use crate::world::DimensionContext;

use super::blend::BlendBounds;
use super::multibuilding::{Section, SharedLayout};
use super::CityResolver;

/// Rail dungeons fit only when the lowest cellar stays above this level
pub const RAILWAY_LEVEL_OFFSET: i32 = -3;

/// Height of one city level in blocks
pub const FLOOR_HEIGHT: i32 = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum StreetType {
    #[default]
    Normal,
    Full,
    Park,
}

impl StreetType {
    pub const ALL: [StreetType; 3] = [StreetType::Normal, StreetType::Full, StreetType::Park];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DoorMaterial {
    Birch,
    Acacia,
    DarkOak,
    Spruce,
    #[default]
    Oak,
    Jungle,
    Iron,
}

impl DoorMaterial {
    fn from_roll(roll: i32) -> Self {
        match roll {
            0 => DoorMaterial::Birch,
            1 => DoorMaterial::Acacia,
            2 => DoorMaterial::DarkOak,
            3 => DoorMaterial::Spruce,
            5 => DoorMaterial::Jungle,
            6 => DoorMaterial::Iron,
            _ => DoorMaterial::Oak,
        }
    }
}

/// A lazily filled, write-once-per-evaluation slot.
pub(crate) struct Memo<T: Copy>(Cell<Option<T>>);

impl<T: Copy> Memo<T> {
    pub fn get(&self) -> Option<T> {
        self.0.get()
    }

    pub fn set(&self, value: T) {
        self.0.set(Some(value));
    }

    pub fn reset(&self) {
        self.0.set(None);
    }
}

impl<T: Copy> Default for Memo<T> {
    fn default() -> Self {
        Memo(Cell::new(None))
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(v) => write!(f, "{:?}", v),
            None => write!(f, "-"),
        }
    }
}

/// Memo slots for values derived from this chunk and its neighbours.
#[derive(Debug, Default)]
pub(crate) struct DerivedMemo {
    pub x_bridge: Memo<Option<PartId>>,
    pub z_bridge: Memo<Option<PartId>>,
    pub stair_direction: Memo<Option<Direction>>,
    pub actual_stair_direction: Memo<Option<Direction>>,
    pub is_ocean: Memo<bool>,
    pub horizontal_monorail: Memo<bool>,
    pub vertical_monorail: Memo<bool>,
    pub x_corridor: Memo<bool>,
    pub z_corridor: Memo<bool>,
    pub blend_l1: Memo<Option<BlendBounds>>,
    pub blend_l2: Memo<Option<BlendBounds>>,
}

impl DerivedMemo {
    pub fn bridge(&self, orientation: Orientation) -> &Memo<Option<PartId>> {
        match orientation {
            Orientation::X => &self.x_bridge,
            Orientation::Z => &self.z_bridge,
        }
    }

    pub fn corridor(&self, orientation: Orientation) -> &Memo<bool> {
        match orientation {
            Orientation::X => &self.x_corridor,
            Orientation::Z => &self.z_corridor,
        }
    }
}

/// Full structural description of one chunk.
#[derive(Debug)]
pub struct ChunkDescriptor {
    pub coord: ChunkCoord,
    /// Profile in effect for this chunk
    pub profile: Rc<Profile>,
    /// Outside every city sphere of a space world
    pub outside_chunk: bool,
    pub ground_level: i32,
    pub water_level: i32,

    pub is_city: bool,
    pub has_building: bool,
    pub section: Option<Section>,
    pub city_level: i32,
    pub city_style: CityStyleId,
    pub building: BuildingId,
    pub multi_building: Option<MultiBuildingId>,

    pub highway_x_level: i32,
    pub highway_z_level: i32,
    pub street_type: StreetType,
    pub fountain: Option<PartId>,
    pub park: Option<PartId>,
    /// Floors above ground, not counting the ground floor
    pub floors: i32,
    pub cellars: i32,
    pub door: DoorMaterial,
    pub bridge_part: Option<PartId>,
    pub stair_part: Option<PartId>,
    pub stair_priority: f32,
    pub palette: PaletteId,
    pub no_loot: bool,
    /// Fraction of the building height where the ruin layer sits
    pub ruin_height: Option<f32>,

    /// Primary part per floor, lowest cellar first
    pub floor_parts: Vec<PartId>,
    pub floor_parts2: Vec<Option<PartId>>,
    /// Doorway toward -x per floor
    pub connection_x: Vec<bool>,
    /// Doorway toward -z per floor
    pub connection_z: Vec<bool>,

    pub x_corridor_candidate: bool,
    pub z_corridor_candidate: bool,
    pub x_bridge_candidate: bool,
    pub z_bridge_candidate: bool,

    pub rail_dungeon: Option<PartId>,
    pub front: Option<PartId>,

    pub(crate) memo: DerivedMemo,
}

impl ChunkDescriptor {
    /// Building type, only when a building actually stands here.
    pub fn building_type(&self) -> Option<BuildingId> {
        self.has_building.then_some(self.building)
    }

    pub fn bridge_candidate(&self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::X => self.x_bridge_candidate,
            Orientation::Z => self.z_bridge_candidate,
        }
    }

    pub fn corridor_candidate(&self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::X => self.x_corridor_candidate,
            Orientation::Z => self.z_corridor_candidate,
        }
    }

    pub fn max_highway_level(&self) -> i32 {
        self.highway_x_level.max(self.highway_z_level)
    }

    pub fn city_ground_level(&self) -> i32 {
        self.ground_level + self.city_level * FLOOR_HEIGHT
    }

    /// City ground level, one block lower outside cities.
    pub fn city_ground_level_outside_lower(&self) -> i32 {
        if self.is_city {
            self.city_ground_level()
        } else {
            self.city_ground_level() - 1
        }
    }

    /// Highest block the city occupies in this chunk.
    pub fn max_height(&self) -> i32 {
        if self.has_building {
            self.city_ground_level() + self.floors * FLOOR_HEIGHT
        } else if self.max_highway_level() >= 0 {
            self.ground_level + self.max_highway_level() * FLOOR_HEIGHT
        } else {
            self.city_ground_level()
        }
    }

    /// Height of the ruin layer, if this building is ruined.
    pub fn ruin_level(&self) -> Option<i32> {
        if self.profile.ruin_chance <= 0.0 {
            return None;
        }
        self.ruin_height
            .map(|h| (self.city_ground_level() as f32 + 1.0 + h * self.floors as f32 * FLOOR_HEIGHT as f32) as i32)
    }

    /// Local building level to global city level.
    pub fn local_to_global(&self, level: i32) -> i32 {
        level + self.city_level
    }

    pub fn global_to_local(&self, level: i32) -> i32 {
        level - self.city_level
    }

    /// Whether `floor` (0 = ground, negative = cellar) exists in this building.
    pub fn is_valid_floor(&self, floor: i32) -> bool {
        let index = floor + self.cellars;
        index >= 0 && (index as usize) < self.floor_parts.len()
    }

    pub fn floor_part(&self, floor: i32) -> Option<PartId> {
        if self.is_valid_floor(floor) {
            Some(self.floor_parts[(floor + self.cellars) as usize])
        } else {
            None
        }
    }

    pub fn floor_part2(&self, floor: i32) -> Option<PartId> {
        if self.is_valid_floor(floor) {
            self.floor_parts2[(floor + self.cellars) as usize]
        } else {
            None
        }
    }

    pub fn is_street_section(&self) -> bool {
        self.is_city && !self.has_building
    }

    /// Whether rails can pass under this chunk.
    pub fn can_rail_go_through(&self) -> bool {
        if !self.is_city {
            return false;
        }
        !self.has_building || self.cellars == 0
    }

    /// Whether a water corridor can pass under this chunk.
    pub fn can_water_corridor_go_through(&self) -> bool {
        if !self.is_city {
            return false;
        }
        !self.has_building || self.cellars <= 1
    }

    /// Which of the four 8x8 quarters holds a block at local (x, z): the
    /// chunk itself or one of the chunks to its -x, -z and -x-z.
    pub fn todo_offset(x: i32, z: i32) -> (i32, i32) {
        match (x >= 8, z >= 8) {
            (true, true) => (0, 0),
            (false, true) => (-1, 0),
            (true, false) => (0, -1),
            (false, false) => (-1, -1),
        }
    }
}

fn max_floors(profile: &Profile, building: &Building, style: &CityStyle) -> i32 {
    let mut max = profile.building_max_floors;
    if let Some(m) = building.max_floors {
        max = max.min(m);
    }
    if let Some(m) = style.max_floor_count {
        max = max.min(m);
    }
    max
}

fn min_floors(profile: &Profile, building: &Building, style: &CityStyle) -> i32 {
    // +1 because the top floor does not count
    let mut min = profile.building_min_floors + 1;
    if let Some(m) = building.min_floors {
        min = min.max(m);
    }
    if let Some(m) = style.min_floor_count {
        min = min.max(m);
    }
    min
}

fn max_cellars(profile: &Profile, city_level: i32, building: &Building, style: &CityStyle) -> i32 {
    let mut max = profile.building_max_cellars + city_level;
    if let Some(m) = building.max_cellars {
        max = max.min(m);
    }
    if let Some(m) = building.min_cellars {
        max = max.max(m);
    }
    if let Some(m) = style.max_cellar_count {
        max = max.min(m);
    }
    if let Some(m) = style.min_cellar_count {
        max = max.max(m);
    }
    max
}

/// Everything the shared-layout draws need to know about the chunk.
struct LayoutInput<'a> {
    ctx: &'a DimensionContext,
    coord: ChunkCoord,
    profile: &'a Profile,
    is_city: bool,
    city_level: i32,
    section: Option<Section>,
    building: &'a Building,
    style: &'a CityStyle,
}

/// Draw the layout an anchor or single chunk decides for itself.
fn draw_layout(input: &LayoutInput<'_>, rng: &mut ChaCha8Rng) -> Result<SharedLayout> {
    let LayoutInput {
        ctx,
        coord,
        profile,
        is_city,
        city_level,
        section,
        building,
        style,
    } = *input;
    let assets: &AssetRegistry = &ctx.assets;
    let prevent_ruins = ctx
        .predefined
        .building_at(coord)
        .map(|p| p.prevent_ruins)
        .unwrap_or(false);
    let highway_x_level = ctx.transit.highway_x_level(coord, profile);
    let highway_z_level = ctx.transit.highway_z_level(coord, profile);

    let street_type = if rng.gen::<f64>() < profile.park_chance {
        StreetType::ALL[next_int(rng, StreetType::ALL.len() as i32) as usize]
    } else {
        StreetType::Normal
    };
    let fountain = if rng.gen::<f32>() < profile.fountain_chance {
        style.random_fountain(rng)
    } else {
        None
    };
    let park = style.random_park(rng);

    let city_factor = ctx.city.city_factor(coord, profile);
    let max_f = max_floors(profile, building, style);
    let spread = profile.building_min_floors_chance
        + (city_factor + 0.1) * (profile.building_max_floors_chance - profile.building_min_floors_chance);
    let mut floors = profile.building_min_floors + next_int(rng, spread as i32) + 1;
    if floors > max_f + 1 {
        floors = max_f + 1;
    }
    let min_f = min_floors(profile, building, style);
    if floors < min_f {
        floors = min_f;
    }
    if ctx.profile.is_space() && ctx.spheres.intersects(coord) {
        let dist = ctx.spheres.relative_distance_to_center(coord);
        if dist > 0.6 {
            floors = min_f.max(floors - 2);
        } else if dist > 0.5 {
            floors = min_f.max(floors - 1);
        }
    }

    let max_c = max_cellars(profile, city_level, building, style);
    let mut cellars = profile.building_min_cellars + if max_c <= 0 { 0 } else { next_int(rng, max_c + 1) };
    let max_highway = highway_x_level.max(highway_z_level);
    if max_highway >= 0 {
        // Cellars must stay above the highway
        cellars = cellars.min(city_level - max_highway - 1).max(0);
    }

    let door = DoorMaterial::from_roll(next_int(rng, 7));
    let bridge_part = style.random_bridge(rng);
    let stair_part = style.random_stair(rng);
    let stair_priority: f32 = rng.gen();
    let palette_style = if is_city {
        style.style
    } else {
        ctx.world_style().outside_style
    };
    let palette = assets.style(palette_style).random_palette(rng)?;

    let loot_roll: f32 = rng.gen();
    let no_loot = section.is_none() && loot_roll < profile.building_without_loot_chance;
    let ruin_roll: f32 = rng.gen();
    let ruin_height = if rng.gen::<f32>() < profile.ruin_chance && !prevent_ruins {
        Some(profile.ruin_min_level_percent + (profile.ruin_max_level_percent - profile.ruin_min_level_percent) * ruin_roll)
    } else {
        None
    };

    Ok(SharedLayout {
        highway_x_level,
        highway_z_level,
        street_type,
        fountain,
        park,
        floors,
        cellars,
        door,
        bridge_part,
        stair_part,
        stair_priority,
        palette,
        no_loot,
        ruin_height,
    })
}

/// Build the descriptor of a chunk. May request characteristics of the four
/// neighbours and the descriptor of a 2x2 anchor.
pub(crate) fn build(resolver: &CityResolver, coord: ChunkCoord) -> Result<ChunkDescriptor> {
    let ctx = resolver.context();
    let assets = &ctx.assets;
    let profile = Rc::clone(ctx.profile_for(coord));
    let outside_chunk = ctx.is_outside_chunk(coord);
    let ch = resolver.characteristics(coord)?;

    let mut rng = building_rng(ctx.seed, coord.x, coord.z);
    let _compat: f32 = rng.gen();

    let mut has_building = ch.could_have_building;
    if has_building && ch.section.is_none() {
        for direction in Direction::ALL {
            let neighbor = resolver.characteristics(coord.step(direction))?;
            let lonely = assets.building(neighbor.building).prefers_lonely;
            if rng.gen::<f32>() < lonely {
                has_building = false;
                break;
            }
        }
    }

    let level_profile: &Profile = if outside_chunk && ctx.profile.citysphere_landscape_outside {
        ctx.outside_profile().as_ref()
    } else {
        ctx.profile.as_ref()
    };
    let ground_level = level_profile.ground_level;
    let water_level = ctx.water_level(level_profile);

    let style = assets.city_style(ch.city_style);
    let building = assets.building(ch.building);

    let layout = match ch.section {
        Some(section) if !section.is_anchor() => {
            let anchor = resolver.descriptor(section.anchor_of(coord))?;
            SharedLayout::from_anchor(&anchor)
        }
        _ => draw_layout(
            &LayoutInput {
                ctx,
                coord,
                profile: &profile,
                is_city: ch.is_city,
                city_level: ch.city_level,
                section: ch.section,
                building,
                style,
            },
            &mut rng,
        )?,
    };

    let (bx, bz) = coord.block_center();
    let in_sphere = ctx.spheres.is_in_sphere(coord, bx, bz);
    let west_is_city = resolver.is_city(coord.offset(-1, 0))?;
    let north_is_city = resolver.is_city(coord.offset(0, -1))?;
    let slots = (layout.floors + layout.cellars + 1) as usize;
    let mut floor_parts = Vec::with_capacity(slots);
    let mut floor_parts2 = Vec::with_capacity(slots);
    let mut connection_x = Vec::with_capacity(slots);
    let mut connection_z = Vec::with_capacity(slots);
    for i in 0..slots as i32 {
        let floor = i - layout.cellars;
        let condition = ConditionContext {
            level: ch.city_level + floor,
            floor,
            floors_below_ground: layout.cellars,
            floors_above_ground: layout.floors,
            building: &building.name,
            chunk: coord,
            in_sphere,
        };
        let part = building
            .random_part(&mut rng, &condition)
            .ok_or_else(|| ResolveError::MissingPart {
                building: building.name.clone(),
                floor,
            })?;
        floor_parts.push(part);
        floor_parts2.push(building.random_part2(&mut rng, &condition));
        connection_x.push(west_is_city && rng.gen::<f32>() < profile.building_doorway_chance);
        connection_z.push(north_is_city && rng.gen::<f32>() < profile.building_doorway_chance);
    }

    let (x_corridor_candidate, z_corridor_candidate) = if has_building && layout.cellars > 0 {
        (false, false)
    } else {
        let x = rng.gen::<f32>() < profile.corridor_chance;
        let z = rng.gen::<f32>() < profile.corridor_chance;
        (x, z)
    };

    let (x_bridge_candidate, z_bridge_candidate) = if ch.is_city {
        (false, false)
    } else {
        let x = rng.gen::<f32>() < profile.bridge_chance;
        let z = rng.gen::<f32>() < profile.bridge_chance;
        (x, z)
    };

    let rail_dungeon = if rng.gen::<f32>() < profile.railway_dungeon_chance {
        if !has_building || RAILWAY_LEVEL_OFFSET < ch.city_level - layout.cellars {
            style.random_rail_dungeon(&mut rng)
        } else {
            None
        }
    } else {
        None
    };

    let front = if rng.gen::<f32>() < profile.building_front_chance {
        style.random_front(&mut rng)
    } else {
        None
    };

    log::trace!(
        "descriptor {}: building={} floors={} cellars={} street={:?}",
        coord,
        has_building,
        layout.floors,
        layout.cellars,
        layout.street_type
    );

    Ok(ChunkDescriptor {
        coord,
        profile,
        outside_chunk,
        ground_level,
        water_level,
        is_city: ch.is_city,
        has_building,
        section: ch.section,
        city_level: ch.city_level,
        city_style: ch.city_style,
        building: ch.building,
        multi_building: ch.multi_building,
        highway_x_level: layout.highway_x_level,
        highway_z_level: layout.highway_z_level,
        street_type: layout.street_type,
        fountain: layout.fountain,
        park: layout.park,
        floors: layout.floors,
        cellars: layout.cellars,
        door: layout.door,
        bridge_part: layout.bridge_part,
        stair_part: layout.stair_part,
        stair_priority: layout.stair_priority,
        palette: layout.palette,
        no_loot: layout.no_loot,
        ruin_height: layout.ruin_height,
        floor_parts,
        floor_parts2,
        connection_x,
        connection_z,
        x_corridor_candidate,
        z_corridor_candidate,
        x_bridge_candidate,
        z_bridge_candidate,
        rail_dungeon,
        front,
        memo: DerivedMemo::default(),
    })
}

#[cfg(test)]
mod tests {
    use crate::city::testkit::{TableSpheres, TestWorld};
    use crate::city::CityResolver;

    fn tall_city(seed: u64) -> TestWorld {
        TestWorld::new(seed)
            .city_everywhere(0.9)
            .tune(|p| p.building_chance = 1.0)
    }

    fn floors(resolver: &CityResolver, x: i32, z: i32) -> i32 {
        let d = resolver.descriptor(resolver.context().coord(x, z)).unwrap();
        assert!(d.has_building);
        d.floors
    }

    #[test]
    fn test_sphere_rim_lowers_buildings() {
        let flat = tall_city(23).build();
        let spheres = TableSpheres::new(0.65).distance_at(0, 1, 0.55).distance_at(1, 1, 0.2);
        let space = tall_city(23).space(spheres).build();

        let mut lowered = 0;
        for x in 0..12 {
            let expected = (floors(&flat, x, 0) - 2).max(1);
            if expected < floors(&flat, x, 0) {
                lowered += 1;
            }
            assert_eq!(floors(&space, x, 0), expected);
        }
        assert!(lowered > 0);

        assert_eq!(floors(&space, 0, 1), (floors(&flat, 0, 1) - 1).max(1));
        assert_eq!(floors(&space, 1, 1), floors(&flat, 1, 1));
    }
}
