//! 2x2 multi-building footprints.
//!
//! A multi-building occupies a square of four chunks. The chunk with the
//! lowest x and z is the anchor (top-left); the other three copy the
//! anchor's shared layout so the building looks the same from every chunk.
//!
//! Footprint detection runs while characteristics are being built, so it
//! only uses raw predicates and never asks the cache for anything.

use serde::Serialize;

use crate::assets::{PaletteId, PartId};
use crate::coords::ChunkCoord;
use crate::profile::Profile;
use crate::seeds::building_rng;
use crate::world::DimensionContext;

use rand::Rng;

use super::characteristics::{has_highway, has_railway, is_city_raw};
use super::descriptor::{ChunkDescriptor, DoorMaterial, StreetType};

/// Position of a chunk inside a 2x2 building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Section {
    pub fn index(&self) -> i32 {
        match self {
            Section::TopLeft => 0,
            Section::TopRight => 1,
            Section::BottomLeft => 2,
            Section::BottomRight => 3,
        }
    }

    /// Offset from this chunk to the anchor chunk
    pub fn anchor_offset(&self) -> (i32, i32) {
        match self {
            Section::TopLeft => (0, 0),
            Section::TopRight => (-1, 0),
            Section::BottomLeft => (0, -1),
            Section::BottomRight => (-1, -1),
        }
    }

    /// Position (x, z) inside the footprint
    pub fn footprint_position(&self) -> (usize, usize) {
        match self {
            Section::TopLeft => (0, 0),
            Section::TopRight => (1, 0),
            Section::BottomLeft => (0, 1),
            Section::BottomRight => (1, 1),
        }
    }

    pub fn is_anchor(&self) -> bool {
        *self == Section::TopLeft
    }

    pub fn anchor_of(&self, coord: ChunkCoord) -> ChunkCoord {
        let (dx, dz) = self.anchor_offset();
        coord.offset(dx, dz)
    }
}

/// City chunk without highway or railway.
pub(crate) fn is_multi_building_candidate(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    is_city_raw(ctx, coord, profile) && !has_highway(ctx, coord, profile) && !has_railway(ctx, coord, profile)
}

/// Whether a chunk rolls to start a 2x2 building, before looking at neighbours.
pub(crate) fn is_candidate_for_top_left(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    if let Some(predefined) = ctx.predefined.building_at(coord) {
        if predefined.multi {
            return true;
        }
    }
    if ctx.predefined.street_at(coord) {
        return false;
    }
    if is_multi_building_candidate(ctx, coord, profile) {
        let mut rng = building_rng(ctx.seed, coord.x, coord.z);
        rng.gen::<f32>() < profile.building2x2_chance
    } else {
        false
    }
}

// The eight chunks around a 2x2 anchor that must not be candidates themselves
const ISOLATION_RING: [(i32, i32); 8] = [(-1, 0), (-1, -1), (0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1)];

/// Whether a chunk is the anchor of a 2x2 building.
pub(crate) fn is_top_left_of_2x2(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> bool {
    if let Some(predefined) = ctx.predefined.building_at(coord) {
        if predefined.multi {
            return true;
        }
    }
    if !is_candidate_for_top_left(ctx, coord, profile) {
        return false;
    }
    if ISOLATION_RING
        .iter()
        .any(|&(dx, dz)| is_candidate_for_top_left(ctx, coord.offset(dx, dz), profile))
    {
        return false;
    }
    if ctx.predefined.street_at(coord) {
        return false;
    }
    is_multi_building_candidate(ctx, coord.offset(1, 0), profile)
        && is_multi_building_candidate(ctx, coord.offset(1, 1), profile)
        && is_multi_building_candidate(ctx, coord.offset(0, 1), profile)
}

/// Section of a chunk, checking itself then the chunks to its -x, -z and -x-z.
pub(crate) fn multi_building_section(ctx: &DimensionContext, coord: ChunkCoord, profile: &Profile) -> Option<Section> {
    [Section::TopLeft, Section::TopRight, Section::BottomLeft, Section::BottomRight]
        .into_iter()
        .find(|section| is_top_left_of_2x2(ctx, section.anchor_of(coord), profile))
}

/// Layout a 2x2 building shares across its four chunks.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedLayout {
    pub highway_x_level: i32,
    pub highway_z_level: i32,
    pub street_type: StreetType,
    pub fountain: Option<PartId>,
    pub park: Option<PartId>,
    pub floors: i32,
    pub cellars: i32,
    pub door: DoorMaterial,
    pub bridge_part: Option<PartId>,
    pub stair_part: Option<PartId>,
    pub stair_priority: f32,
    pub palette: PaletteId,
    pub no_loot: bool,
    pub ruin_height: Option<f32>,
}

impl SharedLayout {
    /// Copy the shared layout of an anchor chunk.
    pub fn from_anchor(anchor: &ChunkDescriptor) -> Self {
        Self {
            highway_x_level: anchor.highway_x_level,
            highway_z_level: anchor.highway_z_level,
            street_type: anchor.street_type,
            fountain: anchor.fountain,
            park: anchor.park,
            floors: anchor.floors,
            cellars: anchor.cellars,
            door: anchor.door,
            bridge_part: anchor.bridge_part,
            stair_part: anchor.stair_part,
            stair_priority: anchor.stair_priority,
            palette: anchor.palette,
            no_loot: anchor.no_loot,
            ruin_height: anchor.ruin_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::testkit::TestWorld;
    use crate::coords::Direction;
    use crate::world::PredefinedBuilding;

    fn predefined_duo(world: TestWorld) -> TestWorld {
        world.predefined_building(PredefinedBuilding {
            x: 0,
            z: 0,
            building: "duo".to_string(),
            multi: true,
            prevent_ruins: false,
        })
    }

    #[test]
    fn test_section_offsets() {
        for s in [Section::TopLeft, Section::TopRight, Section::BottomLeft, Section::BottomRight] {
            let (dx, dz) = s.anchor_offset();
            let (px, pz) = s.footprint_position();
            assert_eq!((dx, dz), (-(px as i32), -(pz as i32)));
        }
        assert!(Section::TopLeft.is_anchor());
        assert_eq!(Section::BottomRight.index(), 3);
    }

    #[test]
    fn test_predefined_multi_sections() {
        let resolver = predefined_duo(TestWorld::new(3).city_everywhere(0.8)).build();
        let ctx = resolver.context();
        let expected = [
            ((0, 0), Section::TopLeft),
            ((1, 0), Section::TopRight),
            ((0, 1), Section::BottomLeft),
            ((1, 1), Section::BottomRight),
        ];
        for ((x, z), section) in expected {
            let c = ctx.coord(x, z);
            assert_eq!(multi_building_section(ctx, c, &ctx.profile), Some(section));
        }
        assert_eq!(multi_building_section(ctx, ctx.coord(-1, 0), &ctx.profile), None);
        assert_eq!(multi_building_section(ctx, ctx.coord(2, 2), &ctx.profile), None);
    }

    #[test]
    fn test_no_random_anchor_without_chance() {
        let resolver = TestWorld::new(8).city_everywhere(0.9).build();
        let ctx = resolver.context();
        for x in -5..5 {
            for z in -5..5 {
                assert!(!is_candidate_for_top_left(ctx, ctx.coord(x, z), &ctx.profile));
            }
        }
    }

    #[test]
    fn test_certain_chance_blocks_clustered_anchors() {
        // Every chunk is a candidate, so no chunk is isolated enough to anchor
        let resolver = TestWorld::new(8)
            .city_everywhere(0.9)
            .tune(|p| p.building2x2_chance = 1.0)
            .build();
        let ctx = resolver.context();
        assert!(is_candidate_for_top_left(ctx, ctx.coord(0, 0), &ctx.profile));
        assert!(!is_top_left_of_2x2(ctx, ctx.coord(0, 0), &ctx.profile));
    }

    #[test]
    fn test_non_anchor_sections_mirror_anchor() {
        let resolver = predefined_duo(TestWorld::new(17).city_everywhere(0.8).tune(|p| p.ruin_chance = 1.0)).build();
        let anchor = resolver.descriptor(resolver.context().coord(0, 0)).unwrap();
        let shared = SharedLayout::from_anchor(&anchor);
        assert!(anchor.has_building);
        for (x, z) in [(1, 0), (0, 1), (1, 1)] {
            let d = resolver.descriptor(resolver.context().coord(x, z)).unwrap();
            assert_eq!(SharedLayout::from_anchor(&d), shared);
            assert_eq!(d.multi_building, anchor.multi_building);
            assert!(d.has_building);
        }
        let assets = &resolver.context().assets;
        let names: Vec<String> = [(0, 0), (1, 0), (0, 1), (1, 1)]
            .iter()
            .map(|&(x, z)| {
                let d = resolver.descriptor(resolver.context().coord(x, z)).unwrap();
                assets.building(d.building).name.clone()
            })
            .collect();
        assert_eq!(names, vec!["duo_nw", "duo_ne", "duo_sw", "duo_se"]);
        // Walking around the footprint lands back on the anchor instance
        let tr = anchor.neighbor(Direction::XMax).unwrap();
        let br = tr.neighbor(Direction::ZMax).unwrap();
        let back = br.neighbor(Direction::XMin).unwrap().neighbor(Direction::ZMin).unwrap();
        assert!(back.same_chunk(&anchor));
    }
}
