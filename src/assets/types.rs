//! Asset definitions: the JSON file format and the compiled, id-linked form.
//!
//! Definitions refer to each other by name. Compilation in the registry turns
//! every name into an interned id so the resolution algorithms never deal with
//! strings.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::coords::ChunkCoord;
use crate::error::{ResolveError, Result};
use crate::seeds::pick_weighted;

macro_rules! asset_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

asset_id!(
    /// Interned handle of a building part
    PartId
);
asset_id!(
    /// Interned handle of a building
    BuildingId
);
asset_id!(
    /// Interned handle of a 2x2 multi-building layout
    MultiBuildingId
);
asset_id!(
    /// Interned handle of a palette
    PaletteId
);
asset_id!(
    /// Interned handle of a style (palette set)
    StyleId
);
asset_id!(
    /// Interned handle of a city style
    CityStyleId
);
asset_id!(
    /// Interned handle of a world style
    WorldStyleId
);

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// A named entry with a relative weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedName {
    pub factor: f32,
    pub name: String,
}

/// Conditions restricting where a part may be used inside a building.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartCondition {
    /// Only on (or never on) the top floor
    pub top: Option<bool>,
    /// Only on (or never on) the ground floor
    pub ground: Option<bool>,
    /// Only below (or never below) ground
    pub cellar: Option<bool>,
    /// Exact floor number (0 = ground)
    pub floor: Option<i32>,
    /// Inclusive floor range
    pub range: Option<[i32; 2]>,
    /// Inclusive global city level range
    pub level: Option<[i32; 2]>,
    /// Only inside (or outside) a city sphere
    pub sphere: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartSelectorDef {
    pub factor: f32,
    pub part: String,
    #[serde(flatten)]
    pub condition: PartCondition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartDef {
    pub name: String,
    #[serde(default)]
    pub dontconnect: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    #[serde(default)]
    pub minfloors: Option<i32>,
    #[serde(default)]
    pub maxfloors: Option<i32>,
    #[serde(default)]
    pub mincellars: Option<i32>,
    #[serde(default)]
    pub maxcellars: Option<i32>,
    #[serde(default)]
    pub prefer_lonely: f32,
    pub parts: Vec<PartSelectorDef>,
    #[serde(default)]
    pub parts2: Vec<PartSelectorDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiBuildingDef {
    pub name: String,
    pub dimx: usize,
    pub dimz: usize,
    /// Building names, row-major by z then x
    pub buildings: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteDef {
    pub name: String,
    #[serde(default)]
    pub entries: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleDef {
    pub name: String,
    pub palettes: Vec<WeightedName>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityStyleDef {
    pub name: String,
    pub style: String,
    #[serde(default)]
    pub buildings: Vec<WeightedName>,
    #[serde(default)]
    pub multibuildings: Vec<WeightedName>,
    #[serde(default)]
    pub fountains: Vec<WeightedName>,
    #[serde(default)]
    pub parks: Vec<WeightedName>,
    #[serde(default)]
    pub bridges: Vec<WeightedName>,
    #[serde(default)]
    pub stairs: Vec<WeightedName>,
    #[serde(default)]
    pub raildungeons: Vec<WeightedName>,
    #[serde(default)]
    pub fronts: Vec<WeightedName>,
    #[serde(default)]
    pub minfloors: Option<i32>,
    #[serde(default)]
    pub maxfloors: Option<i32>,
    #[serde(default)]
    pub mincellars: Option<i32>,
    #[serde(default)]
    pub maxcellars: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldStyleDef {
    pub name: String,
    pub outsidestyle: String,
    pub citystyles: Vec<WeightedName>,
}

/// Top-level layout of an asset file. Every section is optional so override
/// files can carry only what they change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetFile {
    pub parts: Vec<PartDef>,
    pub buildings: Vec<BuildingDef>,
    pub multibuildings: Vec<MultiBuildingDef>,
    pub palettes: Vec<PaletteDef>,
    pub styles: Vec<StyleDef>,
    pub citystyles: Vec<CityStyleDef>,
    pub worldstyles: Vec<WorldStyleDef>,
}

fn merge_named<T: Clone, F: Fn(&T) -> &str>(base: &mut Vec<T>, other: &[T], name: F) {
    for item in other {
        match base.iter().position(|b| name(b) == name(item)) {
            Some(i) => base[i] = item.clone(),
            None => base.push(item.clone()),
        }
    }
}

impl AssetFile {
    /// Merge another file into this one. Assets with the same name are replaced.
    pub fn merge(&mut self, other: &AssetFile) {
        merge_named(&mut self.parts, &other.parts, |a| &a.name);
        merge_named(&mut self.buildings, &other.buildings, |a| &a.name);
        merge_named(&mut self.multibuildings, &other.multibuildings, |a| &a.name);
        merge_named(&mut self.palettes, &other.palettes, |a| &a.name);
        merge_named(&mut self.styles, &other.styles, |a| &a.name);
        merge_named(&mut self.citystyles, &other.citystyles, |a| &a.name);
        merge_named(&mut self.worldstyles, &other.worldstyles, |a| &a.name);
    }
}

// ---------------------------------------------------------------------------
// Compiled assets
// ---------------------------------------------------------------------------

/// Everything a part selector needs to know about the floor being filled.
#[derive(Clone, Debug)]
pub struct ConditionContext<'a> {
    /// Global city level of the floor
    pub level: i32,
    /// Floor relative to the ground floor (negative for cellars)
    pub floor: i32,
    pub floors_below_ground: i32,
    pub floors_above_ground: i32,
    pub building: &'a str,
    pub chunk: ChunkCoord,
    pub in_sphere: bool,
}

impl PartCondition {
    pub fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
        if let Some(top) = self.top {
            if (ctx.floor >= ctx.floors_above_ground) != top {
                return false;
            }
        }
        if let Some(ground) = self.ground {
            if (ctx.floor == 0) != ground {
                return false;
            }
        }
        if let Some(cellar) = self.cellar {
            if (ctx.floor < 0) != cellar {
                return false;
            }
        }
        if let Some(floor) = self.floor {
            if ctx.floor != floor {
                return false;
            }
        }
        if let Some([lo, hi]) = self.range {
            if ctx.floor < lo || ctx.floor > hi {
                return false;
            }
        }
        if let Some([lo, hi]) = self.level {
            if ctx.level < lo || ctx.level > hi {
                return false;
            }
        }
        if let Some(sphere) = self.sphere {
            if ctx.in_sphere != sphere {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingPart {
    pub name: String,
    /// Doorways must never be cut into this part
    pub dont_connect: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartSelector {
    pub factor: f32,
    pub part: PartId,
    pub condition: PartCondition,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    pub name: String,
    pub min_floors: Option<i32>,
    pub max_floors: Option<i32>,
    pub min_cellars: Option<i32>,
    pub max_cellars: Option<i32>,
    /// Chance this building suppresses buildings next to it
    pub prefers_lonely: f32,
    pub parts: Vec<PartSelector>,
    pub parts2: Vec<PartSelector>,
}

fn pick_part<R: Rng>(rng: &mut R, selectors: &[PartSelector], ctx: &ConditionContext<'_>) -> Option<PartId> {
    let candidates: Vec<(f32, PartId)> = selectors
        .iter()
        .filter(|s| s.condition.matches(ctx))
        .map(|s| (s.factor, s.part))
        .collect();
    pick_weighted(rng, &candidates).copied()
}

impl Building {
    /// Primary part for a floor, `None` when no selector matches.
    pub fn random_part<R: Rng>(&self, rng: &mut R, ctx: &ConditionContext<'_>) -> Option<PartId> {
        pick_part(rng, &self.parts, ctx)
    }

    /// Secondary part for a floor. Optional by nature.
    pub fn random_part2<R: Rng>(&self, rng: &mut R, ctx: &ConditionContext<'_>) -> Option<PartId> {
        pick_part(rng, &self.parts2, ctx)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiBuilding {
    pub name: String,
    pub dim_x: usize,
    pub dim_z: usize,
    pub(crate) buildings: Vec<Vec<BuildingId>>,
}

impl MultiBuilding {
    /// Sub-building at (x, z) inside the footprint.
    pub fn building_at(&self, x: usize, z: usize) -> Result<BuildingId> {
        self.buildings
            .get(z)
            .and_then(|row| row.get(x))
            .copied()
            .ok_or_else(|| {
                ResolveError::Invariant(format!(
                    "multibuilding '{}' has no sub-building at ({}, {})",
                    self.name, x, z
                ))
            })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: String,
    pub entries: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub name: String,
    pub palettes: Vec<(f32, PaletteId)>,
}

impl Style {
    pub fn random_palette<R: Rng>(&self, rng: &mut R) -> Result<PaletteId> {
        pick_weighted(rng, &self.palettes).copied().ok_or_else(|| ResolveError::EmptySelection {
            owner: self.name.clone(),
            list: "palettes",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CityStyle {
    pub name: String,
    pub style: StyleId,
    pub buildings: Vec<(f32, BuildingId)>,
    pub multi_buildings: Vec<(f32, MultiBuildingId)>,
    pub fountains: Vec<(f32, PartId)>,
    pub parks: Vec<(f32, PartId)>,
    pub bridges: Vec<(f32, PartId)>,
    pub stairs: Vec<(f32, PartId)>,
    pub rail_dungeons: Vec<(f32, PartId)>,
    pub fronts: Vec<(f32, PartId)>,
    pub min_floor_count: Option<i32>,
    pub max_floor_count: Option<i32>,
    pub min_cellar_count: Option<i32>,
    pub max_cellar_count: Option<i32>,
}

impl CityStyle {
    pub fn random_building<R: Rng>(&self, rng: &mut R) -> Result<BuildingId> {
        pick_weighted(rng, &self.buildings).copied().ok_or_else(|| ResolveError::EmptySelection {
            owner: self.name.clone(),
            list: "buildings",
        })
    }

    pub fn random_multi_building<R: Rng>(&self, rng: &mut R) -> Result<MultiBuildingId> {
        pick_weighted(rng, &self.multi_buildings).copied().ok_or_else(|| ResolveError::EmptySelection {
            owner: self.name.clone(),
            list: "multibuildings",
        })
    }

    pub fn random_fountain<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.fountains).copied()
    }

    pub fn random_park<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.parks).copied()
    }

    pub fn random_bridge<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.bridges).copied()
    }

    pub fn random_stair<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.stairs).copied()
    }

    pub fn random_rail_dungeon<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.rail_dungeons).copied()
    }

    pub fn random_front<R: Rng>(&self, rng: &mut R) -> Option<PartId> {
        pick_weighted(rng, &self.fronts).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldStyle {
    pub name: String,
    pub outside_style: StyleId,
    pub city_styles: Vec<(f32, CityStyleId)>,
}

impl WorldStyle {
    pub fn random_city_style<R: Rng>(&self, rng: &mut R) -> Result<CityStyleId> {
        pick_weighted(rng, &self.city_styles).copied().ok_or_else(|| ResolveError::EmptySelection {
            owner: self.name.clone(),
            list: "citystyles",
        })
    }
}
