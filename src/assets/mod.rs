//! Read-only asset registry.
//!
//! Loads building parts, buildings, multi-buildings, palettes, styles, city
//! styles and world styles from JSON. Defaults are embedded in the binary via
//! `include_str!`; an optional `assets.json` in a data directory can override
//! or extend them.
//!
//! Cross references are resolved once when the registry is built, so a
//! dangling name is reported at load time. Lookups by name that come from
//! outside the registry (city layouts, predefined buildings) fail with
//! [`ResolveError::MissingAsset`] at the point of lookup.

pub mod types;

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AssetKind, ResolveError, Result};

pub use types::{
    AssetFile, Building, BuildingId, BuildingPart, CityStyle, CityStyleId, ConditionContext,
    MultiBuilding, MultiBuildingId, Palette, PaletteId, PartCondition, PartId, PartSelector, Style,
    StyleId, WeightedName, WorldStyle, WorldStyleId,
};
use types::PartSelectorDef;

// Embedded default data file
const DEFAULT_ASSETS_JSON: &str = include_str!("../../data/defaults/assets.json");

/// Name of the world style used when none is configured
pub const DEFAULT_WORLD_STYLE: &str = "standard";

/// Name → index table for one asset kind.
#[derive(Clone, Debug)]
struct NameTable<T> {
    items: Vec<T>,
    index: HashMap<String, u32>,
}

impl<T> NameTable<T> {
    fn new() -> Self {
        Self { items: Vec::new(), index: HashMap::new() }
    }

    fn lookup(&self, kind: AssetKind, name: &str) -> Result<u32> {
        self.index.get(name).copied().ok_or_else(|| ResolveError::MissingAsset {
            kind,
            name: name.to_string(),
        })
    }
}

/// Reserve ids for every name in declaration order.
fn intern<'a, I: Iterator<Item = &'a str>>(kind: AssetKind, names: I) -> Result<HashMap<String, u32>> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name.to_string(), i as u32).is_some() {
            return Err(ResolveError::Invariant(format!("duplicate {} '{}'", kind.name(), name)));
        }
    }
    Ok(index)
}

fn resolve_name(index: &HashMap<String, u32>, kind: AssetKind, name: &str) -> Result<u32> {
    index.get(name).copied().ok_or_else(|| ResolveError::MissingAsset {
        kind,
        name: name.to_string(),
    })
}

fn resolve_weighted<T, F: Fn(u32) -> T>(
    index: &HashMap<String, u32>,
    kind: AssetKind,
    list: &[WeightedName],
    make: F,
) -> Result<Vec<(f32, T)>> {
    list.iter()
        .map(|w| Ok((w.factor, make(resolve_name(index, kind, &w.name)?))))
        .collect()
}

fn resolve_selectors(index: &HashMap<String, u32>, list: &[PartSelectorDef]) -> Result<Vec<PartSelector>> {
    list.iter()
        .map(|s| {
            Ok(PartSelector {
                factor: s.factor,
                part: PartId(resolve_name(index, AssetKind::Part, &s.part)?),
                condition: s.condition.clone(),
            })
        })
        .collect()
}

/// Read-only registry of all city assets, loaded once per configuration.
#[derive(Clone, Debug)]
pub struct AssetRegistry {
    parts: NameTable<BuildingPart>,
    buildings: NameTable<Building>,
    multi_buildings: NameTable<MultiBuilding>,
    palettes: NameTable<Palette>,
    styles: NameTable<Style>,
    city_styles: NameTable<CityStyle>,
    world_styles: NameTable<WorldStyle>,
}

impl AssetRegistry {
    /// Registry built from the embedded default assets.
    pub fn defaults() -> Self {
        let file: AssetFile = serde_json::from_str(DEFAULT_ASSETS_JSON)
            .expect("Failed to parse embedded assets.json");
        Self::compile(&file).expect("Embedded assets.json has dangling references")
    }

    /// Parse and compile a complete asset file.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: AssetFile = serde_json::from_str(json)?;
        Self::compile(&file)
    }

    /// Load a complete asset file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load the defaults merged with `assets.json` from `dir`, if present.
    ///
    /// Assets in the directory replace defaults with the same name. A file
    /// that fails to parse is skipped with a warning, but a merged set with
    /// dangling references is an error.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut file: AssetFile = serde_json::from_str(DEFAULT_ASSETS_JSON)?;
        let path = dir.join("assets.json");
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<AssetFile>(&contents) {
                Ok(overrides) => file.merge(&overrides),
                Err(e) => log::warn!("failed to parse {}: {}", path.display(), e),
            }
        }
        Self::compile(&file)
    }

    /// Resolve every cross reference and intern names into ids.
    pub fn compile(file: &AssetFile) -> Result<Self> {
        let part_index = intern(AssetKind::Part, file.parts.iter().map(|p| p.name.as_str()))?;
        let building_index = intern(AssetKind::Building, file.buildings.iter().map(|b| b.name.as_str()))?;
        let multi_index = intern(AssetKind::MultiBuilding, file.multibuildings.iter().map(|m| m.name.as_str()))?;
        let palette_index = intern(AssetKind::Palette, file.palettes.iter().map(|p| p.name.as_str()))?;
        let style_index = intern(AssetKind::Style, file.styles.iter().map(|s| s.name.as_str()))?;
        let city_style_index = intern(AssetKind::CityStyle, file.citystyles.iter().map(|c| c.name.as_str()))?;
        let world_style_index = intern(AssetKind::WorldStyle, file.worldstyles.iter().map(|w| w.name.as_str()))?;

        let parts = file
            .parts
            .iter()
            .map(|p| BuildingPart { name: p.name.clone(), dont_connect: p.dontconnect })
            .collect();

        let buildings = file
            .buildings
            .iter()
            .map(|b| {
                Ok(Building {
                    name: b.name.clone(),
                    min_floors: b.minfloors,
                    max_floors: b.maxfloors,
                    min_cellars: b.mincellars,
                    max_cellars: b.maxcellars,
                    prefers_lonely: b.prefer_lonely,
                    parts: resolve_selectors(&part_index, &b.parts)?,
                    parts2: resolve_selectors(&part_index, &b.parts2)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let multi_buildings = file
            .multibuildings
            .iter()
            .map(|m| {
                if m.buildings.len() != m.dimz || m.buildings.iter().any(|row| row.len() != m.dimx) {
                    return Err(ResolveError::Invariant(format!(
                        "multibuilding '{}' does not match its {}x{} dimensions",
                        m.name, m.dimx, m.dimz
                    )));
                }
                let rows = m
                    .buildings
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|name| Ok(BuildingId(resolve_name(&building_index, AssetKind::Building, name)?)))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(MultiBuilding { name: m.name.clone(), dim_x: m.dimx, dim_z: m.dimz, buildings: rows })
            })
            .collect::<Result<Vec<_>>>()?;

        let palettes = file
            .palettes
            .iter()
            .map(|p| Palette { name: p.name.clone(), entries: p.entries.clone() })
            .collect();

        let styles = file
            .styles
            .iter()
            .map(|s| {
                Ok(Style {
                    name: s.name.clone(),
                    palettes: resolve_weighted(&palette_index, AssetKind::Palette, &s.palettes, PaletteId)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let city_styles = file
            .citystyles
            .iter()
            .map(|c| {
                let parts = |list: &[WeightedName]| resolve_weighted(&part_index, AssetKind::Part, list, PartId);
                Ok(CityStyle {
                    name: c.name.clone(),
                    style: StyleId(resolve_name(&style_index, AssetKind::Style, &c.style)?),
                    buildings: resolve_weighted(&building_index, AssetKind::Building, &c.buildings, BuildingId)?,
                    multi_buildings: resolve_weighted(&multi_index, AssetKind::MultiBuilding, &c.multibuildings, MultiBuildingId)?,
                    fountains: parts(&c.fountains)?,
                    parks: parts(&c.parks)?,
                    bridges: parts(&c.bridges)?,
                    stairs: parts(&c.stairs)?,
                    rail_dungeons: parts(&c.raildungeons)?,
                    fronts: parts(&c.fronts)?,
                    min_floor_count: c.minfloors,
                    max_floor_count: c.maxfloors,
                    min_cellar_count: c.mincellars,
                    max_cellar_count: c.maxcellars,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let world_styles = file
            .worldstyles
            .iter()
            .map(|w| {
                Ok(WorldStyle {
                    name: w.name.clone(),
                    outside_style: StyleId(resolve_name(&style_index, AssetKind::Style, &w.outsidestyle)?),
                    city_styles: resolve_weighted(&city_style_index, AssetKind::CityStyle, &w.citystyles, CityStyleId)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parts: NameTable { items: parts, index: part_index },
            buildings: NameTable { items: buildings, index: building_index },
            multi_buildings: NameTable { items: multi_buildings, index: multi_index },
            palettes: NameTable { items: palettes, index: palette_index },
            styles: NameTable { items: styles, index: style_index },
            city_styles: NameTable { items: city_styles, index: city_style_index },
            world_styles: NameTable { items: world_styles, index: world_style_index },
        })
    }

    // Ids are only minted by this registry, so indexing cannot go out of range
    // for ids obtained from it.

    pub fn part(&self, id: PartId) -> &BuildingPart {
        &self.parts.items[id.index()]
    }

    pub fn building(&self, id: BuildingId) -> &Building {
        &self.buildings.items[id.index()]
    }

    pub fn multi_building(&self, id: MultiBuildingId) -> &MultiBuilding {
        &self.multi_buildings.items[id.index()]
    }

    pub fn palette(&self, id: PaletteId) -> &Palette {
        &self.palettes.items[id.index()]
    }

    pub fn style(&self, id: StyleId) -> &Style {
        &self.styles.items[id.index()]
    }

    pub fn city_style(&self, id: CityStyleId) -> &CityStyle {
        &self.city_styles.items[id.index()]
    }

    pub fn world_style(&self, id: WorldStyleId) -> &WorldStyle {
        &self.world_styles.items[id.index()]
    }

    pub fn part_id(&self, name: &str) -> Result<PartId> {
        self.parts.lookup(AssetKind::Part, name).map(PartId)
    }

    pub fn building_id(&self, name: &str) -> Result<BuildingId> {
        self.buildings.lookup(AssetKind::Building, name).map(BuildingId)
    }

    pub fn multi_building_id(&self, name: &str) -> Result<MultiBuildingId> {
        self.multi_buildings.lookup(AssetKind::MultiBuilding, name).map(MultiBuildingId)
    }

    pub fn city_style_id(&self, name: &str) -> Result<CityStyleId> {
        self.city_styles.lookup(AssetKind::CityStyle, name).map(CityStyleId)
    }

    pub fn world_style_id(&self, name: &str) -> Result<WorldStyleId> {
        self.world_styles.lookup(AssetKind::WorldStyle, name).map(WorldStyleId)
    }

    pub fn part_count(&self) -> usize {
        self.parts.items.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.items.len()
    }

    pub fn city_style_count(&self) -> usize {
        self.city_styles.items.len()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile() {
        let registry = AssetRegistry::defaults();
        assert!(registry.part_count() > 0);
        assert!(registry.building_count() > 0);
        let world = registry.world_style_id(DEFAULT_WORLD_STYLE).unwrap();
        assert!(!registry.world_style(world).city_styles.is_empty());
    }

    #[test]
    fn test_missing_name_is_reported() {
        let registry = AssetRegistry::defaults();
        let err = registry.building_id("no_such_building").unwrap_err();
        assert!(matches!(err, ResolveError::MissingAsset { kind: AssetKind::Building, .. }));
    }

    #[test]
    fn test_dangling_reference_fails_compile() {
        let json = r#"{
            "buildings": [ { "name": "b", "parts": [ { "factor": 1.0, "part": "ghost" } ] } ]
        }"#;
        let err = AssetRegistry::from_json_str(json).unwrap_err();
        assert!(matches!(err, ResolveError::MissingAsset { kind: AssetKind::Part, .. }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let json = r#"{ "parts": [ { "name": "p" }, { "name": "p" } ] }"#;
        assert!(matches!(AssetRegistry::from_json_str(json), Err(ResolveError::Invariant(_))));
    }

    #[test]
    fn test_multibuilding_dimensions_checked() {
        let json = r#"{
            "parts": [ { "name": "p" } ],
            "buildings": [ { "name": "b", "parts": [ { "factor": 1.0, "part": "p" } ] } ],
            "multibuildings": [ { "name": "m", "dimx": 2, "dimz": 2, "buildings": [ ["b", "b"] ] } ]
        }"#;
        assert!(matches!(AssetRegistry::from_json_str(json), Err(ResolveError::Invariant(_))));
    }

    #[test]
    fn test_every_default_building_has_a_ground_floor_part() {
        use crate::coords::{ChunkCoord, DimensionId};
        let registry = AssetRegistry::defaults();
        for i in 0..registry.building_count() {
            let building = registry.building(BuildingId(i as u32));
            for floor in -3..=6 {
                let ctx = ConditionContext {
                    level: floor,
                    floor,
                    floors_below_ground: 3,
                    floors_above_ground: 6,
                    building: &building.name,
                    chunk: ChunkCoord::new(DimensionId(0), 0, 0),
                    in_sphere: false,
                };
                assert!(
                    building.parts.iter().any(|s| s.condition.matches(&ctx)),
                    "building {} has no part for floor {}",
                    building.name,
                    floor
                );
            }
        }
    }
}
