//! Table-driven worlds for resolver tests.
//!
//! Terrain heights and city factors come from per-chunk tables with a
//! default, so a test states exactly which chunks are city, how high they
//! are and which style they use.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::assets::{AssetRegistry, CityStyleId, WorldStyleId};
use crate::coords::{ChunkCoord, DimensionId};
use crate::error::Result;
use crate::profile::{LandscapeType, Profile};
use crate::world::{
    CityLayout, DamageSource, DimensionContext, NoSpheres, NoTransit, PredefinedBuilding, PredefinedCity,
    SphereLayout, TerrainSource, TransitLayout,
};

use super::CityResolver;

pub(crate) const TEST_ASSETS: &str = r#"{
  "parts": [
    { "name": "plain" },
    { "name": "upper" },
    { "name": "closed", "dontconnect": true },
    { "name": "never" },
    { "name": "fountain_a" },
    { "name": "park_a" },
    { "name": "bridge_a" },
    { "name": "bridge_b" },
    { "name": "stair_a" },
    { "name": "dungeon_a" },
    { "name": "front_a" }
  ],
  "buildings": [
    {
      "name": "block",
      "parts": [ { "factor": 1.0, "part": "plain" } ],
      "parts2": [ { "factor": 1.0, "part": "upper", "range": [1, 100] } ]
    },
    { "name": "closed", "parts": [ { "factor": 1.0, "part": "closed" } ] },
    { "name": "lonely", "prefer_lonely": 1.0, "parts": [ { "factor": 1.0, "part": "plain" } ] },
    { "name": "broken", "parts": [ { "factor": 1.0, "part": "never", "floor": 999 } ] },
    { "name": "duo_nw", "parts": [ { "factor": 1.0, "part": "plain" } ] },
    { "name": "duo_ne", "parts": [ { "factor": 1.0, "part": "plain" } ] },
    { "name": "duo_sw", "parts": [ { "factor": 1.0, "part": "plain" } ] },
    { "name": "duo_se", "parts": [ { "factor": 1.0, "part": "plain" } ] }
  ],
  "multibuildings": [
    { "name": "duo", "dimx": 2, "dimz": 2, "buildings": [ ["duo_nw", "duo_ne"], ["duo_sw", "duo_se"] ] }
  ],
  "palettes": [
    { "name": "pal_alpha", "entries": { "wall": "stone" } },
    { "name": "pal_beta", "entries": { "wall": "brick" } },
    { "name": "pal_outside", "entries": { "wall": "dirt" } }
  ],
  "styles": [
    { "name": "st_alpha", "palettes": [ { "factor": 1.0, "name": "pal_alpha" } ] },
    { "name": "st_beta", "palettes": [ { "factor": 1.0, "name": "pal_beta" } ] },
    { "name": "st_outside", "palettes": [ { "factor": 1.0, "name": "pal_outside" } ] }
  ],
  "citystyles": [
    {
      "name": "alpha",
      "style": "st_alpha",
      "buildings": [ { "factor": 1.0, "name": "block" } ],
      "multibuildings": [ { "factor": 1.0, "name": "duo" } ],
      "fountains": [ { "factor": 1.0, "name": "fountain_a" } ],
      "parks": [ { "factor": 1.0, "name": "park_a" } ],
      "bridges": [ { "factor": 1.0, "name": "bridge_a" } ],
      "stairs": [ { "factor": 1.0, "name": "stair_a" } ],
      "raildungeons": [ { "factor": 1.0, "name": "dungeon_a" } ],
      "fronts": [ { "factor": 1.0, "name": "front_a" } ]
    },
    {
      "name": "beta",
      "style": "st_beta",
      "buildings": [ { "factor": 1.0, "name": "block" } ],
      "multibuildings": [ { "factor": 1.0, "name": "duo" } ],
      "bridges": [ { "factor": 1.0, "name": "bridge_b" } ],
      "stairs": [ { "factor": 1.0, "name": "stair_a" } ],
      "fronts": [ { "factor": 1.0, "name": "front_a" } ]
    },
    {
      "name": "closed",
      "style": "st_alpha",
      "buildings": [ { "factor": 1.0, "name": "closed" } ],
      "fronts": [ { "factor": 1.0, "name": "front_a" } ]
    },
    { "name": "lonely", "style": "st_alpha", "buildings": [ { "factor": 1.0, "name": "lonely" } ] },
    { "name": "broken", "style": "st_alpha", "buildings": [ { "factor": 1.0, "name": "broken" } ] }
  ],
  "worldstyles": [
    { "name": "test", "outsidestyle": "st_outside", "citystyles": [ { "factor": 1.0, "name": "alpha" } ] }
  ]
}"#;

pub(crate) fn test_assets() -> AssetRegistry {
    AssetRegistry::from_json_str(TEST_ASSETS).expect("test assets are valid")
}

/// Flat terrain per chunk, with a default height everywhere else.
#[derive(Clone, Debug)]
pub(crate) struct TableTerrain {
    pub default_height: i32,
    pub heights: HashMap<(i32, i32), i32>,
    pub water: HashSet<(i32, i32)>,
    pub ocean: HashSet<(i32, i32)>,
}

impl Default for TableTerrain {
    fn default() -> Self {
        Self {
            default_height: 64,
            heights: HashMap::new(),
            water: HashSet::new(),
            ocean: HashSet::new(),
        }
    }
}

impl TerrainSource for TableTerrain {
    fn height_at(&self, chunk: ChunkCoord, _local_x: i32, _local_z: i32) -> i32 {
        self.heights
            .get(&(chunk.x, chunk.z))
            .copied()
            .unwrap_or(self.default_height)
    }

    fn is_ocean(&self, chunk: ChunkCoord) -> bool {
        self.ocean.contains(&(chunk.x, chunk.z))
    }

    fn is_water(&self, chunk: ChunkCoord) -> bool {
        self.is_ocean(chunk) || self.water.contains(&(chunk.x, chunk.z))
    }
}

/// City factor and city style per chunk.
#[derive(Clone, Debug)]
pub(crate) struct TableCityLayout {
    pub default_factor: f32,
    pub factors: HashMap<(i32, i32), f32>,
    pub default_style: String,
    pub styles: HashMap<(i32, i32), String>,
}

impl Default for TableCityLayout {
    fn default() -> Self {
        Self {
            default_factor: 0.0,
            factors: HashMap::new(),
            default_style: "alpha".to_string(),
            styles: HashMap::new(),
        }
    }
}

impl CityLayout for TableCityLayout {
    fn city_factor(&self, chunk: ChunkCoord, _profile: &Profile) -> f32 {
        self.factors
            .get(&(chunk.x, chunk.z))
            .copied()
            .unwrap_or(self.default_factor)
    }

    fn city_style(
        &self,
        chunk: ChunkCoord,
        _profile: &Profile,
        assets: &AssetRegistry,
        _world_style: WorldStyleId,
    ) -> Result<CityStyleId> {
        let name = self.styles.get(&(chunk.x, chunk.z)).unwrap_or(&self.default_style);
        assets.city_style_id(name)
    }
}

/// Sphere layout given per chunk: relative distance to the sphere center
/// (below 1 inside a sphere) and where monorails run.
#[derive(Clone, Debug)]
pub(crate) struct TableSpheres {
    pub default_distance: f32,
    pub distances: HashMap<(i32, i32), f32>,
    pub horizontal_monorails: HashSet<(i32, i32)>,
}

impl TableSpheres {
    pub fn new(default_distance: f32) -> Self {
        Self {
            default_distance,
            distances: HashMap::new(),
            horizontal_monorails: HashSet::new(),
        }
    }

    pub fn distance_at(mut self, x: i32, z: i32, distance: f32) -> Self {
        self.distances.insert((x, z), distance);
        self
    }

    pub fn monorail_at(mut self, x: i32, z: i32) -> Self {
        self.horizontal_monorails.insert((x, z));
        self
    }
}

impl SphereLayout for TableSpheres {
    fn intersects(&self, chunk: ChunkCoord) -> bool {
        self.relative_distance_to_center(chunk) < 1.0
    }

    fn on_border(&self, chunk: ChunkCoord) -> bool {
        let d = self.relative_distance_to_center(chunk);
        (0.9..1.0).contains(&d)
    }

    fn fully_inside(&self, chunk: ChunkCoord) -> bool {
        self.relative_distance_to_center(chunk) < 0.9
    }

    fn has_monorail_station(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn relative_distance_to_center(&self, chunk: ChunkCoord) -> f32 {
        self.distances
            .get(&(chunk.x, chunk.z))
            .copied()
            .unwrap_or(self.default_distance)
    }

    fn is_in_sphere(&self, chunk: ChunkCoord, _block_x: i32, _block_z: i32) -> bool {
        self.intersects(chunk)
    }

    fn has_horizontal_monorail(&self, chunk: ChunkCoord) -> bool {
        self.horizontal_monorails.contains(&(chunk.x, chunk.z))
    }

    fn has_vertical_monorail(&self, _chunk: ChunkCoord) -> bool {
        false
    }
}

/// Builder for a resolver over table-driven collaborators.
pub(crate) struct TestWorld {
    seed: u64,
    profile: Profile,
    outside_profile: Option<Profile>,
    terrain: TableTerrain,
    city: TableCityLayout,
    transit: Box<dyn TransitLayout>,
    spheres: Box<dyn SphereLayout>,
    predefined: PredefinedCity,
    damage: Option<Box<dyn DamageSource>>,
}

impl TestWorld {
    /// Non-city flat world at height 64 with 2x2 buildings disabled.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            profile: Profile {
                building2x2_chance: 0.0,
                ..Profile::default()
            },
            outside_profile: None,
            terrain: TableTerrain::default(),
            city: TableCityLayout::default(),
            transit: Box::new(NoTransit),
            spheres: Box::new(NoSpheres),
            predefined: PredefinedCity::new(DimensionId(0)),
            damage: None,
        }
    }

    pub fn city_at(mut self, x: i32, z: i32, factor: f32) -> Self {
        self.city.factors.insert((x, z), factor);
        self
    }

    pub fn city_everywhere(mut self, factor: f32) -> Self {
        self.city.default_factor = factor;
        self
    }

    pub fn height_at(mut self, x: i32, z: i32, height: i32) -> Self {
        self.terrain.heights.insert((x, z), height);
        self
    }

    pub fn water_at(mut self, x: i32, z: i32) -> Self {
        self.terrain.water.insert((x, z));
        self
    }

    pub fn ocean_at(mut self, x: i32, z: i32) -> Self {
        self.terrain.ocean.insert((x, z));
        self
    }

    pub fn style_at(mut self, x: i32, z: i32, style: &str) -> Self {
        self.city.styles.insert((x, z), style.to_string());
        self
    }

    pub fn tune<F: FnOnce(&mut Profile)>(mut self, f: F) -> Self {
        f(&mut self.profile);
        self
    }

    pub fn outside_profile(mut self, profile: Profile) -> Self {
        self.outside_profile = Some(profile);
        self
    }

    pub fn transit(mut self, transit: Box<dyn TransitLayout>) -> Self {
        self.transit = transit;
        self
    }

    pub fn spheres(mut self, spheres: Box<dyn SphereLayout>) -> Self {
        self.spheres = spheres;
        self
    }

    /// Space landscape with cities inside the given spheres.
    pub fn space(mut self, spheres: TableSpheres) -> Self {
        self.profile.landscape_type = LandscapeType::Space;
        self.spheres = Box::new(spheres);
        self
    }

    pub fn damage(mut self, damage: Box<dyn DamageSource>) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn predefined_building(mut self, building: PredefinedBuilding) -> Self {
        self.predefined.add_building(building);
        self
    }

    pub fn predefined_street(mut self, x: i32, z: i32) -> Self {
        self.predefined.add_street(x, z);
        self
    }

    pub fn context(self) -> DimensionContext {
        let mut builder = DimensionContext::builder(self.seed)
            .profile(self.profile)
            .assets(Rc::new(test_assets()))
            .world_style("test")
            .terrain(Box::new(self.terrain))
            .city(Box::new(self.city))
            .transit(self.transit)
            .spheres(self.spheres)
            .predefined(Box::new(self.predefined));
        if let Some(outside) = self.outside_profile {
            builder = builder.outside_profile(outside);
        }
        if let Some(damage) = self.damage {
            builder = builder.damage(damage);
        }
        builder.build().expect("test context is valid")
    }

    pub fn build(self) -> CityResolver {
        CityResolver::new(self.context())
    }
}
