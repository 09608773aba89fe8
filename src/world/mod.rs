//! Dimension context: everything chunk resolution consults.
//!
//! A [`DimensionContext`] bundles the seed, the profiles, the asset registry
//! and the collaborators that describe the world around the cities (terrain,
//! city layout, transit, spheres, predefined content, damage). It is built
//! once per dimension with [`DimensionContextBuilder`] and handed to the
//! resolver.

pub mod damage;
pub mod layout;
pub mod terrain;

use std::rc::Rc;

use crate::assets::{AssetRegistry, WorldStyle, WorldStyleId, DEFAULT_WORLD_STYLE};
use crate::coords::{ChunkCoord, DimensionId};
use crate::error::Result;
use crate::profile::Profile;

pub use damage::{DamageSource, Explosion, ScatteredExplosions};
pub use layout::{
    CityLayout, GridHighways, GridSphereLayout, NoPredefined, NoSpheres, NoTransit, NoiseCityLayout,
    PredefinedBuilding, PredefinedCity, PredefinedLayout, PredefinedStreet, RailChunkInfo, RailChunkType,
    SphereLayout, TransitLayout, NO_HIGHWAY,
};
pub use terrain::{NoiseTerrain, TerrainSource};

/// Sea level of the surrounding world when the profile does not set one
pub const DEFAULT_WORLD_SEA_LEVEL: i32 = 63;

/// Per-dimension configuration and collaborators.
pub struct DimensionContext {
    pub dimension: DimensionId,
    pub seed: u64,
    pub profile: Rc<Profile>,
    /// Profile used outside city spheres on space worlds
    pub outside_profile: Option<Rc<Profile>>,
    pub world_style: WorldStyleId,
    pub assets: Rc<AssetRegistry>,
    pub terrain: Box<dyn TerrainSource>,
    pub city: Box<dyn CityLayout>,
    pub transit: Box<dyn TransitLayout>,
    pub spheres: Box<dyn SphereLayout>,
    pub predefined: Box<dyn PredefinedLayout>,
    pub damage: Option<Box<dyn DamageSource>>,
    /// Sea level used when a profile has `sea_level == -1`
    pub world_sea_level: i32,
}

impl DimensionContext {
    pub fn builder(seed: u64) -> DimensionContextBuilder {
        DimensionContextBuilder::new(seed)
    }

    /// Coordinate in this dimension.
    pub fn coord(&self, x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(self.dimension, x, z)
    }

    /// Profile for chunks outside city spheres (the main profile when none is set).
    pub fn outside_profile(&self) -> &Rc<Profile> {
        self.outside_profile.as_ref().unwrap_or(&self.profile)
    }

    /// Profile in effect at a chunk. Space worlds use the outside profile
    /// for chunks that do not touch a city sphere.
    pub fn profile_for(&self, chunk: ChunkCoord) -> &Rc<Profile> {
        if self.profile.is_space() && !self.spheres.intersects(chunk) {
            self.outside_profile()
        } else {
            &self.profile
        }
    }

    /// Whether a chunk lies outside every city sphere of a space world.
    pub fn is_outside_chunk(&self, chunk: ChunkCoord) -> bool {
        self.profile.is_space() && !self.spheres.intersects(chunk)
    }

    pub fn world_style(&self) -> &WorldStyle {
        self.assets.world_style(self.world_style)
    }

    /// Water level for a profile, resolving -1 to the world's sea level.
    pub fn water_level(&self, profile: &Profile) -> i32 {
        if profile.sea_level == -1 {
            self.world_sea_level
        } else {
            profile.sea_level
        }
    }
}

/// Builder for a [`DimensionContext`], with noise terrain and layouts and
/// no transit, spheres, predefined content or damage by default.
pub struct DimensionContextBuilder {
    seed: u64,
    dimension: DimensionId,
    profile: Profile,
    outside_profile: Option<Profile>,
    world_style: String,
    assets: Option<Rc<AssetRegistry>>,
    terrain: Option<Box<dyn TerrainSource>>,
    city: Option<Box<dyn CityLayout>>,
    transit: Box<dyn TransitLayout>,
    spheres: Box<dyn SphereLayout>,
    predefined: Box<dyn PredefinedLayout>,
    damage: Option<Box<dyn DamageSource>>,
    world_sea_level: i32,
}

impl DimensionContextBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            dimension: DimensionId(0),
            profile: Profile::default(),
            outside_profile: None,
            world_style: DEFAULT_WORLD_STYLE.to_string(),
            assets: None,
            terrain: None,
            city: None,
            transit: Box::new(NoTransit),
            spheres: Box::new(NoSpheres),
            predefined: Box::new(NoPredefined),
            damage: None,
            world_sea_level: DEFAULT_WORLD_SEA_LEVEL,
        }
    }

    pub fn dimension(mut self, dimension: DimensionId) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn outside_profile(mut self, profile: Profile) -> Self {
        self.outside_profile = Some(profile);
        self
    }

    pub fn world_style(mut self, name: &str) -> Self {
        self.world_style = name.to_string();
        self
    }

    pub fn assets(mut self, assets: Rc<AssetRegistry>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn terrain(mut self, terrain: Box<dyn TerrainSource>) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn city(mut self, city: Box<dyn CityLayout>) -> Self {
        self.city = Some(city);
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

    pub fn predefined(mut self, predefined: Box<dyn PredefinedLayout>) -> Self {
        self.predefined = predefined;
        self
    }

    pub fn damage(mut self, damage: Box<dyn DamageSource>) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn world_sea_level(mut self, level: i32) -> Self {
        self.world_sea_level = level;
        self
    }

    /// Validate the profiles, resolve the world style and fill in defaults.
    pub fn build(self) -> Result<DimensionContext> {
        self.profile.validate()?;
        if let Some(outside) = &self.outside_profile {
            outside.validate()?;
        }
        let assets = self.assets.unwrap_or_else(|| Rc::new(AssetRegistry::defaults()));
        let world_style = assets.world_style_id(&self.world_style)?;
        let sea_level = if self.profile.sea_level == -1 {
            self.world_sea_level
        } else {
            self.profile.sea_level
        };
        let seed = self.seed;
        Ok(DimensionContext {
            dimension: self.dimension,
            seed,
            profile: Rc::new(self.profile),
            outside_profile: self.outside_profile.map(Rc::new),
            world_style,
            assets,
            terrain: self
                .terrain
                .unwrap_or_else(|| Box::new(NoiseTerrain::new(seed, sea_level))),
            city: self.city.unwrap_or_else(|| Box::new(NoiseCityLayout::new(seed))),
            transit: self.transit,
            spheres: self.spheres,
            predefined: self.predefined,
            damage: self.damage,
            world_sea_level: self.world_sea_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::profile::LandscapeType;

    #[test]
    fn test_builder_defaults() {
        let ctx = DimensionContext::builder(42).build().unwrap();
        assert_eq!(ctx.seed, 42);
        assert_eq!(ctx.dimension, DimensionId(0));
        assert_eq!(ctx.world_style().name, DEFAULT_WORLD_STYLE);
        assert_eq!(ctx.water_level(&ctx.profile), DEFAULT_WORLD_SEA_LEVEL);
    }

    #[test]
    fn test_unknown_world_style_rejected() {
        let result = DimensionContext::builder(1).world_style("nope").build();
        assert!(matches!(result, Err(ResolveError::MissingAsset { .. })));
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let profile = Profile {
            building_chance: 2.0,
            ..Profile::default()
        };
        let result = DimensionContext::builder(1).profile(profile).build();
        assert!(matches!(result, Err(ResolveError::InvalidProfile(_))));
    }

    #[test]
    fn test_space_profile_selection() {
        let space = Profile {
            landscape_type: LandscapeType::Space,
            ..Profile::default()
        };
        let outside = Profile {
            ground_level: 50,
            ..Profile::default()
        };
        let ctx = DimensionContext::builder(3)
            .profile(space)
            .outside_profile(outside)
            .spheres(Box::new(GridSphereLayout::new(16, 100.0)))
            .build()
            .unwrap();
        let inside = ctx.coord(8, 8);
        let far = ctx.coord(0, 0);
        assert!(ctx.profile_for(inside).is_space());
        assert_eq!(ctx.profile_for(far).ground_level, 50);
        assert!(ctx.is_outside_chunk(far));
        assert!(!ctx.is_outside_chunk(inside));
    }
}
