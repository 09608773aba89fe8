//! City, transit, sphere and predefined layouts.
//!
//! These are the collaborators that decide where cities, highways, railways
//! and city spheres are. Each comes as a narrow trait plus one or more
//! reference implementations used by the tools and tests.

use std::collections::HashMap;
use std::path::Path;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetRegistry, CityStyleId, WorldStyleId};
use crate::coords::{ChunkCoord, DimensionId, CHUNK_SIZE};
use crate::error::Result;
use crate::profile::Profile;

/// Highway level meaning "no highway here"
pub const NO_HIGHWAY: i32 = -1;

/// Where cities are and which style each city has.
pub trait CityLayout {
    /// City factor of a chunk; a chunk is city when this exceeds the
    /// profile's city threshold.
    fn city_factor(&self, chunk: ChunkCoord, profile: &Profile) -> f32;

    /// City style of the city covering this chunk.
    fn city_style(
        &self,
        chunk: ChunkCoord,
        profile: &Profile,
        assets: &AssetRegistry,
        world_style: WorldStyleId,
    ) -> Result<CityStyleId>;
}

/// Noise-driven city layout.
///
/// City factor comes from low-frequency fractal noise. Styles are assigned
/// per square cell of `style_cell` chunks, so a city keeps one style over a
/// region and style borders fall on cell edges.
pub struct NoiseCityLayout {
    fbm: Fbm<Perlin>,
    seed: u64,
    /// Horizontal scale in chunks per noise unit
    pub scale: f64,
    /// Side of a style cell in chunks
    pub style_cell: i32,
}

impl NoiseCityLayout {
    pub fn new(seed: u64) -> Self {
        let fbm = Fbm::<Perlin>::new(seed.wrapping_add(1) as u32)
            .set_octaves(3)
            .set_persistence(0.5);
        Self {
            fbm,
            seed,
            scale: 48.0,
            style_cell: 24,
        }
    }
}

impl CityLayout for NoiseCityLayout {
    fn city_factor(&self, chunk: ChunkCoord, _profile: &Profile) -> f32 {
        let n = self.fbm.get([chunk.x as f64 / self.scale, chunk.z as f64 / self.scale]);
        ((n + 1.0) * 0.5).clamp(0.0, 1.0) as f32
    }

    fn city_style(
        &self,
        chunk: ChunkCoord,
        _profile: &Profile,
        assets: &AssetRegistry,
        world_style: WorldStyleId,
    ) -> Result<CityStyleId> {
        let cx = chunk.x.div_euclid(self.style_cell) as i64;
        let cz = chunk.z.div_euclid(self.style_cell) as i64;
        let cell_seed = (self.seed as i64)
            .wrapping_add(cx.wrapping_mul(787_381_231))
            .wrapping_add(cz.wrapping_mul(1_213_431_917));
        let mut rng = ChaCha8Rng::seed_from_u64(cell_seed as u64);
        assets.world_style(world_style).random_city_style(&mut rng)
    }
}

/// Kind of railway piece in a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RailChunkType {
    #[default]
    None,
    StationSurface,
    StationUnderground,
    StationExtensionSurface,
    StationExtensionUnderground,
    RailsEndHere,
    Horizontal,
    GoingDownTwoFromSurface,
    GoingDownOneFromSurface,
    DoubleBend,
    ThreeSplit,
}

/// Railway piece and the city level it runs at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailChunkInfo {
    pub kind: RailChunkType,
    pub level: i32,
}

impl RailChunkInfo {
    pub const NONE: RailChunkInfo = RailChunkInfo {
        kind: RailChunkType::None,
        level: 0,
    };
}

/// Highway and railway network.
pub trait TransitLayout {
    /// Level of a highway running along X through this chunk, or [`NO_HIGHWAY`].
    fn highway_x_level(&self, chunk: ChunkCoord, profile: &Profile) -> i32;
    /// Level of a highway running along Z through this chunk, or [`NO_HIGHWAY`].
    fn highway_z_level(&self, chunk: ChunkCoord, profile: &Profile) -> i32;
    fn rail_info(&self, chunk: ChunkCoord, profile: &Profile) -> RailChunkInfo;
}

/// No highways and no railways.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTransit;

impl TransitLayout for NoTransit {
    fn highway_x_level(&self, _chunk: ChunkCoord, _profile: &Profile) -> i32 {
        NO_HIGHWAY
    }

    fn highway_z_level(&self, _chunk: ChunkCoord, _profile: &Profile) -> i32 {
        NO_HIGHWAY
    }

    fn rail_info(&self, _chunk: ChunkCoord, _profile: &Profile) -> RailChunkInfo {
        RailChunkInfo::NONE
    }
}

/// Straight highways on a regular grid: an X highway on every row with
/// `z % spacing == 0` and a Z highway on every column with `x % spacing == 0`.
#[derive(Clone, Copy, Debug)]
pub struct GridHighways {
    pub spacing: i32,
    pub level: i32,
}

impl TransitLayout for GridHighways {
    fn highway_x_level(&self, chunk: ChunkCoord, _profile: &Profile) -> i32 {
        if self.spacing > 0 && chunk.z.rem_euclid(self.spacing) == 0 {
            self.level
        } else {
            NO_HIGHWAY
        }
    }

    fn highway_z_level(&self, chunk: ChunkCoord, _profile: &Profile) -> i32 {
        if self.spacing > 0 && chunk.x.rem_euclid(self.spacing) == 0 {
            self.level
        } else {
            NO_HIGHWAY
        }
    }

    fn rail_info(&self, _chunk: ChunkCoord, _profile: &Profile) -> RailChunkInfo {
        RailChunkInfo::NONE
    }
}

/// City spheres of space worlds.
pub trait SphereLayout {
    /// Whether any part of the chunk lies inside a sphere.
    fn intersects(&self, chunk: ChunkCoord) -> bool;
    /// Whether the sphere's glass shell passes through the chunk.
    fn on_border(&self, chunk: ChunkCoord) -> bool;
    fn fully_inside(&self, chunk: ChunkCoord) -> bool;
    fn has_monorail_station(&self, chunk: ChunkCoord) -> bool;
    /// Distance to the nearest sphere center relative to its radius.
    fn relative_distance_to_center(&self, chunk: ChunkCoord) -> f32;
    /// Whether the given block column is inside a sphere.
    fn is_in_sphere(&self, chunk: ChunkCoord, block_x: i32, block_z: i32) -> bool;
    fn has_horizontal_monorail(&self, chunk: ChunkCoord) -> bool;
    fn has_vertical_monorail(&self, chunk: ChunkCoord) -> bool;
}

/// A world without spheres.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpheres;

impl SphereLayout for NoSpheres {
    fn intersects(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn on_border(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn fully_inside(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn has_monorail_station(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn relative_distance_to_center(&self, _chunk: ChunkCoord) -> f32 {
        1.0
    }

    fn is_in_sphere(&self, _chunk: ChunkCoord, _block_x: i32, _block_z: i32) -> bool {
        false
    }

    fn has_horizontal_monorail(&self, _chunk: ChunkCoord) -> bool {
        false
    }

    fn has_vertical_monorail(&self, _chunk: ChunkCoord) -> bool {
        false
    }
}

// Half diagonal of a chunk in blocks, rounded up
const CHUNK_HALF_DIAGONAL: f32 = 12.0;

/// One sphere per square cell of `cell_size` chunks, centered in the cell.
///
/// Monorails run along the center row and center column of every cell and
/// connect neighbouring spheres. Each sphere has one station on its center
/// row, halfway between the center and the eastern shell.
#[derive(Clone, Copy, Debug)]
pub struct GridSphereLayout {
    pub cell_size: i32,
    /// Sphere radius in blocks
    pub radius: f32,
}

impl GridSphereLayout {
    pub fn new(cell_size: i32, radius: f32) -> Self {
        Self { cell_size, radius }
    }

    /// Chunk holding the center of the sphere nearest to `chunk`.
    fn center_chunk(&self, chunk: ChunkCoord) -> ChunkCoord {
        let cx = chunk.x.div_euclid(self.cell_size) * self.cell_size + self.cell_size / 2;
        let cz = chunk.z.div_euclid(self.cell_size) * self.cell_size + self.cell_size / 2;
        ChunkCoord::new(chunk.dimension, cx, cz)
    }

    fn distance_to_center(&self, chunk: ChunkCoord, block_x: i32, block_z: i32) -> f32 {
        let (sx, sz) = self.center_chunk(chunk).block_center();
        let dx = (block_x - sx) as f32;
        let dz = (block_z - sz) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    fn chunk_distance(&self, chunk: ChunkCoord) -> f32 {
        let (bx, bz) = chunk.block_center();
        self.distance_to_center(chunk, bx, bz)
    }
}

impl SphereLayout for GridSphereLayout {
    fn intersects(&self, chunk: ChunkCoord) -> bool {
        self.chunk_distance(chunk) < self.radius + CHUNK_HALF_DIAGONAL
    }

    fn on_border(&self, chunk: ChunkCoord) -> bool {
        self.intersects(chunk) && !self.fully_inside(chunk)
    }

    fn fully_inside(&self, chunk: ChunkCoord) -> bool {
        self.chunk_distance(chunk) + CHUNK_HALF_DIAGONAL < self.radius
    }

    fn has_monorail_station(&self, chunk: ChunkCoord) -> bool {
        let center = self.center_chunk(chunk);
        let offset = (self.radius / CHUNK_SIZE as f32 / 2.0) as i32;
        chunk.z == center.z && chunk.x == center.x + offset
    }

    fn relative_distance_to_center(&self, chunk: ChunkCoord) -> f32 {
        if self.radius <= 0.0 {
            return 1.0;
        }
        self.chunk_distance(chunk) / self.radius
    }

    fn is_in_sphere(&self, chunk: ChunkCoord, block_x: i32, block_z: i32) -> bool {
        self.distance_to_center(chunk, block_x, block_z) < self.radius
    }

    fn has_horizontal_monorail(&self, chunk: ChunkCoord) -> bool {
        chunk.z == self.center_chunk(chunk).z
    }

    fn has_vertical_monorail(&self, chunk: ChunkCoord) -> bool {
        chunk.x == self.center_chunk(chunk).x
    }
}

/// A building placed by hand at a fixed chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredefinedBuilding {
    pub x: i32,
    pub z: i32,
    /// Building name, or multi-building name when `multi` is set
    pub building: String,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub prevent_ruins: bool,
}

/// A street chunk placed by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedStreet {
    pub x: i32,
    pub z: i32,
}

/// Hand-placed buildings and streets that override random generation.
pub trait PredefinedLayout {
    fn building_at(&self, chunk: ChunkCoord) -> Option<&PredefinedBuilding>;
    fn street_at(&self, chunk: ChunkCoord) -> bool;
}

/// No predefined content.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPredefined;

impl PredefinedLayout for NoPredefined {
    fn building_at(&self, _chunk: ChunkCoord) -> Option<&PredefinedBuilding> {
        None
    }

    fn street_at(&self, _chunk: ChunkCoord) -> bool {
        false
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct PredefinedCityFile {
    #[serde(default)]
    dimension: u32,
    #[serde(default)]
    buildings: Vec<PredefinedBuilding>,
    #[serde(default)]
    streets: Vec<PredefinedStreet>,
}

/// Predefined buildings and streets of one dimension, loaded from JSON.
#[derive(Clone, Debug, Default)]
pub struct PredefinedCity {
    pub dimension: DimensionId,
    buildings: HashMap<(i32, i32), PredefinedBuilding>,
    streets: HashMap<(i32, i32), PredefinedStreet>,
}

impl PredefinedCity {
    pub fn new(dimension: DimensionId) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: PredefinedCityFile = serde_json::from_str(json)?;
        let mut city = PredefinedCity::new(DimensionId(file.dimension));
        for b in file.buildings {
            city.add_building(b);
        }
        for s in file.streets {
            city.add_street(s.x, s.z);
        }
        Ok(city)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn add_building(&mut self, building: PredefinedBuilding) {
        self.buildings.insert((building.x, building.z), building);
    }

    pub fn add_street(&mut self, x: i32, z: i32) {
        self.streets.insert((x, z), PredefinedStreet { x, z });
    }
}

impl PredefinedLayout for PredefinedCity {
    fn building_at(&self, chunk: ChunkCoord) -> Option<&PredefinedBuilding> {
        if chunk.dimension != self.dimension {
            return None;
        }
        self.buildings.get(&(chunk.x, chunk.z))
    }

    fn street_at(&self, chunk: ChunkCoord) -> bool {
        chunk.dimension == self.dimension && self.streets.contains_key(&(chunk.x, chunk.z))
    }
}
