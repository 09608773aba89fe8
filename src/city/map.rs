//! ASCII overviews and serialisable summaries of resolved chunks.

use serde::Serialize;

use crate::coords::Direction;
use crate::error::Result;

use super::blend::BlendBounds;
use super::descriptor::{DoorMaterial, StreetType};
use super::multibuilding::Section;
use super::neighbors::ChunkRef;
use super::CityResolver;

fn city_char(d: &ChunkRef<'_>) -> char {
    if d.is_city && d.has_building {
        'B'
    } else if d.is_city {
        '+'
    } else if d.max_highway_level() >= 0 {
        '.'
    } else {
        ' '
    }
}

fn stair_char(direction: Direction) -> char {
    match direction {
        Direction::XMin => '<',
        Direction::XMax => '>',
        Direction::ZMin => '^',
        Direction::ZMax => 'v',
    }
}

fn span_char(d: &ChunkRef<'_>) -> Result<char> {
    let ch = if d.x_bridge()?.is_some() {
        '='
    } else if d.z_bridge()?.is_some() {
        '"'
    } else if d.has_x_corridor()? || d.has_z_corridor()? {
        '#'
    } else if let Some(direction) = d.actual_stair_direction()? {
        stair_char(direction)
    } else if !d.is_city && d.resolver().context().terrain.is_water(d.coord) {
        '~'
    } else {
        city_char(d)
    };
    Ok(ch)
}

fn render_with<F>(resolver: &CityResolver, center_x: i32, center_z: i32, radius: i32, cell: F) -> Result<String>
where
    F: Fn(&ChunkRef<'_>) -> Result<char>,
{
    let side = (2 * radius.max(0) + 1) as usize;
    let mut result = String::with_capacity((side + 1) * side);
    for z in center_z - radius..=center_z + radius {
        for x in center_x - radius..=center_x + radius {
            let d = resolver.descriptor(resolver.context().coord(x, z))?;
            result.push(cell(&d)?);
        }
        result.push('\n');
    }
    Ok(result)
}

/// Render the square of chunks around a center, one character per chunk,
/// rows running along X and Z growing downward.
pub fn render_map(resolver: &CityResolver, center_x: i32, center_z: i32, radius: i32) -> Result<String> {
    render_with(resolver, center_x, center_z, radius, |d| Ok(city_char(d)))
}

/// Like [`render_map`] with bridges, corridors, stairs and open water drawn
/// over the city.
pub fn render_span_map(resolver: &CityResolver, center_x: i32, center_z: i32, radius: i32) -> Result<String> {
    render_with(resolver, center_x, center_z, radius, span_char)
}

/// Legend for both map kinds
pub fn map_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== CITY LEGEND ===\n");
    legend.push_str("  B Building     + Street      . Highway     ~ Water\n");
    legend.push_str("SPANS:\n");
    legend.push_str("  = Bridge (X)   \" Bridge (Z)  # Corridor\n");
    legend.push_str("STAIRS:\n");
    legend.push_str("  < XMin         > XMax        ^ ZMin        v ZMax\n");
    legend
}

/// Flat, name-resolved view of a chunk for dumps and comparisons.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub x: i32,
    pub z: i32,
    pub dimension: u32,
    pub is_city: bool,
    pub has_building: bool,
    pub section: Option<Section>,
    pub city_level: i32,
    pub city_style: String,
    pub building: Option<String>,
    pub multi_building: Option<String>,
    pub floors: i32,
    pub cellars: i32,
    pub street_type: StreetType,
    pub door: DoorMaterial,
    pub palette: String,
    pub floor_parts: Vec<String>,
    pub highway_x_level: i32,
    pub highway_z_level: i32,
    pub x_bridge: Option<String>,
    pub z_bridge: Option<String>,
    pub x_corridor: bool,
    pub z_corridor: bool,
    pub stair: Option<Direction>,
    pub blend: Option<BlendBounds>,
    pub ruin_level: Option<i32>,
    pub max_height: i32,
    pub no_loot: bool,
}

impl ChunkSummary {
    /// Resolve every derived value of the chunk and copy it out by name.
    pub fn from_chunk(d: &ChunkRef<'_>) -> Result<Self> {
        let assets = &d.resolver().context().assets;
        let part_name = |id: crate::assets::PartId| assets.part(id).name.clone();
        Ok(Self {
            x: d.coord.x,
            z: d.coord.z,
            dimension: d.coord.dimension.0,
            is_city: d.is_city,
            has_building: d.has_building,
            section: d.section,
            city_level: d.city_level,
            city_style: assets.city_style(d.city_style).name.clone(),
            building: d.building_type().map(|b| assets.building(b).name.clone()),
            multi_building: d.multi_building.map(|m| assets.multi_building(m).name.clone()),
            floors: d.floors,
            cellars: d.cellars,
            street_type: d.street_type,
            door: d.door,
            palette: assets.palette(d.palette).name.clone(),
            floor_parts: d.floor_parts.iter().map(|&p| part_name(p)).collect(),
            highway_x_level: d.highway_x_level,
            highway_z_level: d.highway_z_level,
            x_bridge: d.x_bridge()?.map(part_name),
            z_bridge: d.z_bridge()?.map(part_name),
            x_corridor: d.has_x_corridor()?,
            z_corridor: d.has_z_corridor()?,
            stair: d.actual_stair_direction()?,
            blend: d.blend_bounds()?,
            ruin_level: d.ruin_level(),
            max_height: d.max_height(),
            no_loot: d.no_loot,
        })
    }
}
