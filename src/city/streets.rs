//! Street topology: how roads, doorways and facades meet between chunks.

use crate::coords::{Orientation, CHUNK_SIZE};
use crate::error::Result;
use crate::world::{Explosion, RailChunkInfo, RailChunkType};

use super::descriptor::{StreetType, FLOOR_HEIGHT};
use super::multibuilding::Section;
use super::neighbors::ChunkRef;

/// Largest city level difference a road may bridge between two chunks
pub const ALLOWED_ROAD_LEVEL_DIFFERENCE: i32 = 0;

/// Samples above highway height needed before a highway becomes a tunnel
const TUNNEL_SAMPLE_THRESHOLD: usize = 12;

/// Whether a road can run between two chunks.
pub fn has_road_connection(a: &ChunkRef<'_>, b: &ChunkRef<'_>) -> Result<bool> {
    if a.does_road_extend_to()? || b.does_road_extend_to()? {
        return Ok(false);
    }
    Ok((a.city_level - b.city_level).abs() <= ALLOWED_ROAD_LEVEL_DIFFERENCE)
}

impl<'r> ChunkRef<'r> {
    /// A street surrounded by streets: all four axis neighbours and at least
    /// three of the four diagonals.
    pub fn is_elevated_park_section(&self) -> Result<bool> {
        if !self.is_street_section() {
            return Ok(false);
        }
        for n in [self.xmin()?, self.xmax()?, self.zmin()?, self.zmax()?] {
            if !n.is_street_section() {
                return Ok(false);
            }
        }
        let mut streets = 0;
        for (dx, dz) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
            if self.adjacent(dx, dz)?.is_street_section() {
                streets += 1;
            }
        }
        Ok(streets >= 3)
    }

    /// Whether a road from a neighbouring chunk can extend into this one.
    pub fn does_road_extend_to(&self) -> Result<bool> {
        if self.is_street_section() {
            self.is_elevated_park_section()
        } else {
            Ok(true)
        }
    }

    pub fn rail_info(&self) -> RailChunkInfo {
        self.resolver().context().transit.rail_info(self.coord, &self.profile)
    }

    /// Whether the building in `adj` shows its front part toward this street.
    pub fn has_front_part_from(&self, adj: &ChunkRef<'_>) -> Result<bool> {
        let street_type = if self.is_elevated_park_section()? {
            StreetType::Park
        } else {
            self.street_type
        };
        if !adj.has_building
            || adj.front.is_none()
            || street_type != StreetType::Normal
            || self.city_level >= adj.city_level + adj.floors
        {
            return Ok(false);
        }
        match self.rail_info().kind {
            RailChunkType::StationUnderground | RailChunkType::GoingDownOneFromSurface => return Ok(false),
            _ => {}
        }
        if self.max_highway_level() >= 0 {
            return Ok(false);
        }
        let local = adj.global_to_local(self.city_level);
        Ok(match adj.floor_part(local) {
            Some(part) => !self.resolver().context().assets.part(part).dont_connect,
            None => true,
        })
    }

    /// Sections that have another chunk of their own building on this side.
    fn inner_side(&self, orientation: Orientation) -> bool {
        match (orientation, self.section) {
            (Orientation::X, Some(Section::TopRight | Section::BottomRight)) => true,
            (Orientation::Z, Some(Section::BottomLeft | Section::BottomRight)) => true,
            _ => false,
        }
    }

    fn connections(&self, orientation: Orientation) -> &[bool] {
        match orientation {
            Orientation::X => &self.connection_x,
            Orientation::Z => &self.connection_z,
        }
    }

    /// Whether this building has a doorway on its min side at floor slot
    /// `level` (0 = lowest cellar).
    pub fn has_connection_at(&self, level: i32, orientation: Orientation) -> Result<bool> {
        if !self.is_city || self.inner_side(orientation) {
            return Ok(false);
        }
        let connections = self.connections(orientation);
        if level < 0 || level as usize >= connections.len() {
            return Ok(false);
        }
        let slot = level as usize;
        if slot < self.floor_parts.len() && self.resolver().context().assets.part(self.floor_parts[slot]).dont_connect {
            return Ok(false);
        }
        if self.neighbor(orientation.min_direction())?.has_front_part_from(self)? {
            return Ok(true);
        }
        Ok(connections[slot])
    }

    /// Doorway check seen from a street: the building on the min side may
    /// face this chunk with its front.
    pub fn has_connection_at_from_street(&self, level: i32, orientation: Orientation) -> Result<bool> {
        if !self.is_city || self.inner_side(orientation) {
            return Ok(false);
        }
        let connections = self.connections(orientation);
        if level < 0 || level as usize >= connections.len() {
            return Ok(false);
        }
        if self.has_front_part_from(&self.neighbor(orientation.min_direction())?)? {
            return Ok(true);
        }
        Ok(connections[level as usize])
    }

    pub fn has_connection_at_x(&self, level: i32) -> Result<bool> {
        self.has_connection_at(level, Orientation::X)
    }

    pub fn has_connection_at_z(&self, level: i32) -> Result<bool> {
        self.has_connection_at(level, Orientation::Z)
    }

    pub fn has_connection_at_x_from_street(&self, level: i32) -> Result<bool> {
        self.has_connection_at_from_street(level, Orientation::X)
    }

    pub fn has_connection_at_z_from_street(&self, level: i32) -> Result<bool> {
        self.has_connection_at_from_street(level, Orientation::Z)
    }

    /// Whether a highway at `level` through this chunk has to be a tunnel.
    pub fn is_tunnel(&self, level: i32) -> bool {
        if self.is_city {
            return self.city_level > level;
        }
        let terrain = &self.resolver().context().terrain;
        let highway_height = self.ground_level + level * FLOOR_HEIGHT + 3;
        let mut above = 0;
        for x in (2..CHUNK_SIZE).step_by(3) {
            for z in (2..CHUNK_SIZE).step_by(3) {
                if terrain.height_at(self.coord, x, z) > highway_height {
                    above += 1;
                }
            }
        }
        above > TUNNEL_SAMPLE_THRESHOLD
    }

    /// Damage at the center of vertical section `chunk_y`.
    pub fn damage(&self, chunk_y: i32) -> f32 {
        let ctx = self.resolver().context();
        let Some(source) = &ctx.damage else {
            return 0.0;
        };
        let (bx, bz) = self.coord.block_center();
        source.damage_at(self.coord, bx, chunk_y * CHUNK_SIZE + CHUNK_SIZE / 2, bz)
    }

    pub fn explosions(&self) -> Vec<Explosion> {
        match &self.resolver().context().damage {
            Some(source) => source.explosions(self.coord),
            None => Vec::new(),
        }
    }
}
