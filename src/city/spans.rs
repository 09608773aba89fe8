//! Bridges and rail corridors: structures that span a line of chunks.
//!
//! A span is resolved from any chunk on it by walking toward both ends until
//! a terminator. Results are memoised on the descriptors; a resolved bridge
//! is written through to every chunk between its terminators.

use crate::assets::PartId;
use crate::coords::Orientation;
use crate::error::Result;

use super::descriptor::ChunkDescriptor;
use super::neighbors::ChunkRef;

/// Most chunks a bridge or corridor may cover between its two ends. Longer
/// spans are rejected as a whole, whichever of their chunks is asked first.
pub const MAX_SPAN_LENGTH: usize = 512;

/// Bridges end on a street chunk at city level 0.
fn is_bridge_terminator(chunk: &ChunkDescriptor) -> bool {
    chunk.is_city && !chunk.has_building && chunk.city_level <= 0
}

/// Corridors end in a building with at least one cellar.
fn is_corridor_terminator(chunk: &ChunkDescriptor) -> bool {
    chunk.has_building && chunk.cellars > 0
}

impl<'r> ChunkRef<'r> {
    pub fn has_horizontal_monorail(&self) -> bool {
        if let Some(v) = self.memo.horizontal_monorail.get() {
            return v;
        }
        let v = self.resolver().context().spheres.has_horizontal_monorail(self.coord);
        self.memo.horizontal_monorail.set(v);
        v
    }

    pub fn has_vertical_monorail(&self) -> bool {
        if let Some(v) = self.memo.vertical_monorail.get() {
            return v;
        }
        let v = self.resolver().context().spheres.has_vertical_monorail(self.coord);
        self.memo.vertical_monorail.set(v);
        v
    }

    pub fn has_monorail(&self) -> bool {
        self.has_horizontal_monorail() || self.has_vertical_monorail()
    }

    pub fn x_bridge(&self) -> Result<Option<PartId>> {
        self.bridge(Orientation::X)
    }

    pub fn z_bridge(&self) -> Result<Option<PartId>> {
        self.bridge(Orientation::Z)
    }

    /// Bridge part crossing this chunk along `orientation`, if any.
    ///
    /// X bridges win over Z bridges, and on odd rows (odd z for X bridges,
    /// odd x for Z bridges) a bridge yields to a parallel one next to it.
    pub fn bridge(&self, orientation: Orientation) -> Result<Option<PartId>> {
        let slot = self.memo.bridge(orientation);
        if let Some(resolved) = slot.get() {
            return Ok(resolved);
        }
        // Anything asking again while we resolve sees no bridge
        slot.set(None);
        match self.resolve_bridge(orientation) {
            Ok(part) => {
                slot.set(part);
                Ok(part)
            }
            Err(e) => {
                slot.reset();
                Err(e)
            }
        }
    }

    /// Whether a bridge from this chunk may pass over `chunk`.
    fn suitable_for_bridge(&self, chunk: &ChunkDescriptor) -> bool {
        let ctx = self.resolver().context();
        if ctx.profile.is_space() && self.has_monorail() {
            return false;
        }
        chunk.city_level < self.city_level || ctx.terrain.is_water(chunk.coord)
    }

    /// Odd-row check: a parallel bridge beside `chunk` blocks this one.
    fn crowded_by_parallel_bridge(&self, chunk: &ChunkRef<'r>, orientation: Orientation) -> Result<bool> {
        let odd = match orientation {
            Orientation::X => self.coord.z % 2 != 0,
            Orientation::Z => self.coord.x % 2 != 0,
        };
        if !odd {
            return Ok(false);
        }
        let side = orientation.perpendicular();
        if chunk.neighbor(side.min_direction())?.bridge(orientation)?.is_some() {
            return Ok(true);
        }
        Ok(chunk.neighbor(side.max_direction())?.bridge(orientation)?.is_some())
    }

    /// Whether `chunk` may be walked over by a bridge from this chunk.
    fn continues_bridge(&self, chunk: &ChunkRef<'r>, orientation: Orientation) -> bool {
        !chunk.is_city && chunk.bridge_candidate(orientation) && self.suitable_for_bridge(chunk)
    }

    /// Checks every span chunk repeats. Z spans may not cross an X bridge.
    fn blocked_span_chunk(&self, chunk: &ChunkRef<'r>, orientation: Orientation) -> Result<bool> {
        if orientation == Orientation::Z && chunk.bridge(Orientation::X)?.is_some() {
            return Ok(true);
        }
        self.crowded_by_parallel_bridge(chunk, orientation)
    }

    fn resolve_bridge(&self, orientation: Orientation) -> Result<Option<PartId>> {
        if !self.bridge_candidate(orientation) || !self.suitable_for_bridge(self) {
            return Ok(None);
        }
        if orientation == Orientation::Z && self.bridge(Orientation::X)?.is_some() {
            return Ok(None);
        }
        if self.crowded_by_parallel_bridge(self, orientation)? {
            return Ok(None);
        }

        let backward = orientation.min_direction();
        let forward = orientation.max_direction();

        // Chunks between the terminators, counted from both walks
        let mut length = 1;
        let mut part = self.bridge_part;
        let mut i = self.neighbor(backward)?;
        while self.continues_bridge(&i, orientation) {
            if self.blocked_span_chunk(&i, orientation)? {
                return Ok(None);
            }
            part = i.bridge_part;
            i = i.neighbor(backward)?;
            length += 1;
            if length > MAX_SPAN_LENGTH {
                log::trace!("bridge through {} exceeds {} chunks", self.coord, MAX_SPAN_LENGTH);
                return Ok(None);
            }
        }
        if !is_bridge_terminator(&i) {
            return Ok(None);
        }
        let minimum = i;

        let mut i = self.neighbor(forward)?;
        while self.continues_bridge(&i, orientation) {
            if self.blocked_span_chunk(&i, orientation)? {
                return Ok(None);
            }
            i = i.neighbor(forward)?;
            length += 1;
            if length > MAX_SPAN_LENGTH {
                log::trace!("bridge through {} exceeds {} chunks", self.coord, MAX_SPAN_LENGTH);
                return Ok(None);
            }
        }
        if !is_bridge_terminator(&i) {
            return Ok(None);
        }

        let mut i = i.neighbor(backward)?;
        while !i.same_chunk(&minimum) {
            i.memo.bridge(orientation).set(part);
            i.memo.bridge(orientation.perpendicular()).set(None);
            i = i.neighbor(backward)?;
        }
        Ok(part)
    }

    pub fn has_x_corridor(&self) -> Result<bool> {
        self.has_corridor(Orientation::X)
    }

    pub fn has_z_corridor(&self) -> Result<bool> {
        self.has_corridor(Orientation::Z)
    }

    /// Whether an underground rail corridor runs through this chunk: a line
    /// of passable, eligible chunks ending in buildings with cellars.
    pub fn has_corridor(&self, orientation: Orientation) -> Result<bool> {
        let slot = self.memo.corridor(orientation);
        if let Some(v) = slot.get() {
            return Ok(v);
        }
        let v = self.resolve_corridor(orientation)?;
        slot.set(v);
        Ok(v)
    }

    fn resolve_corridor(&self, orientation: Orientation) -> Result<bool> {
        if !self.corridor_candidate(orientation) {
            return Ok(false);
        }
        let mut length = 1;
        for direction in [orientation.min_direction(), orientation.max_direction()] {
            let mut i = self.neighbor(direction)?;
            while i.can_rail_go_through() && i.corridor_candidate(orientation) {
                i = i.neighbor(direction)?;
                length += 1;
                if length > MAX_SPAN_LENGTH {
                    log::trace!("corridor through {} exceeds {} chunks", self.coord, MAX_SPAN_LENGTH);
                    return Ok(false);
                }
            }
            if !is_corridor_terminator(&i) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
