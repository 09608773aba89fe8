//! Handles for walking between descriptors.
//!
//! A [`ChunkRef`] pairs a shared descriptor with the resolver that owns it.
//! Moving to a neighbour is a cache lookup by coordinate, constructing the
//! neighbour on a miss, so every handle to a coordinate points at the same
//! instance and sees the same memoised values.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::coords::{Direction, CHUNK_SIZE};
use crate::error::Result;

use super::descriptor::ChunkDescriptor;
use super::CityResolver;

/// The eight chunks around a chunk, axis neighbours first.
pub const RING: [(i32, i32); 8] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, -1), (-1, 1), (1, 1)];

#[derive(Clone)]
pub struct ChunkRef<'r> {
    resolver: &'r CityResolver,
    info: Rc<ChunkDescriptor>,
}

impl<'r> ChunkRef<'r> {
    pub(crate) fn new(resolver: &'r CityResolver, info: Rc<ChunkDescriptor>) -> Self {
        Self { resolver, info }
    }

    pub fn resolver(&self) -> &'r CityResolver {
        self.resolver
    }

    pub fn descriptor(&self) -> &Rc<ChunkDescriptor> {
        &self.info
    }

    /// Whether both handles point at the same cached instance.
    pub fn same_chunk(&self, other: &ChunkRef<'_>) -> bool {
        Rc::ptr_eq(&self.info, &other.info)
    }

    pub fn neighbor(&self, direction: Direction) -> Result<ChunkRef<'r>> {
        self.resolver.descriptor(self.coord.step(direction))
    }

    pub fn xmin(&self) -> Result<ChunkRef<'r>> {
        self.neighbor(Direction::XMin)
    }

    pub fn xmax(&self) -> Result<ChunkRef<'r>> {
        self.neighbor(Direction::XMax)
    }

    pub fn zmin(&self) -> Result<ChunkRef<'r>> {
        self.neighbor(Direction::ZMin)
    }

    pub fn zmax(&self) -> Result<ChunkRef<'r>> {
        self.neighbor(Direction::ZMax)
    }

    /// Chunk at an offset, reached through axis steps (x first).
    pub fn adjacent(&self, dx: i32, dz: i32) -> Result<ChunkRef<'r>> {
        let mut current = self.clone();
        for _ in 0..dx.abs() {
            current = current.neighbor(if dx < 0 { Direction::XMin } else { Direction::XMax })?;
        }
        for _ in 0..dz.abs() {
            current = current.neighbor(if dz < 0 { Direction::ZMin } else { Direction::ZMax })?;
        }
        Ok(current)
    }

    /// The eight surrounding chunks in [`RING`] order.
    pub fn ring(&self) -> Result<Vec<ChunkRef<'r>>> {
        RING.iter().map(|&(dx, dz)| self.adjacent(dx, dz)).collect()
    }

    /// Chunk that owns the 8x8 quarter holding local block (x, z).
    pub fn todo_chunk(&self, x: i32, z: i32) -> Result<ChunkRef<'r>> {
        let (dx, dz) = ChunkDescriptor::todo_offset(x, z);
        self.adjacent(dx, dz)
    }

    /// Chunk across the edge touched by local block (x, z); self when the
    /// block is not on an edge.
    pub fn adjacent_at_edge(&self, x: i32, z: i32) -> Result<ChunkRef<'r>> {
        if x == 0 {
            self.xmin()
        } else if x == CHUNK_SIZE - 1 {
            self.xmax()
        } else if z == 0 {
            self.zmin()
        } else if z == CHUNK_SIZE - 1 {
            self.zmax()
        } else {
            Ok(self.clone())
        }
    }
}

impl Deref for ChunkRef<'_> {
    type Target = ChunkDescriptor;

    fn deref(&self) -> &ChunkDescriptor {
        &self.info
    }
}

impl fmt::Debug for ChunkRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChunkRef").field(&self.info.coord).finish()
    }
}
