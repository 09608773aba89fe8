//! Procedural city generation library
//!
//! Resolves chunk descriptions for infinite city worlds. Re-exports modules
//! for use by binaries and tools.

pub mod assets;
pub mod city;
pub mod coords;
pub mod error;
pub mod profile;
pub mod seeds;
pub mod world;
