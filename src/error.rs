//! Error types for chunk resolution and data loading.
//!
//! Configuration errors (missing assets, empty selection lists, malformed
//! profile values) are fatal for the chunk being resolved and are never
//! retried. Edge-of-world, void and ocean chunks are not errors.

use std::fmt;

/// Kind of asset looked up in the registry, used in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Part,
    Building,
    MultiBuilding,
    Palette,
    Style,
    CityStyle,
    WorldStyle,
}

impl AssetKind {
    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Part => "part",
            AssetKind::Building => "building",
            AssetKind::MultiBuilding => "multibuilding",
            AssetKind::Palette => "palette",
            AssetKind::Style => "style",
            AssetKind::CityStyle => "citystyle",
            AssetKind::WorldStyle => "worldstyle",
        }
    }
}

/// Errors that can occur while resolving chunk characteristics or descriptors.
#[derive(Debug)]
pub enum ResolveError {
    /// A name did not resolve to an asset of the expected kind
    MissingAsset { kind: AssetKind, name: String },
    /// A weighted list that must produce a value was empty
    EmptySelection { owner: String, list: &'static str },
    /// No primary part matched a floor of a building
    MissingPart { building: String, floor: i32 },
    /// A profile parameter is out of its valid range
    InvalidProfile(String),
    /// Internal consistency violation (programming defect)
    Invariant(String),
    /// IO error while loading data files
    Io(std::io::Error),
    /// Malformed JSON data
    Json(serde_json::Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingAsset { kind, name } => {
                write!(f, "Cannot find {} '{}'", kind.name(), name)
            }
            ResolveError::EmptySelection { owner, list } => {
                write!(f, "'{}' has no entries to pick from in '{}'", owner, list)
            }
            ResolveError::MissingPart { building, floor } => {
                write!(f, "Null part for building '{}' at floor {}", building, floor)
            }
            ResolveError::InvalidProfile(e) => write!(f, "Invalid profile: {}", e),
            ResolveError::Invariant(e) => write!(f, "Invariant violated: {}", e),
            ResolveError::Io(e) => write!(f, "IO error: {}", e),
            ResolveError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io(e) => Some(e),
            ResolveError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(e: std::io::Error) -> Self {
        ResolveError::Io(e)
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        ResolveError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_message_names_kind_and_name() {
        let e = ResolveError::MissingAsset {
            kind: AssetKind::Building,
            name: "tower".to_string(),
        };
        assert_eq!(e.to_string(), "Cannot find building 'tower'");
    }

    #[test]
    fn test_io_error_has_source() {
        let e: ResolveError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
