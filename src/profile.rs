//! Profile: the flat table of tunable parameters for city generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// How the landscape of a dimension is laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandscapeType {
    /// Regular terrain
    #[default]
    Default,
    /// Floating islands over the void
    Floating,
    /// Cities inside glass spheres
    Space,
    /// Closed caverns
    Cavern,
}

/// Configuration parameters for city generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Layout strategy of the landscape.
    pub landscape_type: LandscapeType,

    /// City factor above which a chunk is part of a city.
    pub city_threshold: f32,

    /// Ground level of cities in blocks.
    pub ground_level: i32,
    /// Sea level in blocks (-1 = use the world's sea level).
    pub sea_level: i32,

    /// Heights below which a chunk gets city level 0, 1, 2 and 3.
    pub city_level0_height: i32,
    pub city_level1_height: i32,
    pub city_level2_height: i32,
    pub city_level3_height: i32,

    /// Chance that a city chunk may hold a building.
    pub building_chance: f32,
    /// Chance that an eligible chunk anchors a 2x2 building.
    pub building2x2_chance: f32,
    pub building_min_floors: i32,
    pub building_max_floors: i32,
    pub building_min_floors_chance: f32,
    pub building_max_floors_chance: f32,
    pub building_min_cellars: i32,
    pub building_max_cellars: i32,
    /// Chance of a doorway on each floor toward a city neighbour.
    pub building_doorway_chance: f32,
    /// Chance that a building has a front facade part.
    pub building_front_chance: f32,
    pub building_without_loot_chance: f32,

    /// Chance that a street chunk is a full street or a park instead of normal.
    pub park_chance: f64,
    pub fountain_chance: f32,

    /// Chance that a chunk is a candidate for a rail corridor (per axis).
    pub corridor_chance: f32,
    /// Chance that a chunk is a candidate for a bridge (per axis).
    pub bridge_chance: f32,
    pub railway_dungeon_chance: f32,

    /// Chance that a building is ruined and the range of the ruin layer.
    pub ruin_chance: f32,
    pub ruin_min_level_percent: f32,
    pub ruin_max_level_percent: f32,

    /// Jitter bounds applied to terrain blend heights at city corners.
    pub terrain_fix_lower_min_offset: i32,
    pub terrain_fix_lower_max_offset: i32,
    pub terrain_fix_upper_min_offset: i32,
    pub terrain_fix_upper_max_offset: i32,

    /// Generate normal landscape outside city spheres.
    pub citysphere_landscape_outside: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            landscape_type: LandscapeType::Default,
            city_threshold: 0.2,
            ground_level: 71,
            sea_level: -1,
            city_level0_height: 75,
            city_level1_height: 83,
            city_level2_height: 91,
            city_level3_height: 99,
            building_chance: 0.3,
            building2x2_chance: 0.03,
            building_min_floors: 0,
            building_max_floors: 9,
            building_min_floors_chance: 1.0,
            building_max_floors_chance: 6.0,
            building_min_cellars: 0,
            building_max_cellars: 3,
            building_doorway_chance: 0.6,
            building_front_chance: 0.2,
            building_without_loot_chance: 0.2,
            park_chance: 0.2,
            fountain_chance: 0.05,
            corridor_chance: 0.7,
            bridge_chance: 0.7,
            railway_dungeon_chance: 0.01,
            ruin_chance: 0.05,
            ruin_min_level_percent: 0.8,
            ruin_max_level_percent: 0.99,
            terrain_fix_lower_min_offset: -4,
            terrain_fix_lower_max_offset: -3,
            terrain_fix_upper_min_offset: -1,
            terrain_fix_upper_max_offset: 2,
            citysphere_landscape_outside: false,
        }
    }
}

impl Profile {
    pub fn is_space(&self) -> bool {
        self.landscape_type == LandscapeType::Space
    }

    pub fn is_floating(&self) -> bool {
        self.landscape_type == LandscapeType::Floating
    }

    pub fn is_cavern(&self) -> bool {
        self.landscape_type == LandscapeType::Cavern
    }

    /// Parse a profile from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: Profile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check that every parameter is in its valid range.
    pub fn validate(&self) -> Result<()> {
        let chances: [(&str, f64); 13] = [
            ("city_threshold", self.city_threshold as f64),
            ("building_chance", self.building_chance as f64),
            ("building2x2_chance", self.building2x2_chance as f64),
            ("building_doorway_chance", self.building_doorway_chance as f64),
            ("building_front_chance", self.building_front_chance as f64),
            ("building_without_loot_chance", self.building_without_loot_chance as f64),
            ("park_chance", self.park_chance),
            ("fountain_chance", self.fountain_chance as f64),
            ("corridor_chance", self.corridor_chance as f64),
            ("bridge_chance", self.bridge_chance as f64),
            ("railway_dungeon_chance", self.railway_dungeon_chance as f64),
            ("ruin_chance", self.ruin_chance as f64),
            ("ruin_max_level_percent", self.ruin_max_level_percent as f64),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResolveError::InvalidProfile(format!(
                    "{} must be within 0..1, got {}",
                    name, value
                )));
            }
        }
        if self.ruin_min_level_percent > self.ruin_max_level_percent {
            return Err(ResolveError::InvalidProfile(
                "ruin_min_level_percent exceeds ruin_max_level_percent".to_string(),
            ));
        }
        if self.building_min_floors < 0 || self.building_min_floors > self.building_max_floors {
            return Err(ResolveError::InvalidProfile(format!(
                "building floors range {}..{} is invalid",
                self.building_min_floors, self.building_max_floors
            )));
        }
        if self.building_min_cellars < 0 || self.building_max_cellars < 0 {
            return Err(ResolveError::InvalidProfile("cellar counts must not be negative".to_string()));
        }
        if self.building_min_floors_chance < 1.0 || self.building_max_floors_chance < self.building_min_floors_chance {
            return Err(ResolveError::InvalidProfile(format!(
                "floor chances {}..{} are invalid",
                self.building_min_floors_chance, self.building_max_floors_chance
            )));
        }
        let levels = [
            self.city_level0_height,
            self.city_level1_height,
            self.city_level2_height,
            self.city_level3_height,
        ];
        if levels.windows(2).any(|w| w[0] > w[1]) {
            return Err(ResolveError::InvalidProfile("city level heights must be ascending".to_string()));
        }
        if self.terrain_fix_lower_min_offset > self.terrain_fix_lower_max_offset
            || self.terrain_fix_upper_min_offset > self.terrain_fix_upper_max_offset
        {
            return Err(ResolveError::InvalidProfile("terrain fix offset ranges are inverted".to_string()));
        }
        Ok(())
    }

    /// Bucket a terrain height into a city level (0..=4).
    pub fn level_for_height(&self, height: i32) -> i32 {
        if height < self.city_level0_height {
            0
        } else if height < self.city_level1_height {
            1
        } else if height < self.city_level2_height {
            2
        } else if height < self.city_level3_height {
            3
        } else {
            4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        let profile = Profile::default();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.landscape_type, LandscapeType::Default);
        assert_eq!(profile.ground_level, 71);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let profile = Profile::from_json_str(r#"{ "city_threshold": 0.5, "landscape_type": "floating" }"#).unwrap();
        assert_eq!(profile.city_threshold, 0.5);
        assert!(profile.is_floating());
        assert_eq!(profile.building_max_cellars, Profile::default().building_max_cellars);
    }

    #[test]
    fn test_out_of_range_chance_rejected() {
        let result = Profile::from_json_str(r#"{ "bridge_chance": 1.5 }"#);
        assert!(matches!(result, Err(ResolveError::InvalidProfile(_))));
    }

    #[test]
    fn test_level_for_height() {
        let profile = Profile::default();
        assert_eq!(profile.level_for_height(60), 0);
        assert_eq!(profile.level_for_height(75), 1);
        assert_eq!(profile.level_for_height(90), 2);
        assert_eq!(profile.level_for_height(98), 3);
        assert_eq!(profile.level_for_height(200), 4);
    }
}
