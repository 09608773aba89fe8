//! Street stairs between city levels.
//!
//! A street chunk one level below a neighbouring street gets a stair toward
//! it. Stairs next to each other compete on their drawn priority so only the
//! highest of a cluster is built.

use crate::coords::Direction;
use crate::error::Result;

use super::descriptor::StreetType;
use super::neighbors::ChunkRef;

impl<'r> ChunkRef<'r> {
    /// Direction of a street one level up that a stair here could reach.
    pub fn stair_direction(&self) -> Result<Option<Direction>> {
        if let Some(v) = self.memo.stair_direction.get() {
            return Ok(v);
        }
        let v = self.resolve_stair_direction()?;
        self.memo.stair_direction.set(v);
        Ok(v)
    }

    fn resolve_stair_direction(&self) -> Result<Option<Direction>> {
        if self.street_type == StreetType::Park || self.has_building || !self.is_city {
            return Ok(None);
        }
        for direction in Direction::ALL {
            let n = self.neighbor(direction)?;
            if self.city_level == n.city_level - 1 && !n.has_building && n.is_city {
                return Ok(Some(direction));
            }
        }
        Ok(None)
    }

    /// Stair that is actually built: none when a surrounding stair
    /// candidate has a strictly higher priority.
    pub fn actual_stair_direction(&self) -> Result<Option<Direction>> {
        if let Some(v) = self.memo.actual_stair_direction.get() {
            return Ok(v);
        }
        let mut v = self.stair_direction()?;
        if v.is_some() {
            for adjacent in self.ring()? {
                if adjacent.stair_direction()?.is_some() && adjacent.stair_priority > self.stair_priority {
                    v = None;
                    break;
                }
            }
        }
        self.memo.actual_stair_direction.set(v);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use crate::city::testkit::TestWorld;
    use crate::coords::Direction;

    fn terrace() -> TestWorld {
        // Level 0 at x <= 0, level 1 at x >= 1
        let mut world = TestWorld::new(51).city_everywhere(0.9).tune(|p| {
            p.building_chance = 0.0;
            p.park_chance = 0.0;
        });
        for x in 1..4 {
            for z in -3..4 {
                world = world.height_at(x, z, 80);
            }
        }
        world
    }

    #[test]
    fn test_stair_toward_higher_street() {
        let resolver = terrace().build();
        let ctx = resolver.context();
        let low = resolver.descriptor(ctx.coord(0, 0)).unwrap();
        assert_eq!(low.city_level, 0);
        assert_eq!(low.stair_direction().unwrap(), Some(Direction::XMax));
        let high = resolver.descriptor(ctx.coord(1, 0)).unwrap();
        assert_eq!(high.stair_direction().unwrap(), None);
        let far = resolver.descriptor(ctx.coord(-2, 0)).unwrap();
        assert_eq!(far.stair_direction().unwrap(), None);
    }

    #[test]
    fn test_only_highest_priority_stair_is_built() {
        let resolver = terrace().build();
        let ctx = resolver.context();
        let column: Vec<_> = (-3..4).map(|z| resolver.descriptor(ctx.coord(0, z)).unwrap()).collect();
        for (i, d) in column.iter().enumerate().skip(1).take(5) {
            let built = d.actual_stair_direction().unwrap().is_some();
            let beaten = [&column[i - 1], &column[i + 1]]
                .iter()
                .any(|n| n.stair_priority > d.stair_priority);
            assert_eq!(built, !beaten, "stair at z={}", d.coord.z);
        }
    }

    #[test]
    fn test_buildings_have_no_stairs() {
        let resolver = terrace().tune(|p| p.building_chance = 1.0).build();
        let d = resolver.descriptor(resolver.context().coord(0, 0)).unwrap();
        assert!(d.has_building);
        assert_eq!(d.stair_direction().unwrap(), None);
        assert_eq!(d.actual_stair_direction().unwrap(), None);
    }
}
