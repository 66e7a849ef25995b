//! # Room Catalog
//!
//! The set of archetypes generation can place, with the roles each one plays.

use crate::generation::{ArchetypeId, RoomArchetype, BOSS_ROOM_COUNT};
use crate::world::{Cardinal, GridPos, MapTexture, Room, TileColor};
use crate::{CrawlError, CrawlResult};
use serde::{Deserialize, Serialize};

/// All archetypes available to a floor, and which of them fill which role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomCatalog {
    pub archetypes: Vec<RoomArchetype>,
    pub starter: ArchetypeId,
    pub tutorial: ArchetypeId,
    pub mural: ArchetypeId,
    pub escape: ArchetypeId,
    /// Rooms the frontier and guaranteed path choose from
    pub filler: Vec<ArchetypeId>,
    /// Boss layout rooms: corners bl, br, tl, tr; edges North, South, East,
    /// West; interior filler
    pub boss: Vec<ArchetypeId>,
}

/// Open edges of the standard tutorial room, a North-South corridor.
pub const TUTORIAL_OPENINGS: [bool; 4] = [true, false, true, false];

/// Open edges of the standard mural room.
pub const MURAL_OPENINGS: [bool; 4] = [true; 4];

impl RoomCatalog {
    /// Looks up an archetype.
    pub fn archetype(&self, id: ArchetypeId) -> Option<&RoomArchetype> {
        self.archetypes.get(id)
    }

    /// Adds an archetype and returns its id.
    pub fn push(&mut self, archetype: RoomArchetype) -> ArchetypeId {
        self.archetypes.push(archetype);
        self.archetypes.len() - 1
    }

    /// Filler archetypes open on every edge.
    pub fn four_way_fillers(&self) -> Vec<ArchetypeId> {
        self.filler
            .iter()
            .copied()
            .filter(|id| self.archetype(*id).is_some_and(RoomArchetype::is_four_way))
            .collect()
    }

    /// Filler archetypes whose open edges are exactly `pattern`.
    pub fn fillers_matching(&self, pattern: [bool; 4]) -> Vec<ArchetypeId> {
        self.filler
            .iter()
            .copied()
            .filter(|id| self.archetype(*id).is_some_and(|a| a.matches(pattern)))
            .collect()
    }

    /// Checks that every role points at an existing archetype.
    pub fn validate(&self) -> CrawlResult<()> {
        let roles = [
            ("starter", self.starter),
            ("tutorial", self.tutorial),
            ("mural", self.mural),
            ("escape", self.escape),
        ];
        let listed = self
            .filler
            .iter()
            .map(|id| ("filler", *id))
            .chain(self.boss.iter().map(|id| ("boss", *id)));

        for (role, id) in roles.into_iter().chain(listed) {
            if self.archetype(id).is_none() {
                return Err(CrawlError::InvalidConfig(format!(
                    "{} archetype {} is not in the catalog of {}",
                    role,
                    id,
                    self.archetypes.len()
                )));
            }
        }

        if self.four_way_fillers().is_empty() {
            return Err(CrawlError::InvalidConfig(
                "catalog needs at least one four-way filler room".to_string(),
            ));
        }
        Ok(())
    }

    /// The built-in catalog.
    ///
    /// Every non-empty edge pattern has a plain filler room, and fully open
    /// rooms also come in pillared and crossroads variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::RoomCatalog;
    ///
    /// let catalog = RoomCatalog::standard();
    /// assert!(catalog.validate().is_ok());
    /// assert_eq!(catalog.boss.len(), 9);
    /// ```
    pub fn standard() -> Self {
        let mut catalog = Self {
            archetypes: Vec::new(),
            starter: 0,
            tutorial: 0,
            mural: 0,
            escape: 0,
            filler: Vec::new(),
            boss: Vec::new(),
        };

        let mut starter = shell([true, false, false, false]);
        starter.set_pixel(GridPos::new(3, 7), TileColor::PLAYER_START);
        catalog.starter = catalog.push(RoomArchetype::new(
            "starter",
            [true, false, false, false],
            starter,
        ));

        let mut tutorial = shell(TUTORIAL_OPENINGS);
        tutorial.set_pixel(GridPos::new(7, 3), TileColor::EYE_SPAWN);
        catalog.tutorial = catalog.push(RoomArchetype::new("tutorial", TUTORIAL_OPENINGS, tutorial));

        let mut mural = shell(MURAL_OPENINGS);
        mural.set_pixel(GridPos::new(7, 7), TileColor::BLOCKED);
        catalog.mural = catalog.push(RoomArchetype::new("mural", MURAL_OPENINGS, mural));

        let mut escape = shell([false, false, true, false]);
        escape.set_pixel(GridPos::new(10, 7), TileColor::TORMENTOR_SPAWN);
        catalog.escape = catalog.push(RoomArchetype::new(
            "escape",
            [false, false, true, false],
            escape,
        ));

        for mask in 1..16u8 {
            let open = pattern_from_mask(mask);
            let mut texture = shell(open);
            texture.set_pixel(GridPos::new(4, 4), TileColor::ENEMY_SPAWN);
            texture.set_pixel(GridPos::new(10, 10), TileColor::ENEMY_SPAWN);
            texture.set_pixel(GridPos::new(7, 7), TileColor::EYE_SPAWN);
            let id = catalog.push(RoomArchetype::new(
                format!("hall_{}", pattern_name(open)),
                open,
                texture,
            ));
            catalog.filler.push(id);
        }

        let mut pillars = shell([true; 4]);
        for (x, y) in [(4, 4), (4, 10), (10, 4), (10, 10)] {
            pillars.set_pixel(GridPos::new(x, y), TileColor::BLOCKED);
        }
        pillars.set_pixel(GridPos::new(7, 3), TileColor::ENEMY_SPAWN);
        pillars.set_pixel(GridPos::new(7, 11), TileColor::ENEMY_SPAWN);
        let id = catalog.push(RoomArchetype::new("pillars_nesw", [true; 4], pillars));
        catalog.filler.push(id);

        let mut crossroads = MapTexture::filled(TileColor::EMPTY);
        for x in 0..15 {
            for y in 0..15 {
                if (5..10).contains(&x) || (5..10).contains(&y) {
                    crossroads.set_pixel(GridPos::new(x, y), TileColor::FLOOR);
                }
            }
        }
        crossroads.set_pixel(GridPos::new(2, 7), TileColor::ENEMY_SPAWN);
        crossroads.set_pixel(GridPos::new(12, 7), TileColor::ENEMY_SPAWN);
        let id = catalog.push(RoomArchetype::new(
            "crossroads_nesw",
            [true; 4],
            crossroads,
        ));
        catalog.filler.push(id);

        // bl, br, tl, tr, then North, South, East, West edges, then interior
        let boss_layout: [(&str, [bool; 4]); BOSS_ROOM_COUNT] = [
            ("boss_corner_sw", [true, true, false, false]),
            ("boss_corner_se", [true, false, false, true]),
            ("boss_corner_nw", [false, true, true, false]),
            ("boss_corner_ne", [false, false, true, true]),
            ("boss_edge_n", [false, true, true, true]),
            ("boss_edge_s", [true, true, false, true]),
            ("boss_edge_e", [true, false, true, true]),
            ("boss_edge_w", [true, true, true, false]),
            ("boss_arena", [true; 4]),
        ];
        for (slot, (name, open)) in boss_layout.into_iter().enumerate() {
            let mut texture = shell(open);
            match slot {
                0 => texture.set_pixel(GridPos::new(7, 7), TileColor::PLAYER_START),
                8 => texture.set_pixel(GridPos::new(7, 7), TileColor::TORMENTOR_SPAWN),
                _ => {}
            }
            let id = catalog.push(RoomArchetype::new(name, open, texture));
            catalog.boss.push(id);
        }

        catalog
    }
}

impl Default for RoomCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Edge pattern for a 4-bit mask, bit `i` opening [`Cardinal::from_index`]`(i)`.
pub fn pattern_from_mask(mask: u8) -> [bool; 4] {
    let mut open = [false; 4];
    for dir in Cardinal::ALL {
        open[dir.index()] = mask & (1 << dir.index()) != 0;
    }
    open
}

/// Short lowercase name of an edge pattern, e.g. `"nes"`.
pub fn pattern_name(open: [bool; 4]) -> String {
    Cardinal::ALL
        .iter()
        .filter(|dir| open[dir.index()])
        .map(|dir| match dir {
            Cardinal::North => 'n',
            Cardinal::East => 'e',
            Cardinal::South => 's',
            Cardinal::West => 'w',
        })
        .collect()
}

/// A full floor with the closed edges removed.
fn shell(open: [bool; 4]) -> MapTexture {
    let mut texture = MapTexture::filled(TileColor::FLOOR);
    for dir in Cardinal::ALL {
        if !open[dir.index()] {
            for offset in 0..crate::config::GRID_EDGE_LENGTH {
                texture.set_pixel(Room::edge_position(dir, offset), TileColor::EMPTY);
            }
        }
    }
    texture
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = RoomCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.boss.len(), BOSS_ROOM_COUNT);
        assert_eq!(catalog.four_way_fillers().len(), 3);
    }

    #[test]
    fn test_every_pattern_has_a_filler() {
        let catalog = RoomCatalog::standard();
        for mask in 1..16u8 {
            let pattern = pattern_from_mask(mask);
            assert!(
                !catalog.fillers_matching(pattern).is_empty(),
                "no filler for {}",
                pattern_name(pattern)
            );
        }
        assert!(catalog.fillers_matching([false; 4]).is_empty());
    }

    #[test]
    fn test_pattern_helpers() {
        assert_eq!(pattern_from_mask(0b0101), [true, false, true, false]);
        assert_eq!(pattern_name([true, false, true, true]), "nsw");
        let names: HashSet<_> = (1..16u8).map(|m| pattern_name(pattern_from_mask(m))).collect();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn test_shell_clears_closed_edges() {
        let texture = shell([true, false, false, false]);
        assert_eq!(texture.pixel(GridPos::new(14, 7)), Some(TileColor::FLOOR));
        assert_eq!(texture.pixel(GridPos::new(0, 7)), Some(TileColor::EMPTY));
        assert_eq!(texture.pixel(GridPos::new(7, 14)), Some(TileColor::EMPTY));
        assert_eq!(texture.pixel(GridPos::new(7, 0)), Some(TileColor::EMPTY));
        assert_eq!(texture.pixel(GridPos::new(7, 7)), Some(TileColor::FLOOR));
    }

    #[test]
    fn test_validate_rejects_dangling_roles() {
        let mut catalog = RoomCatalog::standard();
        catalog.escape = 999;
        assert!(catalog.validate().is_err());

        let mut catalog = RoomCatalog::standard();
        let four_way = catalog.four_way_fillers();
        catalog.filler.retain(|id| !four_way.contains(id));
        assert!(catalog.validate().is_err());
    }
}
