//! # Boss Floor
//!
//! Fixed perimeter-and-fill layout spanning the whole map.

use crate::world::{GridHooks, GridPos, MacroGrid};
use log::{debug, info};

/// Number of archetypes a boss layout needs.
pub const BOSS_ROOM_COUNT: usize = 9;

impl<H: GridHooks> MacroGrid<H> {
    /// Lays out a boss floor from the catalog's nine boss archetypes.
    ///
    /// Corners get the corner rooms, the rest of each map edge gets that
    /// edge's room and the interior is filled with the last one. Any previous
    /// generation is destroyed first. A catalog listing fewer than nine boss
    /// archetypes places nothing and returns `false`; the previous generation
    /// is left alone.
    pub fn generate_boss_room(&mut self) -> bool {
        if self.catalog.boss.len() < BOSS_ROOM_COUNT {
            debug!(
                "Boss layout needs {} archetypes, catalog has {}",
                BOSS_ROOM_COUNT,
                self.catalog.boss.len()
            );
            return false;
        }
        if self.room_count() > 0 {
            self.destroy_generation();
        }

        let top = self.height() as i32 - 1;
        let right = self.width() as i32 - 1;
        let boss = self.catalog.boss.clone();
        for index in 0..self.flat_size() {
            let Some(position) = self.flat_to_grid_index(index) else {
                continue;
            };
            let slot = boss_slot(position, top, right);
            self.add_room(position, boss[slot]);
        }

        info!("Generated boss floor with {} rooms", self.room_count());
        true
    }
}

/// Which of the nine boss archetypes belongs at `position`.
fn boss_slot(position: GridPos, top: i32, right: i32) -> usize {
    match (position.x, position.y) {
        (0, 0) => 0,
        (0, y) if y == right => 1,
        (x, 0) if x == top => 2,
        (x, y) if x == top && y == right => 3,
        (x, _) if x == top => 4,
        (0, _) => 5,
        (_, y) if y == right => 6,
        (_, 0) => 7,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GenerationConfig, RoomCatalog};
    use crate::world::{Cardinal, TileGraph};

    fn boss_grid() -> MacroGrid {
        let mut config = GenerationConfig::for_testing(8);
        config.map_width = 4;
        config.map_height = 3;
        MacroGrid::new(config, RoomCatalog::standard()).unwrap()
    }

    #[test]
    fn test_boss_slots() {
        assert_eq!(boss_slot(GridPos::new(0, 0), 2, 3), 0);
        assert_eq!(boss_slot(GridPos::new(0, 3), 2, 3), 1);
        assert_eq!(boss_slot(GridPos::new(2, 0), 2, 3), 2);
        assert_eq!(boss_slot(GridPos::new(2, 3), 2, 3), 3);
        assert_eq!(boss_slot(GridPos::new(2, 1), 2, 3), 4);
        assert_eq!(boss_slot(GridPos::new(0, 2), 2, 3), 5);
        assert_eq!(boss_slot(GridPos::new(1, 3), 2, 3), 6);
        assert_eq!(boss_slot(GridPos::new(1, 0), 2, 3), 7);
        assert_eq!(boss_slot(GridPos::new(1, 1), 2, 3), 8);
    }

    #[test]
    fn test_boss_layout_fills_map() {
        let mut grid = boss_grid();
        assert!(grid.generate_boss_room());
        assert_eq!(grid.room_count(), 12);

        let catalog = grid.catalog.clone();
        assert_eq!(grid.room(GridPos::new(0, 0)).unwrap().archetype, catalog.boss[0]);
        assert_eq!(grid.room(GridPos::new(2, 3)).unwrap().archetype, catalog.boss[3]);
        assert_eq!(grid.room(GridPos::new(1, 1)).unwrap().archetype, catalog.boss[8]);

        for room in grid.rooms() {
            for direction in Cardinal::ALL {
                let inside = grid.is_valid_space(room.position.step(direction));
                assert_eq!(room.is_valid_cardinal(direction), inside, "{:?}", room.position);
            }
        }
    }

    #[test]
    fn test_boss_floor_is_connected() {
        let mut grid = boss_grid();
        grid.generate_boss_room();
        let start = grid.starter_tile().unwrap();
        assert_eq!(start.room, grid.room(GridPos::new(0, 0)).unwrap().index);

        let far = grid.tile_at(GridPos::new(2, 3), GridPos::new(7, 7)).unwrap().id;
        assert!(grid.is_reachable(start, far));
        assert!(grid.tile(far).is_some());
    }

    #[test]
    fn test_short_catalog_places_nothing() {
        let mut grid = boss_grid();
        grid.catalog.boss.truncate(8);
        assert!(!grid.generate_boss_room());
        assert_eq!(grid.room_count(), 0);
    }
}
