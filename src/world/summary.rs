//! # Floor Summary
//!
//! A serialisable snapshot of a generated floor, used by the binary for JSON
//! output and its ASCII overview.

use crate::generation::pattern_name;
use crate::world::{GridHooks, GridPos, MacroGrid, OccupantKind};
use serde::{Deserialize, Serialize};

/// One placed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub position: GridPos,
    pub archetype: String,
    /// Open edges, e.g. `"nesw"`
    pub open: String,
    pub tiles: usize,
    /// Map glyph for the room's role
    pub glyph: char,
}

/// Snapshot of a whole floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSummary {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub rooms: Vec<RoomSummary>,
    pub enemies: usize,
    pub eyes: usize,
    pub has_player: bool,
}

impl FloorSummary {
    /// Summarises the current state of a grid.
    pub fn from_grid<H: GridHooks>(grid: &MacroGrid<H>) -> Self {
        let catalog = &grid.catalog;
        let rooms = grid
            .rooms()
            .map(|room| {
                let glyph = match room.archetype {
                    id if id == catalog.starter => 'S',
                    id if id == catalog.tutorial => 'T',
                    id if id == catalog.mural => 'M',
                    id if id == catalog.escape => 'E',
                    id if catalog.boss.contains(&id) => 'B',
                    _ => '#',
                };
                RoomSummary {
                    position: room.position,
                    archetype: catalog
                        .archetype(room.archetype)
                        .map(|a| a.name.clone())
                        .unwrap_or_default(),
                    open: pattern_name(room.valid_cardinals),
                    tiles: room.tile_count(),
                    glyph,
                }
            })
            .collect();

        let enemies = grid.occupants().filter(|o| o.is_enemy()).count();
        let eyes = grid
            .occupants()
            .filter(|o| matches!(o.kind, OccupantKind::Eye))
            .count();

        Self {
            seed: grid.config.seed,
            width: grid.width(),
            height: grid.height(),
            rooms,
            enemies,
            eyes,
            has_player: grid.player().is_some(),
        }
    }

    /// Renders the macro grid with North at the top, one glyph per room.
    ///
    /// `S` starter, `T` tutorial, `M` mural, `E` escape, `B` boss layout,
    /// `#` filler and `.` for an empty slot.
    pub fn ascii_map(&self) -> String {
        let mut cells = vec![vec!['.'; self.width]; self.height];
        for room in &self.rooms {
            let (x, y) = (room.position.x as usize, room.position.y as usize);
            if let Some(cell) = cells.get_mut(x).and_then(|row| row.get_mut(y)) {
                *cell = room.glyph;
            }
        }

        let mut map = String::with_capacity((self.width + 1) * self.height);
        for row in cells.iter().rev() {
            map.extend(row.iter());
            map.push('\n');
        }
        map
    }
}

impl<H: GridHooks> MacroGrid<H> {
    /// Snapshot of the floor.
    pub fn summary(&self) -> FloorSummary {
        FloorSummary::from_grid(self)
    }
}
