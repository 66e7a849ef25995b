//! # Grid Hooks
//!
//! Extension points the macro grid calls into at fixed moments. Gameplay code
//! implements [`GridHooks`] to attach visuals, scripted setup or scoring; the
//! grid only guarantees *when* each hook runs, never what it does.

use crate::world::{Occupant, Room, TileId};

/// Callbacks invoked by [`crate::MacroGrid`] during generation and play.
///
/// Every method has an empty default so implementors only override what they
/// need.
pub trait GridHooks {
    /// A room was decorated from its texture, before it is stitched to its
    /// neighbours.
    fn on_map_load(&mut self, _room: &Room) {}

    /// A room was placed, stitched and had its tile capacities assigned.
    fn on_map_finalization(&mut self, _room: &Room) {}

    /// An occupant was placed on the grid for the first time.
    fn on_occupant_spawned(&mut self, _occupant: &Occupant) {}

    /// An occupant moved onto (or spawned on) a tile.
    fn on_tile_entered(&mut self, _occupant: &Occupant, _tile: TileId) {}

    /// An enemy died. `room` is the room it originally spawned in.
    fn on_enemy_death(&mut self, _room: Option<&Room>, _occupant: &Occupant) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl GridHooks for NoHooks {}

/// Records every hook invocation in order. Useful in tests and for replaying
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingHooks {
    pub events: Vec<HookEvent>,
}

/// A single recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    MapLoad(usize),
    MapFinalization(usize),
    OccupantSpawned(crate::world::OccupantId),
    TileEntered(crate::world::OccupantId, TileId),
    EnemyDeath(Option<usize>, crate::world::OccupantId),
}

impl GridHooks for RecordingHooks {
    fn on_map_load(&mut self, room: &Room) {
        self.events.push(HookEvent::MapLoad(room.index));
    }

    fn on_map_finalization(&mut self, room: &Room) {
        self.events.push(HookEvent::MapFinalization(room.index));
    }

    fn on_occupant_spawned(&mut self, occupant: &Occupant) {
        self.events.push(HookEvent::OccupantSpawned(occupant.id));
    }

    fn on_tile_entered(&mut self, occupant: &Occupant, tile: TileId) {
        self.events.push(HookEvent::TileEntered(occupant.id, tile));
    }

    fn on_enemy_death(&mut self, room: Option<&Room>, occupant: &Occupant) {
        self.events
            .push(HookEvent::EnemyDeath(room.map(|r| r.index), occupant.id));
    }
}
