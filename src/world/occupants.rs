//! # Occupants
//!
//! Anything that stands on a tile: the player, enemies, the tormentor and the
//! eyes. The macro grid keeps the records; tiles only hold the occupant id.
//!
//! Also covers the room-level population rules: initial enemy spawns, timed
//! respawns, eye placement and despawning enemies far from the player.

use crate::world::{
    EnemyType, GridHooks, GridPos, MacroGrid, OccupantId, Room, TileGraph, TileId, WorldPos,
};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of thing an occupant is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupantKind {
    Player,
    Enemy {
        enemy_type: EnemyType,
        /// Flat index of the room that spawned it
        origin_room: Option<usize>,
    },
    Tormentor,
    /// Immovable key object; its tile is closed to pathing
    Eye,
}

/// Something standing on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: OccupantId,
    pub kind: OccupantKind,
    pub tile: TileId,
}

impl Occupant {
    pub fn is_player(&self) -> bool {
        matches!(self.kind, OccupantKind::Player)
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, OccupantKind::Enemy { .. })
    }
}

impl<H: GridHooks> MacroGrid<H> {
    /// Looks up an occupant.
    pub fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(&id)
    }

    /// The occupant standing on a tile.
    pub fn occupant_at(&self, tile: TileId) -> Option<&Occupant> {
        self.tile(tile)?.occupant.and_then(|id| self.occupant(id))
    }

    /// All occupants in no particular order.
    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.occupants.values()
    }

    /// The player, if one has been placed.
    pub fn player(&self) -> Option<&Occupant> {
        self.player.and_then(|id| self.occupant(id))
    }

    fn player_world_position(&self) -> Option<WorldPos> {
        let player = self.player()?;
        Some(self.tile(player.tile)?.world_position)
    }

    /// Places a new occupant on a free tile.
    ///
    /// Refuses tiles that are missing or already occupied, and refuses a
    /// second player.
    pub fn spawn_occupant(&mut self, kind: OccupantKind, tile: TileId) -> Option<OccupantId> {
        if kind == OccupantKind::Player && self.player.is_some() {
            warn!("spawn_occupant: a player already exists");
            return None;
        }
        let target = self.tile_mut(tile)?;
        if target.is_occupied() {
            return None;
        }

        let id = Uuid::new_v4();
        target.occupant = Some(id);
        if kind == OccupantKind::Player {
            self.player = Some(id);
        }

        let occupant = Occupant { id, kind, tile };
        self.hooks.on_occupant_spawned(&occupant);
        self.hooks.on_tile_entered(&occupant, tile);
        self.occupants.insert(id, occupant);
        Some(id)
    }

    /// Moves an occupant onto a free tile, clearing the one it left.
    pub fn move_occupant(&mut self, id: OccupantId, to: TileId) -> bool {
        let Some(from) = self.occupant(id).map(|occupant| occupant.tile) else {
            return false;
        };
        match self.tile(to) {
            Some(tile) if tile.occupant.is_none() || tile.occupant == Some(id) => {}
            _ => return false,
        }

        if let Some(tile) = self.tile_mut(from) {
            if tile.occupant == Some(id) {
                tile.occupant = None;
            }
        }
        if let Some(tile) = self.tile_mut(to) {
            tile.occupant = Some(id);
        }
        if let Some(occupant) = self.occupants.get_mut(&id) {
            occupant.tile = to;
            self.hooks.on_tile_entered(occupant, to);
        }
        true
    }

    /// Puts the player on `tile`, creating the player if needed.
    pub fn set_player_location(&mut self, tile: TileId) -> Option<OccupantId> {
        match self.player {
            Some(player) => self.move_occupant(player, tile).then_some(player),
            None => self.spawn_occupant(OccupantKind::Player, tile),
        }
    }

    /// Takes an occupant off the grid.
    pub fn remove_occupant(&mut self, id: OccupantId) -> Option<Occupant> {
        let occupant = self.occupants.remove(&id)?;
        if let Some(tile) = self.tile_mut(occupant.tile) {
            if tile.occupant == Some(id) {
                tile.occupant = None;
            }
        }
        if self.player == Some(id) {
            self.player = None;
        }
        Some(occupant)
    }

    /// Removes a dead occupant. An enemy's origin room queues a respawn.
    pub fn kill_occupant(&mut self, id: OccupantId) -> Option<Occupant> {
        let occupant = self.remove_occupant(id)?;
        if let OccupantKind::Enemy { origin_room, .. } = &occupant.kind {
            if let Some(room) = origin_room.and_then(|index| self.room_by_index_mut(index)) {
                room.respawn.pending += 1;
            }
            let room = origin_room
                .and_then(|index| self.rooms.get(index))
                .and_then(Option::as_ref);
            self.hooks.on_enemy_death(room, &occupant);
        }
        Some(occupant)
    }

    /// Spawns a room's starting enemies.
    ///
    /// Picks a random count between the room's minimum and maximum, shuffles
    /// the spawn points and spawns on the first `count` of them, skipping
    /// any that are already occupied.
    pub fn spawn_enemies(&mut self, room_index: usize) -> usize {
        let Some(room) = self.room_by_index(room_index) else {
            return 0;
        };
        let config = room.respawn.config.clone();
        let mut spawn_points = room.spawn_points.clone();
        let low = config.spawns_minimum.min(config.spawns_maximum);
        let high = config.spawns_minimum.max(config.spawns_maximum);

        let count = self.rng.gen_range(low..=high);
        spawn_points.shuffle(&mut self.rng);

        let mut spawned = 0;
        for spawn in spawn_points.into_iter().take(count) {
            let Some(tile) = Self::room_tile_id(room_index, spawn.spawn) else {
                continue;
            };
            let kind = OccupantKind::Enemy {
                enemy_type: spawn.enemy_type,
                origin_room: Some(room_index),
            };
            if self.spawn_occupant(kind, tile).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    /// Spawns the starting enemies of every room.
    pub fn spawn_all_enemies(&mut self) -> usize {
        let indices: Vec<usize> = self.rooms().map(|room| room.index).collect();
        let spawned = indices
            .into_iter()
            .map(|index| self.spawn_enemies(index))
            .sum();
        info!("Spawned {} enemies", spawned);
        spawned
    }

    /// Advances every room's respawn timer by `delta` seconds.
    ///
    /// A room whose timer runs out respawns pending enemies at shuffled spawn
    /// points that are free and at least the room's minimum distance from the
    /// player. Nothing respawns while there is no player. The timer then
    /// restarts, shorter while enemies are still pending.
    pub fn tick_respawns(&mut self, delta: f32) -> usize {
        let indices: Vec<usize> = self.rooms().map(|room| room.index).collect();
        let player_position = self.player_world_position();
        let mut spawned = 0;

        for index in indices {
            let due = self
                .room_by_index_mut(index)
                .is_some_and(|room| room.advance_respawn_timer(delta));
            if !due {
                continue;
            }

            if let Some(player_position) = player_position {
                spawned += self.respawn_room(index, player_position);
            }
            if let Some(room) = self.room_by_index_mut(index) {
                room.reset_respawn_timer();
            }
        }
        spawned
    }

    fn respawn_room(&mut self, index: usize, player_position: WorldPos) -> usize {
        let Some(room) = self.room_by_index(index) else {
            return 0;
        };
        let min_distance = room.respawn.config.min_distance;
        let mut candidates: Vec<_> = room
            .spawn_points
            .iter()
            .map(|spawn| (spawn.clone(), room.tile_world_position(spawn.spawn)))
            .collect();
        candidates.shuffle(&mut self.rng);

        let mut spawned = 0;
        for (spawn, world) in candidates {
            let pending = self.room_by_index(index).map_or(0, |room| room.respawn.pending);
            if pending == 0 {
                break;
            }
            if world.distance_squared(player_position) < min_distance * min_distance {
                continue;
            }
            let Some(tile) = Self::room_tile_id(index, spawn.spawn) else {
                continue;
            };
            let kind = OccupantKind::Enemy {
                enemy_type: spawn.enemy_type,
                origin_room: Some(index),
            };
            if self.spawn_occupant(kind, tile).is_some() {
                if let Some(room) = self.room_by_index_mut(index) {
                    room.respawn.pending -= 1;
                }
                spawned += 1;
            }
        }
        debug!("Room {} respawned {} enemies", index, spawned);
        spawned
    }

    /// Places up to `count` eyes on registered eye spawn points.
    ///
    /// If `required_room` is given, its first eye spawn is always used. The
    /// rest are drawn at random, rejecting any closer than `spacing` to an
    /// eye already placed; every candidate is tried at most once. Each eye's
    /// tile is closed to pathing. Returns the tiles holding eyes.
    pub fn place_eyes(
        &mut self,
        count: usize,
        spacing: f32,
        required_room: Option<GridPos>,
    ) -> Vec<TileId> {
        let mut candidates: Vec<(TileId, WorldPos)> = self
            .rooms()
            .flat_map(|room| {
                room.eye_spawns.iter().filter_map(move |spawn| {
                    Self::room_tile_id(room.index, *spawn)
                        .map(|tile| (tile, room.tile_world_position(*spawn)))
                })
            })
            .collect();

        let mut placed: Vec<(TileId, WorldPos)> = Vec::new();
        let required = required_room
            .and_then(|position| self.room(position))
            .map(|room| room.index);
        if let Some(room_index) = required {
            if let Some(slot) = candidates.iter().position(|(tile, _)| tile.room == room_index) {
                let (tile, world) = candidates.swap_remove(slot);
                if placed.len() < count && self.place_eye(tile) {
                    placed.push((tile, world));
                }
            }
        }

        let spacing_squared = spacing * spacing;
        candidates.shuffle(&mut self.rng);
        while placed.len() < count && !candidates.is_empty() {
            let slot = self.rng.gen_range(0..candidates.len());
            let (tile, world) = candidates.swap_remove(slot);
            let clear = placed
                .iter()
                .all(|(_, other)| world.distance_squared(*other) >= spacing_squared);
            if clear && self.place_eye(tile) {
                placed.push((tile, world));
            }
        }

        if placed.len() < count {
            warn!("Placed only {} of {} eyes", placed.len(), count);
        }
        placed.into_iter().map(|(tile, _)| tile).collect()
    }

    fn place_eye(&mut self, tile: TileId) -> bool {
        if self.spawn_occupant(OccupantKind::Eye, tile).is_none() {
            return false;
        }
        self.permit_pathing(tile, false);
        true
    }

    /// Removes enemies farther than `distance` from the player.
    pub fn despawn_enemies(&mut self, distance: f32) -> usize {
        let Some(player_position) = self.player_world_position() else {
            return 0;
        };
        let limit = distance * distance;
        let far: Vec<OccupantId> = self
            .occupants()
            .filter(|occupant| occupant.is_enemy())
            .filter(|occupant| {
                self.tile(occupant.tile)
                    .is_some_and(|tile| tile.world_position.distance_squared(player_position) > limit)
            })
            .map(|occupant| occupant.id)
            .collect();

        for id in &far {
            self.remove_occupant(*id);
        }
        far.len()
    }

    /// Puts the player on the starter room's start marker.
    pub fn place_player_at_start(&mut self) -> Option<OccupantId> {
        let tile = self.starter_tile()?;
        self.set_player_location(tile)
    }

    fn room_tile_id(room_index: usize, position: GridPos) -> Option<TileId> {
        Room::grid_to_flat_index(position).map(|slot| TileId::new(room_index, slot))
    }
}
