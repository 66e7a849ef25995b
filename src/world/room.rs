//! # Rooms
//!
//! A room is a fixed 15×15 grid of tile slots sitting at one position of the
//! macro grid. It owns its tiles, the markers left by texture decoration
//! (spawn points, player start, tormentor and eye spawns) and its enemy respawn
//! schedule.

use crate::config::{GRID_EDGE_LENGTH, ROOM_TILE_COUNT};
use crate::generation::ArchetypeId;
use crate::world::{
    room_origin, room_tile_to_world, Cardinal, GridPos, Tile, TileGraph, TileId, WorldPos,
};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Token naming the kind of enemy a spawn point produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyType(pub String);

impl EnemyType {
    /// Creates a new enemy type token.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Default for EnemyType {
    fn default() -> Self {
        Self::new("crawler")
    }
}

/// A place inside a room where an enemy may be spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawnData {
    /// Tile position inside the room
    pub spawn: GridPos,
    /// Kind of enemy to spawn there
    pub enemy_type: EnemyType,
}

/// Tunables for how a room populates and repopulates enemies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespawnConfig {
    /// Fewest enemies spawned when the floor starts
    pub spawns_minimum: usize,
    /// Most enemies spawned when the floor starts
    pub spawns_maximum: usize,
    /// Respawns never happen closer than this to the player, in world units
    pub min_distance: f32,
    /// Seconds between respawn checks when nothing is pending
    pub interval: f32,
    /// Seconds between respawn checks while enemies are still pending
    pub awaiting_interval: f32,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            spawns_minimum: 0,
            spawns_maximum: 2,
            min_distance: 1000.0,
            interval: 45.0,
            awaiting_interval: 10.0,
        }
    }
}

/// Live respawn bookkeeping for a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespawnState {
    pub config: RespawnConfig,
    /// Seconds left until the next respawn check
    pub timer: f32,
    /// Enemies that died and are waiting to come back
    pub pending: usize,
}

impl RespawnState {
    /// Creates respawn state with the first check at a random point within
    /// one interval.
    pub fn new<R: Rng + ?Sized>(config: RespawnConfig, rng: &mut R) -> Self {
        let timer = if config.interval > 0.0 {
            rng.gen_range(0.0..config.interval)
        } else {
            0.0
        };
        Self {
            config,
            timer,
            pending: 0,
        }
    }
}

impl Default for RespawnState {
    fn default() -> Self {
        Self {
            config: RespawnConfig::default(),
            timer: 0.0,
            pending: 0,
        }
    }
}

/// A 15×15 block of tiles placed on the macro grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Flat index of this room on the macro grid
    pub index: usize,
    /// Macro grid position
    pub position: GridPos,
    /// Catalog entry this room was built from
    pub archetype: ArchetypeId,
    /// Which edges may be stitched to a neighbouring room
    pub valid_cardinals: [bool; 4],
    tiles: Vec<Option<Tile>>,
    /// Enemy spawn points registered during decoration
    pub spawn_points: Vec<EnemySpawnData>,
    /// Where the player enters the floor, if this room has it
    pub player_start: Option<GridPos>,
    /// Tormentor spawn points
    pub tormentor_spawns: Vec<GridPos>,
    /// Eye spawn points
    pub eye_spawns: Vec<GridPos>,
    pub respawn: RespawnState,
}

impl Room {
    /// Creates an empty room. Tiles are added by decoration or [`Room::add_tile`].
    pub fn new(
        index: usize,
        position: GridPos,
        archetype: ArchetypeId,
        valid_cardinals: [bool; 4],
    ) -> Self {
        Self {
            index,
            position,
            archetype,
            valid_cardinals,
            tiles: vec![None; ROOM_TILE_COUNT],
            spawn_points: Vec::new(),
            player_start: None,
            tormentor_spawns: Vec::new(),
            eye_spawns: Vec::new(),
            respawn: RespawnState::default(),
        }
    }

    /// Converts an in-room position to its flat slot index.
    pub fn grid_to_flat_index(position: GridPos) -> Option<usize> {
        if !position.is_in_room() {
            return None;
        }
        Some(position.y as usize * GRID_EDGE_LENGTH + position.x as usize)
    }

    /// Converts a flat slot index back to its in-room position.
    pub fn flat_to_grid_index(index: usize) -> Option<GridPos> {
        if index >= ROOM_TILE_COUNT {
            return None;
        }
        Some(GridPos::new(
            (index % GRID_EDGE_LENGTH) as i32,
            (index / GRID_EDGE_LENGTH) as i32,
        ))
    }

    /// Tile position along an edge. `offset` runs west to east on the North and
    /// South edges and south to north on the East and West edges.
    pub fn edge_position(direction: Cardinal, offset: usize) -> GridPos {
        let last = GRID_EDGE_LENGTH as i32 - 1;
        let offset = offset as i32;
        match direction {
            Cardinal::North => GridPos::new(last, offset),
            Cardinal::South => GridPos::new(0, offset),
            Cardinal::East => GridPos::new(offset, last),
            Cardinal::West => GridPos::new(offset, 0),
        }
    }

    /// Checks if an edge may be stitched to a neighbour.
    pub fn is_valid_cardinal(&self, direction: Cardinal) -> bool {
        self.valid_cardinals[direction.index()]
    }

    /// World position of the room's corner.
    pub fn world_origin(&self) -> WorldPos {
        room_origin(self.position)
    }

    /// World position of the centre of an in-room tile position.
    pub fn tile_world_position(&self, position: GridPos) -> WorldPos {
        room_tile_to_world(self.position, position)
    }

    /// Creates a tile at `position` and links it with its in-room neighbours.
    ///
    /// Returns the tile already present if there is one. Out-of-room positions
    /// return `None`.
    pub fn add_tile(&mut self, position: GridPos) -> Option<&Tile> {
        let slot = Self::grid_to_flat_index(position)?;
        if self.tiles[slot].is_some() {
            debug!(
                "Tile already exists at {:?} in room {:?}, returning existing tile",
                position, self.position
            );
            return self.tiles[slot].as_ref();
        }

        let id = TileId::new(self.index, slot);
        let mut tile = Tile::new(id, self.position, position);

        for direction in Cardinal::ALL {
            let Some(neighbor_slot) = Self::grid_to_flat_index(position.step(direction)) else {
                continue;
            };
            if let Some(neighbor) = self.tiles[neighbor_slot].as_mut() {
                tile.connections[direction.index()] = Some(neighbor.id);
                neighbor.connections[direction.opposite().index()] = Some(id);
            }
        }

        self.tiles[slot] = Some(tile);
        self.tiles[slot].as_ref()
    }

    /// Looks up the tile at an in-room position.
    pub fn tile(&self, position: GridPos) -> Option<&Tile> {
        Self::grid_to_flat_index(position).and_then(|slot| self.tiles[slot].as_ref())
    }

    /// Mutable lookup of the tile at an in-room position.
    pub fn tile_mut(&mut self, position: GridPos) -> Option<&mut Tile> {
        let slot = Self::grid_to_flat_index(position)?;
        self.tiles[slot].as_mut()
    }

    /// Looks up a tile by its flat slot index.
    pub fn tile_by_index(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index).and_then(Option::as_ref)
    }

    /// Mutable lookup of a tile by its flat slot index.
    pub fn tile_by_index_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index).and_then(Option::as_mut)
    }

    /// All tiles in slot order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }

    /// Number of tiles that exist in this room.
    pub fn tile_count(&self) -> usize {
        self.tiles().count()
    }

    /// A random tile able to hold an actor of footprint `size`.
    pub fn random_tile<R: Rng + ?Sized>(&self, size: u8, rng: &mut R) -> Option<&Tile> {
        let mut slots: Vec<usize> = (0..ROOM_TILE_COUNT).collect();
        slots.shuffle(rng);
        slots
            .into_iter()
            .filter_map(|slot| self.tile_by_index(slot))
            .find(|tile| tile.available_space >= size)
    }

    /// Writes precomputed capacities back onto tiles.
    pub fn apply_sizes(&mut self, sizes: &[(usize, u8)]) {
        for &(slot, space) in sizes {
            if let Some(tile) = self.tile_by_index_mut(slot) {
                tile.available_space = space;
            }
        }
    }

    /// Counts the respawn timer down by `delta` seconds.
    ///
    /// Returns `true` when a respawn check is due.
    pub fn advance_respawn_timer(&mut self, delta: f32) -> bool {
        self.respawn.timer -= delta;
        self.respawn.timer <= 0.0
    }

    /// Restarts the respawn timer after a check, using the shorter interval
    /// while enemies are still pending.
    pub fn reset_respawn_timer(&mut self) {
        self.respawn.timer = if self.respawn.pending > 0 {
            self.respawn.config.awaiting_interval
        } else {
            self.respawn.config.interval
        };
    }
}

impl TileGraph for Room {
    /// Only tiles owned by this room resolve; links into other rooms do not.
    fn tile(&self, id: TileId) -> Option<&Tile> {
        if id.room != self.index {
            return None;
        }
        self.tile_by_index(id.tile)
    }
}
