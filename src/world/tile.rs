//! # Tiles
//!
//! The atomic cell of the dungeon. A tile knows its four cardinal neighbours by
//! id, whatever currently stands on it, and how large an actor may stand
//! centred on it.
//!
//! Neighbourhood queries (capacity checks, the 8-neighbourhood) need to follow
//! links into other tiles, possibly in other rooms, so they live on the
//! [`TileGraph`] trait rather than on [`Tile`] itself.

use crate::config::{LARGE_SPACE, SMALL_SPACE};
use crate::world::{room_tile_to_world, Cardinal, GridPos, TileId, WorldPos};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of anything that can stand on a tile.
pub type OccupantId = Uuid;

/// A single cell of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Where this tile lives in the macro grid arena
    pub id: TileId,
    /// Position inside the owning room
    pub position: GridPos,
    /// Centre of the tile in world space
    pub world_position: WorldPos,
    /// Neighbour links indexed by [`Cardinal::index`]
    pub connections: [Option<TileId>; 4],
    /// Whatever currently stands here
    pub occupant: Option<OccupantId>,
    /// Tile exists but must never be routed through
    pub pathing_ignore: bool,
    /// Largest actor footprint that fits here, 1 or 3
    pub available_space: u8,
}

impl Tile {
    /// Creates an unlinked tile at `position` inside the room at `room_position`.
    pub fn new(id: TileId, room_position: GridPos, position: GridPos) -> Self {
        Self {
            id,
            position,
            world_position: room_tile_to_world(room_position, position),
            connections: [None; 4],
            occupant: None,
            pathing_ignore: false,
            available_space: SMALL_SPACE,
        }
    }

    /// The tile linked in `direction`, if any.
    pub fn connection(&self, direction: Cardinal) -> Option<TileId> {
        self.connections[direction.index()]
    }

    /// Checks if anything stands on this tile.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Checks if an actor of footprint `size` could stand here.
    pub fn can_fit(&self, size: u8) -> bool {
        !self.pathing_ignore && self.available_space >= size
    }

    /// Squared world distance between the centres of two tiles.
    pub fn squared_distance_to(&self, other: &Tile) -> f32 {
        self.world_position.distance_squared(other.world_position)
    }

    /// The four cardinals in a random order.
    pub fn random_directions<R: Rng + ?Sized>(rng: &mut R) -> [Cardinal; 4] {
        let mut directions = Cardinal::ALL;
        directions.shuffle(rng);
        directions
    }
}

/// Read access to a set of linked tiles.
///
/// Implementors only provide [`TileGraph::tile`]; all neighbourhood queries are
/// derived from it by following links.
pub trait TileGraph {
    /// Looks up a tile by id.
    fn tile(&self, id: TileId) -> Option<&Tile>;

    /// The tile linked to `id` in `direction`.
    fn neighbor(&self, id: TileId, direction: Cardinal) -> Option<&Tile> {
        self.tile(id)?
            .connection(direction)
            .and_then(|next| self.tile(next))
    }

    /// Checks that the tile a link points at exists and is routable.
    fn is_open(&self, id: Option<TileId>) -> bool {
        id.and_then(|id| self.tile(id))
            .map(|tile| !tile.pathing_ignore)
            .unwrap_or(false)
    }

    /// Checks whether a 3×3 actor could stand centred on `id`.
    ///
    /// All four cardinal neighbours must exist and be routable, and the North
    /// and South neighbours must each have routable East and West neighbours.
    fn check_surrounding_tiles(&self, id: TileId) -> bool {
        let Some(tile) = self.tile(id) else {
            return false;
        };

        for direction in Cardinal::ALL {
            let link = tile.connection(direction);
            if !self.is_open(link) {
                return false;
            }

            if matches!(direction, Cardinal::North | Cardinal::South) {
                let Some(side) = link.and_then(|link| self.tile(link)) else {
                    return false;
                };
                if !self.is_open(side.connection(Cardinal::East))
                    || !self.is_open(side.connection(Cardinal::West))
                {
                    return false;
                }
            }
        }
        true
    }

    /// The capacity `id` should have given its current neighbourhood.
    fn computed_space(&self, id: TileId) -> u8 {
        if self.check_surrounding_tiles(id) {
            LARGE_SPACE
        } else {
            SMALL_SPACE
        }
    }

    /// The 8-neighbourhood of `id` in the order N, E, S, W, NW, NE, SE, SW.
    ///
    /// Diagonals are discovered through the cardinal neighbours, so a diagonal
    /// is only found when at least one cardinal path to it exists. Missing
    /// entries are `None`.
    fn surrounding_tiles(&self, id: TileId) -> [Option<TileId>; 8] {
        let mut out = [None; 8];
        let Some(tile) = self.tile(id) else {
            return out;
        };

        let mut north_west = None;
        let mut north_east = None;
        let mut south_east = None;
        let mut south_west = None;

        for direction in Cardinal::ALL {
            let link = tile.connection(direction);
            out[direction.index()] = link;

            let Some(current) = link.and_then(|link| self.tile(link)) else {
                continue;
            };
            let west = current.connection(Cardinal::West);
            let east = current.connection(Cardinal::East);
            let north = current.connection(Cardinal::North);
            let south = current.connection(Cardinal::South);

            match direction {
                Cardinal::North => {
                    north_west = north_west.or(west);
                    north_east = north_east.or(east);
                }
                Cardinal::South => {
                    south_west = south_west.or(west);
                    south_east = south_east.or(east);
                }
                Cardinal::East => {
                    north_east = north_east.or(north);
                    south_east = south_east.or(south);
                }
                Cardinal::West => {
                    north_west = north_west.or(north);
                    south_west = south_west.or(south);
                }
            }
        }

        out[4] = north_west;
        out[5] = north_east;
        out[6] = south_east;
        out[7] = south_west;
        out
    }
}
