//! # World Module
//!
//! The tile graph: coordinates, tiles, rooms, the macro grid that owns them,
//! occupants standing on tiles, and the pathfinder that walks the graph.
//!
//! Two coordinate spaces are used throughout:
//! - **Grid space**: integer positions of rooms on the macro grid, or of tiles
//!   inside a room. North is `+x` and East is `+y` in both.
//! - **World space**: continuous positions. Room `(x, y)` covers
//!   `[x * 1500, (x + 1) * 1500)` on the first axis and likewise on the second.

pub mod hooks;
pub mod macro_grid;
pub mod occupants;
pub mod pathing;
pub mod room;
pub mod summary;
pub mod texture;
pub mod tile;

pub use hooks::*;
pub use macro_grid::*;
pub use occupants::*;
pub use pathing::*;
pub use room::*;
pub use summary::*;
pub use texture::*;
pub use tile::*;

use crate::config::{GRID_EDGE_LENGTH, ROOM_POSITION_SCALAR, TILE_SEPARATION};
use serde::{Deserialize, Serialize};

/// An integer coordinate on the macro grid or inside a room.
///
/// Positions are allowed to be negative or past the grid edge; every lookup
/// checks bounds and treats such positions as empty.
///
/// # Examples
///
/// ```
/// use tilecrawl::{Cardinal, GridPos};
///
/// let pos = GridPos::new(3, 4);
/// assert_eq!(pos.step(Cardinal::North), GridPos::new(4, 4));
/// assert_eq!(pos.step(Cardinal::West), GridPos::new(3, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    /// Creates a new grid position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring position one step in `direction`.
    pub fn step(self, direction: Cardinal) -> Self {
        self + direction.offset()
    }

    /// Checks whether this position addresses a tile slot inside a room.
    pub fn is_in_room(self) -> bool {
        let edge = GRID_EDGE_LENGTH as i32;
        self.x >= 0 && self.y >= 0 && self.x < edge && self.y < edge
    }

    /// Closest cardinal direction from this position towards `other`.
    pub fn direction_to(self, other: GridPos) -> Cardinal {
        crate::utils::closest_direction(
            (self.x as f32, self.y as f32),
            (other.x as f32, other.y as f32),
        )
    }
}

impl std::ops::Add for GridPos {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for GridPos {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A continuous position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPos {
    /// Creates a new world position.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another position.
    pub fn distance_squared(self, other: WorldPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// One of the four cardinal directions, indexed 0..3 clockwise from North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cardinal {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Cardinal {
    /// All four directions in index order.
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
    ];

    /// Index of this direction (North = 0, East = 1, South = 2, West = 3).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index; wraps around every four.
    pub const fn from_index(index: usize) -> Cardinal {
        Self::ALL[index % 4]
    }

    /// Rotates clockwise by `steps`, which may be negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::Cardinal;
    ///
    /// assert_eq!(Cardinal::North.rotate(2), Cardinal::South);
    /// assert_eq!(Cardinal::East.rotate(-3), Cardinal::South);
    /// ```
    pub fn rotate(self, steps: i32) -> Cardinal {
        Self::from_index((self.index() as i32 + steps).rem_euclid(4) as usize)
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Cardinal {
        self.rotate(2)
    }

    /// Number of clockwise steps from `from` to `self`, in `0..4`.
    pub fn relative_to(self, from: Cardinal) -> usize {
        (self.index() + 4 - from.index()) % 4
    }

    /// Grid delta of one step in this direction.
    pub const fn offset(self) -> GridPos {
        match self {
            Cardinal::North => GridPos::new(1, 0),
            Cardinal::East => GridPos::new(0, 1),
            Cardinal::South => GridPos::new(-1, 0),
            Cardinal::West => GridPos::new(0, -1),
        }
    }
}

/// Identifies a tile by the flat index of its room on the macro grid and its
/// flat index inside that room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub room: usize,
    pub tile: usize,
}

impl TileId {
    /// Creates a new tile id.
    pub const fn new(room: usize, tile: usize) -> Self {
        Self { room, tile }
    }
}

/// World position of the corner of the room at `position`.
pub fn room_origin(position: GridPos) -> WorldPos {
    WorldPos::new(
        position.x as f32 * ROOM_POSITION_SCALAR,
        position.y as f32 * ROOM_POSITION_SCALAR,
        0.0,
    )
}

/// World position of the centre of the room at `position`.
pub fn grid_to_world(position: GridPos) -> WorldPos {
    let origin = room_origin(position);
    let half = ROOM_POSITION_SCALAR / 2.0;
    WorldPos::new(origin.x + half, origin.y + half, 0.0)
}

/// World position of the centre of tile `tile` inside the room at `room`.
pub fn room_tile_to_world(room: GridPos, tile: GridPos) -> WorldPos {
    let origin = room_origin(room);
    let half = TILE_SEPARATION / 2.0;
    WorldPos::new(
        origin.x + tile.x as f32 * TILE_SEPARATION + half,
        origin.y + tile.y as f32 * TILE_SEPARATION + half,
        origin.z,
    )
}

/// Macro grid position of the room covering a world position.
pub fn world_to_room_position(position: WorldPos) -> GridPos {
    GridPos::new(
        (position.x / ROOM_POSITION_SCALAR).floor() as i32,
        (position.y / ROOM_POSITION_SCALAR).floor() as i32,
    )
}

/// Tile position, inside its room, of the tile covering a world position.
///
/// Negative world coordinates produce negative tile positions, which never
/// address a tile.
pub fn world_to_tile_position(position: WorldPos) -> GridPos {
    GridPos::new(
        ((position.x % ROOM_POSITION_SCALAR) / TILE_SEPARATION).floor() as i32,
        ((position.y % ROOM_POSITION_SCALAR) / TILE_SEPARATION).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_rotation_wraps_both_ways() {
        assert_eq!(Cardinal::North.rotate(2), Cardinal::South);
        assert_eq!(Cardinal::East.rotate(-3), Cardinal::South);
        assert_eq!(Cardinal::West.rotate(1), Cardinal::North);
        assert_eq!(Cardinal::North.rotate(-9), Cardinal::West);
        for dir in Cardinal::ALL {
            assert_eq!(dir.rotate(4), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn test_cardinal_relative_direction() {
        assert_eq!(Cardinal::North.relative_to(Cardinal::North), 0);
        assert_eq!(Cardinal::East.relative_to(Cardinal::North), 1);
        assert_eq!(Cardinal::North.relative_to(Cardinal::East), 3);
        assert_eq!(Cardinal::West.relative_to(Cardinal::East), 2);
    }

    #[test]
    fn test_offsets_cancel_with_opposite() {
        let origin = GridPos::new(5, 5);
        for dir in Cardinal::ALL {
            assert_eq!(origin.step(dir).step(dir.opposite()), origin);
        }
        assert_eq!(origin.step(Cardinal::North), GridPos::new(6, 5));
        assert_eq!(origin.step(Cardinal::East), GridPos::new(5, 6));
    }

    #[test]
    fn test_direction_to_uses_dominant_axis() {
        let origin = GridPos::new(0, 0);
        assert_eq!(origin.direction_to(GridPos::new(9, 1)), Cardinal::North);
        assert_eq!(origin.direction_to(GridPos::new(1, 5)), Cardinal::East);
        assert_eq!(origin.direction_to(GridPos::new(-4, 0)), Cardinal::South);
        assert_eq!(origin.direction_to(GridPos::new(0, -2)), Cardinal::West);
    }

    #[test]
    fn test_room_and_tile_world_conversions() {
        let room = GridPos::new(2, 3);
        let centre = grid_to_world(room);
        assert_eq!(centre, WorldPos::new(3750.0, 5250.0, 0.0));
        assert_eq!(world_to_room_position(centre), room);

        let tile = GridPos::new(4, 14);
        let world = room_tile_to_world(room, tile);
        assert_eq!(world, WorldPos::new(3450.0, 5950.0, 0.0));
        assert_eq!(world_to_room_position(world), room);
        assert_eq!(world_to_tile_position(world), tile);
    }

    #[test]
    fn test_negative_world_positions_never_address_tiles() {
        let world = WorldPos::new(-50.0, 20.0, 0.0);
        assert_eq!(world_to_room_position(world), GridPos::new(-1, 0));
        assert!(!world_to_tile_position(world).is_in_room());
    }

    #[test]
    fn test_distance_squared() {
        let a = WorldPos::new(0.0, 0.0, 0.0);
        let b = WorldPos::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_squared(b), 25.0);
    }
}
