//! # Room Textures
//!
//! Rooms are authored as small colour images. Each pixel colour is a key into
//! a [`ColorCallbackRegistry`]; decorating a room runs the matching handler
//! once per pixel, which is how tiles, scenery and spawn markers get created.
//!
//! For convenience textures can be written as 15 rows of ASCII glyphs:
//!
//! | glyph | colour | meaning |
//! |-------|--------|---------|
//! | `.` | [`TileColor::FLOOR`] | walkable tile |
//! | `x` | [`TileColor::BLOCKED`] | tile blocked by scenery |
//! | `e` | [`TileColor::ENEMY_SPAWN`] | tile with an enemy spawn point |
//! | `s` | [`TileColor::PLAYER_START`] | tile where the player enters |
//! | `t` | [`TileColor::TORMENTOR_SPAWN`] | tile where the boss may appear |
//! | `y` | [`TileColor::EYE_SPAWN`] | tile that may hold an eye |
//! | `#` or space | [`TileColor::EMPTY`] | no tile |
//!
//! Row 0 is the northern edge of the room and columns run west to east.

use crate::config::GRID_EDGE_LENGTH;
use crate::world::{EnemySpawnData, EnemyType, GridPos, Room};
use crate::{CrawlError, CrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An RGB pixel colour used as a decoration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TileColor {
    pub const EMPTY: TileColor = TileColor::new(0, 0, 0);
    pub const FLOOR: TileColor = TileColor::new(255, 255, 255);
    pub const BLOCKED: TileColor = TileColor::new(128, 128, 128);
    pub const ENEMY_SPAWN: TileColor = TileColor::new(255, 0, 0);
    pub const PLAYER_START: TileColor = TileColor::new(0, 255, 0);
    pub const TORMENTOR_SPAWN: TileColor = TileColor::new(255, 0, 255);
    pub const EYE_SPAWN: TileColor = TileColor::new(0, 0, 255);

    /// Creates a colour from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour for an ASCII texture glyph.
    pub fn from_glyph(glyph: char) -> Option<TileColor> {
        match glyph {
            '.' => Some(Self::FLOOR),
            'x' => Some(Self::BLOCKED),
            'e' => Some(Self::ENEMY_SPAWN),
            's' => Some(Self::PLAYER_START),
            't' => Some(Self::TORMENTOR_SPAWN),
            'y' => Some(Self::EYE_SPAWN),
            '#' | ' ' => Some(Self::EMPTY),
            _ => None,
        }
    }
}

/// A 15×15 colour image describing one room.
///
/// Pixels are stored by tile position, `pixels[x][y]`, so no flipping is
/// needed when decorating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTexture {
    pixels: [[TileColor; GRID_EDGE_LENGTH]; GRID_EDGE_LENGTH],
}

impl MapTexture {
    /// A texture where every pixel has the same colour.
    pub fn filled(color: TileColor) -> Self {
        Self {
            pixels: [[color; GRID_EDGE_LENGTH]; GRID_EDGE_LENGTH],
        }
    }

    /// Parses a texture from 15 rows of 15 glyphs, northern row first.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::{GridPos, MapTexture, TileColor};
    ///
    /// let mut rows = vec!["..............."; 15];
    /// rows[0] = "......s........";
    /// let texture = MapTexture::from_rows(&rows).unwrap();
    /// assert_eq!(texture.pixel(GridPos::new(14, 6)), Some(TileColor::PLAYER_START));
    /// ```
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> CrawlResult<Self> {
        if rows.len() != GRID_EDGE_LENGTH {
            return Err(CrawlError::InvalidTexture(format!(
                "expected {} rows, found {}",
                GRID_EDGE_LENGTH,
                rows.len()
            )));
        }

        let mut texture = Self::filled(TileColor::EMPTY);
        for (row, line) in rows.iter().enumerate() {
            let glyphs: Vec<char> = line.as_ref().chars().collect();
            if glyphs.len() != GRID_EDGE_LENGTH {
                return Err(CrawlError::InvalidTexture(format!(
                    "row {} has {} glyphs, expected {}",
                    row,
                    glyphs.len(),
                    GRID_EDGE_LENGTH
                )));
            }

            let x = GRID_EDGE_LENGTH - 1 - row;
            for (y, glyph) in glyphs.into_iter().enumerate() {
                texture.pixels[x][y] = TileColor::from_glyph(glyph).ok_or_else(|| {
                    CrawlError::InvalidTexture(format!(
                        "unknown glyph '{}' at row {}, column {}",
                        glyph, row, y
                    ))
                })?;
            }
        }
        Ok(texture)
    }

    /// Colour of the pixel for a tile position.
    pub fn pixel(&self, position: GridPos) -> Option<TileColor> {
        if !position.is_in_room() {
            return None;
        }
        Some(self.pixels[position.x as usize][position.y as usize])
    }

    /// Overwrites the pixel for a tile position; out-of-room positions are ignored.
    pub fn set_pixel(&mut self, position: GridPos, color: TileColor) {
        if position.is_in_room() {
            self.pixels[position.x as usize][position.y as usize] = color;
        }
    }

    /// Every pixel with its tile position, row by row from x = 0.
    pub fn pixels(&self) -> impl Iterator<Item = (GridPos, TileColor)> + '_ {
        self.pixels.iter().enumerate().flat_map(|(x, row)| {
            row.iter()
                .enumerate()
                .map(move |(y, color)| (GridPos::new(x as i32, y as i32), *color))
        })
    }
}

/// Handler run for every pixel of a given colour.
pub type ColorCallback = Box<dyn Fn(&mut Room, GridPos)>;

/// Maps pixel colours to decoration handlers.
pub struct ColorCallbackRegistry {
    callbacks: HashMap<TileColor, ColorCallback>,
}

impl ColorCallbackRegistry {
    /// A registry with no handlers; decorating with it does nothing.
    pub fn empty() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// The handlers for the standard glyph palette.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.bind(TileColor::FLOOR, |room, pos| {
            room.add_tile(pos);
        });
        registry.bind(TileColor::BLOCKED, |room, pos| {
            room.add_tile(pos);
            if let Some(tile) = room.tile_mut(pos) {
                tile.pathing_ignore = true;
            }
        });
        registry.bind(TileColor::ENEMY_SPAWN, |room, pos| {
            room.add_tile(pos);
            room.spawn_points.push(EnemySpawnData {
                spawn: pos,
                enemy_type: EnemyType::default(),
            });
        });
        registry.bind(TileColor::PLAYER_START, |room, pos| {
            room.add_tile(pos);
            room.player_start = Some(pos);
        });
        registry.bind(TileColor::TORMENTOR_SPAWN, |room, pos| {
            room.add_tile(pos);
            room.tormentor_spawns.push(pos);
        });
        registry.bind(TileColor::EYE_SPAWN, |room, pos| {
            room.add_tile(pos);
            room.eye_spawns.push(pos);
        });

        registry
    }

    /// Binds `handler` to `color`, replacing any previous handler.
    pub fn bind<F>(&mut self, color: TileColor, handler: F)
    where
        F: Fn(&mut Room, GridPos) + 'static,
    {
        self.callbacks.insert(color, Box::new(handler));
    }

    /// Removes the handler for `color`.
    pub fn unbind(&mut self, color: TileColor) -> bool {
        self.callbacks.remove(&color).is_some()
    }

    /// Checks if a colour has a handler.
    pub fn contains(&self, color: TileColor) -> bool {
        self.callbacks.contains_key(&color)
    }

    /// Runs the handler for every pixel of `texture` whose colour is bound.
    ///
    /// Returns how many handlers ran.
    pub fn decorate(&self, room: &mut Room, texture: &MapTexture) -> usize {
        let mut invoked = 0;
        for (position, color) in texture.pixels() {
            if let Some(handler) = self.callbacks.get(&color) {
                handler(room, position);
                invoked += 1;
            }
        }
        invoked
    }
}

impl Default for ColorCallbackRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ColorCallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorCallbackRegistry")
            .field("colors", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}
