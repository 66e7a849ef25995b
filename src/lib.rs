//! # Tilecrawl
//!
//! Procedural dungeon generation and tile-graph pathfinding for turn-based
//! dungeon crawlers.
//!
//! ## Architecture Overview
//!
//! The dungeon is a two-level grid:
//!
//! - **Tiles**: atomic cells with four cardinal links, occupancy and a
//!   footprint capacity used by large actors
//! - **Rooms**: fixed 15×15 tile grids decorated from a colour texture
//! - **Macro grid**: the grid of rooms. It owns room placement, edge
//!   stitching, floor and boss-room generation, and the pathfinder
//!
//! All cross references are indices into the macro grid's arena, so tiles and
//! rooms are plain data records. Randomness comes from a single seeded
//! generator held by the grid, which makes every floor reproducible from its
//! [`GenerationConfig::seed`].
//!
//! Gameplay code (player, enemies, bosses) only talks to the core through
//! tile ids, positions and path results, plus the [`GridHooks`] extension
//! points.

pub mod generation;
pub mod utils;
pub mod world;

// Core module re-exports
pub use generation::*;
pub use utils::*;
pub use world::*;

/// Core error type for the Tilecrawl engine.
///
/// Grid lookups never fail with an error; they return `None` for anything out
/// of range. Errors are reserved for loading configuration and content.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generation settings are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A room texture has the wrong shape or unknown glyphs
    #[error("Invalid texture: {0}")]
    InvalidTexture(String),

    /// A generated floor failed validation
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Tilecrawl codebase.
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grid geometry constants.
pub mod config {
    /// Number of tiles along each edge of a room
    pub const GRID_EDGE_LENGTH: usize = 15;

    /// Number of tile slots in a room
    pub const ROOM_TILE_COUNT: usize = GRID_EDGE_LENGTH * GRID_EDGE_LENGTH;

    /// World units between the centres of adjacent tiles
    pub const TILE_SEPARATION: f32 = 100.0;

    /// World units covered by one room along each axis
    pub const ROOM_POSITION_SCALAR: f32 = GRID_EDGE_LENGTH as f32 * TILE_SEPARATION;

    /// Capacity of a tile that only fits a 1×1 actor
    pub const SMALL_SPACE: u8 = 1;

    /// Capacity of a tile that can hold a 3×3 actor centred on it
    pub const LARGE_SPACE: u8 = 3;
}
