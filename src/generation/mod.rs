//! # Generation Module
//!
//! Procedural floor layout for the macro grid.
//!
//! A floor is anchored on four landmark rooms (starter, tutorial, mural and
//! escape). A rasterised line of fully open rooms guarantees a route from the
//! starter to the mural, then a frontier of open connectors grows outwards,
//! each connector resolving into a new room whose open edges are decided by a
//! decaying fill chance. Boss floors use a fixed perimeter-and-fill layout
//! instead.
//!
//! Rooms are chosen from a [`RoomCatalog`] of [`RoomArchetype`]s, preferring
//! whichever matching archetype has been used least so far.

pub mod boss;
pub mod catalog;
pub mod floor;

pub use boss::*;
pub use catalog::*;
pub use floor::*;

use crate::utils::shuffle_then_sort_by_key;
use crate::world::{Cardinal, EnemyType, GridPos, MapTexture, RespawnConfig};
use crate::{CrawlError, CrawlResult};
use log::error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Index of an archetype inside a [`RoomCatalog`].
pub type ArchetypeId = usize;

/// Configuration for procedural generation.
///
/// Controls the map size, where the landmark rooms go and how eagerly the
/// frontier opens new connectors. Missing fields in JSON fall back to the
/// defaults of [`GenerationConfig::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of rooms along the East-West (`y`) axis
    pub map_width: usize,
    /// Number of rooms along the North-South (`x`) axis
    pub map_height: usize,
    /// Where the player starts; the tutorial room sits one step North
    pub starter_room_position: GridPos,
    /// Where the floor exit is; the mural room sits one step South
    pub escape_room_position: GridPos,
    /// Lowest value the fill chance decays to
    pub min_fill_chance: f32,
    /// Fill chance at the start of each floor
    pub max_fill_chance: f32,
    /// How much the fill chance drops per sample
    pub fill_chance_velocity: f32,
    /// Multipliers on the fill chance, indexed by how many clockwise steps a
    /// new edge is turned from the connector that created the room
    pub directional_biases: [f32; 4],
    /// Eyes to place on a fresh floor
    pub eye_count: usize,
    /// Minimum world distance between two eyes
    pub eye_spacing: f32,
    /// Enemies farther than this from the player are despawned
    pub despawn_distance: f32,
}

impl GenerationConfig {
    /// Creates the standard configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            map_width: 15,
            map_height: 11,
            starter_room_position: GridPos::new(0, 7),
            escape_room_position: GridPos::new(10, 7),
            min_fill_chance: 0.1,
            max_fill_chance: 1.0,
            fill_chance_velocity: 0.1,
            directional_biases: [1.0; 4],
            eye_count: 6,
            eye_spacing: 1000.0,
            despawn_distance: 1500.0,
        }
    }

    /// Creates a configuration for testing with a small map.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            map_width: 5,
            map_height: 6,
            starter_room_position: GridPos::new(0, 2),
            escape_room_position: GridPos::new(5, 2),
            eye_count: 2,
            ..Self::new(seed)
        }
    }

    /// Loads a configuration from JSON text.
    pub fn from_json_str(json: &str) -> CrawlResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> CrawlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialises the configuration as pretty JSON.
    pub fn to_json(&self) -> CrawlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Position of the tutorial room.
    pub fn tutorial_room_position(&self) -> GridPos {
        self.starter_room_position.step(Cardinal::North)
    }

    /// Position of the mural room.
    pub fn mural_room_position(&self) -> GridPos {
        self.escape_room_position.step(Cardinal::South)
    }

    /// Checks whether a position lies on the configured map.
    pub fn contains(&self, position: GridPos) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.map_height
            && (position.y as usize) < self.map_width
    }

    /// Checks the configuration for values generation cannot work with.
    ///
    /// Besides ranges and map bounds, the landmark rooms must not overlap and
    /// the standard tutorial and mural rooms must be joinable by a route that
    /// avoids the starter and escape rooms.
    pub fn validate(&self) -> CrawlResult<()> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(CrawlError::InvalidConfig(format!(
                "map must be at least 1x1, got {}x{}",
                self.map_width, self.map_height
            )));
        }

        if !(0.0..=1.0).contains(&self.min_fill_chance)
            || !(0.0..=1.0).contains(&self.max_fill_chance)
            || self.min_fill_chance > self.max_fill_chance
        {
            return Err(CrawlError::InvalidConfig(format!(
                "fill chance range {}..{} must lie within 0..1",
                self.min_fill_chance, self.max_fill_chance
            )));
        }

        if !(self.fill_chance_velocity >= 0.0) {
            return Err(CrawlError::InvalidConfig(
                "fill chance velocity must not be negative".to_string(),
            ));
        }

        if let Some(bias) = self
            .directional_biases
            .iter()
            .find(|bias| !(**bias >= 0.0) || !bias.is_finite())
        {
            return Err(CrawlError::InvalidConfig(format!(
                "directional bias {} must be a non-negative number",
                bias
            )));
        }

        let landmarks = [
            ("starter", self.starter_room_position),
            ("tutorial", self.tutorial_room_position()),
            ("escape", self.escape_room_position),
            ("mural", self.mural_room_position()),
        ];
        for (name, position) in landmarks {
            if !self.contains(position) {
                return Err(CrawlError::InvalidConfig(format!(
                    "{} room at {:?} lies outside the {}x{} map",
                    name, position, self.map_height, self.map_width
                )));
            }
        }
        for (i, (name, position)) in landmarks.iter().enumerate() {
            if let Some((other, _)) = landmarks[i + 1..].iter().find(|(_, p)| p == position) {
                return Err(CrawlError::InvalidConfig(format!(
                    "{} and {} rooms overlap at {:?}",
                    name, other, position
                )));
            }
        }

        if guaranteed_route(self, TUTORIAL_OPENINGS, MURAL_OPENINGS).is_none() {
            return Err(CrawlError::InvalidConfig(format!(
                "no route of open rooms can join the tutorial room at {:?} to the mural room at {:?}",
                self.tutorial_room_position(),
                self.mural_room_position()
            )));
        }

        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A room template: which edges it opens and how it is decorated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomArchetype {
    pub name: String,
    /// Open edges, indexed by [`Cardinal::index`]
    pub valid_cardinals: [bool; 4],
    pub texture: MapTexture,
    #[serde(default)]
    pub respawn: RespawnConfig,
    /// Enemy produced by this room's spawn points
    #[serde(default)]
    pub enemy_type: EnemyType,
}

impl RoomArchetype {
    /// Creates an archetype with default respawn settings.
    pub fn new(name: impl Into<String>, valid_cardinals: [bool; 4], texture: MapTexture) -> Self {
        Self {
            name: name.into(),
            valid_cardinals,
            texture,
            respawn: RespawnConfig::default(),
            enemy_type: EnemyType::default(),
        }
    }

    /// Checks whether every edge is open.
    pub fn is_four_way(&self) -> bool {
        self.valid_cardinals.iter().all(|open| *open)
    }

    /// Checks whether the open edges are exactly `pattern`.
    pub fn matches(&self, pattern: [bool; 4]) -> bool {
        self.valid_cardinals == pattern
    }
}

/// Per-generation record of how often each archetype was placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageCounter {
    uses: HashMap<ArchetypeId, usize>,
}

impl UsageCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `id` has been picked.
    pub fn count(&self, id: ArchetypeId) -> usize {
        self.uses.get(&id).copied().unwrap_or(0)
    }

    /// Picks the least-used candidate, breaking ties randomly, and counts the
    /// use.
    pub fn pick_least_used<R: Rng + ?Sized>(
        &mut self,
        candidates: &[ArchetypeId],
        rng: &mut R,
    ) -> Option<ArchetypeId> {
        let mut ordered = candidates.to_vec();
        shuffle_then_sort_by_key(&mut ordered, rng, |id| self.count(*id));
        let picked = *ordered.first()?;
        *self.uses.entry(picked).or_insert(0) += 1;
        Some(picked)
    }
}

/// Creates a seeded random number generator from the config.
pub fn create_rng(config: &GenerationConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}

/// Logs a landmark that does not fit on the map. Generation carries on
/// without it.
pub(crate) fn report_misplaced_landmark(name: &str, position: GridPos) {
    error!(
        "{} room position {:?} is outside the map; increase the map size or move the room",
        name, position
    );
}
