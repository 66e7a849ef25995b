//! # Floor Generation
//!
//! Connector-growth layout of a normal floor.
//!
//! The four landmark rooms go down first. A route of four-way rooms then links
//! the tutorial to the mural so the escape is always reachable from the
//! starter.
//! After that a frontier of open connectors is resolved one at a time, in
//! random order, until nothing is left to grow.

use crate::config::GRID_EDGE_LENGTH;
use crate::generation::{report_misplaced_landmark, ArchetypeId, GenerationConfig, UsageCounter};
use crate::utils::{bresenham_line, four_connected};
use crate::world::{
    Cardinal, GridHooks, GridPos, MacroGrid, OccupantId, OccupantKind, Room, TileId,
};
use crate::{CrawlError, CrawlResult};
use log::{debug, error, info, trace};
use pathfinding::prelude::bfs;
use rand::Rng;

/// An open, unresolved room edge at the frontier of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    pub direction: Cardinal,
    /// Room the edge belongs to
    pub origin: GridPos,
}

impl Connector {
    pub fn new(direction: Cardinal, origin: GridPos) -> Self {
        Self { direction, origin }
    }

    /// Where a room would go to close this connector.
    pub fn target(&self) -> GridPos {
        self.origin.step(self.direction)
    }
}

/// What a call to [`MacroGrid::generate_floor`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloorReport {
    pub rooms_placed: usize,
    /// Rooms placed along the starter-to-mural line
    pub guaranteed_path: usize,
    pub connectors_resolved: usize,
    /// Connectors that pointed off the map
    pub out_of_bounds_connectors: usize,
    /// Edge patterns no filler archetype matched
    pub unmatched_patterns: usize,
}

impl<H: GridHooks> MacroGrid<H> {
    /// Lays out a fresh floor.
    ///
    /// Any previous generation is destroyed and the fill chance restarts at
    /// its maximum. Landmarks that fall outside the map are logged and
    /// skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::{GenerationConfig, MacroGrid, RoomCatalog};
    ///
    /// let mut grid = MacroGrid::new(GenerationConfig::for_testing(3), RoomCatalog::standard()).unwrap();
    /// let report = grid.generate_floor();
    /// assert!(report.rooms_placed >= 4);
    /// assert!(grid.validate_floor().is_ok());
    /// ```
    pub fn generate_floor(&mut self) -> FloorReport {
        if self.room_count() > 0 {
            self.destroy_generation();
        }
        self.fill_chance.reset();

        let mut report = FloorReport::default();
        let mut frontier: Vec<Connector> = Vec::new();

        let starter = self.config.starter_room_position;
        let tutorial = self.config.tutorial_room_position();
        let escape = self.config.escape_room_position;
        let mural = self.config.mural_room_position();

        let landmarks = [
            ("starter", starter, self.catalog.starter),
            ("tutorial", tutorial, self.catalog.tutorial),
            ("escape", escape, self.catalog.escape),
            ("mural", mural, self.catalog.mural),
        ];
        for (name, position, archetype) in landmarks {
            if !self.is_valid_space(position) {
                report_misplaced_landmark(name, position);
                continue;
            }
            if self.add_room(position, archetype).is_some() {
                report.rooms_placed += 1;
            }
        }

        // The mural opens away from the escape, the tutorial away from the
        // starter.
        self.seed_connectors(&mut frontier, mural, Some(mural.direction_to(escape)));
        self.seed_connectors(&mut frontier, tutorial, Some(Cardinal::South));

        match self.landmark_route() {
            Some(route) => {
                self.place_route(&route, &mut frontier, &mut report);
                debug!(
                    "Guaranteed path placed {} rooms, {} connectors open",
                    report.guaranteed_path,
                    frontier.len()
                );
            }
            None => error!(
                "No route of open rooms joins the tutorial at {:?} to the mural at {:?}",
                tutorial, mural
            ),
        }

        let mut usage = UsageCounter::new();
        while !frontier.is_empty() {
            let slot = self.rng.gen_range(0..frontier.len());
            let connector = frontier[slot];
            let placed = self.resolve_connector(connector, &mut usage, &mut frontier, &mut report);
            if let Some(archetype) = placed {
                trace!("Connector {:?} placed archetype {}", connector, archetype);
                report.rooms_placed += 1;
            }
            frontier.swap_remove(slot);
            report.connectors_resolved += 1;
        }

        info!(
            "Generated floor with {} rooms ({} on the guaranteed path)",
            report.rooms_placed, report.guaranteed_path
        );
        report
    }

    /// The guaranteed route for this grid's catalog, tutorial to mural.
    fn landmark_route(&self) -> Option<Vec<GridPos>> {
        let openings = |id: ArchetypeId| self.catalog.archetype(id).map(|a| a.valid_cardinals);
        guaranteed_route(
            &self.config,
            openings(self.catalog.tutorial)?,
            openings(self.catalog.mural)?,
        )
    }

    /// Fills the rooms between the ends of `route` with four-way rooms.
    ///
    /// Each placed room opens connectors on every edge except the one back
    /// along the route. Route picks count their own usage, so the frontier
    /// starts from fresh counts. Returns the route's usage.
    fn place_route(
        &mut self,
        route: &[GridPos],
        frontier: &mut Vec<Connector>,
        report: &mut FloorReport,
    ) -> UsageCounter {
        let four_way = self.catalog.four_way_fillers();
        let mut usage = UsageCounter::new();
        for pair in route.windows(2) {
            let (previous, position) = (pair[0], pair[1]);
            if self.room(position).is_some() {
                continue;
            }
            let Some(archetype) = usage.pick_least_used(&four_way, &mut self.rng) else {
                break;
            };
            if self.add_room(position, archetype).is_some() {
                report.rooms_placed += 1;
                report.guaranteed_path += 1;
                self.seed_connectors(frontier, position, Some(position.direction_to(previous)));
            }
        }
        usage
    }

    /// Opens a connector on every open edge of the room at `position`, except
    /// `skip`.
    fn seed_connectors(
        &self,
        frontier: &mut Vec<Connector>,
        position: GridPos,
        skip: Option<Cardinal>,
    ) {
        let Some(room) = self.room(position) else {
            return;
        };
        frontier.extend(
            Cardinal::ALL
                .into_iter()
                .filter(|dir| Some(*dir) != skip && room.is_valid_cardinal(*dir))
                .map(|dir| Connector::new(dir, position)),
        );
    }

    /// Places a room where `connector` points, if the spot is free.
    ///
    /// Returns the archetype placed. New open edges, other than the one back
    /// to the connector's origin, join the frontier.
    fn resolve_connector(
        &mut self,
        connector: Connector,
        usage: &mut UsageCounter,
        frontier: &mut Vec<Connector>,
        report: &mut FloorReport,
    ) -> Option<ArchetypeId> {
        let target = connector.target();
        if !self.is_valid_space(target) {
            error!(
                "Connector from {:?} heading {:?} leaves the map; check the landmark room positions",
                connector.origin, connector.direction
            );
            report.out_of_bounds_connectors += 1;
            return None;
        }
        if self.room(target).is_some() {
            return None;
        }

        let mut pattern = [false; 4];
        for direction in Cardinal::ALL {
            let next = target.step(direction);
            pattern[direction.index()] = if !self.is_valid_space(next) {
                false
            } else if next == connector.origin {
                true
            } else if let Some(open) = self
                .room(next)
                .map(|room| room.is_valid_cardinal(direction.opposite()))
            {
                open
            } else {
                let fill = self.fill_chance.sample();
                let relative = direction.relative_to(connector.direction);
                let bias = self.config.directional_biases[relative];
                self.rng.gen::<f32>() < fill * bias
            };
        }

        let candidates = self.catalog.fillers_matching(pattern);
        let Some(archetype) = usage.pick_least_used(&candidates, &mut self.rng) else {
            debug!("No filler matches edge pattern {:?} at {:?}", pattern, target);
            report.unmatched_patterns += 1;
            return None;
        };
        self.add_room(target, archetype)?;

        let back = target.direction_to(connector.origin);
        frontier.extend(
            Cardinal::ALL
                .into_iter()
                .filter(|dir| *dir != back && pattern[dir.index()])
                .map(|dir| Connector::new(dir, target)),
        );
        Some(archetype)
    }

    /// The tile the player starts on: the first room's start marker, or the
    /// starter room's most central tile.
    pub fn starter_tile(&self) -> Option<TileId> {
        let marked = self.rooms().find_map(|room| {
            let slot = Room::grid_to_flat_index(room.player_start?)?;
            room.tile_by_index(slot).map(|tile| tile.id)
        });
        marked.or_else(|| self.anchor_tile(self.config.starter_room_position))
    }

    /// The most central routable tile of the escape room.
    pub fn escape_tile(&self) -> Option<TileId> {
        self.anchor_tile(self.config.escape_room_position)
    }

    fn anchor_tile(&self, position: GridPos) -> Option<TileId> {
        let centre = GridPos::new(GRID_EDGE_LENGTH as i32 / 2, GRID_EDGE_LENGTH as i32 / 2);
        self.room(position)?
            .tiles()
            .filter(|tile| !tile.pathing_ignore)
            .min_by_key(|tile| {
                let offset = tile.position - centre;
                offset.x * offset.x + offset.y * offset.y
            })
            .map(|tile| tile.id)
    }

    /// Checks that the starter and escape rooms exist and are connected.
    pub fn validate_floor(&self) -> CrawlResult<()> {
        let start = self.starter_tile().ok_or_else(|| {
            CrawlError::GenerationFailed("floor has no starter room".to_string())
        })?;
        let exit = self.escape_tile().ok_or_else(|| {
            CrawlError::GenerationFailed("floor has no escape room".to_string())
        })?;
        if !self.is_reachable(start, exit) {
            return Err(CrawlError::GenerationFailed(format!(
                "escape room at {:?} cannot be reached from the starter room",
                self.config.escape_room_position
            )));
        }
        Ok(())
    }

    /// Puts the player, eyes and starting enemies on a generated floor.
    ///
    /// The tutorial room always receives an eye when it has a spawn for one.
    pub fn populate_floor(&mut self) -> Option<OccupantId> {
        let player = self.place_player_at_start()?;
        let tutorial = self.config.tutorial_room_position();
        let eyes = self.place_eyes(self.config.eye_count, self.config.eye_spacing, Some(tutorial));
        let enemies = self.spawn_all_enemies();
        info!("Populated floor: {} eyes, {} enemies", eyes.len(), enemies);
        Some(player)
    }

    /// Spawns the tormentor on the first registered tormentor spawn point.
    pub fn spawn_tormentor(&mut self) -> Option<OccupantId> {
        let tile = self.rooms().find_map(|room| {
            room.tormentor_spawns.iter().find_map(|spawn| {
                let slot = Room::grid_to_flat_index(*spawn)?;
                room.tile_by_index(slot).map(|tile| tile.id)
            })
        })?;
        self.spawn_occupant(OccupantKind::Tormentor, tile)
    }
}

/// Room positions of the guaranteed route from the tutorial room to the
/// mural room, both ends included.
///
/// Consecutive positions are orthogonal neighbours. The route leaves the
/// tutorial through `tutorial_open`, enters the mural through `mural_open`
/// and never crosses another landmark. The Bresenham line between the two
/// rooms is used when it qualifies, with a corner room added at each
/// diagonal step; otherwise the shortest detour is taken. Returns `None`
/// when landmarks leave the map or overlap, or no route exists.
///
/// # Examples
///
/// ```
/// use tilecrawl::{guaranteed_route, GenerationConfig, GridPos, MURAL_OPENINGS, TUTORIAL_OPENINGS};
///
/// let config = GenerationConfig::for_testing(1);
/// let route = guaranteed_route(&config, TUTORIAL_OPENINGS, MURAL_OPENINGS).unwrap();
/// assert_eq!(route, vec![GridPos::new(1, 2), GridPos::new(2, 2), GridPos::new(3, 2), GridPos::new(4, 2)]);
/// ```
pub fn guaranteed_route(
    config: &GenerationConfig,
    tutorial_open: [bool; 4],
    mural_open: [bool; 4],
) -> Option<Vec<GridPos>> {
    let tutorial = config.tutorial_room_position();
    let mural = config.mural_room_position();
    let landmarks = [
        config.starter_room_position,
        tutorial,
        config.escape_room_position,
        mural,
    ];
    for (i, position) in landmarks.iter().enumerate() {
        if !config.contains(*position) || landmarks[i + 1..].contains(position) {
            return None;
        }
    }

    let can_step = |from: GridPos, to: GridPos| -> bool {
        let delta = to - from;
        if delta.x.abs() + delta.y.abs() != 1 || !config.contains(to) {
            return false;
        }
        let direction = from.direction_to(to);
        if from == tutorial && !tutorial_open[direction.index()] {
            return false;
        }
        if to == mural {
            return mural_open[direction.opposite().index()];
        }
        !landmarks.contains(&to)
    };

    let line = four_connected(&bresenham_line(tutorial, mural));
    if line.windows(2).all(|pair| can_step(pair[0], pair[1])) {
        return Some(line);
    }

    trace!("Line from {:?} to {:?} is blocked, detouring", tutorial, mural);
    bfs(
        &tutorial,
        |from| {
            let from = *from;
            Cardinal::ALL
                .into_iter()
                .map(|direction| from.step(direction))
                .filter(|to| can_step(from, *to))
                .collect::<Vec<_>>()
        },
        |position| *position == mural,
    )
}
