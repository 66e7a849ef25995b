//! # Pathfinding
//!
//! Best-first search over the tile graph, used by every mobile actor.
//!
//! The open list is a plain vector re-sorted by total cost after every
//! expansion. Sorting is stable, so ties go to whichever tile entered the list
//! first. The heuristic is the squared world distance to the goal, and the
//! same value is used as the cost of stepping onto a tile. This favours
//! heading straight for the goal over finding the strictly shortest route,
//! which is what the crawlers want.

use crate::world::{GridHooks, MacroGrid, TileGraph, TileId};
use log::trace;
use std::collections::{HashMap, HashSet};

/// Step cost multiplier for tiles held by something other than the player.
pub const OCCUPIED_COST_FACTOR: f32 = 1.1;

/// Per-search bookkeeping for a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SearchNode {
    g_cost: f32,
    h_cost: f32,
    parent: Option<TileId>,
}

impl SearchNode {
    fn f_cost(&self) -> f32 {
        self.g_cost + self.h_cost
    }
}

/// A pathfinding query with the usual defaults.
///
/// # Examples
///
/// ```
/// use tilecrawl::{PathRequest, TileId};
///
/// let request = PathRequest::new(TileId::new(0, 0), TileId::new(0, 5))
///     .size(3)
///     .respect_occupants(true);
/// assert_eq!(request.size, 3);
/// assert!(request.get_closest);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequest {
    pub start: TileId,
    pub end: TileId,
    /// Footprint of the actor; tiles with less available space are skipped
    pub size: u8,
    /// Walk to the closest reachable tile when `end` cannot be reached
    pub get_closest: bool,
    /// Make tiles held by non-player occupants more expensive
    pub respect_occupants: bool,
}

impl PathRequest {
    /// A request for a 1×1 actor that falls back to the closest tile.
    pub fn new(start: TileId, end: TileId) -> Self {
        Self {
            start,
            end,
            size: 1,
            get_closest: true,
            respect_occupants: false,
        }
    }

    pub fn size(mut self, size: u8) -> Self {
        self.size = size;
        self
    }

    pub fn get_closest(mut self, get_closest: bool) -> Self {
        self.get_closest = get_closest;
        self
    }

    pub fn respect_occupants(mut self, respect_occupants: bool) -> Self {
        self.respect_occupants = respect_occupants;
        self
    }
}

impl<H: GridHooks> MacroGrid<H> {
    /// Runs a [`PathRequest`].
    pub fn find_path(&self, request: &PathRequest) -> Vec<TileId> {
        self.generate_path(
            request.start,
            request.end,
            request.size,
            request.get_closest,
            request.respect_occupants,
        )
    }

    /// Finds a route from `start` to `end`.
    ///
    /// The result excludes `start` and ends with `end`; it is empty when the
    /// two are the same tile. When `end` cannot be reached and `get_closest`
    /// is set, the route leads to the reachable tile nearest to `end` instead.
    /// Otherwise an unreachable goal gives an empty route.
    pub fn generate_path(
        &self,
        start: TileId,
        end: TileId,
        size: u8,
        get_closest: bool,
        respect_occupants: bool,
    ) -> Vec<TileId> {
        if start == end {
            return Vec::new();
        }

        match self.search(start, end, size, respect_occupants) {
            Ok(path) => path,
            Err(closest) if get_closest && closest != start => {
                trace!("No route to {:?}, retargeting {:?}", end, closest);
                self.generate_path(start, closest, size, false, respect_occupants)
            }
            Err(_) => Vec::new(),
        }
    }

    /// One search pass. On failure returns the expanded tile closest to `end`.
    fn search(
        &self,
        start: TileId,
        end: TileId,
        size: u8,
        respect_occupants: bool,
    ) -> Result<Vec<TileId>, TileId> {
        let (Some(start_tile), Some(goal)) = (self.tile(start), self.tile(end)) else {
            return Err(start);
        };

        let mut nodes: HashMap<TileId, SearchNode> = HashMap::new();
        let mut open: Vec<TileId> = vec![start];
        let mut closed: HashSet<TileId> = HashSet::new();

        let start_distance = start_tile.squared_distance_to(goal);
        nodes.insert(
            start,
            SearchNode {
                g_cost: 0.0,
                h_cost: start_distance,
                parent: None,
            },
        );
        let mut closest = start;
        let mut closest_distance = start_distance;

        while !open.is_empty() {
            let current = open.remove(0);
            let Some(current_tile) = self.tile(current) else {
                continue;
            };

            let distance = current_tile.squared_distance_to(goal);
            if distance < closest_distance {
                closest = current;
                closest_distance = distance;
            }
            closed.insert(current);

            if current == end {
                return Ok(reconstruct_path(&nodes, start, end));
            }

            let current_cost = nodes.get(&current).map_or(0.0, |node| node.g_cost);
            for link in current_tile.connections.iter().flatten() {
                let Some(next) = self.tile(*link) else {
                    continue;
                };
                if closed.contains(link) || next.available_space < size || next.pathing_ignore {
                    continue;
                }

                let heuristic = next.squared_distance_to(goal);
                let mut step = heuristic;
                if respect_occupants && next.occupant.is_some() && next.occupant != self.player {
                    step *= OCCUPIED_COST_FACTOR;
                }
                let cost = current_cost + step;

                let in_open = open.contains(link);
                let improves = nodes.get(link).map_or(true, |node| cost < node.g_cost);
                if improves || !in_open {
                    nodes.insert(
                        *link,
                        SearchNode {
                            g_cost: cost,
                            h_cost: heuristic,
                            parent: Some(current),
                        },
                    );
                    if !in_open {
                        open.push(*link);
                    }
                }
            }

            open.sort_by(|a, b| {
                let a = nodes.get(a).map_or(f32::INFINITY, SearchNode::f_cost);
                let b = nodes.get(b).map_or(f32::INFINITY, SearchNode::f_cost);
                a.total_cmp(&b)
            });
        }

        Err(closest)
    }
}

/// Walks parent links back from `end`, stopping before `start`.
fn reconstruct_path(nodes: &HashMap<TileId, SearchNode>, start: TileId, end: TileId) -> Vec<TileId> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(parent) = nodes.get(&current).and_then(|node| node.parent) {
        if parent == start {
            break;
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LARGE_SPACE;
    use crate::generation::{GenerationConfig, RoomArchetype, RoomCatalog};
    use crate::world::{Cardinal, GridPos, MapTexture, OccupantKind, TileColor};
    use crate::EnemyType;

    fn single_room(texture: MapTexture) -> MacroGrid {
        let mut config = GenerationConfig::for_testing(9);
        config.map_width = 1;
        config.map_height = 1;
        let mut catalog = RoomCatalog::standard();
        let id = catalog.push(RoomArchetype::new("test", [false; 4], texture));
        let mut grid = MacroGrid::new(config, catalog).unwrap();
        grid.add_room(GridPos::new(0, 0), id);
        grid
    }

    fn open_room() -> MacroGrid {
        single_room(MapTexture::filled(TileColor::FLOOR))
    }

    /// Start at (0,1), goal at (2,1), with (1,1) missing so the only routes
    /// go round the west side or the east side in four steps each.
    fn two_route_room() -> MacroGrid {
        let mut texture = MapTexture::filled(TileColor::EMPTY);
        for (x, y) in [(0, 1), (0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2), (2, 1)] {
            texture.set_pixel(GridPos::new(x, y), TileColor::FLOOR);
        }
        single_room(texture)
    }

    fn at(grid: &MacroGrid, x: i32, y: i32) -> TileId {
        grid.tile_at(GridPos::new(0, 0), GridPos::new(x, y)).unwrap().id
    }

    fn assert_walkable(grid: &MacroGrid, start: TileId, path: &[TileId]) {
        let mut previous = start;
        for step in path {
            let tile = grid.tile(previous).unwrap();
            assert!(tile.connections.contains(&Some(*step)), "{:?} -> {:?}", previous, step);
            previous = *step;
        }
    }

    #[test]
    fn test_same_tile_gives_empty_path() {
        let grid = open_room();
        let tile = at(&grid, 3, 3);
        assert!(grid.generate_path(tile, tile, 1, true, false).is_empty());
        assert!(grid.generate_path(tile, tile, 3, false, true).is_empty());
    }

    #[test]
    fn test_straight_path_excludes_start() {
        let grid = open_room();
        let start = at(&grid, 2, 2);
        let end = at(&grid, 2, 6);
        let path = grid.generate_path(start, end, 1, true, false);
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&end));
        assert!(!path.contains(&start));
        assert_walkable(&grid, start, &path);
    }

    #[test]
    fn test_path_skips_ignored_tiles() {
        let mut grid = open_room();
        for x in 0..14 {
            let id = at(&grid, x, 5);
            grid.tile_mut(id).unwrap().pathing_ignore = true;
        }
        let start = at(&grid, 2, 2);
        let end = at(&grid, 2, 8);
        let path = grid.generate_path(start, end, 1, false, false);
        assert_eq!(path.last(), Some(&end));
        assert!(path.iter().all(|id| !grid.tile(*id).unwrap().pathing_ignore));
        assert!(path.contains(&at(&grid, 14, 5)));
        assert_walkable(&grid, start, &path);
    }

    #[test]
    fn test_large_actor_stays_on_large_tiles() {
        let grid = open_room();
        let start = at(&grid, 3, 3);
        let end = at(&grid, 10, 11);
        let path = grid.generate_path(start, end, LARGE_SPACE, false, false);
        assert_eq!(path.last(), Some(&end));
        assert!(path
            .iter()
            .all(|id| grid.tile(*id).unwrap().available_space >= LARGE_SPACE));
    }

    #[test]
    fn test_unreachable_without_fallback_is_empty() {
        let mut grid = open_room();
        for y in 0..15 {
            let id = at(&grid, 7, y);
            grid.tile_mut(id).unwrap().pathing_ignore = true;
        }
        let start = at(&grid, 2, 2);
        let end = at(&grid, 12, 2);
        assert!(grid.generate_path(start, end, 1, false, false).is_empty());
        assert!(!grid.is_reachable(start, end));
    }

    #[test]
    fn test_fallback_reaches_closest_tile() {
        let mut grid = open_room();
        for y in 0..15 {
            let id = at(&grid, 7, y);
            grid.tile_mut(id).unwrap().pathing_ignore = true;
        }
        let start = at(&grid, 2, 2);
        let end = at(&grid, 12, 2);
        let path = grid.generate_path(start, end, 1, true, false);

        let closest = at(&grid, 6, 2);
        assert_eq!(path.last(), Some(&closest));
        assert!(grid.is_reachable(start, closest));
        assert_walkable(&grid, start, &path);
    }

    #[test]
    fn test_fallback_from_isolated_tile_is_empty() {
        let mut texture = MapTexture::filled(TileColor::EMPTY);
        texture.set_pixel(GridPos::new(0, 0), TileColor::FLOOR);
        texture.set_pixel(GridPos::new(5, 5), TileColor::FLOOR);
        let grid = single_room(texture);
        let path = grid.generate_path(at(&grid, 0, 0), at(&grid, 5, 5), 1, true, false);
        assert!(path.is_empty());
    }

    #[test]
    fn test_occupied_route_is_avoided_when_respecting_occupants() {
        let mut grid = two_route_room();
        let start = at(&grid, 0, 1);
        let end = at(&grid, 2, 1);
        let east = at(&grid, 0, 2);
        let west = at(&grid, 0, 0);

        let baseline = grid.generate_path(start, end, 1, false, false);
        assert_eq!(baseline.len(), 4);
        assert_eq!(baseline[0], east);

        grid.spawn_occupant(
            OccupantKind::Enemy {
                enemy_type: EnemyType::default(),
                origin_room: None,
            },
            east,
        )
        .unwrap();

        let ignoring = grid.generate_path(start, end, 1, false, false);
        assert_eq!(ignoring[0], east);

        let avoiding = grid.generate_path(start, end, 1, false, true);
        assert_eq!(avoiding.len(), 4);
        assert_eq!(avoiding[0], west);
        assert_walkable(&grid, start, &avoiding);
    }

    #[test]
    fn test_player_does_not_inflate_cost() {
        let mut grid = two_route_room();
        let start = at(&grid, 0, 1);
        let end = at(&grid, 2, 1);
        let east = at(&grid, 0, 2);
        grid.spawn_occupant(OccupantKind::Player, east).unwrap();

        let path = grid.generate_path(start, end, 1, false, true);
        assert_eq!(path[0], east);
    }

    #[test]
    fn test_request_builder_matches_direct_call() {
        let grid = open_room();
        let start = at(&grid, 1, 1);
        let end = at(&grid, 9, 4);
        let request = PathRequest::new(start, end).get_closest(false);
        assert_eq!(
            grid.find_path(&request),
            grid.generate_path(start, end, 1, false, false)
        );
        assert_eq!(request.size, 1);
        assert!(!request.respect_occupants);
    }

    #[test]
    fn test_forced_disconnect_blocks_route() {
        let mut grid = two_route_room();
        let start = at(&grid, 0, 1);
        let end = at(&grid, 2, 1);
        grid.force_tile_disconnect(Cardinal::East, Some(start));
        let path = grid.generate_path(start, end, 1, false, false);
        assert_eq!(path[0], at(&grid, 0, 0));
    }
}
