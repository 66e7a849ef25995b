//! # Macro Grid
//!
//! The grid of rooms. It owns every room (and through them every tile), places
//! and stitches rooms, and answers position lookups. Floor generation, the
//! pathfinder and occupant handling are further `impl` blocks on
//! [`MacroGrid`] in their own modules.
//!
//! The grid is `height` rooms tall along `x` (North) and `width` rooms wide
//! along `y` (East). Every access is bounds checked; anything outside the grid
//! is simply "no room here".

use crate::config::{GRID_EDGE_LENGTH, SMALL_SPACE};
use crate::generation::{create_rng, ArchetypeId, GenerationConfig, RoomCatalog};
use crate::utils::FillChance;
use crate::world::{
    world_to_room_position, world_to_tile_position, Cardinal, ColorCallbackRegistry, GridHooks,
    GridPos, NoHooks, Occupant, OccupantId, RespawnState, Room, Tile, TileGraph, TileId, WorldPos,
};
use crate::{CrawlError, CrawlResult};
use log::{debug, warn};
use pathfinding::prelude::bfs;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// The dungeon: a grid of rooms plus everything standing in them.
pub struct MacroGrid<H: GridHooks = NoHooks> {
    width: usize,
    height: usize,
    pub(crate) rooms: Vec<Option<Room>>,
    pub catalog: RoomCatalog,
    pub config: GenerationConfig,
    pub(crate) fill_chance: FillChance,
    registry: ColorCallbackRegistry,
    pub(crate) occupants: HashMap<OccupantId, Occupant>,
    pub(crate) player: Option<OccupantId>,
    pub(crate) rng: StdRng,
    pub hooks: H,
}

impl MacroGrid<NoHooks> {
    /// Creates an empty grid sized and seeded from `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecrawl::{GenerationConfig, MacroGrid, RoomCatalog};
    ///
    /// let grid = MacroGrid::new(GenerationConfig::for_testing(1), RoomCatalog::standard()).unwrap();
    /// assert_eq!(grid.width(), 5);
    /// assert_eq!(grid.height(), 6);
    /// assert_eq!(grid.room_count(), 0);
    /// ```
    pub fn new(config: GenerationConfig, catalog: RoomCatalog) -> CrawlResult<Self> {
        Self::with_hooks(config, catalog, NoHooks)
    }
}

impl<H: GridHooks> MacroGrid<H> {
    /// Creates an empty grid that reports to `hooks`.
    pub fn with_hooks(config: GenerationConfig, catalog: RoomCatalog, hooks: H) -> CrawlResult<Self> {
        if config.map_width == 0 || config.map_height == 0 {
            return Err(CrawlError::InvalidConfig(format!(
                "map must be at least 1x1, got {}x{}",
                config.map_width, config.map_height
            )));
        }
        catalog.validate()?;

        let width = config.map_width;
        let height = config.map_height;
        Ok(Self {
            width,
            height,
            rooms: (0..width * height).map(|_| None).collect(),
            catalog,
            fill_chance: FillChance::new(
                config.max_fill_chance,
                config.min_fill_chance,
                config.fill_chance_velocity,
            ),
            rng: create_rng(&config),
            config,
            registry: ColorCallbackRegistry::standard(),
            occupants: HashMap::new(),
            player: None,
            hooks,
        })
    }

    /// Replaces the decoration registry used for rooms placed from now on.
    pub fn with_registry(mut self, registry: ColorCallbackRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Mutable access to the decoration registry.
    pub fn registry_mut(&mut self) -> &mut ColorCallbackRegistry {
        &mut self.registry
    }

    /// Rooms along the `y` axis.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rooms along the `x` axis.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of room slots.
    pub fn flat_size(&self) -> usize {
        self.rooms.len()
    }

    /// The grid's random number generator.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// The fill chance the next probabilistic connector decision will use.
    pub fn fill_chance(&self) -> f32 {
        self.fill_chance.current()
    }

    /// Checks whether a position lies on the grid.
    pub fn is_valid_space(&self, position: GridPos) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.height
            && (position.y as usize) < self.width
    }

    /// Converts a grid position to its flat slot index.
    pub fn grid_to_flat_index(&self, position: GridPos) -> Option<usize> {
        if !self.is_valid_space(position) {
            return None;
        }
        Some(position.y as usize * self.height + position.x as usize)
    }

    /// Converts a flat slot index back to its grid position.
    pub fn flat_to_grid_index(&self, index: usize) -> Option<GridPos> {
        if index >= self.flat_size() {
            return None;
        }
        Some(GridPos::new(
            (index % self.height) as i32,
            (index / self.height) as i32,
        ))
    }

    /// Places a room built from `archetype` at `position`.
    ///
    /// The room is decorated from its texture, stitched to every neighbour
    /// whose facing edge is also open, and has its tile capacities assigned.
    /// If a room already sits there it is returned unchanged. Positions off
    /// the grid and unknown archetypes place nothing.
    pub fn add_room(&mut self, position: GridPos, archetype: ArchetypeId) -> Option<&Room> {
        let Some(index) = self.grid_to_flat_index(position) else {
            warn!("add_room: {:?} is outside the map", position);
            return None;
        };
        if self.rooms[index].is_some() {
            warn!("add_room: room already at {:?}, keeping it", position);
            return self.rooms[index].as_ref();
        }
        let Some(template) = self.catalog.archetype(archetype) else {
            warn!("add_room: unknown archetype {}", archetype);
            return None;
        };

        let mut room = Room::new(index, position, archetype, template.valid_cardinals);
        room.respawn = RespawnState::new(template.respawn.clone(), &mut self.rng);
        self.registry.decorate(&mut room, &template.texture);
        for spawn in &mut room.spawn_points {
            spawn.enemy_type = template.enemy_type.clone();
        }
        self.hooks.on_map_load(&room);
        debug!(
            "Placed room '{}' at {:?} with {} tiles",
            template.name,
            position,
            room.tile_count()
        );

        let valid_cardinals = room.valid_cardinals;
        self.rooms[index] = Some(room);

        for direction in Cardinal::ALL {
            if !valid_cardinals[direction.index()] {
                continue;
            }
            let Some(neighbor) = self.room(position.step(direction)) else {
                continue;
            };
            if !neighbor.is_valid_cardinal(direction.opposite()) {
                continue;
            }
            let neighbor_index = neighbor.index;
            self.stitch_rooms(index, neighbor_index, direction);
            self.assign_sizes(neighbor_index);
        }
        // Corner tiles of diagonal rooms see the new room through their
        // neighbours' links.
        for (a, b) in [
            (Cardinal::North, Cardinal::East),
            (Cardinal::South, Cardinal::East),
            (Cardinal::South, Cardinal::West),
            (Cardinal::North, Cardinal::West),
        ] {
            if let Some(diagonal) = self.room(position.step(a).step(b)).map(|room| room.index) {
                self.assign_sizes(diagonal);
            }
        }
        self.assign_sizes(index);

        let room = self.rooms[index].as_ref()?;
        self.hooks.on_map_finalization(room);
        Some(room)
    }

    /// Links the 15 tile pairs along the edge where room `b` touches room `a`
    /// in `direction`. Pairs missing a tile on either side stay unlinked.
    fn stitch_rooms(&mut self, a: usize, b: usize, direction: Cardinal) {
        for offset in 0..GRID_EDGE_LENGTH {
            let a_tile = Room::grid_to_flat_index(Room::edge_position(direction, offset))
                .map(|slot| TileId::new(a, slot));
            let b_tile = Room::grid_to_flat_index(Room::edge_position(direction.opposite(), offset))
                .map(|slot| TileId::new(b, slot));
            if let (Some(a_tile), Some(b_tile)) = (a_tile, b_tile) {
                self.check_set_cardinal(a_tile, direction, b_tile, direction.opposite());
            }
        }
    }

    /// Links `a` to `b` in `a_direction` and `b` to `a` in `b_direction`.
    ///
    /// Does nothing and returns `false` unless both tiles exist.
    pub fn check_set_cardinal(
        &mut self,
        a: TileId,
        a_direction: Cardinal,
        b: TileId,
        b_direction: Cardinal,
    ) -> bool {
        if self.tile(a).is_none() || self.tile(b).is_none() {
            return false;
        }
        if let Some(tile) = self.tile_mut(a) {
            tile.connections[a_direction.index()] = Some(b);
        }
        if let Some(tile) = self.tile_mut(b) {
            tile.connections[b_direction.index()] = Some(a);
        }
        true
    }

    /// Severs the one-way link out of `target` in `direction`.
    ///
    /// Returns the tile that was linked so the caller can restore it later
    /// with [`MacroGrid::force_tile_connect`]. The reverse link is untouched.
    pub fn force_tile_disconnect(
        &mut self,
        direction: Cardinal,
        target: Option<TileId>,
    ) -> Option<TileId> {
        let tile = self.tile_mut(target?)?;
        tile.connections[direction.index()].take()
    }

    /// Sets the one-way link out of `target` in `direction` to `linking`.
    pub fn force_tile_connect(
        &mut self,
        direction: Cardinal,
        target: Option<TileId>,
        linking: Option<TileId>,
    ) {
        if let Some(tile) = target.and_then(|id| self.tile_mut(id)) {
            tile.connections[direction.index()] = linking;
        }
    }

    /// Recomputes the capacity of every tile in a room.
    pub fn assign_sizes(&mut self, room_index: usize) {
        let Some(room) = self.room_by_index(room_index) else {
            return;
        };
        let sizes: Vec<(usize, u8)> = room
            .tiles()
            .map(|tile| (tile.id.tile, self.computed_space(tile.id)))
            .collect();
        if let Some(room) = self.room_by_index_mut(room_index) {
            room.apply_sizes(&sizes);
        }
    }

    /// Allows or forbids routing through a tile.
    ///
    /// Forbidding drops the 8 surrounding tiles to capacity 1 straight away.
    /// Allowing recomputes their capacity and the tile's own.
    pub fn permit_pathing(&mut self, id: TileId, allow: bool) {
        let around = self.surrounding_tiles(id);
        let Some(tile) = self.tile_mut(id) else {
            return;
        };
        tile.pathing_ignore = !allow;

        if allow {
            for neighbor in around.into_iter().flatten() {
                let space = self.computed_space(neighbor);
                if let Some(tile) = self.tile_mut(neighbor) {
                    tile.available_space = space;
                }
            }
            let space = self.computed_space(id);
            if let Some(tile) = self.tile_mut(id) {
                tile.available_space = space;
            }
        } else {
            for neighbor in around.into_iter().flatten() {
                if let Some(tile) = self.tile_mut(neighbor) {
                    tile.available_space = SMALL_SPACE;
                }
            }
        }
    }

    /// Mutable lookup of a tile by id.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.rooms
            .get_mut(id.room)?
            .as_mut()?
            .tile_by_index_mut(id.tile)
    }

    /// The room at a grid position.
    pub fn room(&self, position: GridPos) -> Option<&Room> {
        let index = self.grid_to_flat_index(position)?;
        self.rooms[index].as_ref()
    }

    /// Mutable lookup of the room at a grid position.
    pub fn room_mut(&mut self, position: GridPos) -> Option<&mut Room> {
        let index = self.grid_to_flat_index(position)?;
        self.rooms[index].as_mut()
    }

    /// The room in a flat slot.
    pub fn room_by_index(&self, index: usize) -> Option<&Room> {
        self.rooms.get(index)?.as_ref()
    }

    /// Mutable lookup of the room in a flat slot.
    pub fn room_by_index_mut(&mut self, index: usize) -> Option<&mut Room> {
        self.rooms.get_mut(index)?.as_mut()
    }

    /// A uniformly random placed room.
    pub fn room_random(&mut self) -> Option<&Room> {
        let placed: Vec<usize> = self
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, room)| room.is_some())
            .map(|(index, _)| index)
            .collect();
        let index = *placed.choose(&mut self.rng)?;
        self.rooms[index].as_ref()
    }

    /// The room covering a world position.
    pub fn room_by_world_position(&self, position: WorldPos) -> Option<&Room> {
        self.room(world_to_room_position(position))
    }

    /// The tile covering a world position.
    pub fn tile_at_world_position(&self, position: WorldPos) -> Option<&Tile> {
        self.room_by_world_position(position)?
            .tile(world_to_tile_position(position))
    }

    /// The tile at `tile` inside the room at `room`.
    pub fn tile_at(&self, room: GridPos, tile: GridPos) -> Option<&Tile> {
        self.room(room)?.tile(tile)
    }

    /// All placed rooms in slot order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter().flatten()
    }

    /// Number of placed rooms.
    pub fn room_count(&self) -> usize {
        self.rooms().count()
    }

    /// Removes every room, tile and occupant.
    pub fn destroy_generation(&mut self) {
        for slot in &mut self.rooms {
            *slot = None;
        }
        self.occupants.clear();
        self.player = None;
        debug!("Destroyed generation");
    }

    /// Routable neighbours of a tile.
    fn open_neighbors(&self, id: TileId) -> Vec<TileId> {
        self.tile(id)
            .map(|tile| {
                tile.connections
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|next| self.tile(*next).is_some_and(|t| !t.pathing_ignore))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks whether `to` can be reached from `from` by following links
    /// through routable tiles, ignoring footprint and occupants.
    pub fn is_reachable(&self, from: TileId, to: TileId) -> bool {
        if self.tile(from).is_none() || self.tile(to).is_none() {
            return false;
        }
        bfs(&from, |id| self.open_neighbors(*id), |id| *id == to).is_some()
    }
}

impl<H: GridHooks> TileGraph for MacroGrid<H> {
    fn tile(&self, id: TileId) -> Option<&Tile> {
        self.rooms.get(id.room)?.as_ref()?.tile_by_index(id.tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LARGE_SPACE;
    use crate::world::{HookEvent, RecordingHooks};

    fn grid(width: usize, height: usize) -> MacroGrid {
        let mut config = GenerationConfig::for_testing(17);
        config.map_width = width;
        config.map_height = height;
        MacroGrid::new(config, RoomCatalog::standard()).unwrap()
    }

    fn four_way(grid: &MacroGrid) -> ArchetypeId {
        grid.catalog.four_way_fillers()[0]
    }

    #[test]
    fn test_rejects_empty_map() {
        let mut config = GenerationConfig::for_testing(1);
        config.map_height = 0;
        assert!(MacroGrid::new(config, RoomCatalog::standard()).is_err());
    }

    #[test]
    fn test_flat_index_round_trip_non_square() {
        let grid = grid(5, 6);
        for index in 0..grid.flat_size() {
            let position = grid.flat_to_grid_index(index).unwrap();
            assert!(grid.is_valid_space(position));
            assert_eq!(grid.grid_to_flat_index(position), Some(index));
        }
        assert_eq!(grid.flat_to_grid_index(30), None);
        assert_eq!(grid.grid_to_flat_index(GridPos::new(6, 0)), None);
        assert_eq!(grid.grid_to_flat_index(GridPos::new(0, 5)), None);
        assert!(grid.is_valid_space(GridPos::new(5, 4)));
    }

    #[test]
    fn test_add_room_twice_keeps_original() {
        let mut grid = grid(1, 1);
        let starter = grid.catalog.starter;
        let first = grid.add_room(GridPos::new(0, 0), starter).unwrap().tile_count();

        let other = four_way(&grid);
        let again = grid.add_room(GridPos::new(0, 0), other).unwrap();
        assert_eq!(again.archetype, starter);
        assert_eq!(again.tile_count(), first);
        assert_eq!(grid.room_count(), 1);
    }

    #[test]
    fn test_add_room_out_of_bounds_is_none() {
        let mut grid = grid(2, 2);
        let id = four_way(&grid);
        assert!(grid.add_room(GridPos::new(2, 0), id).is_none());
        assert!(grid.add_room(GridPos::new(0, -1), id).is_none());
        assert!(grid.add_room(GridPos::new(0, 0), 10_000).is_none());
        assert_eq!(grid.room_count(), 0);
    }

    #[test]
    fn test_adjacent_open_rooms_are_stitched() {
        let mut grid = grid(2, 2);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), id);
        grid.add_room(GridPos::new(1, 0), id);

        let south = grid.tile_at(GridPos::new(0, 0), GridPos::new(14, 4)).unwrap();
        let north = grid.tile_at(GridPos::new(1, 0), GridPos::new(0, 4)).unwrap();
        assert_eq!(south.connection(Cardinal::North), Some(north.id));
        assert_eq!(north.connection(Cardinal::South), Some(south.id));
        assert!(grid.is_reachable(south.id, north.id));
    }

    #[test]
    fn test_closed_edge_is_not_stitched() {
        let mut grid = grid(2, 2);
        let starter = grid.catalog.starter;
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), starter);
        grid.add_room(GridPos::new(0, 1), id);

        let west = grid.tile_at(GridPos::new(0, 1), GridPos::new(7, 0)).unwrap().id;
        assert_eq!(grid.neighbor(west, Cardinal::West), None);
        let start = grid.tile_at(GridPos::new(0, 0), GridPos::new(3, 7)).unwrap().id;
        assert!(!grid.is_reachable(start, west));
    }

    #[test]
    fn test_stitching_upgrades_neighbor_capacity() {
        let mut grid = grid(2, 2);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), id);
        let seam = grid.tile_at(GridPos::new(0, 0), GridPos::new(14, 2)).unwrap().id;
        assert_eq!(grid.tile(seam).unwrap().available_space, SMALL_SPACE);

        grid.add_room(GridPos::new(1, 0), id);
        assert_eq!(grid.tile(seam).unwrap().available_space, LARGE_SPACE);
    }

    #[test]
    fn test_links_are_bidirectional() {
        let mut grid = grid(3, 3);
        let id = four_way(&grid);
        for index in 0..9 {
            let position = grid.flat_to_grid_index(index).unwrap();
            grid.add_room(position, id);
        }
        for room in grid.rooms() {
            for tile in room.tiles() {
                for direction in Cardinal::ALL {
                    if let Some(next) = tile.connection(direction) {
                        let back = grid.tile(next).unwrap().connection(direction.opposite());
                        assert_eq!(back, Some(tile.id));
                    }
                }
            }
        }
    }

    #[test]
    fn test_force_disconnect_and_restore() {
        let mut grid = grid(1, 1);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), id);
        let a = grid.tile_at(GridPos::new(0, 0), GridPos::new(5, 5)).unwrap().id;
        let b = grid.tile_at(GridPos::new(0, 0), GridPos::new(6, 5)).unwrap().id;

        let held = grid.force_tile_disconnect(Cardinal::North, Some(a));
        assert_eq!(held, Some(b));
        assert_eq!(grid.tile(a).unwrap().connection(Cardinal::North), None);
        assert_eq!(grid.tile(b).unwrap().connection(Cardinal::South), Some(a));

        grid.force_tile_connect(Cardinal::North, Some(a), held);
        assert_eq!(grid.tile(a).unwrap().connection(Cardinal::North), Some(b));

        assert_eq!(grid.force_tile_disconnect(Cardinal::North, None), None);
    }

    #[test]
    fn test_assign_sizes_is_idempotent() {
        let mut grid = grid(2, 2);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), id);
        grid.add_room(GridPos::new(0, 1), id);
        let snapshot = |grid: &MacroGrid| -> Vec<u8> {
            grid.rooms()
                .flat_map(|room| room.tiles().map(|t| t.available_space))
                .collect()
        };
        let before = snapshot(&grid);
        grid.assign_sizes(0);
        grid.assign_sizes(2);
        assert_eq!(snapshot(&grid), before);
        assert!(before.iter().all(|space| *space == 1 || *space == 3));
    }

    #[test]
    fn test_permit_pathing_round_trip() {
        let mut grid = grid(1, 1);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(0, 0), id);
        let centre = grid.tile_at(GridPos::new(0, 0), GridPos::new(5, 5)).unwrap().id;
        assert_eq!(grid.tile(centre).unwrap().available_space, LARGE_SPACE);

        let around = grid.surrounding_tiles(centre);
        grid.permit_pathing(centre, false);
        assert!(grid.tile(centre).unwrap().pathing_ignore);
        for neighbor in around.iter().flatten() {
            assert_eq!(grid.tile(*neighbor).unwrap().available_space, SMALL_SPACE);
        }

        grid.permit_pathing(centre, true);
        assert!(!grid.tile(centre).unwrap().pathing_ignore);
        for neighbor in around.iter().flatten() {
            let expected = grid.computed_space(*neighbor);
            assert_eq!(grid.tile(*neighbor).unwrap().available_space, expected);
        }
        assert_eq!(grid.tile(centre).unwrap().available_space, LARGE_SPACE);
    }

    #[test]
    fn test_world_position_lookups() {
        let mut grid = grid(2, 2);
        let id = four_way(&grid);
        grid.add_room(GridPos::new(1, 1), id);

        let tile = grid
            .tile_at_world_position(WorldPos::new(1500.0 + 450.0, 1500.0 + 1250.0, 0.0))
            .unwrap();
        assert_eq!(tile.position, GridPos::new(4, 12));
        assert!(grid.tile_at_world_position(WorldPos::new(100.0, 100.0, 0.0)).is_none());
        assert!(grid.tile_at_world_position(WorldPos::new(-10.0, 100.0, 0.0)).is_none());
        assert!(grid.room_by_world_position(WorldPos::new(9000.0, 0.0, 0.0)).is_none());
        assert!(grid.room_by_index(99).is_none());
    }

    #[test]
    fn test_room_random_and_destroy() {
        let mut grid = grid(2, 2);
        assert!(grid.room_random().is_none());
        let id = four_way(&grid);
        grid.add_room(GridPos::new(1, 0), id);
        assert_eq!(grid.room_random().unwrap().position, GridPos::new(1, 0));

        grid.destroy_generation();
        assert_eq!(grid.room_count(), 0);
        assert!(grid.room(GridPos::new(1, 0)).is_none());
    }

    #[test]
    fn test_hooks_fire_in_order() {
        let mut config = GenerationConfig::for_testing(2);
        config.map_width = 2;
        config.map_height = 2;
        let mut grid =
            MacroGrid::with_hooks(config, RoomCatalog::standard(), RecordingHooks::default())
                .unwrap();
        let id = grid.catalog.four_way_fillers()[0];
        grid.add_room(GridPos::new(0, 1), id);
        grid.add_room(GridPos::new(0, 1), id);
        assert_eq!(
            grid.hooks.events,
            vec![HookEvent::MapLoad(2), HookEvent::MapFinalization(2)]
        );
    }
}
