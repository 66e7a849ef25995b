//! Invariants every generated floor must satisfy, for any seed.

use proptest::prelude::*;
use tilecrawl::config::{LARGE_SPACE, SMALL_SPACE};
use tilecrawl::{
    Cardinal, CrawlResult, GenerationConfig, GridPos, MacroGrid, RoomCatalog, TileGraph,
    BOSS_ROOM_COUNT,
};

fn generate(config: GenerationConfig) -> CrawlResult<MacroGrid> {
    let mut grid = MacroGrid::new(config, RoomCatalog::standard())?;
    grid.generate_floor();
    Ok(grid)
}

/// Map sizes with arbitrary in-bounds starter and escape positions.
fn landmark_layout() -> impl Strategy<Value = GenerationConfig> {
    (2usize..10, 3usize..10, any::<u64>())
        .prop_flat_map(|(width, height, seed)| {
            (
                Just(width),
                Just(height),
                Just(seed),
                0..height as i32,
                0..width as i32,
                0..height as i32,
                0..width as i32,
            )
        })
        .prop_map(|(width, height, seed, sx, sy, ex, ey)| GenerationConfig {
            map_width: width,
            map_height: height,
            starter_room_position: GridPos::new(sx, sy),
            escape_room_position: GridPos::new(ex, ey),
            ..GenerationConfig::new(seed)
        })
}

fn assert_links_bidirectional(grid: &MacroGrid) {
    for room in grid.rooms() {
        for tile in room.tiles() {
            for direction in Cardinal::ALL {
                if let Some(next) = tile.connection(direction) {
                    let back = grid
                        .tile(next)
                        .and_then(|next| next.connection(direction.opposite()));
                    assert_eq!(back, Some(tile.id), "{:?} {:?}", tile.id, direction);
                }
            }
        }
    }
}

#[test]
fn test_default_floor_is_valid() -> CrawlResult<()> {
    let grid = generate(GenerationConfig::default())?;
    grid.validate_floor()?;
    assert_links_bidirectional(&grid);
    assert!(grid.room_count() > 4);
    Ok(())
}

#[test]
fn test_capacities_match_neighbourhoods() -> CrawlResult<()> {
    let mut grid = generate(GenerationConfig::new(31))?;
    let snapshot = |grid: &MacroGrid| -> Vec<u8> {
        grid.rooms()
            .flat_map(|room| room.tiles().map(|tile| tile.available_space))
            .collect()
    };

    for room in grid.rooms() {
        for tile in room.tiles() {
            assert!(tile.available_space == SMALL_SPACE || tile.available_space == LARGE_SPACE);
            assert_eq!(tile.available_space, grid.computed_space(tile.id));
        }
    }

    let before = snapshot(&grid);
    let indices: Vec<usize> = grid.rooms().map(|room| room.index).collect();
    for _ in 0..2 {
        for index in &indices {
            grid.assign_sizes(*index);
        }
        assert_eq!(snapshot(&grid), before);
    }
    Ok(())
}

#[test]
fn test_boss_floor_links() -> CrawlResult<()> {
    let mut grid = MacroGrid::new(GenerationConfig::default(), RoomCatalog::standard())?;
    assert_eq!(grid.catalog.boss.len(), BOSS_ROOM_COUNT);
    assert!(grid.generate_boss_room());
    assert_eq!(grid.room_count(), grid.flat_size());
    assert_links_bidirectional(&grid);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_seed_connects_starter_to_escape(seed in any::<u64>()) {
        let grid = generate(GenerationConfig::new(seed)).unwrap();
        prop_assert!(grid.validate_floor().is_ok(), "seed {}", seed);

        let start = grid.starter_tile().unwrap();
        let exit = grid.escape_tile().unwrap();
        let path = grid.generate_path(start, exit, 1, false, false);
        prop_assert!(!path.is_empty());
        prop_assert_eq!(path.last().copied(), Some(exit));
    }

    #[test]
    fn prop_any_valid_layout_connects(config in landmark_layout()) {
        prop_assume!(config.validate().is_ok());
        let grid = generate(config).unwrap();
        prop_assert!(grid.validate_floor().is_ok());

        let start = grid.starter_tile().unwrap();
        let exit = grid.escape_tile().unwrap();
        let path = grid.generate_path(start, exit, 1, false, false);
        prop_assert_eq!(path.last().copied(), Some(exit));
    }

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let a = generate(GenerationConfig::for_testing(seed)).unwrap();
        let b = generate(GenerationConfig::for_testing(seed)).unwrap();
        prop_assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn prop_links_are_bidirectional(seed in any::<u64>()) {
        let grid = generate(GenerationConfig::for_testing(seed)).unwrap();
        assert_links_bidirectional(&grid);
    }

    #[test]
    fn prop_neighbouring_fillers_agree_on_edges(seed in any::<u64>()) {
        let grid = generate(GenerationConfig::new(seed)).unwrap();
        let catalog = &grid.catalog;
        let landmarks = [catalog.starter, catalog.tutorial, catalog.escape, catalog.mural];
        for room in grid.rooms().filter(|room| !landmarks.contains(&room.archetype)) {
            for direction in Cardinal::ALL {
                let next = room.position.step(direction);
                match grid.room(next) {
                    Some(neighbor) if !landmarks.contains(&neighbor.archetype) => {
                        prop_assert_eq!(
                            room.is_valid_cardinal(direction),
                            neighbor.is_valid_cardinal(direction.opposite())
                        );
                    }
                    Some(_) => {}
                    None => prop_assert!(
                        !room.is_valid_cardinal(direction) || grid.is_valid_space(next),
                        "{:?} opens off the map",
                        room.position
                    ),
                }
            }
        }
    }
}
