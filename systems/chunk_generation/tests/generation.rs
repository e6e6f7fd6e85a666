use std::collections::HashSet;

use hayrunner_core::{
    AssetId, DifficultyProfile, FenceFacing, GenerationWarning, GridCoord, RowSpec, Shade,
    TileCatalog, TileKindId, TileProbability, TileTypeDef,
};
use hayrunner_system_chunk_generation::{ChunkGenerator, SlabLayout, SlabRequest};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const GRASS: TileKindId = TileKindId::new(0);
const ROCK: TileKindId = TileKindId::new(1);
const HAY: TileKindId = TileKindId::new(2);
const WATER: TileKindId = TileKindId::new(3);
const TREE: TileKindId = TileKindId::new(4);

fn catalog(with_assets: bool) -> TileCatalog {
    let mut rock = TileTypeDef::new("rock");
    rock.passable = false;
    let mut hay = TileTypeDef::new("hay");
    hay.hiding_place = true;
    let mut water = TileTypeDef::new("water");
    water.passable = false;
    water.has_crossings = true;
    let mut tree = TileTypeDef::new("tree");
    tree.passable = false;
    tree.rotatable_decoration = true;
    if with_assets {
        water.crossing_asset = Some(AssetId::new(7));
    }
    let fence = with_assets.then(|| AssetId::new(1));
    TileCatalog::new(
        vec![TileTypeDef::new("grass"), rock, hay, water, tree],
        GRASS,
        fence,
    )
    .expect("valid catalog")
}

fn scenario_profile() -> DifficultyProfile {
    DifficultyProfile {
        tile_probabilities: vec![
            TileProbability::new(ROCK, 15.0),
            TileProbability::new(HAY, 10.0),
            TileProbability {
                kind: TREE,
                probability: 40.0,
                only_inside_boundary: false,
                only_outside_boundary: true,
            },
        ],
        row_specs: vec![RowSpec {
            kind: WATER,
            row_count: 2,
            minimum_rows_apart: 2,
        }],
        boundary_left: 2,
        boundary_right: 2,
        pickup_probability: 10.0,
        ..DifficultyProfile::default()
    }
}

fn generate(
    catalog: &TileCatalog,
    profile: &DifficultyProfile,
    reserved_row: Option<u32>,
    seed: u64,
) -> SlabLayout {
    let request = SlabRequest {
        rows_high: 10,
        lanes_wide: 15,
        tile_size: 1.0,
        catalog,
        profile,
        reserved_row,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ChunkGenerator::new().generate(&request, &mut rng)
}

#[test]
fn slab_has_one_tile_per_coordinate() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    for seed in 0..16 {
        let slab = generate(&catalog, &profile, None, seed);
        assert_eq!(slab.tiles().len(), 150);
        let coords: HashSet<GridCoord> = slab.tiles().iter().map(|tile| tile.local).collect();
        assert_eq!(coords.len(), 150);
        assert!(coords
            .iter()
            .all(|coord| coord.row() < 10 && coord.lane() < 15));
        for (index, tile) in slab.tiles().iter().enumerate() {
            assert_eq!(tile.local.row() as usize, index / 15);
            assert_eq!(tile.local.lane() as usize, index % 15);
        }
    }
}

#[test]
fn water_rows_respect_spacing_and_count() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    for seed in 0..64 {
        let slab = generate(&catalog, &profile, None, seed);
        let rows: Vec<u32> = slab
            .special_rows()
            .iter()
            .filter(|special| special.kind == WATER)
            .map(|special| special.row)
            .collect();
        assert!(rows.len() <= 2, "seed {seed} placed {rows:?}");
        assert!(rows.iter().all(|row| (1..=8).contains(row)));
        if let [first, second] = rows[..] {
            assert!(first.abs_diff(second) >= 3, "seed {seed} placed {rows:?}");
        }
        for special in slab.special_rows() {
            for lane in 2..13 {
                let tile = slab
                    .tile(GridCoord::new(special.row, lane))
                    .expect("tile inside slab");
                assert_eq!(tile.kind, WATER);
            }
        }
    }
}

#[test]
fn crossings_and_their_neighbours_are_passable() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    let mut saw_crossing = false;
    for seed in 0..64 {
        let slab = generate(&catalog, &profile, None, seed);
        for special in slab.special_rows() {
            assert!(!special.crossings.is_empty());
            assert!(special.crossings.len() <= 2);
            for &lane in &special.crossings {
                saw_crossing = true;
                assert!((2..13).contains(&lane), "crossing on boundary lane {lane}");
                let tile = slab
                    .tile(GridCoord::new(special.row, lane))
                    .expect("crossing tile");
                assert!(tile.crossing);
                assert!(tile.passable);
                assert_eq!(tile.crossing_asset, Some(AssetId::new(7)));
                for neighbour in [special.row - 1, special.row + 1] {
                    let adjacent = slab
                        .tile(GridCoord::new(neighbour, lane))
                        .expect("neighbour tile");
                    assert!(adjacent.passable, "seed {seed} blocked ({neighbour}, {lane})");
                }
            }
        }
        for tile in slab.tiles() {
            if tile.crossing {
                assert!(tile.passable);
            }
        }
    }
    assert!(saw_crossing);
}

#[test]
fn boundary_lanes_are_dark_and_fenced() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    let slab = generate(&catalog, &profile, None, 11);
    for row in 0..10 {
        for lane in [0, 1, 13, 14] {
            let tile = slab.tile(GridCoord::new(row, lane)).expect("tile");
            assert_eq!(tile.shade, Shade::Dark);
        }
        for lane in 2..13 {
            let tile = slab.tile(GridCoord::new(row, lane)).expect("tile");
            let expected = if row % 2 == 0 { Shade::Light } else { Shade::Dark };
            assert_eq!(tile.shade, expected);
        }

        let low_fence = slab.tile(GridCoord::new(row, 1)).expect("tile");
        let high_fence = slab.tile(GridCoord::new(row, 13)).expect("tile");
        assert!(!low_fence.passable);
        assert!(!high_fence.passable);
        assert_eq!(
            low_fence.fence.map(|fence| fence.facing),
            Some(FenceFacing::IncreasingLanes)
        );
        assert_eq!(
            high_fence.fence.map(|fence| fence.facing),
            Some(FenceFacing::DecreasingLanes)
        );
        assert_eq!(low_fence.fence.and_then(|fence| fence.asset), Some(AssetId::new(1)));
    }
    assert!(slab.warnings().is_empty());
}

#[test]
fn outside_only_tiles_never_appear_in_bounds() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    for seed in 0..32 {
        let slab = generate(&catalog, &profile, None, seed);
        for tile in slab.tiles() {
            if tile.kind == TREE {
                let lane = tile.local.lane();
                assert!(!(2..13).contains(&lane));
                assert!(tile.decoration_rotation.is_some());
            }
        }
    }
}

#[test]
fn empty_table_fills_with_default_kind() {
    let catalog = catalog(true);
    let profile = DifficultyProfile::default();
    let slab = generate(&catalog, &profile, None, 5);
    assert!(slab.tiles().iter().all(|tile| tile.kind == GRASS));
    assert!(slab.tiles().iter().all(|tile| tile.passable));
    assert_eq!(slab.warnings(), &[GenerationWarning::EmptyProbabilityTable]);
}

#[test]
fn malformed_profile_is_clamped_and_reported() {
    let catalog = catalog(true);
    let profile = DifficultyProfile {
        tile_probabilities: vec![TileProbability::new(ROCK, 10.0)],
        row_specs: vec![RowSpec {
            kind: WATER,
            row_count: 1,
            minimum_rows_apart: 0,
        }],
        min_crossings: 5,
        max_crossings: 1,
        boundary_left: 40,
        boundary_right: 3,
        ..DifficultyProfile::default()
    };
    let slab = generate(&catalog, &profile, None, 9);
    assert_eq!(slab.tiles().len(), 150);
    assert!(slab.warnings().contains(&GenerationWarning::BoundaryClamped {
        requested_left: 40,
        requested_right: 3,
        applied_left: 12,
        applied_right: 3,
    }));
    assert!(slab.warnings().contains(&GenerationWarning::CrossingRangeClamped {
        min_crossings: 5,
        requested_max: 1,
    }));
    // The interior is empty, so water rows have nowhere to cut crossings.
    assert!(slab
        .special_rows()
        .iter()
        .all(|special| special.crossings.is_empty()));
}

#[test]
fn missing_assets_are_reported_once() {
    let catalog = catalog(false);
    let profile = scenario_profile();
    let slab = generate(&catalog, &profile, None, 21);
    let fence_warnings = slab
        .warnings()
        .iter()
        .filter(|warning| matches!(warning, GenerationWarning::MissingFenceAsset { .. }))
        .count();
    assert!(fence_warnings >= 1);
    let unique: HashSet<&GenerationWarning> = slab.warnings().iter().collect();
    assert_eq!(unique.len(), slab.warnings().len());

    let fence = slab.tile(GridCoord::new(0, 1)).expect("tile");
    assert!(!fence.passable);
    assert_eq!(fence.fence.and_then(|fence| fence.asset), None);
}

#[test]
fn reserved_row_stays_clear() {
    let catalog = catalog(true);
    let mut profile = scenario_profile();
    profile.pickup_probability = 100.0;
    for seed in 0..16 {
        let slab = generate(&catalog, &profile, Some(5), seed);
        assert!(slab.special_rows().iter().all(|special| special.row != 5));
        for lane in 2..13 {
            let tile = slab.tile(GridCoord::new(5, lane)).expect("tile");
            assert_eq!(tile.kind, GRASS);
            assert!(tile.passable);
            assert!(!tile.pickup);
        }
    }
}

#[test]
fn pickups_only_land_on_open_ground() {
    let catalog = catalog(true);
    let mut profile = scenario_profile();
    profile.pickup_probability = 100.0;
    let slab = generate(&catalog, &profile, None, 4);
    for tile in slab.tiles() {
        if tile.pickup {
            assert!(tile.passable);
            assert!(!tile.hiding_place);
            assert!(tile.fence.is_none());
        }
    }
    assert!(slab.tiles().iter().any(|tile| tile.pickup));
}

#[test]
fn generation_is_deterministic_per_seed() {
    let catalog = catalog(true);
    let mut profile = scenario_profile();
    profile.shuffle_order = true;
    let first = generate(&catalog, &profile, None, 77);
    let second = generate(&catalog, &profile, None, 77);
    assert_eq!(first.tiles(), second.tiles());
    assert_eq!(first.special_rows(), second.special_rows());
}

#[test]
fn generator_reuse_does_not_leak_rows() {
    let catalog = catalog(true);
    let profile = scenario_profile();
    let request = SlabRequest {
        rows_high: 10,
        lanes_wide: 15,
        tile_size: 2.0,
        catalog: &catalog,
        profile: &profile,
        reserved_row: None,
    };
    let mut generator = ChunkGenerator::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..8 {
        let slab = generator.generate(&request, &mut rng);
        assert_eq!(slab.tiles().len(), 150);
        assert!(slab.special_rows().len() <= 2);
        assert_eq!(
            slab.local_position(GridCoord::new(3, 4)),
            glam::Vec2::new(8.0, 6.0)
        );
    }
}
