#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural slab generation for the endless field.
//!
//! A slab is a `rows_high × lanes_wide` block of tiles. Generation runs in
//! fixed passes: special rows are claimed first, crossings are cut into
//! crossing-capable rows, every remaining cell is drawn from the weighted
//! probability table, fences close the playable boundary, pickups are seeded,
//! and finally the tiles neighbouring each crossing are forced passable.
//!
//! The generator never fails. Malformed profiles are clamped and reported as
//! [`GenerationWarning`] values on the returned [`SlabLayout`].

use glam::Vec2;
use hayrunner_core::{
    AssetId, DifficultyProfile, FenceFacing, GenerationWarning, GridCoord, RowSpec, Shade,
    TileCatalog, TileKindId, TileProbability, PROBABILITY_SCALE,
};
use rand::{seq::SliceRandom, Rng};

/// Draws allowed per requested special row before the row is given up.
const ROW_ATTEMPTS_PER_ROW: u32 = 16;

/// Everything needed to generate one slab.
#[derive(Clone, Copy, Debug)]
pub struct SlabRequest<'a> {
    /// Number of rows along the scroll axis.
    pub rows_high: u32,
    /// Number of lanes across the scroll axis.
    pub lanes_wide: u32,
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Tile types available to the generator.
    pub catalog: &'a TileCatalog,
    /// Generation parameters for the current difficulty tier.
    pub profile: &'a DifficultyProfile,
    /// Slab-local row kept free of hazards and pickups (the player-start row).
    pub reserved_row: Option<u32>,
}

/// Fence decoration closing the playable boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fence {
    /// Side of the interior the fence faces.
    pub facing: FenceFacing,
    /// Decoration asset, absent when none was configured.
    pub asset: Option<AssetId>,
}

/// Generated content of a single tile, in slab-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBlueprint {
    /// Slab-local coordinate.
    pub local: GridCoord,
    /// Tile kind placed on the cell.
    pub kind: TileKindId,
    /// Whether an occupant may stand on the tile.
    pub passable: bool,
    /// Whether the tile hides its occupant.
    pub hiding_place: bool,
    /// Whether the tile is a crossing cut into a hazard row.
    pub crossing: bool,
    /// Cosmetic brightness band.
    pub shade: Shade,
    /// Fence decoration on boundary lanes.
    pub fence: Option<Fence>,
    /// Decoration placed on a crossing.
    pub crossing_asset: Option<AssetId>,
    /// Rotation in degrees applied to a rotatable decoration.
    pub decoration_rotation: Option<f32>,
    /// Whether a collectible was seeded on the tile.
    pub pickup: bool,
}

/// Row claimed by a [`RowSpec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecialRow {
    /// Slab-local row index.
    pub row: u32,
    /// Tile kind filling the row.
    pub kind: TileKindId,
    /// Lanes cut into the row as crossings, in ascending order.
    pub crossings: Vec<u32>,
}

/// Output of one generation pass.
#[derive(Clone, Debug)]
pub struct SlabLayout {
    rows_high: u32,
    lanes_wide: u32,
    tile_size: f32,
    tiles: Vec<TileBlueprint>,
    special_rows: Vec<SpecialRow>,
    warnings: Vec<GenerationWarning>,
}

impl SlabLayout {
    /// Number of rows in the slab.
    #[must_use]
    pub const fn rows_high(&self) -> u32 {
        self.rows_high
    }

    /// Number of lanes in the slab.
    #[must_use]
    pub const fn lanes_wide(&self) -> u32 {
        self.lanes_wide
    }

    /// Looks up a tile by slab-local coordinate.
    #[must_use]
    pub fn tile(&self, local: GridCoord) -> Option<&TileBlueprint> {
        if local.row() >= self.rows_high || local.lane() >= self.lanes_wide {
            return None;
        }
        let index = local.row() as usize * self.lanes_wide as usize + local.lane() as usize;
        self.tiles.get(index)
    }

    /// Tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileBlueprint] {
        &self.tiles
    }

    /// Rows claimed by row specs, in ascending row order.
    #[must_use]
    pub fn special_rows(&self) -> &[SpecialRow] {
        &self.special_rows
    }

    /// Conditions repaired or skipped during generation.
    #[must_use]
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    /// Position of a tile relative to the slab origin.
    #[must_use]
    pub fn local_position(&self, local: GridCoord) -> Vec2 {
        Vec2::new(
            local.lane() as f32 * self.tile_size,
            local.row() as f32 * self.tile_size,
        )
    }

    /// Consumes the layout, yielding its tiles.
    #[must_use]
    pub fn into_tiles(self) -> Vec<TileBlueprint> {
        self.tiles
    }
}

/// Reusable slab generator.
///
/// Scratch buffers are kept between calls; no tile state survives from one
/// call to the next.
#[derive(Debug, Default)]
pub struct ChunkGenerator {
    row_kinds: Vec<Option<TileKindId>>,
    accepted_rows: Vec<u32>,
    lane_candidates: Vec<u32>,
    force_passable: Vec<GridCoord>,
    probabilities: Vec<TileProbability>,
    row_specs: Vec<RowSpec>,
}

impl ChunkGenerator {
    /// Creates a generator with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates one slab from the request, consuming randomness from `rng`.
    pub fn generate<R>(&mut self, request: &SlabRequest<'_>, rng: &mut R) -> SlabLayout
    where
        R: Rng + ?Sized,
    {
        let rows_high = request.rows_high;
        let lanes_wide = request.lanes_wide;
        let catalog = request.catalog;
        let profile = request.profile;
        let default_kind = catalog.default_kind();
        let reserved_row = request.reserved_row.filter(|row| *row < rows_high);

        let mut warnings = Vec::new();
        let boundary = Boundary::clamped(profile, lanes_wide, &mut warnings);
        let (min_crossings, max_crossings) = crossing_range(profile, &mut warnings);
        if profile.tile_probabilities.is_empty() {
            warnings.push(GenerationWarning::EmptyProbabilityTable);
        }

        self.probabilities.clear();
        self.probabilities.extend_from_slice(&profile.tile_probabilities);
        self.row_specs.clear();
        self.row_specs.extend_from_slice(&profile.row_specs);
        if profile.shuffle_order {
            self.probabilities.shuffle(rng);
            self.row_specs.shuffle(rng);
        }

        self.assign_rows(rows_high, reserved_row, rng);

        let capacity = rows_high as usize * lanes_wide as usize;
        let mut tiles = Vec::with_capacity(capacity);
        let mut special_rows = Vec::new();
        self.force_passable.clear();

        for row in 0..rows_high {
            let row_kind = self.row_kinds[row as usize];
            let crossings = match row_kind {
                Some(kind) if catalog.definition(kind).has_crossings => self.place_crossings(
                    profile,
                    &boundary,
                    min_crossings,
                    max_crossings,
                    rng,
                ),
                _ => Vec::new(),
            };

            for lane in 0..lanes_wide {
                let inside = boundary.contains(lane);
                let kind = if reserved_row == Some(row) {
                    default_kind
                } else if let Some(kind) = row_kind {
                    kind
                } else {
                    select_kind(&self.probabilities, inside, default_kind, rng)
                };
                let definition = catalog.definition(kind);

                let mut tile = TileBlueprint {
                    local: GridCoord::new(row, lane),
                    kind,
                    passable: definition.passable,
                    hiding_place: definition.hiding_place,
                    crossing: false,
                    shade: if inside && row % 2 == 0 {
                        Shade::Light
                    } else {
                        Shade::Dark
                    },
                    fence: None,
                    crossing_asset: None,
                    decoration_rotation: None,
                    pickup: false,
                };

                if definition.rotatable_decoration {
                    tile.decoration_rotation = Some(rng.gen_range(0.0..360.0));
                }

                if crossings.contains(&lane) {
                    tile.passable = true;
                    tile.crossing = true;
                    tile.crossing_asset = definition.crossing_asset;
                    if definition.crossing_asset.is_none() {
                        push_unique(&mut warnings, GenerationWarning::MissingCrossingAsset { kind });
                    }
                }

                if let Some(facing) = boundary.fence_facing(lane) {
                    let asset = definition.fence_asset.or(catalog.fence_asset());
                    if asset.is_none() {
                        push_unique(&mut warnings, GenerationWarning::MissingFenceAsset { kind });
                    }
                    tile.passable = false;
                    tile.fence = Some(Fence { facing, asset });
                }

                tiles.push(tile);
            }

            for &lane in &crossings {
                if row > 0 {
                    self.force_passable.push(GridCoord::new(row - 1, lane));
                }
                if row + 1 < rows_high {
                    self.force_passable.push(GridCoord::new(row + 1, lane));
                }
            }

            if let Some(kind) = row_kind {
                special_rows.push(SpecialRow {
                    row,
                    kind,
                    crossings,
                });
            }
        }

        if profile.pickup_probability > 0.0 {
            for tile in &mut tiles {
                let eligible = tile.passable
                    && !tile.hiding_place
                    && Some(tile.local.row()) != reserved_row;
                if eligible && rng.gen_range(0.0..PROBABILITY_SCALE) < profile.pickup_probability {
                    tile.pickup = true;
                }
            }
        }

        for &local in &self.force_passable {
            let index = local.row() as usize * lanes_wide as usize + local.lane() as usize;
            let Some(tile) = tiles.get_mut(index) else {
                continue;
            };
            if tile.fence.is_some() || tile.passable {
                continue;
            }
            tile.passable = true;
            if let Some(row_kind) = self.row_kinds[local.row() as usize] {
                tile.crossing = true;
                tile.crossing_asset = catalog.definition(row_kind).crossing_asset;
            } else {
                let definition = catalog.definition(default_kind);
                tile.kind = default_kind;
                tile.hiding_place = definition.hiding_place;
                tile.decoration_rotation = None;
            }
        }

        SlabLayout {
            rows_high,
            lanes_wide,
            tile_size: request.tile_size,
            tiles,
            special_rows,
            warnings,
        }
    }

    /// Claims rows for every row spec, leaving unresolved rows unassigned once
    /// the attempt budget runs out.
    fn assign_rows<R>(&mut self, rows_high: u32, reserved_row: Option<u32>, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.row_kinds.clear();
        self.row_kinds.resize(rows_high as usize, None);
        if rows_high < 3 {
            return;
        }

        for spec in &self.row_specs {
            // Rows of the same kind claimed by earlier specs count toward spacing.
            self.accepted_rows.clear();
            self.accepted_rows.extend(
                self.row_kinds
                    .iter()
                    .enumerate()
                    .filter(|(_, assigned)| **assigned == Some(spec.kind))
                    .map(|(row, _)| row as u32),
            );

            let budget = spec.row_count.saturating_mul(ROW_ATTEMPTS_PER_ROW);
            let mut accepted = 0;
            let mut attempts = 0;
            while accepted < spec.row_count && attempts < budget {
                attempts += 1;
                let row = rng.gen_range(1..=rows_high - 2);
                if reserved_row == Some(row) || self.row_kinds[row as usize].is_some() {
                    continue;
                }
                let too_close = self
                    .accepted_rows
                    .iter()
                    .any(|other| other.abs_diff(row) <= spec.minimum_rows_apart);
                if too_close {
                    continue;
                }
                self.row_kinds[row as usize] = Some(spec.kind);
                self.accepted_rows.push(row);
                accepted += 1;
            }
        }
    }

    fn place_crossings<R>(
        &mut self,
        profile: &DifficultyProfile,
        boundary: &Boundary,
        min_crossings: u32,
        max_crossings: u32,
        rng: &mut R,
    ) -> Vec<u32>
    where
        R: Rng + ?Sized,
    {
        if rng.gen_range(0.0..PROBABILITY_SCALE) >= profile.crossing_probability {
            return Vec::new();
        }

        self.lane_candidates.clear();
        self.lane_candidates.extend(boundary.interior());
        if self.lane_candidates.is_empty() {
            return Vec::new();
        }

        let requested = rng.gen_range(min_crossings..=max_crossings) as usize;
        let count = requested.min(self.lane_candidates.len());
        let (chosen, _) = self.lane_candidates.partial_shuffle(rng, count);
        let mut crossings = chosen.to_vec();
        crossings.sort_unstable();
        crossings
    }
}

/// Playable interior of a slab after clamping the profile's boundary widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Boundary {
    left: u32,
    right: u32,
    lanes_wide: u32,
}

impl Boundary {
    fn clamped(
        profile: &DifficultyProfile,
        lanes_wide: u32,
        warnings: &mut Vec<GenerationWarning>,
    ) -> Self {
        let right = profile.boundary_right.min(lanes_wide);
        let left = profile.boundary_left.min(lanes_wide - right);
        if right != profile.boundary_right || left != profile.boundary_left {
            warnings.push(GenerationWarning::BoundaryClamped {
                requested_left: profile.boundary_left,
                requested_right: profile.boundary_right,
                applied_left: left,
                applied_right: right,
            });
        }
        Self {
            left,
            right,
            lanes_wide,
        }
    }

    fn interior_end(&self) -> u32 {
        self.lanes_wide - self.left
    }

    fn contains(&self, lane: u32) -> bool {
        lane >= self.right && lane < self.interior_end()
    }

    fn interior(&self) -> std::ops::Range<u32> {
        self.right..self.interior_end()
    }

    fn fence_facing(&self, lane: u32) -> Option<FenceFacing> {
        if self.right > 0 && lane == self.right - 1 {
            Some(FenceFacing::IncreasingLanes)
        } else if self.left > 0 && lane == self.interior_end() {
            Some(FenceFacing::DecreasingLanes)
        } else {
            None
        }
    }
}

fn crossing_range(
    profile: &DifficultyProfile,
    warnings: &mut Vec<GenerationWarning>,
) -> (u32, u32) {
    if profile.min_crossings > profile.max_crossings {
        warnings.push(GenerationWarning::CrossingRangeClamped {
            min_crossings: profile.min_crossings,
            requested_max: profile.max_crossings,
        });
        return (profile.min_crossings, profile.min_crossings);
    }
    (profile.min_crossings, profile.max_crossings)
}

/// Walks eligible candidates in order; the first whose cumulative weight
/// reaches the roll wins, and a roll above the total falls through to the
/// default kind.
fn select_kind<R>(
    candidates: &[TileProbability],
    inside_boundary: bool,
    default_kind: TileKindId,
    rng: &mut R,
) -> TileKindId
where
    R: Rng + ?Sized,
{
    let roll = rng.gen_range(0.0..PROBABILITY_SCALE);
    let mut cumulative = 0.0;
    for candidate in candidates {
        if candidate.only_inside_boundary && !inside_boundary {
            continue;
        }
        if candidate.only_outside_boundary && inside_boundary {
            continue;
        }
        cumulative += candidate.probability.max(0.0);
        if cumulative >= roll {
            return candidate.kind;
        }
    }
    default_kind
}

fn push_unique(warnings: &mut Vec<GenerationWarning>, warning: GenerationWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
