use glam::Vec2;
use hayrunner_core::{
    DifficultyProfile, Event, GenerationWarning, GridCoord, SlabId, TileCatalog,
    TileVisibilitySample,
};
use hayrunner_system_chunk_generation::{ChunkGenerator, SlabRequest};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::tiles::Tile;

/// Inputs shared by every slab generation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GenerationContext<'a> {
    pub(crate) catalog: &'a TileCatalog,
    pub(crate) profile: &'a DifficultyProfile,
    /// Master row kept clear of hazards, if any.
    pub(crate) reserved_row: Option<u32>,
}

#[derive(Clone, Copy, Debug)]
struct Dimensions {
    rows_high: u32,
    lanes_wide: u32,
    tile_size: f32,
}

impl Dimensions {
    fn slab_length(&self) -> f32 {
        (self.rows_high as f32 * self.tile_size).max(0.0)
    }

    /// Converts a master row into a row of the slab at `position`.
    fn local_row(&self, master_row: u32, position: u32) -> Option<u32> {
        if self.rows_high == 0 || master_row / self.rows_high != position {
            return None;
        }
        Some(master_row % self.rows_high)
    }
}

#[derive(Clone, Debug)]
struct Slab {
    id: SlabId,
    offset: f32,
    tiles: Vec<Tile>,
}

/// Owns the two slabs that make up the scrolling strip.
///
/// `order[0]` is the slab nearest the trailing edge; master rows
/// `0..rows_high` belong to it and `rows_high..2 * rows_high` to `order[1]`.
#[derive(Debug)]
pub(crate) struct GridStreamer {
    dimensions: Dimensions,
    slabs: [Slab; 2],
    order: [usize; 2],
    generator: ChunkGenerator,
    rng: ChaCha8Rng,
    regenerations: u64,
}

impl GridStreamer {
    pub(crate) fn new(
        rows_high: u32,
        lanes_wide: u32,
        tile_size: f32,
        seed: u64,
        context: &GenerationContext<'_>,
        warnings: &mut Vec<(SlabId, GenerationWarning)>,
    ) -> Self {
        let dimensions = Dimensions {
            rows_high,
            lanes_wide,
            tile_size,
        };
        let mut generator = ChunkGenerator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let slabs = [0u8, 1].map(|value| {
            let id = SlabId::new(value);
            let position = u32::from(value);
            let (tiles, slab_warnings) =
                generate_tiles(&mut generator, &mut rng, dimensions, id, position, context);
            warnings.extend(slab_warnings.into_iter().map(|warning| (id, warning)));
            Slab {
                id,
                offset: position as f32 * dimensions.slab_length(),
                tiles,
            }
        });

        let mut streamer = Self {
            dimensions,
            slabs,
            order: [0, 1],
            generator,
            rng,
            regenerations: 0,
        };
        streamer.reassign_coordinates();
        streamer
    }

    /// Scrolls both slabs toward the trailing edge and recycles at most one
    /// slab that passed it.
    pub(crate) fn advance(
        &mut self,
        distance: f32,
        context: &GenerationContext<'_>,
        out_events: &mut Vec<Event>,
    ) -> Option<SlabId> {
        let slab_length = self.dimensions.slab_length();
        let distance = if distance.is_finite() {
            distance.max(0.0).min(slab_length)
        } else {
            0.0
        };
        for slab in &mut self.slabs {
            slab.offset -= distance;
        }
        out_events.push(Event::GridScrolled { distance });

        let position = self
            .order
            .iter()
            .position(|&index| self.slabs[index].offset < -slab_length)?;
        let expired = self.order[position];
        let retained = self.order[1 - position];
        let id = self.slabs[expired].id;

        for tile in &self.slabs[expired].tiles {
            if let Some(entity) = tile.occupant() {
                out_events.push(Event::OccupantDespawned {
                    entity,
                    coord: tile.coord(),
                });
            }
        }

        let (tiles, warnings) = generate_tiles(
            &mut self.generator,
            &mut self.rng,
            self.dimensions,
            id,
            1,
            context,
        );
        out_events.extend(
            warnings
                .into_iter()
                .map(|warning| Event::GenerationWarning { slab: id, warning }),
        );

        let expired_slab = &mut self.slabs[expired];
        expired_slab.tiles = tiles;
        expired_slab.offset = slab_length;
        self.slabs[retained].offset = 0.0;
        self.order = [retained, expired];
        self.reassign_coordinates();
        self.regenerations = self.regenerations.saturating_add(1);

        out_events.push(Event::SlabRegenerated {
            slab: id,
            offset: slab_length,
        });
        Some(id)
    }

    pub(crate) fn rows_high(&self) -> u32 {
        self.dimensions.rows_high
    }

    pub(crate) fn lanes_wide(&self) -> u32 {
        self.dimensions.lanes_wide
    }

    pub(crate) fn tile_size(&self) -> f32 {
        self.dimensions.tile_size
    }

    pub(crate) fn slab_length(&self) -> f32 {
        self.dimensions.slab_length()
    }

    pub(crate) fn master_rows(&self) -> u32 {
        self.dimensions.rows_high.saturating_mul(2)
    }

    pub(crate) fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Slab identifiers with their scroll-axis offsets, trailing slab first.
    pub(crate) fn offsets(&self) -> [(SlabId, f32); 2] {
        self.order.map(|index| (self.slabs[index].id, self.slabs[index].offset))
    }

    pub(crate) fn tile(&self, coord: GridCoord) -> Option<&Tile> {
        let (slab, index) = self.index(coord)?;
        self.slabs[slab].tiles.get(index)
    }

    pub(crate) fn tile_mut(&mut self, coord: GridCoord) -> Option<&mut Tile> {
        let (slab, index) = self.index(coord)?;
        self.slabs[slab].tiles.get_mut(index)
    }

    /// World position of a tile: `x` across lanes, `y` along the scroll axis.
    pub(crate) fn tile_position(&self, coord: GridCoord) -> Option<Vec2> {
        let (slab, index) = self.index(coord)?;
        let tile = self.slabs[slab].tiles.get(index)?;
        Some(self.position_of(self.slabs[slab].offset, tile))
    }

    /// Iterates tiles in master-grid order.
    pub(crate) fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.order
            .iter()
            .flat_map(move |&index| self.slabs[index].tiles.iter())
    }

    pub(crate) fn visibility_samples(&self) -> Vec<TileVisibilitySample> {
        self.order
            .iter()
            .flat_map(|&index| {
                let slab = &self.slabs[index];
                slab.tiles.iter().map(move |tile| TileVisibilitySample {
                    coord: tile.coord(),
                    position: self.position_of(slab.offset, tile),
                    active: tile.is_active(),
                })
            })
            .collect()
    }

    fn position_of(&self, offset: f32, tile: &Tile) -> Vec2 {
        let tile_size = self.dimensions.tile_size;
        Vec2::new(
            tile.coord().lane() as f32 * tile_size,
            offset + tile.local_row() as f32 * tile_size,
        )
    }

    fn index(&self, coord: GridCoord) -> Option<(usize, usize)> {
        let Dimensions {
            rows_high,
            lanes_wide,
            ..
        } = self.dimensions;
        if rows_high == 0 || coord.lane() >= lanes_wide || coord.row() >= self.master_rows() {
            return None;
        }
        let position = (coord.row() / rows_high) as usize;
        let local_row = (coord.row() % rows_high) as usize;
        let index = local_row * lanes_wide as usize + coord.lane() as usize;
        Some((self.order[position], index))
    }

    fn reassign_coordinates(&mut self) {
        let rows_high = self.dimensions.rows_high;
        let order = self.order;
        for (position, index) in order.into_iter().enumerate() {
            let base = position as u32 * rows_high;
            for tile in &mut self.slabs[index].tiles {
                let lane = tile.coord().lane();
                tile.set_coord(GridCoord::new(base + tile.local_row(), lane));
            }
        }
    }
}

fn generate_tiles(
    generator: &mut ChunkGenerator,
    rng: &mut ChaCha8Rng,
    dimensions: Dimensions,
    id: SlabId,
    position: u32,
    context: &GenerationContext<'_>,
) -> (Vec<Tile>, Vec<GenerationWarning>) {
    let request = SlabRequest {
        rows_high: dimensions.rows_high,
        lanes_wide: dimensions.lanes_wide,
        tile_size: dimensions.tile_size,
        catalog: context.catalog,
        profile: context.profile,
        reserved_row: context
            .reserved_row
            .and_then(|row| dimensions.local_row(row, position)),
    };
    let layout = generator.generate(&request, rng);
    let warnings = layout.warnings().to_vec();
    let hazard_rows: Vec<u32> = layout.special_rows().iter().map(|special| special.row).collect();
    let tiles = layout
        .into_tiles()
        .into_iter()
        .map(|blueprint| {
            let hazard_row = hazard_rows.contains(&blueprint.local.row());
            Tile::from_blueprint(id, blueprint, hazard_row)
        })
        .collect();
    (tiles, warnings)
}
