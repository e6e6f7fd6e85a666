#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Hayrunner.
//!
//! The world owns the two-slab grid streamer, the occupants standing on the
//! master grid and the run lifecycle. It is mutated exclusively through
//! [`apply`] and observed through the [`query`] module.

mod streamer;
mod tiles;

use std::{collections::BTreeMap, fmt};

use hayrunner_core::{
    Command, DifficultyProfile, EntityHandle, Event, GenerationWarning, GridCoord, HopDirection,
    HopError, OccupantKind, PlayState, SlabId, SpawnError, TileCatalog,
};

use crate::streamer::{GenerationContext, GridStreamer};
use crate::tiles::Occupant;

pub use crate::tiles::Tile;

const DEFAULT_ROWS_HIGH: u32 = 10;
const DEFAULT_LANES_WIDE: u32 = 15;
const DEFAULT_TILE_SIZE: f32 = 1.0;
const DEFAULT_PLAYER_START: GridCoord = GridCoord::new(5, 7);

/// Construction-time configuration of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Rows per slab along the scroll axis.
    pub rows_high: u32,
    /// Lanes across the scroll axis.
    pub lanes_wide: u32,
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Seed of the generation RNG stream.
    pub seed: u64,
    /// Master-grid tile the player spawns on; its row is kept clear until the run starts.
    pub player_start: GridCoord,
    /// Tile types available to generation.
    pub catalog: TileCatalog,
    /// Initial difficulty profile.
    pub profile: DifficultyProfile,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rows_high: DEFAULT_ROWS_HIGH,
            lanes_wide: DEFAULT_LANES_WIDE,
            tile_size: DEFAULT_TILE_SIZE,
            seed: 0,
            player_start: DEFAULT_PLAYER_START,
            catalog: TileCatalog::default(),
            profile: DifficultyProfile::default(),
        }
    }
}

/// Represents the authoritative Hayrunner world state.
#[derive(Debug)]
pub struct World {
    catalog: TileCatalog,
    profile: DifficultyProfile,
    player_start: GridCoord,
    streamer: GridStreamer,
    occupants: BTreeMap<EntityHandle, Occupant>,
    play_state: PlayState,
    startup_warnings: Vec<(SlabId, GenerationWarning)>,
    tick_index: u64,
}

impl World {
    /// Creates a world and generates both initial slabs.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let WorldConfig {
            rows_high,
            lanes_wide,
            tile_size,
            seed,
            player_start,
            catalog,
            profile,
        } = config;

        let mut startup_warnings = Vec::new();
        let context = GenerationContext {
            catalog: &catalog,
            profile: &profile,
            reserved_row: Some(player_start.row()),
        };
        let streamer = GridStreamer::new(
            rows_high,
            lanes_wide,
            tile_size,
            seed,
            &context,
            &mut startup_warnings,
        );

        Self {
            catalog,
            profile,
            player_start,
            streamer,
            occupants: BTreeMap::new(),
            play_state: PlayState::Ready,
            startup_warnings,
            tick_index: 0,
        }
    }

    /// Row kept clear of hazards in newly generated slabs.
    fn reserved_row(&self) -> Option<u32> {
        match self.play_state {
            PlayState::Running => None,
            PlayState::Ready | PlayState::Ended => Some(self.player_start.row()),
        }
    }

    fn scroll(&mut self, distance: f32, out_events: &mut Vec<Event>) {
        let context = GenerationContext {
            catalog: &self.catalog,
            profile: &self.profile,
            reserved_row: self.reserved_row(),
        };
        if self.streamer.advance(distance, &context, out_events).is_some() {
            self.refresh_occupants();
        }
    }

    /// Rebuilds the entity registry from the tiles after the master grid changed.
    fn refresh_occupants(&mut self) {
        let mut refreshed = BTreeMap::new();
        for tile in self.streamer.tiles() {
            let Some(entity) = tile.occupant() else {
                continue;
            };
            if let Some(previous) = self.occupants.get(&entity) {
                let _ = refreshed.insert(
                    entity,
                    Occupant {
                        kind: previous.kind,
                        coord: tile.coord(),
                    },
                );
            }
        }
        self.occupants = refreshed;
    }

    fn spawn(
        &mut self,
        coord: GridCoord,
        entity: EntityHandle,
        kind: OccupantKind,
    ) -> Result<(), SpawnError> {
        if self.occupants.contains_key(&entity) {
            return Err(SpawnError::DuplicateEntity);
        }
        let tile = self
            .streamer
            .tile_mut(coord)
            .ok_or(SpawnError::OutOfBounds)?;
        if tile.occupant().is_some() {
            return Err(SpawnError::Occupied);
        }
        if !tile.is_passable() {
            return Err(SpawnError::Impassable);
        }
        tile.set_occupant(Some(entity));
        let _ = self.occupants.insert(entity, Occupant { kind, coord });
        Ok(())
    }

    fn hop(
        &mut self,
        entity: EntityHandle,
        direction: HopDirection,
        out_events: &mut Vec<Event>,
    ) -> Result<(), HopError> {
        if self.play_state != PlayState::Running {
            return Err(HopError::RunInactive);
        }
        let from = self
            .occupants
            .get(&entity)
            .map(|occupant| occupant.coord)
            .ok_or(HopError::UnknownEntity)?;
        let to = from.step(direction).ok_or(HopError::OutOfBounds)?;
        let destination = self.streamer.tile_mut(to).ok_or(HopError::OutOfBounds)?;
        if !destination.is_passable() {
            return Err(HopError::Impassable);
        }
        if destination.occupant().is_some() {
            return Err(HopError::Occupied);
        }

        destination.set_occupant(Some(entity));
        let collected = destination.take_pickup();
        if let Some(origin) = self.streamer.tile_mut(from) {
            origin.set_occupant(None);
        }
        if let Some(occupant) = self.occupants.get_mut(&entity) {
            occupant.coord = to;
        }

        out_events.push(Event::OccupantHopped { entity, from, to });
        if collected {
            out_events.push(Event::PickupCollected { entity, coord: to });
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartRun => {
            if world.play_state == PlayState::Ready {
                world.play_state = PlayState::Running;
                out_events.push(Event::RunStarted);
            }
        }
        Command::EndRun { reason } => {
            if world.play_state == PlayState::Running {
                world.play_state = PlayState::Ended;
                out_events.push(Event::RunEnded { reason });
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::Scroll { distance } => world.scroll(distance, out_events),
        Command::SpawnOnTile {
            coord,
            entity,
            kind,
        } => match world.spawn(coord, entity, kind) {
            Ok(()) => out_events.push(Event::OccupantSpawned {
                entity,
                kind,
                coord,
            }),
            Err(reason) => out_events.push(Event::SpawnRejected {
                entity,
                coord,
                reason,
            }),
        },
        Command::HopOccupant { entity, direction } => {
            if let Err(reason) = world.hop(entity, direction, out_events) {
                out_events.push(Event::HopRejected {
                    entity,
                    direction,
                    reason,
                });
            }
        }
        Command::SetTileActive { coord, active } => {
            if let Some(tile) = world.streamer.tile_mut(coord) {
                if tile.set_active(active) {
                    out_events.push(Event::TileActivationChanged { coord, active });
                }
            }
        }
        Command::ChangeDifficulty { profile } => {
            world.profile = profile;
            out_events.push(Event::DifficultyChanged);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use hayrunner_core::{
        DifficultyProfile, EntityHandle, GenerationWarning, GridCoord, OccupantKind, PlayState,
        SlabId, TileCatalog, TileVisibilitySample,
    };

    use super::{GridDump, Tile, World};

    /// Current lifecycle state of the run.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Master-grid dimensions as `(rows, lanes)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.streamer.master_rows(), world.streamer.lanes_wide())
    }

    /// Rows per slab.
    #[must_use]
    pub fn rows_high(world: &World) -> u32 {
        world.streamer.rows_high()
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub fn tile_size(world: &World) -> f32 {
        world.streamer.tile_size()
    }

    /// Length of one slab along the scroll axis.
    #[must_use]
    pub fn slab_length(world: &World) -> f32 {
        world.streamer.slab_length()
    }

    /// Looks up the tile at a master-grid coordinate.
    #[must_use]
    pub fn tile_at(world: &World, coord: GridCoord) -> Option<&Tile> {
        world.streamer.tile(coord)
    }

    /// World position of the tile at a master-grid coordinate.
    #[must_use]
    pub fn tile_position(world: &World, coord: GridCoord) -> Option<Vec2> {
        world.streamer.tile_position(coord)
    }

    /// Iterates every tile in master-grid order (row-major, trailing slab first).
    pub fn tiles(world: &World) -> impl Iterator<Item = &Tile> {
        world.streamer.tiles()
    }

    /// Captures the position and activation flag of every tile.
    #[must_use]
    pub fn visibility_samples(world: &World) -> Vec<TileVisibilitySample> {
        world.streamer.visibility_samples()
    }

    /// Slab identifiers and scroll-axis offsets, trailing slab first.
    #[must_use]
    pub fn slab_offsets(world: &World) -> [(SlabId, f32); 2] {
        world.streamer.offsets()
    }

    /// Number of slabs regenerated since the world was created.
    #[must_use]
    pub fn regeneration_count(world: &World) -> u64 {
        world.streamer.regenerations()
    }

    /// Master-grid coordinate of an occupant.
    #[must_use]
    pub fn locate(world: &World, entity: EntityHandle) -> Option<GridCoord> {
        world.occupants.get(&entity).map(|occupant| occupant.coord)
    }

    /// World position of the tile an occupant stands on.
    #[must_use]
    pub fn occupant_position(world: &World, entity: EntityHandle) -> Option<Vec2> {
        locate(world, entity).and_then(|coord| tile_position(world, coord))
    }

    /// Every registered occupant in handle order.
    pub fn occupants(
        world: &World,
    ) -> impl Iterator<Item = (EntityHandle, OccupantKind, GridCoord)> + '_ {
        world
            .occupants
            .iter()
            .map(|(entity, occupant)| (*entity, occupant.kind, occupant.coord))
    }

    /// Master-grid tile the player spawns on.
    #[must_use]
    pub fn player_start(world: &World) -> GridCoord {
        world.player_start
    }

    /// Difficulty profile applied to the next generated slab.
    #[must_use]
    pub fn profile(world: &World) -> &DifficultyProfile {
        &world.profile
    }

    /// Tile catalog used by generation.
    #[must_use]
    pub fn catalog(world: &World) -> &TileCatalog {
        &world.catalog
    }

    /// Warnings raised while generating the initial slabs.
    #[must_use]
    pub fn startup_warnings(world: &World) -> &[(SlabId, GenerationWarning)] {
        &world.startup_warnings
    }

    /// Textual rendering of the master grid.
    #[must_use]
    pub fn grid_dump(world: &World) -> GridDump<'_> {
        GridDump { world }
    }
}

/// Renders the master grid one row per line, leading edge first.
#[derive(Clone, Copy, Debug)]
pub struct GridDump<'a> {
    world: &'a World,
}

impl fmt::Display for GridDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, lanes) = query::dimensions(self.world);
        for row in (0..rows).rev() {
            write!(f, "{row:>4} ")?;
            for lane in 0..lanes {
                let glyph = query::tile_at(self.world, GridCoord::new(row, lane))
                    .map_or(' ', Tile::glyph);
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
