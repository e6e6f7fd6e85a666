#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hayrunner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable views, and respond exclusively with new command batches.
//!
//! The generation contracts ([`TileCatalog`], [`DifficultyProfile`]) are plain
//! immutable configuration loaded once at startup.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Upper bound of the roll used by weighted tile selection.
pub const PROBABILITY_SCALE: f32 = 100.0;

/// Lifecycle of a single run through the endless field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// The grid exists but the run has not started; the player-start row is reserved.
    Ready,
    /// The grid scrolls and the player may hop.
    Running,
    /// The run finished; scrolling and hopping are disabled.
    Ended,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the run, enabling scrolling and hops.
    StartRun,
    /// Ends the run for the provided reason.
    EndRun {
        /// Why the run ended.
        reason: RunEndReason,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves both slabs toward the trailing edge by the provided distance.
    Scroll {
        /// Distance in world units; clamped by the world to one slab length.
        distance: f32,
    },
    /// Places an entity onto the tile at the provided master-grid coordinate.
    SpawnOnTile {
        /// Master-grid coordinate of the destination tile.
        coord: GridCoord,
        /// Handle allocated by the caller for the entity.
        entity: EntityHandle,
        /// Role the entity plays on the grid.
        kind: OccupantKind,
    },
    /// Requests that an occupant hop one tile in the provided direction.
    HopOccupant {
        /// Occupant attempting the hop.
        entity: EntityHandle,
        /// Direction of the hop.
        direction: HopDirection,
    },
    /// Toggles whether a tile is active (inside the culled viewport).
    SetTileActive {
        /// Master-grid coordinate of the tile.
        coord: GridCoord,
        /// Desired activation state.
        active: bool,
    },
    /// Replaces the difficulty profile used by subsequent slab generations.
    ChangeDifficulty {
        /// Profile to install.
        profile: DifficultyProfile,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the run started.
    RunStarted,
    /// Announces that the run ended.
    RunEnded {
        /// Why the run ended.
        reason: RunEndReason,
    },
    /// Confirms that both slabs moved toward the trailing edge.
    GridScrolled {
        /// Distance actually applied after clamping.
        distance: f32,
    },
    /// Reports that a slab scrolled off-screen and was regenerated past the leading edge.
    SlabRegenerated {
        /// Slab that was recycled.
        slab: SlabId,
        /// Scroll-axis offset of the regenerated slab.
        offset: f32,
    },
    /// Diagnostic raised while generating a slab; generation still completed.
    GenerationWarning {
        /// Slab being generated when the warning was raised.
        slab: SlabId,
        /// Specific condition that was repaired or skipped.
        warning: GenerationWarning,
    },
    /// Confirms that an entity was placed on a tile.
    OccupantSpawned {
        /// Entity that was placed.
        entity: EntityHandle,
        /// Role of the entity.
        kind: OccupantKind,
        /// Master-grid coordinate of the tile.
        coord: GridCoord,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Entity named in the request.
        entity: EntityHandle,
        /// Coordinate named in the request.
        coord: GridCoord,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an occupant hopped between two tiles.
    OccupantHopped {
        /// Occupant that hopped.
        entity: EntityHandle,
        /// Tile occupied before the hop.
        from: GridCoord,
        /// Tile occupied after the hop.
        to: GridCoord,
    },
    /// Reports that a hop request was rejected.
    HopRejected {
        /// Occupant named in the request.
        entity: EntityHandle,
        /// Direction named in the request.
        direction: HopDirection,
        /// Specific reason the hop failed.
        reason: HopError,
    },
    /// Reports that an occupant consumed the pickup on its tile.
    PickupCollected {
        /// Occupant that collected the pickup.
        entity: EntityHandle,
        /// Tile that held the pickup.
        coord: GridCoord,
    },
    /// Reports that an occupant was removed because its slab was recycled.
    OccupantDespawned {
        /// Occupant that was removed.
        entity: EntityHandle,
        /// Last master-grid coordinate of the occupant.
        coord: GridCoord,
    },
    /// Confirms that a tile's activation flag changed.
    TileActivationChanged {
        /// Master-grid coordinate of the tile.
        coord: GridCoord,
        /// New activation state.
        active: bool,
    },
    /// Confirms that a new difficulty profile was installed.
    DifficultyChanged,
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunEndReason {
    /// The pursuer caught the player.
    Caught,
    /// The adapter abandoned the run.
    Abandoned,
}

/// Location of a tile in the master grid.
///
/// Rows run along the scroll axis (increasing in the direction of travel);
/// lanes run across it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    row: u32,
    lane: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: u32, lane: u32) -> Self {
        Self { row, lane }
    }

    /// Zero-based row index along the scroll axis.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based lane index across the scroll axis.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Returns the neighbouring coordinate in the provided direction.
    ///
    /// Yields `None` when the step would leave the non-negative quadrant;
    /// upper bounds are the caller's concern.
    #[must_use]
    pub fn step(self, direction: HopDirection) -> Option<Self> {
        match direction {
            HopDirection::Forward => self.row.checked_add(1).map(|row| Self::new(row, self.lane)),
            HopDirection::Backward => self.row.checked_sub(1).map(|row| Self::new(row, self.lane)),
            HopDirection::Left => self.lane.checked_sub(1).map(|lane| Self::new(self.row, lane)),
            HopDirection::Right => self.lane.checked_add(1).map(|lane| Self::new(self.row, lane)),
        }
    }
}

/// Identifies one of the two slabs owned by the grid streamer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlabId(u8);

impl SlabId {
    /// Creates a new slab identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Caller-allocated handle for an entity standing on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Role an entity plays while occupying a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OccupantKind {
    /// The player character.
    Player,
    /// Any other grid-locked prop spawned by collaborators.
    Prop,
}

/// Directions available to a hopping occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HopDirection {
    /// Toward increasing rows (the direction of travel).
    Forward,
    /// Toward decreasing rows.
    Backward,
    /// Toward decreasing lanes.
    Left,
    /// Toward increasing lanes.
    Right,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnError {
    /// The coordinate lies outside the master grid.
    OutOfBounds,
    /// Another entity already stands on the tile.
    Occupied,
    /// The tile cannot be stood on.
    Impassable,
    /// The entity handle is already registered on the grid.
    DuplicateEntity,
}

/// Reasons a hop request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HopError {
    /// Hops are only accepted while the run is active.
    RunInactive,
    /// The entity is not registered on the grid.
    UnknownEntity,
    /// The destination lies outside the master grid.
    OutOfBounds,
    /// The destination tile cannot be stood on.
    Impassable,
    /// Another entity stands on the destination tile.
    Occupied,
}

/// Conditions repaired or skipped while generating a slab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationWarning {
    /// Boundary widths exceeded the slab width and were clamped.
    BoundaryClamped {
        /// Requested left boundary width.
        requested_left: u32,
        /// Requested right boundary width.
        requested_right: u32,
        /// Left boundary width actually used.
        applied_left: u32,
        /// Right boundary width actually used.
        applied_right: u32,
    },
    /// The minimum crossing count exceeded the maximum; the maximum was raised.
    CrossingRangeClamped {
        /// Minimum crossings per hazard row.
        min_crossings: u32,
        /// Maximum crossings requested by the profile.
        requested_max: u32,
    },
    /// The profile declares no weighted tiles; every free cell uses the default kind.
    EmptyProbabilityTable,
    /// A fence lane had no fence asset to decorate it with.
    MissingFenceAsset {
        /// Tile kind occupying the fence lane.
        kind: TileKindId,
    },
    /// A crossing had no crossing asset to decorate it with.
    MissingCrossingAsset {
        /// Hazard tile kind containing the crossing.
        kind: TileKindId,
    },
}

/// Index of a tile type within a [`TileCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKindId(u16);

impl TileKindId {
    /// Creates a new tile kind identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque reference to a decoration asset owned by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(u32);

impl AssetId {
    /// Creates a new asset identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable definition of a tile type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileTypeDef {
    /// Human-readable name used by configuration and grid dumps.
    pub name: String,
    /// Whether an occupant may stand on the tile.
    pub passable: bool,
    /// Whether the tile hides its occupant.
    pub hiding_place: bool,
    /// Whether the tile carries a decoration that receives a random rotation.
    pub rotatable_decoration: bool,
    /// Whether rows of this type receive crossings.
    pub has_crossings: bool,
    /// Fence decoration used when this tile sits on a fence lane.
    pub fence_asset: Option<AssetId>,
    /// Decoration placed on crossings within rows of this type.
    pub crossing_asset: Option<AssetId>,
}

impl TileTypeDef {
    /// Creates a passable, undecorated tile type with the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passable: true,
            hiding_place: false,
            rotatable_decoration: false,
            has_crossings: false,
            fence_asset: None,
            crossing_asset: None,
        }
    }
}

/// Reasons a tile catalog cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatalogError {
    /// The catalog contains no tile types.
    Empty,
    /// The catalog holds more tile types than a [`TileKindId`] can address.
    TooManyKinds,
    /// The default kind does not index into the catalog.
    DefaultOutOfRange,
}

/// Static set of tile types consumed by slab generation.
#[derive(Clone, Debug, PartialEq)]
pub struct TileCatalog {
    kinds: Vec<TileTypeDef>,
    default_kind: TileKindId,
    fence_asset: Option<AssetId>,
}

impl TileCatalog {
    /// Creates a catalog, validating that the default kind exists.
    pub fn new(
        kinds: Vec<TileTypeDef>,
        default_kind: TileKindId,
        fence_asset: Option<AssetId>,
    ) -> Result<Self, CatalogError> {
        if kinds.is_empty() {
            return Err(CatalogError::Empty);
        }
        if kinds.len() > usize::from(u16::MAX) {
            return Err(CatalogError::TooManyKinds);
        }
        if default_kind.index() >= kinds.len() {
            return Err(CatalogError::DefaultOutOfRange);
        }
        Ok(Self {
            kinds,
            default_kind,
            fence_asset,
        })
    }

    /// Kind used whenever generation has nothing better to place.
    #[must_use]
    pub const fn default_kind(&self) -> TileKindId {
        self.default_kind
    }

    /// Catalog-wide fence decoration used when a tile type declares none.
    #[must_use]
    pub const fn fence_asset(&self) -> Option<AssetId> {
        self.fence_asset
    }

    /// Looks up a tile type definition.
    #[must_use]
    pub fn get(&self, kind: TileKindId) -> Option<&TileTypeDef> {
        self.kinds.get(kind.index())
    }

    /// Looks up a tile type definition, falling back to the default kind for unknown ids.
    #[must_use]
    pub fn definition(&self, kind: TileKindId) -> &TileTypeDef {
        self.get(kind)
            .unwrap_or(&self.kinds[self.default_kind.index()])
    }

    /// Resolves a tile type by its configured name.
    #[must_use]
    pub fn kind_by_name(&self, name: &str) -> Option<TileKindId> {
        self.kinds
            .iter()
            .position(|definition| definition.name == name)
            .and_then(|index| u16::try_from(index).ok())
            .map(TileKindId::new)
    }

    /// Iterates over every tile kind with its definition in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TileKindId, &TileTypeDef)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(index, definition)| (TileKindId::new(index as u16), definition))
    }

    /// Number of tile kinds in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Reports whether the catalog is empty; always `false` for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for TileCatalog {
    /// Single passable "grass" kind without decorations.
    fn default() -> Self {
        Self {
            kinds: vec![TileTypeDef::new("grass")],
            default_kind: TileKindId::new(0),
            fence_asset: None,
        }
    }
}

/// Weighted candidate for individually placed tiles such as rocks and hay bales.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileProbability {
    /// Tile kind placed when the entry is selected.
    pub kind: TileKindId,
    /// Weight in `[0, 100]`; negative values count as zero.
    pub probability: f32,
    /// Restricts the entry to lanes inside the playable boundary.
    pub only_inside_boundary: bool,
    /// Restricts the entry to lanes outside the playable boundary.
    pub only_outside_boundary: bool,
}

impl TileProbability {
    /// Creates an unrestricted entry.
    #[must_use]
    pub const fn new(kind: TileKindId, probability: f32) -> Self {
        Self {
            kind,
            probability,
            only_inside_boundary: false,
            only_outside_boundary: false,
        }
    }
}

/// Declares whole rows of a special tile type, such as water or roads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowSpec {
    /// Tile kind filling the row.
    pub kind: TileKindId,
    /// Number of rows requested per slab.
    pub row_count: u32,
    /// Minimum number of ordinary rows separating two rows of this kind.
    pub minimum_rows_apart: u32,
}

/// Tunable generation parameters for one difficulty tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Weighted candidates for individually placed tiles, walked in declaration order.
    pub tile_probabilities: Vec<TileProbability>,
    /// Special rows placed in every slab.
    pub row_specs: Vec<RowSpec>,
    /// Chance in `[0, 100]` that a crossing-capable row receives crossings.
    pub crossing_probability: f32,
    /// Minimum crossings per crossing-capable row.
    pub min_crossings: u32,
    /// Maximum crossings per crossing-capable row.
    pub max_crossings: u32,
    /// Number of outside lanes on the high-lane side of the slab.
    pub boundary_left: u32,
    /// Number of outside lanes on the low-lane side of the slab.
    pub boundary_right: u32,
    /// Chance in `[0, 100]` that an eligible tile is seeded with a pickup.
    pub pickup_probability: f32,
    /// Shuffles probability entries and row specs before each generation.
    pub shuffle_order: bool,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            tile_probabilities: Vec::new(),
            row_specs: Vec::new(),
            crossing_probability: PROBABILITY_SCALE,
            min_crossings: 1,
            max_crossings: 2,
            boundary_left: 0,
            boundary_right: 0,
            pickup_probability: 0.0,
            shuffle_order: false,
        }
    }
}

/// Cosmetic brightness band of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shade {
    /// Even in-bounds rows.
    Light,
    /// Odd rows and every lane outside the playable boundary.
    Dark,
}

/// Side of the playable interior a fence faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FenceFacing {
    /// Fence on the low-lane edge, facing toward increasing lanes.
    IncreasingLanes,
    /// Fence on the high-lane edge, facing toward decreasing lanes.
    DecreasingLanes,
}

/// Position and activation flag of a tile, as read by the viewport culler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileVisibilitySample {
    /// Master-grid coordinate of the tile.
    pub coord: GridCoord,
    /// World position of the tile centre.
    pub position: Vec2,
    /// Whether the tile is currently active.
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TileCatalog {
        let mut rock = TileTypeDef::new("rock");
        rock.passable = false;
        TileCatalog::new(
            vec![TileTypeDef::new("grass"), rock],
            TileKindId::new(0),
            None,
        )
        .expect("valid catalog")
    }

    #[test]
    fn step_respects_lower_bounds() {
        let origin = GridCoord::new(0, 0);
        assert_eq!(origin.step(HopDirection::Backward), None);
        assert_eq!(origin.step(HopDirection::Left), None);
        assert_eq!(origin.step(HopDirection::Forward), Some(GridCoord::new(1, 0)));
        assert_eq!(origin.step(HopDirection::Right), Some(GridCoord::new(0, 1)));
    }

    #[test]
    fn catalog_rejects_missing_default() {
        let result = TileCatalog::new(vec![TileTypeDef::new("grass")], TileKindId::new(3), None);
        assert_eq!(result, Err(CatalogError::DefaultOutOfRange));
        assert_eq!(
            TileCatalog::new(Vec::new(), TileKindId::new(0), None),
            Err(CatalogError::Empty)
        );
    }

    #[test]
    fn unknown_kinds_resolve_to_default_definition() {
        let catalog = catalog();
        assert_eq!(catalog.definition(TileKindId::new(42)).name, "grass");
        assert!(!catalog.definition(TileKindId::new(1)).passable);
    }

    #[test]
    fn kinds_resolve_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.kind_by_name("rock"), Some(TileKindId::new(1)));
        assert_eq!(catalog.kind_by_name("water"), None);
    }

    #[test]
    fn difficulty_profile_round_trips_through_bincode() {
        let profile = DifficultyProfile {
            tile_probabilities: vec![TileProbability::new(TileKindId::new(1), 12.5)],
            row_specs: vec![RowSpec {
                kind: TileKindId::new(2),
                row_count: 2,
                minimum_rows_apart: 2,
            }],
            boundary_left: 2,
            boundary_right: 2,
            ..DifficultyProfile::default()
        };
        let bytes = bincode::serialize(&profile).expect("serialize");
        let restored: DifficultyProfile = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, profile);
    }
}
