use hayrunner_core::{
    AssetId, EntityHandle, FenceFacing, GridCoord, OccupantKind, Shade, SlabId, TileKindId,
};
use hayrunner_system_chunk_generation::TileBlueprint;

/// Tile stored in the master grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    coord: GridCoord,
    slab: SlabId,
    blueprint: TileBlueprint,
    hazard_row: bool,
    occupant: Option<EntityHandle>,
    active: bool,
}

impl Tile {
    pub(crate) fn from_blueprint(slab: SlabId, blueprint: TileBlueprint, hazard_row: bool) -> Self {
        Self {
            coord: blueprint.local,
            slab,
            blueprint,
            hazard_row,
            occupant: None,
            active: true,
        }
    }

    /// Master-grid coordinate of the tile.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Slab that owns the tile.
    #[must_use]
    pub const fn slab(&self) -> SlabId {
        self.slab
    }

    /// Row of the tile within its slab.
    #[must_use]
    pub const fn local_row(&self) -> u32 {
        self.blueprint.local.row()
    }

    /// Tile kind placed on the cell.
    #[must_use]
    pub const fn kind(&self) -> TileKindId {
        self.blueprint.kind
    }

    /// Whether an occupant may stand on the tile.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        self.blueprint.passable
    }

    /// Whether the tile hides its occupant.
    #[must_use]
    pub const fn is_hiding_place(&self) -> bool {
        self.blueprint.hiding_place
    }

    /// Whether the tile is a crossing cut into a hazard row.
    #[must_use]
    pub const fn is_crossing(&self) -> bool {
        self.blueprint.crossing
    }

    /// Whether the tile lies on a row claimed by a row spec.
    #[must_use]
    pub const fn is_hazard_row(&self) -> bool {
        self.hazard_row
    }

    /// Cosmetic brightness band.
    #[must_use]
    pub const fn shade(&self) -> Shade {
        self.blueprint.shade
    }

    /// Fence facing and decoration, present on boundary lanes.
    #[must_use]
    pub fn fence(&self) -> Option<(FenceFacing, Option<AssetId>)> {
        self.blueprint.fence.map(|fence| (fence.facing, fence.asset))
    }

    /// Decoration placed on a crossing.
    #[must_use]
    pub const fn crossing_asset(&self) -> Option<AssetId> {
        self.blueprint.crossing_asset
    }

    /// Rotation in degrees of the tile's decoration.
    #[must_use]
    pub const fn decoration_rotation(&self) -> Option<f32> {
        self.blueprint.decoration_rotation
    }

    /// Whether an uncollected pickup rests on the tile.
    #[must_use]
    pub const fn has_pickup(&self) -> bool {
        self.blueprint.pickup
    }

    /// Entity standing on the tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<EntityHandle> {
        self.occupant
    }

    /// Whether the tile is active inside the culled viewport.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_coord(&mut self, coord: GridCoord) {
        self.coord = coord;
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<EntityHandle>) {
        self.occupant = occupant;
    }

    pub(crate) fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }

    pub(crate) fn take_pickup(&mut self) -> bool {
        std::mem::replace(&mut self.blueprint.pickup, false)
    }

    pub(crate) fn glyph(&self) -> char {
        if self.occupant.is_some() {
            '@'
        } else if self.blueprint.fence.is_some() {
            '|'
        } else if self.blueprint.crossing {
            '='
        } else if self.blueprint.pickup {
            '*'
        } else if self.hazard_row {
            '~'
        } else if !self.blueprint.passable {
            '#'
        } else {
            '.'
        }
    }
}

/// Entity registered on the master grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Occupant {
    pub(crate) kind: OccupantKind,
    pub(crate) coord: GridCoord,
}
