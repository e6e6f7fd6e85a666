use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use glam::Vec2;
use hayrunner_core::{
    AssetId, CatalogError, DifficultyProfile, GridCoord, RowSpec, TileCatalog, TileKindId,
    TileProbability, TileTypeDef,
};
use hayrunner_system_movement::HopTuning;
use hayrunner_system_pursuit::PursuitTuning;
use hayrunner_system_scroll_speed::SpeedTuning;
use hayrunner_system_viewport_culling::{BufferArea, OrthographicCamera};
use hayrunner_world::WorldConfig;
use serde::Deserialize;
use thiserror::Error;

/// Configuration used when no file is supplied.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Failures raised while loading a session configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    #[error("unknown tile `{0}`")]
    UnknownTile(String),
    #[error("tile `{0}` is declared more than once")]
    DuplicateTile(String),
    #[error("the catalog declares no tiles")]
    EmptyCatalog,
    #[error("the catalog declares more tiles than can be addressed")]
    TooManyTiles,
    #[error("slab dimensions must be non-zero, got {rows_high}x{lanes_wide}")]
    ZeroDimension { rows_high: u32, lanes_wide: u32 },
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
    #[error("player start ({row}, {lane}) lies outside the master grid")]
    PlayerStartOutOfBounds { row: u32, lane: u32 },
}

/// Difficulty profile installed once enough slabs were regenerated.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DifficultyTier {
    pub(crate) after_slabs: u64,
    pub(crate) profile: DifficultyProfile,
}

/// Fully resolved session configuration.
#[derive(Clone, Debug)]
pub(crate) struct GameConfig {
    pub(crate) world: WorldConfig,
    pub(crate) speed: SpeedTuning,
    pub(crate) hop: HopTuning,
    pub(crate) pursuit: PursuitTuning,
    pub(crate) buffer: BufferArea,
    /// Ordered by `after_slabs`.
    pub(crate) tiers: Vec<DifficultyTier>,
    /// Asset names indexed by [`AssetId`].
    pub(crate) asset_names: Vec<String>,
}

impl GameConfig {
    /// Loads the configuration at `path`, or the embedded default when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&contents)
            }
            None => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    pub(crate) fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)?;
        raw.resolve()
    }

    /// Camera framing exactly one slab, lanes across and rows up.
    pub(crate) fn camera(&self) -> OrthographicCamera {
        let world = &self.world;
        let size = Vec2::new(world.lanes_wide as f32, world.rows_high as f32) * world.tile_size;
        let center = (size - Vec2::splat(world.tile_size)) * 0.5;
        OrthographicCamera::new(center, size * 0.5)
    }

    pub(crate) fn asset_name(&self, asset: AssetId) -> Option<&str> {
        self.asset_names
            .get(asset.get() as usize)
            .map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    seed: u64,
    grid: RawGrid,
    catalog: RawCatalog,
    #[serde(default)]
    difficulty: RawDifficulty,
    #[serde(default)]
    tiers: Vec<RawTier>,
    #[serde(default)]
    speed: RawSpeed,
    #[serde(default)]
    hop: RawHop,
    #[serde(default)]
    pursuit: RawPursuit,
    #[serde(default)]
    viewport: RawViewport,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGrid {
    rows_high: u32,
    lanes_wide: u32,
    tile_size: f32,
    player_start: RawCoord,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCoord {
    row: u32,
    lane: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    default: String,
    fence_asset: Option<String>,
    #[serde(default)]
    tiles: Vec<RawTile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTile {
    name: String,
    #[serde(default = "default_true")]
    passable: bool,
    #[serde(default)]
    hiding_place: bool,
    #[serde(default)]
    rotatable_decoration: bool,
    #[serde(default)]
    has_crossings: bool,
    fence_asset: Option<String>,
    crossing_asset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDifficulty {
    tiles: Vec<RawTileProbability>,
    rows: Vec<RawRowSpec>,
    crossing_probability: f32,
    min_crossings: u32,
    max_crossings: u32,
    boundary_left: u32,
    boundary_right: u32,
    pickup_probability: f32,
    shuffle_order: bool,
}

impl Default for RawDifficulty {
    fn default() -> Self {
        let profile = DifficultyProfile::default();
        Self {
            tiles: Vec::new(),
            rows: Vec::new(),
            crossing_probability: profile.crossing_probability,
            min_crossings: profile.min_crossings,
            max_crossings: profile.max_crossings,
            boundary_left: profile.boundary_left,
            boundary_right: profile.boundary_right,
            pickup_probability: profile.pickup_probability,
            shuffle_order: profile.shuffle_order,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTileProbability {
    tile: String,
    probability: f32,
    #[serde(default)]
    only_inside_boundary: bool,
    #[serde(default)]
    only_outside_boundary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRowSpec {
    tile: String,
    count: u32,
    #[serde(default)]
    minimum_rows_apart: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTier {
    after_slabs: u64,
    difficulty: RawDifficulty,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSpeed {
    initial_speed: f32,
    speed_increment: f32,
    max_base_speed: f32,
    catchup_speed_cap: f32,
    catchup_smooth_time: f32,
    release_smooth_time: f32,
    tolerance: f32,
}

impl Default for RawSpeed {
    fn default() -> Self {
        let tuning = SpeedTuning::default();
        Self {
            initial_speed: tuning.initial_speed,
            speed_increment: tuning.speed_increment,
            max_base_speed: tuning.max_base_speed,
            catchup_speed_cap: tuning.catchup_speed_cap,
            catchup_smooth_time: tuning.catchup_smooth_time,
            release_smooth_time: tuning.release_smooth_time,
            tolerance: tuning.tolerance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawHop {
    duration_ms: u64,
}

impl Default for RawHop {
    fn default() -> Self {
        Self {
            duration_ms: HopTuning::default().hop_duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPursuit {
    catchup_line: f32,
    caught_line: f32,
}

impl Default for RawPursuit {
    fn default() -> Self {
        let tuning = PursuitTuning::default();
        Self {
            catchup_line: tuning.catchup_line,
            caught_line: tuning.caught_line,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawViewport {
    left: f32,
    right: f32,
    up: f32,
    down: f32,
}

impl Default for RawViewport {
    fn default() -> Self {
        let buffer = BufferArea::default();
        Self {
            left: buffer.left,
            right: buffer.right,
            up: buffer.up,
            down: buffer.down,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Interns asset names in order of first appearance.
#[derive(Debug, Default)]
struct AssetTable {
    names: Vec<String>,
}

impl AssetTable {
    fn intern(&mut self, name: &str) -> AssetId {
        let index = match self.names.iter().position(|existing| existing == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_owned());
                self.names.len() - 1
            }
        };
        AssetId::new(index as u32)
    }
}

impl RawConfig {
    fn resolve(self) -> Result<GameConfig, ConfigError> {
        let RawGrid {
            rows_high,
            lanes_wide,
            tile_size,
            player_start,
        } = self.grid;
        if rows_high == 0 || lanes_wide == 0 {
            return Err(ConfigError::ZeroDimension {
                rows_high,
                lanes_wide,
            });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(ConfigError::InvalidTileSize(tile_size));
        }
        if player_start.row >= rows_high.saturating_mul(2) || player_start.lane >= lanes_wide {
            return Err(ConfigError::PlayerStartOutOfBounds {
                row: player_start.row,
                lane: player_start.lane,
            });
        }

        let mut assets = AssetTable::default();
        let catalog = self.catalog.resolve(&mut assets)?;
        let profile = self.difficulty.resolve(&catalog)?;
        let mut tiers = self
            .tiers
            .into_iter()
            .map(|tier| {
                Ok(DifficultyTier {
                    after_slabs: tier.after_slabs,
                    profile: tier.difficulty.resolve(&catalog)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        tiers.sort_by_key(|tier| tier.after_slabs);

        let speed = self.speed;
        let viewport = self.viewport;
        Ok(GameConfig {
            world: WorldConfig {
                rows_high,
                lanes_wide,
                tile_size,
                seed: self.seed,
                player_start: GridCoord::new(player_start.row, player_start.lane),
                catalog,
                profile,
            },
            speed: SpeedTuning {
                initial_speed: speed.initial_speed,
                speed_increment: speed.speed_increment,
                max_base_speed: speed.max_base_speed,
                catchup_speed_cap: speed.catchup_speed_cap,
                catchup_smooth_time: speed.catchup_smooth_time,
                release_smooth_time: speed.release_smooth_time,
                tolerance: speed.tolerance,
            },
            hop: HopTuning {
                hop_duration: Duration::from_millis(self.hop.duration_ms),
            },
            pursuit: PursuitTuning {
                catchup_line: self.pursuit.catchup_line,
                caught_line: self.pursuit.caught_line,
            },
            buffer: BufferArea {
                left: viewport.left,
                right: viewport.right,
                up: viewport.up,
                down: viewport.down,
            },
            tiers,
            asset_names: assets.names,
        })
    }
}

impl RawCatalog {
    fn resolve(self, assets: &mut AssetTable) -> Result<TileCatalog, ConfigError> {
        let mut kinds: Vec<TileTypeDef> = Vec::with_capacity(self.tiles.len());
        for tile in self.tiles {
            if kinds.iter().any(|existing| existing.name == tile.name) {
                return Err(ConfigError::DuplicateTile(tile.name));
            }
            kinds.push(TileTypeDef {
                passable: tile.passable,
                hiding_place: tile.hiding_place,
                rotatable_decoration: tile.rotatable_decoration,
                has_crossings: tile.has_crossings,
                fence_asset: tile.fence_asset.as_deref().map(|name| assets.intern(name)),
                crossing_asset: tile
                    .crossing_asset
                    .as_deref()
                    .map(|name| assets.intern(name)),
                name: tile.name,
            });
        }

        let default_index = kinds
            .iter()
            .position(|kind| kind.name == self.default)
            .ok_or_else(|| ConfigError::UnknownTile(self.default.clone()))?;
        let default_kind = u16::try_from(default_index)
            .map(TileKindId::new)
            .map_err(|_| ConfigError::TooManyTiles)?;
        let fence_asset = self.fence_asset.as_deref().map(|name| assets.intern(name));

        TileCatalog::new(kinds, default_kind, fence_asset).map_err(|error| match error {
            CatalogError::Empty => ConfigError::EmptyCatalog,
            CatalogError::TooManyKinds => ConfigError::TooManyTiles,
            CatalogError::DefaultOutOfRange => ConfigError::UnknownTile(self.default),
        })
    }
}

impl RawDifficulty {
    fn resolve(self, catalog: &TileCatalog) -> Result<DifficultyProfile, ConfigError> {
        let lookup = |name: &str| {
            catalog
                .kind_by_name(name)
                .ok_or_else(|| ConfigError::UnknownTile(name.to_owned()))
        };

        let tile_probabilities = self
            .tiles
            .iter()
            .map(|entry| {
                Ok(TileProbability {
                    kind: lookup(&entry.tile)?,
                    probability: entry.probability,
                    only_inside_boundary: entry.only_inside_boundary,
                    only_outside_boundary: entry.only_outside_boundary,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let row_specs = self
            .rows
            .iter()
            .map(|row| {
                Ok(RowSpec {
                    kind: lookup(&row.tile)?,
                    row_count: row.count,
                    minimum_rows_apart: row.minimum_rows_apart,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(DifficultyProfile {
            tile_probabilities,
            row_specs,
            crossing_probability: self.crossing_probability,
            min_crossings: self.min_crossings,
            max_crossings: self.max_crossings,
            boundary_left: self.boundary_left,
            boundary_right: self.boundary_right,
            pickup_probability: self.pickup_probability,
            shuffle_order: self.shuffle_order,
        })
    }
}
