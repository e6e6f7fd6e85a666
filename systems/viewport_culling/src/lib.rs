#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Viewport culling that toggles tile activation as tiles enter or leave
//! a padded camera viewport.

use glam::Vec2;
use hayrunner_core::{Command, Event, TileVisibilitySample};

/// Padding around the normalized viewport, as fractions of its size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferArea {
    /// Padding past the low-`x` edge.
    pub left: f32,
    /// Padding past the high-`x` edge.
    pub right: f32,
    /// Padding past the high-`y` edge.
    pub up: f32,
    /// Padding past the low-`y` edge.
    pub down: f32,
}

impl Default for BufferArea {
    fn default() -> Self {
        Self {
            left: 0.2,
            right: 0.2,
            up: 0.2,
            down: 0.2,
        }
    }
}

/// Projects world positions into normalized viewport space, where the
/// visible area spans `[0, 1]` on both axes.
pub trait ViewportProjection {
    /// Maps a world position into viewport space.
    fn world_to_viewport(&self, position: Vec2) -> Vec2;
}

/// Axis-aligned orthographic camera looking down on the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthographicCamera {
    /// World position at the centre of the view.
    pub center: Vec2,
    /// Half the visible world extent along each axis.
    pub half_extents: Vec2,
}

impl OrthographicCamera {
    /// Creates a camera centred on `center` spanning `2 * half_extents`.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }
}

impl ViewportProjection for OrthographicCamera {
    fn world_to_viewport(&self, position: Vec2) -> Vec2 {
        let extents = self.half_extents.max(Vec2::splat(f32::EPSILON)) * 2.0;
        (position - (self.center - self.half_extents)) / extents
    }
}

/// Pure system emitting activation commands for tiles whose visibility changed.
#[derive(Debug, Default)]
pub struct ViewportCulling {
    buffer: BufferArea,
}

impl ViewportCulling {
    /// Creates a culling system with the provided viewport padding.
    #[must_use]
    pub const fn new(buffer: BufferArea) -> Self {
        Self { buffer }
    }

    /// Reports whether a viewport-space point lies inside the padded viewport.
    #[must_use]
    pub fn is_visible(&self, viewport: Vec2) -> bool {
        let buffer = self.buffer;
        (-buffer.left..=1.0 + buffer.right).contains(&viewport.x)
            && (-buffer.down..=1.0 + buffer.up).contains(&viewport.y)
    }

    /// Re-evaluates every tile after the grid moved and emits
    /// [`Command::SetTileActive`] for tiles whose activation must flip.
    pub fn handle<P>(
        &mut self,
        events: &[Event],
        samples: &[TileVisibilitySample],
        camera: &P,
        out: &mut Vec<Command>,
    ) where
        P: ViewportProjection + ?Sized,
    {
        let grid_moved = events.iter().any(|event| {
            matches!(
                event,
                Event::GridScrolled { .. } | Event::SlabRegenerated { .. } | Event::RunStarted
            )
        });
        if !grid_moved {
            return;
        }

        for sample in samples {
            let visible = self.is_visible(camera.world_to_viewport(sample.position));
            if visible != sample.active {
                out.push(Command::SetTileActive {
                    coord: sample.coord,
                    active: visible,
                });
            }
        }
    }
}
