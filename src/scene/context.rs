//! Per-run scene state.
//!
//! One [`SceneContext`] is built before the first trial and torn down
//! at process exit.  It owns the viewpoint, the checkerboard floor and
//! one pre-generated column mesh per tested distance.  Mesh identity is
//! keyed by distance, not by trial: trials sharing a distance see the
//! *same* brick layout, and nothing mutates the cache after
//! construction.

use std::collections::HashMap;

use glam::Vec3;
use log::info;
use rand::Rng;

use crate::scene::column::{ColumnParams, build_column};
use crate::scene::floor::{
    FloorError, FloorParams, build_checkerboard_floor, build_solid_floor, required_square_size,
};
use crate::scene::mesh::Mesh;
use crate::stereo::Viewpoint;

/// Which ground-plane stimulus the run uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FloorStyle {
    /// White/transparent checkerboard with the corridor cut out.
    Checkerboard,
    /// Solid sheet; per-vertex normals drawn around +Y.
    Solid { divisions: usize, normal_jitter: f32 },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SceneError {
    /// A trial requested a distance no column was pre-generated for.
    /// Recoverable: skip the draw and log the condition.
    #[error("no column geometry cached for distance {0}")]
    MissingGeometry(f32),

    #[error(transparent)]
    Floor(#[from] FloorError),
}

/// Cache key: distances rounded to 1e-3 world units, so the same
/// nominal distance read back from a CSV hits the same mesh.
#[inline]
fn distance_key(distance: f32) -> i64 {
    (distance * 1000.0).round() as i64
}

pub struct SceneContext {
    viewpoint: Viewpoint,
    column_params: ColumnParams,
    floor: Mesh,
    floor_square_size: f32,
    columns: HashMap<i64, CachedColumn>,
}

struct CachedColumn {
    mesh: Mesh,
    anchor: Vec3,
}

impl SceneContext {
    /// Pre-generate geometry for every distance in `distances`.  The
    /// checkerboard square size is derived from the worst-case column
    /// footprint across those distances, and the grid is anchored on
    /// the first column position so the corridor invariant holds for
    /// all of them.
    pub fn new<R: Rng>(
        viewpoint: Viewpoint,
        column_params: ColumnParams,
        reference_distance: f32,
        distances: &[f32],
        floor_brightness: f32,
        floor_extent: f32,
        floor_style: FloorStyle,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        let max_footprint = distances
            .iter()
            .map(|&d| column_params.footprint(d, reference_distance))
            .fold(0.0f32, f32::max);
        let square_size = required_square_size(max_footprint);

        let first_anchor = viewpoint.position_along_vector(*distances.first().unwrap_or(&0.0));
        let floor = match floor_style {
            FloorStyle::Checkerboard => build_checkerboard_floor(
                &FloorParams {
                    square_size,
                    extent: floor_extent,
                    brightness: floor_brightness,
                },
                first_anchor.x,
                first_anchor.z,
            )?,
            FloorStyle::Solid {
                divisions,
                normal_jitter,
            } => build_solid_floor(floor_extent, divisions, floor_brightness, normal_jitter, rng)?,
        };
        info!(
            "floor ({floor_style:?}): square size {:.2} (max footprint {:.3}), {} triangles",
            square_size,
            max_footprint,
            floor.triangle_count()
        );

        let mut columns = HashMap::new();
        for &distance in distances {
            let mesh = build_column(distance, reference_distance, &column_params, rng);
            let anchor = viewpoint.position_along_vector(distance);
            info!(
                "column at distance {distance}: anchor ({:.2}, {:.2}, {:.2}), {} bricks",
                anchor.x,
                anchor.y,
                anchor.z,
                mesh.len() / 36
            );
            columns.insert(distance_key(distance), CachedColumn { mesh, anchor });
        }

        Ok(Self {
            viewpoint,
            column_params,
            floor,
            floor_square_size: square_size,
            columns,
        })
    }

    #[inline]
    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    #[inline]
    pub fn column_params(&self) -> &ColumnParams {
        &self.column_params
    }

    #[inline]
    pub fn floor(&self) -> &Mesh {
        &self.floor
    }

    #[inline]
    pub fn floor_square_size(&self) -> f32 {
        self.floor_square_size
    }

    pub fn distances(&self) -> impl Iterator<Item = f32> + '_ {
        self.columns.keys().map(|&k| k as f32 / 1000.0)
    }

    /// Cached column for `distance`, or `MissingGeometry` for the
    /// caller to skip and log.
    pub fn column(&self, distance: f32) -> Result<(&Mesh, Vec3), SceneError> {
        self.columns
            .get(&distance_key(distance))
            .map(|c| (&c.mesh, c.anchor))
            .ok_or(SceneError::MissingGeometry(distance))
    }

    /// World-space anchor for `distance`, if cached.
    pub fn column_anchor(&self, distance: f32) -> Result<Vec3, SceneError> {
        self.column(distance).map(|(_, anchor)| anchor)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
