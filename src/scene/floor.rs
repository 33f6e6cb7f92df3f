//! Ground-plane stimuli: a checkerboard of white and transparent
//! squares, or a plain solid sheet.
//!
//! The checkerboard is the depth reference the participant judges the
//! column against.  The grid is aligned so one grid line passes through
//! the column's world x, and the whole strip of cells sharing that x
//! index (the corridor) is suppressed regardless of checker parity –
//! the column must never abut or be occluded by a white square, or
//! occlusion would leak a depth cue and invalidate the task.

use glam::{Vec3, vec3};
use rand::Rng;
use self::gauss::jittered_up_normal;

use crate::scene::mesh::Mesh;

#[derive(Clone, Copy, Debug)]
pub struct FloorParams {
    /// Edge length of one checkerboard cell, world units.
    pub square_size: f32,
    /// Total floor extent (square, centred on the reference point).
    pub extent: f32,
    /// Flat brightness of emitted cells.
    pub brightness: f32,
}

/// Things that can go wrong while building a floor.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FloorError {
    #[error("checkerboard square size must be positive, got {0}")]
    BadSquareSize(f32),
    #[error("floor extent must be positive, got {0}")]
    BadExtent(f32),
}

/// Cell size that guarantees the column sits fully inside a transparent
/// cell at every tested distance: three times the worst-case footprint,
/// rounded *up* to the nearest 0.5.  Too small a cell and the column
/// visually straddles a white square, defeating the experiment.
pub fn required_square_size(max_footprint: f32) -> f32 {
    let required = max_footprint * 3.0;
    (required * 2.0).ceil() / 2.0
}

/// Build the checkerboard.  `column_world_x`/`column_world_z` anchor
/// the grid: the reference cell is centred on the first column
/// position, and the corridor runs along the cells whose x index
/// matches the column's.
///
/// A cell emits two triangles iff `(gi + gj)` is odd *and* `gi` is not
/// the corridor index; the corridor test overrides parity.
pub fn build_checkerboard_floor(
    params: &FloorParams,
    column_world_x: f32,
    column_world_z: f32,
) -> Result<Mesh, FloorError> {
    if params.square_size <= 0.0 {
        return Err(FloorError::BadSquareSize(params.square_size));
    }
    if params.extent <= 0.0 {
        return Err(FloorError::BadExtent(params.extent));
    }

    let square = params.square_size;
    // a few extra rings of cells so the horizon stays covered
    let num_squares = (params.extent / square) as i32 + 4;

    let reference_x = column_world_x;
    let reference_z = column_world_z;

    // shift the grid so the reference point lands on a cell centre
    let mut start_x = reference_x - (num_squares as f32 * square) / 2.0;
    let mut start_z = reference_z - (num_squares as f32 * square) / 2.0;
    start_x += (reference_x - start_x).rem_euclid(square) - square / 2.0;
    start_z += (reference_z - start_z).rem_euclid(square) - square / 2.0;

    let corridor_index = ((column_world_x - reference_x) / square).round() as i32;

    let mut mesh = Mesh::default();
    for i in 0..num_squares {
        for j in 0..num_squares {
            let x1 = start_x + i as f32 * square;
            let x2 = x1 + square;
            let z1 = start_z + j as f32 * square;
            let z2 = z1 + square;

            let gi = (((x1 + x2) / 2.0 - reference_x) / square).round() as i32;
            let gj = (((z1 + z2) / 2.0 - reference_z) / square).round() as i32;

            // corridor check first: it unconditionally wins over parity
            if gi == corridor_index {
                continue;
            }
            if (gi + gj).rem_euclid(2) != 1 {
                continue;
            }

            mesh.push_quad(
                [
                    vec3(x1, 0.0, z1),
                    vec3(x2, 0.0, z1),
                    vec3(x2, 0.0, z2),
                    vec3(x1, 0.0, z2),
                ],
                Vec3::Y,
                params.brightness,
            );
        }
    }
    Ok(mesh)
}

/// Solid (non-checkered) floor sheet used by the uniform-plane
/// variants.  With `normal_jitter > 0` each vertex normal is drawn from
/// a Gaussian around +Y and renormalized, giving the sheet a matte
/// micro-structure.
pub fn build_solid_floor<R: Rng>(
    size: f32,
    divisions: usize,
    brightness: f32,
    normal_jitter: f32,
    rng: &mut R,
) -> Result<Mesh, FloorError> {
    if size <= 0.0 {
        return Err(FloorError::BadExtent(size));
    }
    let step = size / divisions.max(1) as f32;
    let mut mesh = Mesh::with_capacity(divisions * divisions * 6);

    for i in 0..divisions {
        for j in 0..divisions {
            let x1 = -size / 2.0 + i as f32 * step;
            let x2 = x1 + step;
            let z1 = -size / 2.0 + j as f32 * step;
            let z2 = z1 + step;

            let corners = [
                vec3(x1, 0.0, z1),
                vec3(x2, 0.0, z1),
                vec3(x2, 0.0, z2),
                vec3(x1, 0.0, z2),
            ];
            if normal_jitter > 0.0 {
                let [a, b, c, d] = corners;
                for v in [a, b, c, a, c, d] {
                    mesh.push(v, jittered_up_normal(normal_jitter, rng), brightness);
                }
            } else {
                mesh.push_quad(corners, Vec3::Y, brightness);
            }
        }
    }
    Ok(mesh)
}

/// Gaussian-jittered unit normal around +Y.
mod gauss {
    use glam::{Vec3, vec3};
    use rand::Rng;

    pub fn jittered_up_normal<R: Rng>(sigma: f32, rng: &mut R) -> Vec3 {
        // Box–Muller pair for the x/z tilt components
        let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let r = (-2.0 * u1.ln()).sqrt() * sigma;
        vec3(r * u2.cos(), 1.0, r * u2.sin()).normalize()
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
