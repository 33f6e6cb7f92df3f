//! Horizontal disparity as a function of depth.
//!
//! Points exactly on the convergence sphere carry only the trial's
//! base disparity; points nearer get a positive distance factor,
//! points farther a negative one, scaled by
//! [`MAX_DISTANCE_EFFECT_DEGREES`].  Degrees convert to pixels with the
//! screen spanning [`DEGREES_PER_SCREEN_WIDTH`] of visual angle, and
//! pixels convert to the world-unit shift applied to vertices with
//! [`PIXELS_TO_WORLD`].

use glam::Vec3;

use crate::stereo::viewpoint::Viewpoint;

/// Extra disparity (degrees) a point gains per unit of normalized
/// distance from the convergence plane.
pub const MAX_DISTANCE_EFFECT_DEGREES: f32 = 0.5;

/// Calibration: the screen width subtends this many degrees of visual
/// angle when converting degrees to pixels.
pub const DEGREES_PER_SCREEN_WIDTH: f32 = 60.0;

/// Conversion from a screen-pixel disparity to the world-unit shift
/// applied direct to vertex x.
pub const PIXELS_TO_WORLD: f32 = 0.01;

/// Disparity evaluation granularity.
///
/// `PerVertex` is the geometrically correct mode: a tall column spans a
/// range of distances from top to bottom and each vertex gets its own
/// value.  `WholeObject` evaluates the formula once at the object's
/// anchor and reuses it for every vertex — a deliberate simplification
/// some experiment variants call for, not a bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisparityModel {
    PerVertex,
    WholeObject,
}

/// Camera-to-point distance used by the disparity formula.  With
/// `onplane` the point is first projected onto the ground plane
/// (y = 0), so the stimulus inherits the disparity of the floor
/// directly beneath it.
#[inline]
pub fn measured_distance(world_point: Vec3, camera_pos: Vec3, onplane: bool) -> f32 {
    let p = if onplane {
        Vec3::new(world_point.x, 0.0, world_point.z)
    } else {
        world_point
    };
    (p - camera_pos).length()
}

/// Per-point disparity in screen pixels.
///
/// ```text
/// factor = (convergence - distance) / convergence
/// total° = base° + factor * MAX_DISTANCE_EFFECT_DEGREES
/// pixels = total° * screen_width / DEGREES_PER_SCREEN_WIDTH
/// ```
pub fn disparity_pixels(
    world_point: Vec3,
    viewpoint: &Viewpoint,
    base_disparity_degrees: f32,
    screen_width_px: f32,
    onplane: bool,
) -> f32 {
    let distance = measured_distance(world_point, viewpoint.camera_pos(), onplane);
    let convergence = viewpoint.convergence_distance();
    let distance_factor = (convergence - distance) / convergence;
    let total_degrees = base_disparity_degrees + distance_factor * MAX_DISTANCE_EFFECT_DEGREES;
    total_degrees * (screen_width_px / DEGREES_PER_SCREEN_WIDTH)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
