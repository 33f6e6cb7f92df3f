//! Brick-column stimulus.
//!
//! A column is a stack of `num_bricks` axis-aligned bricks hanging
//! *down* from its anchor point.  Every linear dimension (and the
//! jitter bounds) scales with `distance / reference_distance` while the
//! brick count stays fixed, so the column subtends the same visual
//! angle at any tested distance.  Bricks are skipped with
//! `missing_brick_probability`, leaving visible gaps that act as an
//! occlusion-free depth cue.

use glam::{Vec3, vec3};
use rand::Rng;

use crate::scene::mesh::Mesh;

/// How per-brick brightness is drawn before jitter is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BrightnessPolicy {
    /// Same base value for every brick.
    Uniform { base: f32 },
    /// Base falls linearly with brick index: `top - index_frac * drop`.
    /// Bricks further down the stack render darker, an extra depth cue.
    DepthGradient { top: f32, drop: f32 },
}

impl BrightnessPolicy {
    fn base_for(&self, index: usize, count: usize) -> f32 {
        match *self {
            BrightnessPolicy::Uniform { base } => base,
            BrightnessPolicy::DepthGradient { top, drop } => {
                let frac = if count > 1 {
                    index as f32 / (count - 1) as f32
                } else {
                    0.0
                };
                top - frac * drop
            }
        }
    }
}

/// Optional split-row variant: a row occasionally emits two narrower
/// bricks flanking a central gap instead of one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRows {
    pub probability: f64,
    /// Gap between the two half-bricks, in unscaled units.
    pub gap: f32,
}

/// Unscaled column parameters; `build_column` applies the size factor.
#[derive(Clone, Copy, Debug)]
pub struct ColumnParams {
    pub num_bricks: usize,
    pub total_height: f32,
    pub brick_width: f32,
    pub brick_depth: f32,
    /// Lateral jitter bound for brick centres (x and z).
    pub max_offset: f32,
    pub missing_brick_probability: f64,
    pub brightness: BrightnessPolicy,
    /// Uniform jitter added on top of the policy's base value.
    pub brightness_jitter: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub split_rows: Option<SplitRows>,
}

impl Default for ColumnParams {
    fn default() -> Self {
        Self {
            num_bricks: 80,
            total_height: 4.0,
            brick_width: 0.8,
            brick_depth: 0.08,
            max_offset: 0.04,
            missing_brick_probability: 0.1,
            brightness: BrightnessPolicy::Uniform { base: 0.8 },
            brightness_jitter: 0.1,
            min_brightness: 0.6,
            max_brightness: 1.0,
            split_rows: None,
        }
    }
}

impl ColumnParams {
    /// Linear scale applied to every dimension at `distance`.
    #[inline]
    pub fn size_factor(distance: f32, reference_distance: f32) -> f32 {
        distance / reference_distance
    }

    /// Worst-case footprint (max of width/depth extent including
    /// jitter) of the column at `distance`.  Drives the checkerboard
    /// square size.
    pub fn footprint(&self, distance: f32, reference_distance: f32) -> f32 {
        let sf = Self::size_factor(distance, reference_distance);
        let w = self.brick_width * sf + 2.0 * self.max_offset * sf;
        let d = self.brick_depth * sf + 2.0 * self.max_offset * sf;
        w.max(d)
    }
}

/// Build the column mesh for one distance, in column-local coordinates
/// (anchor at the origin, bricks stacked towards −y).  The caller
/// translates it to the column's world position at render time.
pub fn build_column<R: Rng>(
    distance: f32,
    reference_distance: f32,
    params: &ColumnParams,
    rng: &mut R,
) -> Mesh {
    let sf = ColumnParams::size_factor(distance, reference_distance);

    let total_height = params.total_height * sf;
    let brick_width = params.brick_width * sf;
    let brick_depth = params.brick_depth * sf;
    let max_offset = params.max_offset * sf;

    if params.num_bricks == 0 {
        return Mesh::default();
    }
    let brick_height = total_height / params.num_bricks as f32;

    // 36 vertices per brick when nothing is missing
    let mut mesh = Mesh::with_capacity(params.num_bricks * 36);

    for brick_i in 0..params.num_bricks {
        let y_top = -(brick_i as f32) * brick_height;
        let y_bottom = -((brick_i + 1) as f32) * brick_height;

        if rng.gen_bool(params.missing_brick_probability) {
            continue;
        }

        let split = params
            .split_rows
            .filter(|s| rng.gen_bool(s.probability));

        if let Some(split) = split {
            // Two narrower bricks flanking the gap; each keeps its own
            // jitter and brightness draw.
            let gap = split.gap * sf;
            let split_width = brick_width * 0.7;
            for side in [-1.0f32, 1.0] {
                let base_x = side * (gap / 2.0 + brick_width / 4.0);
                let x = base_x + rng.gen_range(-max_offset / 2.0..=max_offset / 2.0);
                let z = rng.gen_range(-max_offset..=max_offset);
                let b = draw_brightness(params, brick_i, rng);
                push_brick(&mut mesh, x, z, y_top, y_bottom, split_width, brick_depth, b);
            }
        } else {
            let x = rng.gen_range(-max_offset..=max_offset);
            let z = rng.gen_range(-max_offset..=max_offset);
            let b = draw_brightness(params, brick_i, rng);
            push_brick(&mut mesh, x, z, y_top, y_bottom, brick_width, brick_depth, b);
        }
    }

    mesh
}

fn draw_brightness<R: Rng>(params: &ColumnParams, index: usize, rng: &mut R) -> f32 {
    let base = params.brightness.base_for(index, params.num_bricks);
    let jitter = if params.brightness_jitter > 0.0 {
        rng.gen_range(-params.brightness_jitter..=params.brightness_jitter)
    } else {
        0.0
    };
    (base + jitter).clamp(params.min_brightness, params.max_brightness)
}

/// Emit the six faces of one brick.  Winding and normals are fixed by
/// face identity, never derived from the vertices.
fn push_brick(
    mesh: &mut Mesh,
    cx: f32,
    cz: f32,
    y_top: f32,
    y_bottom: f32,
    width: f32,
    depth: f32,
    brightness: f32,
) {
    let x1 = cx - width / 2.0;
    let x2 = cx + width / 2.0;
    let z1 = cz - depth / 2.0;
    let z2 = cz + depth / 2.0;

    // front (towards the viewer at z1)
    mesh.push_quad(
        [
            vec3(x1, y_top, z1),
            vec3(x2, y_top, z1),
            vec3(x2, y_bottom, z1),
            vec3(x1, y_bottom, z1),
        ],
        Vec3::Z,
        brightness,
    );
    // back
    mesh.push_quad(
        [
            vec3(x2, y_top, z2),
            vec3(x1, y_top, z2),
            vec3(x1, y_bottom, z2),
            vec3(x2, y_bottom, z2),
        ],
        Vec3::NEG_Z,
        brightness,
    );
    // left
    mesh.push_quad(
        [
            vec3(x1, y_top, z2),
            vec3(x1, y_top, z1),
            vec3(x1, y_bottom, z1),
            vec3(x1, y_bottom, z2),
        ],
        Vec3::NEG_X,
        brightness,
    );
    // right
    mesh.push_quad(
        [
            vec3(x2, y_top, z1),
            vec3(x2, y_top, z2),
            vec3(x2, y_bottom, z2),
            vec3(x2, y_bottom, z1),
        ],
        Vec3::X,
        brightness,
    );
    // top
    mesh.push_quad(
        [
            vec3(x1, y_top, z1),
            vec3(x1, y_top, z2),
            vec3(x2, y_top, z2),
            vec3(x2, y_top, z1),
        ],
        Vec3::Y,
        brightness,
    );
    // bottom
    mesh.push_quad(
        [
            vec3(x1, y_bottom, z2),
            vec3(x1, y_bottom, z1),
            vec3(x2, y_bottom, z1),
            vec3(x2, y_bottom, z2),
        ],
        Vec3::NEG_Y,
        brightness,
    );
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn zero_bricks_is_a_valid_empty_mesh() {
        let params = ColumnParams {
            num_bricks: 0,
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        assert!(mesh.is_empty());
    }

    #[test]
    fn all_missing_is_a_valid_empty_mesh() {
        let params = ColumnParams {
            missing_brick_probability: 1.0,
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        assert!(mesh.is_empty());
    }

    #[test]
    fn no_missing_emits_exactly_36_vertices_per_brick() {
        let params = ColumnParams {
            missing_brick_probability: 0.0,
            split_rows: None,
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        assert_eq!(mesh.len(), params.num_bricks * 36);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.brightness.len(), mesh.positions.len());
    }

    #[test]
    fn height_scales_linearly_with_distance() {
        let params = ColumnParams {
            missing_brick_probability: 0.0,
            ..ColumnParams::default()
        };
        let near = build_column(3.0, 15.0, &params, &mut rng());
        let far = build_column(25.0, 15.0, &params, &mut rng());

        let height = |m: &Mesh| {
            let lo = m.positions.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
            let hi = m.positions.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
            hi - lo
        };
        // height / (d / reference) must be the same at both distances
        let k_near = height(&near) / (3.0 / 15.0);
        let k_far = height(&far) / (25.0 / 15.0);
        assert!((k_near - k_far).abs() < 1e-4, "{k_near} vs {k_far}");
        assert!((k_near - params.total_height).abs() < 1e-4);
    }

    #[test]
    fn brick_count_tracks_missing_probability() {
        let params = ColumnParams {
            num_bricks: 400,
            missing_brick_probability: 0.15,
            split_rows: None,
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        let bricks = mesh.len() / 36;
        let expected = 400.0 * 0.85;
        // binomial: sd = sqrt(n p q) ≈ 7.1, allow 4 sd
        assert!(
            (bricks as f32 - expected).abs() < 30.0,
            "got {bricks} bricks, expected ≈{expected}"
        );
    }

    #[test]
    fn depth_gradient_darkens_lower_bricks() {
        let policy = BrightnessPolicy::DepthGradient { top: 1.0, drop: 0.3 };
        assert!((policy.base_for(0, 100) - 1.0).abs() < 1e-6);
        assert!((policy.base_for(99, 100) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn brightness_respects_clamp_bounds() {
        let params = ColumnParams {
            missing_brick_probability: 0.0,
            brightness: BrightnessPolicy::Uniform { base: 0.95 },
            brightness_jitter: 0.3,
            min_brightness: 0.6,
            max_brightness: 1.0,
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        assert!(mesh.brightness.iter().all(|&b| (0.6..=1.0).contains(&b)));
    }

    #[test]
    fn split_rows_emit_narrower_bricks() {
        let params = ColumnParams {
            num_bricks: 50,
            missing_brick_probability: 0.0,
            split_rows: Some(SplitRows {
                probability: 1.0,
                gap: 0.3,
            }),
            ..ColumnParams::default()
        };
        let mesh = build_column(15.0, 15.0, &params, &mut rng());
        // every row renders two bricks
        assert_eq!(mesh.len(), 50 * 2 * 36);
    }
}
