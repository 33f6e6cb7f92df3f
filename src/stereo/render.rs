//! Disparity renderer: mesh + viewpoint → one per-eye vertex batch.
//!
//! The same mesh rendered for the left and the right eye must produce
//! batches with identical vertex count and order, identical normals and
//! brightness; only the horizontal positions differ.  Topology
//! divergence between the eyes is a defect — the rasterizer pairs the
//! two streams triangle for triangle.

use glam::{Vec3, vec3};
use log::warn;

use crate::renderer::Rasterizer;
use crate::scene::{Mesh, SceneContext};
use crate::stereo::disparity::{DisparityModel, PIXELS_TO_WORLD, disparity_pixels};
use crate::stereo::viewpoint::{Eye, Viewpoint};

/// Final per-eye vertex streams, ready for
/// [`crate::renderer::Rasterizer::submit_triangles`].
#[derive(Clone, Debug, Default)]
pub struct StereoBatch {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub brightness: Vec<f32>,
}

impl StereoBatch {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Translate `mesh` by `anchor`, apply the eye-specific horizontal
/// disparity shift, and pass normals/brightness through untouched.
///
/// With [`DisparityModel::WholeObject`] the disparity is evaluated once
/// at the anchor; with [`DisparityModel::PerVertex`] each vertex gets
/// its own value.  The shift is `sign(eye) * pixels / 2` converted to
/// world units — the same sign convention as
/// [`Viewpoint::eye_offset`].
#[allow(clippy::too_many_arguments)]
pub fn render_stereo_pair(
    mesh: &Mesh,
    anchor: Vec3,
    viewpoint: &Viewpoint,
    base_disparity_degrees: f32,
    eye: Eye,
    model: DisparityModel,
    screen_width_px: f32,
    onplane: bool,
) -> StereoBatch {
    let mut batch = StereoBatch {
        positions: Vec::with_capacity(mesh.len()),
        normals: mesh.normals.clone(),
        brightness: mesh.brightness.clone(),
    };

    let object_px = match model {
        DisparityModel::WholeObject => Some(disparity_pixels(
            anchor,
            viewpoint,
            base_disparity_degrees,
            screen_width_px,
            onplane,
        )),
        DisparityModel::PerVertex => None,
    };

    for &local in &mesh.positions {
        let world = local + anchor;
        let px = object_px.unwrap_or_else(|| {
            disparity_pixels(
                world,
                viewpoint,
                base_disparity_degrees,
                screen_width_px,
                onplane,
            )
        });
        let shift = eye.sign() * px / 2.0 * PIXELS_TO_WORLD;
        batch
            .positions
            .push(vec3(world.x + shift, world.y, world.z));
    }

    batch
}

/// Submit one eye's view of a full trial scene (checkerboard + column)
/// to a rasterizer.  The floor always renders with true per-vertex
/// disparity; the column follows the requested model and onplane flag.
///
/// Returns `false` when the column mesh is missing for `distance` —
/// the draw is skipped and logged, never fatal.
pub fn submit_trial_pass<Rz: Rasterizer>(
    raster: &mut Rz,
    scene: &SceneContext,
    distance: f32,
    base_disparity_degrees: f32,
    onplane: bool,
    model: DisparityModel,
    eye: Eye,
    screen_width_px: f32,
) -> bool {
    let vp = scene.viewpoint();

    let floor = render_stereo_pair(
        scene.floor(),
        Vec3::ZERO,
        vp,
        base_disparity_degrees,
        eye,
        DisparityModel::PerVertex,
        screen_width_px,
        false,
    );
    raster.submit_triangles(&floor.positions, &floor.normals, &floor.brightness);

    match scene.column(distance) {
        Ok((mesh, anchor)) => {
            let column = render_stereo_pair(
                mesh,
                anchor,
                vp,
                base_disparity_degrees,
                eye,
                model,
                screen_width_px,
                onplane,
            );
            raster.submit_triangles(&column.positions, &column.normals, &column.brightness);
            true
        }
        Err(err) => {
            warn!("{err}; column draw skipped");
            false
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ColumnParams, build_column};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const W: f32 = 1024.0;

    fn vp() -> Viewpoint {
        Viewpoint::new(vec3(0.0, 3.0, 0.0), vec3(0.0, 0.0, -15.0), 0.1).unwrap()
    }

    fn column() -> Mesh {
        let params = ColumnParams::default();
        build_column(15.0, 15.0, &params, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn eyes_agree_on_count_order_normals_and_brightness() {
        let mesh = column();
        let vp = vp();
        let anchor = vp.position_along_vector(15.0);

        let left = render_stereo_pair(
            &mesh, anchor, &vp, 0.3, Eye::Left, DisparityModel::PerVertex, W, false,
        );
        let right = render_stereo_pair(
            &mesh, anchor, &vp, 0.3, Eye::Right, DisparityModel::PerVertex, W, false,
        );

        assert_eq!(left.len(), right.len());
        assert_eq!(left.len(), mesh.len());
        assert_eq!(left.normals, right.normals);
        assert_eq!(left.brightness, right.brightness);
        for (l, r) in left.positions.iter().zip(&right.positions) {
            assert_eq!(l.y, r.y);
            assert_eq!(l.z, r.z);
        }
    }

    #[test]
    fn horizontal_shifts_are_mirror_images() {
        let mesh = column();
        let vp = vp();
        let anchor = vp.position_along_vector(25.0);

        let left = render_stereo_pair(
            &mesh, anchor, &vp, 0.2, Eye::Left, DisparityModel::PerVertex, W, false,
        );
        let right = render_stereo_pair(
            &mesh, anchor, &vp, 0.2, Eye::Right, DisparityModel::PerVertex, W, false,
        );

        for ((l, r), &local) in left.positions.iter().zip(&right.positions).zip(&mesh.positions) {
            let world_x = local.x + anchor.x;
            let dl = l.x - world_x;
            let dr = r.x - world_x;
            assert!((dl + dr).abs() < 1e-5, "shifts not antisymmetric: {dl} vs {dr}");
        }
    }

    #[test]
    fn whole_object_mode_shifts_every_vertex_equally() {
        let mesh = column();
        let vp = vp();
        let anchor = vp.position_along_vector(25.0);

        let batch = render_stereo_pair(
            &mesh, anchor, &vp, 0.3, Eye::Right, DisparityModel::WholeObject, W, false,
        );
        let shift0 = batch.positions[0].x - (mesh.positions[0].x + anchor.x);
        for (out, &local) in batch.positions.iter().zip(&mesh.positions) {
            let shift = out.x - (local.x + anchor.x);
            assert!((shift - shift0).abs() < 1e-6);
        }
    }

    #[test]
    fn per_vertex_mode_varies_along_the_column() {
        let mesh = column();
        let vp = vp();
        // distance well inside convergence so the factor is large
        let anchor = vp.position_along_vector(3.0);

        let batch = render_stereo_pair(
            &mesh, anchor, &vp, 0.0, Eye::Right, DisparityModel::PerVertex, W, false,
        );
        let shifts: Vec<f32> = batch
            .positions
            .iter()
            .zip(&mesh.positions)
            .map(|(out, &local)| out.x - (local.x + anchor.x))
            .collect();
        let min = shifts.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = shifts.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(max - min > 1e-6, "per-vertex disparity collapsed to one value");
    }

    #[test]
    fn empty_mesh_renders_an_empty_batch() {
        let mesh = Mesh::default();
        let vp = vp();
        let batch = render_stereo_pair(
            &mesh,
            Vec3::ZERO,
            &vp,
            0.3,
            Eye::Left,
            DisparityModel::PerVertex,
            W,
            false,
        );
        assert!(batch.is_empty());
    }
}
