//! Stereoscopic depth-perception stimuli.
//!
//! The crate splits into four layers, leaf-first:
//!
//! * [`scene`] – procedural stimulus geometry (brick columns,
//!   checkerboard floors, oriented sticks) and the per-run
//!   [`scene::SceneContext`] that caches one column mesh per tested
//!   distance.
//! * [`stereo`] – the viewpoint model (eye positions, convergence) and
//!   the disparity renderer that turns a mesh into per-eye vertex
//!   batches.
//! * [`renderer`] – the rasterizer seam.  Experiment logic never
//!   touches a pixel buffer; it submits triangle batches to a type
//!   implementing [`renderer::Rasterizer`].
//! * [`trial`] – condition lists, sequencing and CSV persistence.
//!
//! The experiment binaries (`anaglyph`, `stereoscope`, `sticks`) wire
//! these together with a `minifb` window per eye surface.

pub mod config;
pub mod renderer;
pub mod scene;
pub mod stereo;
pub mod trial;

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
// End-to-end scenarios across the layer seams; the per-module details
// live next to their modules.
#[cfg(test)]
mod tests {
    use glam::{Vec3, vec3};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::renderer::{ChannelMask, Rasterizer, SoftwareRaster};
    use crate::scene::{ColumnParams, FloorStyle, SceneContext};
    use crate::stereo::{
        DisparityModel, Eye, Viewpoint, disparity_pixels, submit_trial_pass,
    };
    use crate::trial::synthesize_conditions;

    // the standard rig: camera 3 up, looking 15 out and down
    fn scene() -> SceneContext {
        let vp = Viewpoint::new(vec3(0.0, 3.0, 0.0), vec3(0.0, 0.0, -15.0), 0.1).unwrap();
        SceneContext::new(
            vp,
            ColumnParams::default(),
            15.0,
            &[3.0, 25.0],
            0.9,
            60.0,
            FloorStyle::Checkerboard,
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    #[test]
    fn columns_scale_against_the_reference_distance() {
        let scene = scene();
        assert!((ColumnParams::size_factor(3.0, 15.0) - 0.2).abs() < 1e-6);
        assert!((ColumnParams::size_factor(25.0, 15.0) - 25.0 / 15.0).abs() < 1e-6);
        let (near, _) = scene.column(3.0).unwrap();
        let (far, _) = scene.column(25.0).unwrap();
        assert!(!near.is_empty());
        assert!(!far.is_empty());

        // brick survival is binomial around n * (1 - p_missing)
        let p = scene.column_params();
        let expected = p.num_bricks as f32 * (1.0 - p.missing_brick_probability as f32);
        let sd = (p.num_bricks as f32 * 0.1 * 0.9).sqrt();
        for mesh in [near, far] {
            let bricks = (mesh.len() / 36) as f32;
            assert!(
                (bricks - expected).abs() < 4.0 * sd,
                "got {bricks} bricks, expected about {expected}"
            );
        }
    }

    #[test]
    fn near_column_gains_extra_disparity_over_the_base() {
        let scene = scene();
        let vp = scene.viewpoint();
        let anchor = scene.column_anchor(3.0).unwrap();
        // nearer than convergence: the distance term adds to the base
        let px = disparity_pixels(anchor, vp, 0.3, 1024.0, false);
        assert!(px > 0.3 * 1024.0 / 60.0);
        // at the convergence distance only the base term remains
        let at_conv = vp.position_along_vector(vp.convergence_distance());
        let base_only = disparity_pixels(at_conv, vp, 0.3, 1024.0, false);
        assert!((base_only - 0.3 * 1024.0 / 60.0).abs() < 1e-2);
    }

    #[test]
    fn anaglyph_passes_fill_both_channel_groups() {
        let scene = scene();
        let mut raster = SoftwareRaster::default();
        raster.set_projection(45.0, 1024.0 / 768.0, 0.1, 100.0);
        raster.begin_frame(1024, 768);
        let vp = *scene.viewpoint();
        raster.set_view(vp.camera_pos(), vp.look_at(), Vec3::Y);

        for (eye, mask) in [
            (Eye::Left, ChannelMask::LEFT_ANAGLYPH),
            (Eye::Right, ChannelMask::RIGHT_ANAGLYPH),
        ] {
            raster.clear_color_channels(mask);
            raster.clear_depth();
            let drew = submit_trial_pass(
                &mut raster,
                &scene,
                3.0,
                0.3,
                false,
                DisparityModel::PerVertex,
                eye,
                1024.0,
            );
            assert!(drew);
        }

        let (mut red, mut cyan) = (0usize, 0usize);
        raster.present_frame(|buf, _, _| {
            red = buf.iter().filter(|&&p| p & 0x00FF_0000 != 0).count();
            cyan = buf.iter().filter(|&&p| p & 0x0000_FFFF != 0).count();
        });
        assert!(red > 0, "left pass wrote no red pixels");
        assert!(cyan > 0, "right pass wrote no cyan pixels");
    }

    #[test]
    fn missing_distance_still_renders_the_floor() {
        let scene = scene();
        let mut raster = SoftwareRaster::default();
        raster.set_projection(45.0, 1024.0 / 768.0, 0.1, 100.0);
        raster.begin_frame(640, 480);
        let vp = *scene.viewpoint();
        raster.set_view(vp.camera_pos(), vp.look_at(), Vec3::Y);

        let drew = submit_trial_pass(
            &mut raster,
            &scene,
            7.0,
            0.3,
            false,
            DisparityModel::PerVertex,
            Eye::Left,
            640.0,
        );
        assert!(!drew);

        let mut lit = 0usize;
        raster.present_frame(|buf, _, _| {
            lit = buf.iter().filter(|&&p| p != 0).count();
        });
        assert!(lit > 0, "floor should draw even without a column");
    }

    #[test]
    fn the_condition_grid_covers_every_cell() {
        let trials = synthesize_conditions(&[0.1, 0.3], &[3.0, 25.0], &[false], 2, 3.0);
        assert_eq!(trials.len(), 8);
        let ids: Vec<u32> = trials.iter().map(|t| t.trial_id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        for &(disp, dist) in &[(0.1, 3.0), (0.1, 25.0), (0.3, 3.0), (0.3, 25.0)] {
            let n = trials
                .iter()
                .filter(|t| t.disparity_degrees == disp && t.distance_along_vector == dist)
                .count();
            assert_eq!(n, 2);
        }
    }
}
