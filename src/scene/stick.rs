//! Oriented-line (stick) stimuli.
//!
//! A stick is a thin frontoparallel quad whose in-plane inclination
//! differs between the eyes: for an interocular inclination `theta`,
//! the left eye sees the stick rotated `-theta/2` from vertical and
//! the right `+theta/2`.  The orientation difference, not a horizontal
//! shift, is the stereo signal here; fused, the stick appears slanted
//! in depth, and a larger theta reads as a steeper slant.  Two sticks
//! side by side make one comparison trial.

use glam::{Vec2, Vec3, vec2, vec3};

use crate::scene::mesh::Mesh;
use crate::stereo::Eye;

#[derive(Clone, Copy, Debug)]
pub struct StickParams {
    pub length: f32,
    pub width: f32,
    /// Horizontal gap between the two stick centres.
    pub separation: f32,
    /// Distance of the stimulus plane in front of the camera.
    pub depth: f32,
    pub brightness: f32,
}

impl Default for StickParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            width: 0.04,
            separation: 1.0,
            depth: 5.0,
            brightness: 1.0,
        }
    }
}

/// Endpoints of a stick inclined `angle_deg` from vertical (positive
/// tips the top towards +x).
pub fn stick_endpoints(center: Vec2, angle_deg: f32, length: f32) -> (Vec2, Vec2) {
    let a = angle_deg.to_radians();
    let half = vec2(a.sin(), a.cos()) * (length / 2.0);
    (center - half, center + half)
}

/// This eye's in-plane rotation for an interocular inclination of
/// `theta_deg`: the orientation disparity splits evenly, `-theta/2` to
/// the left eye and `+theta/2` to the right.
#[inline]
pub fn eye_inclination(theta_deg: f32, eye: Eye) -> f32 {
    eye.sign() * theta_deg / 2.0
}

/// Build one stick as a thin quad on the `z = -depth` plane.
pub fn build_stick(center: Vec2, angle_deg: f32, params: &StickParams) -> Mesh {
    let mut mesh = Mesh::with_capacity(6);
    push_stick(&mut mesh, center, angle_deg, params);
    mesh
}

/// One eye's view of a comparison trial: the left stimulus inclined
/// `left_theta`, the right `right_theta`, each rotated by this eye's
/// half of its orientation disparity.
pub fn build_stick_pair(
    left_theta: f32,
    right_theta: f32,
    eye: Eye,
    params: &StickParams,
) -> Mesh {
    let mut mesh = Mesh::with_capacity(12);
    let dx = params.separation / 2.0;
    push_stick(
        &mut mesh,
        vec2(-dx, 0.0),
        eye_inclination(left_theta, eye),
        params,
    );
    push_stick(
        &mut mesh,
        vec2(dx, 0.0),
        eye_inclination(right_theta, eye),
        params,
    );
    mesh
}

fn push_stick(mesh: &mut Mesh, center: Vec2, angle_deg: f32, params: &StickParams) {
    let (start, end) = stick_endpoints(center, angle_deg, params.length);
    let axis = (end - start).normalize();
    let side = vec2(-axis.y, axis.x) * (params.width / 2.0);
    let z = -params.depth;
    mesh.push_quad(
        [
            vec3(start.x - side.x, start.y - side.y, z),
            vec3(start.x + side.x, start.y + side.y, z),
            vec3(end.x + side.x, end.y + side.y, z),
            vec3(end.x - side.x, end.y - side.y, z),
        ],
        Vec3::Z,
        params.brightness,
    );
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_inclination_is_vertical() {
        let (start, end) = stick_endpoints(Vec2::ZERO, 0.0, 2.0);
        assert!((start - vec2(0.0, -1.0)).length() < 1e-6);
        assert!((end - vec2(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn endpoints_tip_towards_positive_x_for_positive_angles() {
        let (start, end) = stick_endpoints(vec2(1.0, 2.0), 30.0, 2.0);
        assert!(end.x > 1.0 && start.x < 1.0);
        // length is preserved under rotation
        assert!(((end - start).length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn eye_inclinations_split_theta_symmetrically() {
        for theta in [2.0_f32, 6.0, 12.0] {
            assert_eq!(eye_inclination(theta, Eye::Left), -theta / 2.0);
            assert_eq!(eye_inclination(theta, Eye::Right), theta / 2.0);
        }
    }

    #[test]
    fn a_pair_emits_two_quads_on_the_stimulus_plane() {
        let params = StickParams::default();
        let mesh = build_stick_pair(4.0, 10.0, Eye::Left, &params);
        assert_eq!(mesh.len(), 12);
        assert!(mesh.positions.iter().all(|p| p.z == -params.depth));
        // one stick left of centre, one right
        assert!(mesh.positions[..6].iter().all(|p| p.x < 0.0));
        assert!(mesh.positions[6..].iter().all(|p| p.x > 0.0));
    }

    #[test]
    fn eye_views_mirror_about_the_stick_centre() {
        let params = StickParams::default();
        let left = build_stick(Vec2::ZERO, eye_inclination(8.0, Eye::Left), &params);
        let right = build_stick(Vec2::ZERO, eye_inclination(8.0, Eye::Right), &params);
        // same topology; every left vertex has its x-mirrored twin in
        // the right view (winding reorders the corners, so match sets)
        assert_eq!(left.len(), right.len());
        for l in &left.positions {
            assert!(
                right
                    .positions
                    .iter()
                    .any(|r| (l.x + r.x).abs() < 1e-6 && (l.y - r.y).abs() < 1e-6),
                "no mirror twin for {l}"
            );
        }
    }
}
