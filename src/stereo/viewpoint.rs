//! Cyclopean camera plus stereo eye geometry.
//!
//! The *viewpoint* is the mid-point between the two eyes.  Each eye
//! sits `eye_separation / 2` away along the vector perpendicular to
//! both the viewing vector and world-up; the convergence distance is
//! where the two lines of sight cross, i.e. the depth that renders with
//! zero disparity.

use glam::Vec3;

/// Which eye a render pass is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Sign applied to half-separation offsets and disparity shifts:
    /// left is negative, right positive.  The same convention is used
    /// everywhere — mixing signs between the eye offset and the
    /// disparity shift is the classic way to silently break the
    /// stimulus.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ViewpointError {
    #[error("camera position equals look-at point; viewing vector is undefined")]
    DegenerateView,
    #[error("eye separation must be non-negative, got {0}")]
    NegativeSeparation(f32),
    #[error("convergence distance must be positive, got {0}")]
    BadConvergence(f32),
}

/// Validated stereo viewpoint.  Constructed once per run and immutable
/// afterwards; the derived vectors are cached at construction.
#[derive(Clone, Copy, Debug)]
pub struct Viewpoint {
    camera_pos: Vec3,
    look_at: Vec3,
    viewing_vector: Vec3,
    eye_separation: f32,
    convergence_distance: f32,
}

impl Viewpoint {
    /// Build a viewpoint converging at the look-at point.
    pub fn new(
        camera_pos: Vec3,
        look_at: Vec3,
        eye_separation: f32,
    ) -> Result<Self, ViewpointError> {
        let convergence = (look_at - camera_pos).length();
        Self::with_convergence(camera_pos, look_at, eye_separation, convergence)
    }

    /// Build a viewpoint with an explicit convergence distance.
    pub fn with_convergence(
        camera_pos: Vec3,
        look_at: Vec3,
        eye_separation: f32,
        convergence_distance: f32,
    ) -> Result<Self, ViewpointError> {
        let viewing_vector = compute_viewing_vector(camera_pos, look_at)?;
        if eye_separation < 0.0 {
            return Err(ViewpointError::NegativeSeparation(eye_separation));
        }
        if convergence_distance <= 0.0 {
            return Err(ViewpointError::BadConvergence(convergence_distance));
        }
        Ok(Self {
            camera_pos,
            look_at,
            viewing_vector,
            eye_separation,
            convergence_distance,
        })
    }

    #[inline]
    pub fn camera_pos(&self) -> Vec3 {
        self.camera_pos
    }

    #[inline]
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    /// Unit vector from the camera towards the look-at point.
    #[inline]
    pub fn viewing_vector(&self) -> Vec3 {
        self.viewing_vector
    }

    #[inline]
    pub fn eye_separation(&self) -> f32 {
        self.eye_separation
    }

    #[inline]
    pub fn convergence_distance(&self) -> f32 {
        self.convergence_distance
    }

    /// Unit vector to the camera's right, perpendicular to the viewing
    /// vector and world-up.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.viewing_vector.cross(Vec3::Y).normalize()
    }

    /// Signed scalar offset of `eye` from the camera along `right()`:
    /// `-sep/2` for the left eye, `+sep/2` for the right.
    #[inline]
    pub fn eye_offset(&self, eye: Eye) -> f32 {
        eye.sign() * self.eye_separation / 2.0
    }

    /// World-space position of one eye.
    pub fn eye_position(&self, eye: Eye) -> Vec3 {
        self.camera_pos + self.right() * self.eye_offset(eye)
    }

    /// Look-at point for one eye's physical camera: shifted sideways by
    /// the same offset as the eye so the two view frusta stay parallel
    /// instead of toeing in.
    pub fn eye_look_at(&self, eye: Eye) -> Vec3 {
        self.look_at + self.right() * self.eye_offset(eye)
    }

    /// World point at `distance` along the viewing vector; columns are
    /// anchored here.
    pub fn position_along_vector(&self, distance: f32) -> Vec3 {
        self.camera_pos + self.viewing_vector * distance
    }
}

/// Normalized `look_at - camera_pos`; errors out instead of dividing by
/// zero when the two coincide.
pub fn compute_viewing_vector(camera_pos: Vec3, look_at: Vec3) -> Result<Vec3, ViewpointError> {
    let v = look_at - camera_pos;
    let len = v.length();
    if len <= f32::EPSILON {
        return Err(ViewpointError::DegenerateView);
    }
    Ok(v / len)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    fn vp() -> Viewpoint {
        Viewpoint::new(vec3(0.0, 3.0, 0.0), vec3(0.0, 0.0, -15.0), 0.1).unwrap()
    }

    #[test]
    fn viewing_vector_is_unit_length() {
        for (cam, look) in [
            (vec3(0.0, 3.0, 0.0), vec3(0.0, 0.0, -15.0)),
            (vec3(1.0, 2.0, 3.0), vec3(-4.0, 0.5, 9.0)),
            (vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)),
        ] {
            let v = compute_viewing_vector(cam, look).unwrap();
            assert!((v.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn coincident_camera_and_look_at_is_an_error() {
        let p = vec3(1.0, 2.0, 3.0);
        assert_eq!(
            compute_viewing_vector(p, p),
            Err(ViewpointError::DegenerateView)
        );
        assert!(Viewpoint::new(p, p, 0.1).is_err());
    }

    #[test]
    fn eye_offsets_are_antisymmetric() {
        for sep in [0.0, 0.065, 0.1, 2.0] {
            let vp =
                Viewpoint::new(vec3(0.0, 3.0, 0.0), vec3(0.0, 0.0, -15.0), sep).unwrap();
            assert_eq!(vp.eye_offset(Eye::Left), -vp.eye_offset(Eye::Right));
            assert_eq!(vp.eye_offset(Eye::Right), sep / 2.0);
        }
    }

    #[test]
    fn eye_positions_straddle_the_camera() {
        let vp = vp();
        let l = vp.eye_position(Eye::Left);
        let r = vp.eye_position(Eye::Right);
        let mid = (l + r) / 2.0;
        assert!((mid - vp.camera_pos()).length() < 1e-6);
        assert!(((l - r).length() - vp.eye_separation()).abs() < 1e-6);
        // the eye axis is perpendicular to the viewing vector
        assert!((r - l).normalize().dot(vp.viewing_vector()).abs() < 1e-6);
    }

    #[test]
    fn default_convergence_is_look_at_distance() {
        let vp = vp();
        // |(0,3,0) - (0,0,-15)| = sqrt(234)
        assert!((vp.convergence_distance() - 234.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn position_along_vector_lands_at_requested_distance() {
        let vp = vp();
        let p = vp.position_along_vector(15.0);
        assert!(((p - vp.camera_pos()).length() - 15.0).abs() < 1e-4);
    }
}
