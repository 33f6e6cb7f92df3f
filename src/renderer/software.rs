//! Z-buffered software backend.
//!
//! Flat-shaded triangles into a `0x00RRGGBB` scratch buffer the caller
//! can hand straight to `minifb`.  Stimuli carry precomputed per-face
//! brightness, so no lighting is evaluated here; the channel mask turns
//! the grayscale fill into the red or cyan half of an anaglyph pair.

use glam::{Mat4, Vec3, Vec4Swizzles};

use crate::renderer::{ChannelMask, Rasterizer, Rgba};

pub struct SoftwareRaster {
    scratch: Vec<Rgba>,
    depth: Vec<f32>,
    width: usize,
    height: usize,
    view_proj: Mat4,
    proj: Mat4,
    view: Mat4,
    mask: ChannelMask,
}

impl Default for SoftwareRaster {
    fn default() -> Self {
        Self {
            scratch: Vec::new(),
            depth: Vec::new(),
            width: 0,
            height: 0,
            view_proj: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            mask: ChannelMask::all(),
        }
    }
}

impl SoftwareRaster {
    fn plot(&mut self, x: usize, y: usize, z: f32, color: Rgba) {
        let idx = y * self.width + x;
        if z < self.depth[idx] {
            self.depth[idx] = z;
            let bits = self.mask.bits();
            self.scratch[idx] = (self.scratch[idx] & !bits) | (color & bits);
        }
    }

    /// Clip-space positions for one triangle, or `None` when any vertex
    /// lies behind the near plane.  Stimuli live far in front of the
    /// camera, so dropping straddling triangles instead of clipping
    /// them never costs visible geometry here.
    fn to_clip(&self, tri: &[Vec3]) -> Option<[glam::Vec4; 3]> {
        let mut clip = [glam::Vec4::ZERO; 3];
        for (out, &p) in clip.iter_mut().zip(tri) {
            let c = self.view_proj * p.extend(1.0);
            if c.w <= 1e-4 {
                return None;
            }
            *out = c;
        }
        Some(clip)
    }

    fn fill_triangle(&mut self, clip: [glam::Vec4; 3], color: Rgba) {
        let (wf, hf) = (self.width as f32, self.height as f32);

        // perspective divide + viewport transform
        let mut scr = [Vec3::ZERO; 3];
        for (s, c) in scr.iter_mut().zip(&clip) {
            let ndc = c.xyz() / c.w;
            *s = Vec3::new(
                (ndc.x * 0.5 + 0.5) * wf,
                (1.0 - (ndc.y * 0.5 + 0.5)) * hf,
                ndc.z,
            );
        }

        let area = edge(scr[0], scr[1], scr[2]);
        if area.abs() < 1e-6 {
            return; // degenerate
        }

        let min_x = scr.iter().map(|v| v.x).fold(f32::INFINITY, f32::min).max(0.0) as usize;
        let max_x = (scr.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max) as usize)
            .min(self.width.saturating_sub(1));
        let min_y = scr.iter().map(|v| v.y).fold(f32::INFINITY, f32::min).max(0.0) as usize;
        let max_y = (scr.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max) as usize)
            .min(self.height.saturating_sub(1));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(scr[1], scr[2], p) / area;
                let w1 = edge(scr[2], scr[0], p) / area;
                let w2 = edge(scr[0], scr[1], p) / area;
                // no backface culling: accept either winding
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * scr[0].z + w1 * scr[1].z + w2 * scr[2].z;
                self.plot(x, y, z, color);
            }
        }
    }
}

#[inline]
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[inline]
fn gray(brightness: f32) -> Rgba {
    let v = (brightness.clamp(0.0, 1.0) * 255.0) as u32;
    (v << 16) | (v << 8) | v
}

impl Rasterizer for SoftwareRaster {
    fn begin_frame(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.scratch.resize(width * height, 0);
            self.depth.resize(width * height, f32::INFINITY);
        }
        // black clear, full depth
        self.scratch.fill(0x00_00_00_00);
        self.depth.fill(f32::INFINITY);
        self.mask = ChannelMask::all();
    }

    fn set_projection(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.proj = Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, near, far);
        self.view_proj = self.proj * self.view;
    }

    fn set_view(&mut self, eye_pos: Vec3, look_at: Vec3, up: Vec3) {
        self.view = Mat4::look_at_rh(eye_pos, look_at, up);
        self.view_proj = self.proj * self.view;
    }

    fn clear_color_channels(&mut self, mask: ChannelMask) {
        self.mask = mask;
    }

    fn clear_depth(&mut self) {
        self.depth.fill(f32::INFINITY);
    }

    fn submit_triangles(&mut self, positions: &[Vec3], _normals: &[Vec3], brightness: &[f32]) {
        debug_assert_eq!(positions.len(), brightness.len());
        for (tri, b) in positions.chunks_exact(3).zip(brightness.chunks_exact(3)) {
            let Some(clip) = self.to_clip(tri) else {
                continue;
            };
            // brightness is constant per face; take the lead vertex
            self.fill_triangle(clip, gray(b[0]));
        }
    }

    fn present_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    const W: usize = 64;
    const H: usize = 64;

    fn raster() -> SoftwareRaster {
        let mut r = SoftwareRaster::default();
        r.begin_frame(W, H);
        r.set_projection(45.0, 1.0, 0.1, 100.0);
        r.set_view(Vec3::ZERO, vec3(0.0, 0.0, -10.0), Vec3::Y);
        r
    }

    fn facing_quad(z: f32) -> Vec<Vec3> {
        vec![
            vec3(-2.0, -2.0, z),
            vec3(2.0, -2.0, z),
            vec3(2.0, 2.0, z),
            vec3(-2.0, -2.0, z),
            vec3(2.0, 2.0, z),
            vec3(-2.0, 2.0, z),
        ]
    }

    fn center_pixel(r: &mut SoftwareRaster) -> Rgba {
        let mut px = 0;
        r.present_frame(|fb, w, _| px = fb[(H / 2) * w + W / 2]);
        px
    }

    #[test]
    fn triangle_covers_the_screen_centre() {
        let mut r = raster();
        let quad = facing_quad(-5.0);
        let n = vec![Vec3::Z; 6];
        let b = vec![1.0; 6];
        r.submit_triangles(&quad, &n, &b);
        assert_eq!(center_pixel(&mut r), 0x00FF_FFFF);
    }

    #[test]
    fn nearer_geometry_wins_the_depth_test() {
        let mut r = raster();
        let n = vec![Vec3::Z; 6];
        // dim far quad first, bright near quad second
        r.submit_triangles(&facing_quad(-9.0), &n, &vec![0.25; 6]);
        r.submit_triangles(&facing_quad(-4.0), &n, &vec![1.0; 6]);
        assert_eq!(center_pixel(&mut r), 0x00FF_FFFF);

        // submitted near-first, the far quad must lose
        let mut r = raster();
        r.submit_triangles(&facing_quad(-4.0), &n, &vec![1.0; 6]);
        r.submit_triangles(&facing_quad(-9.0), &n, &vec![0.25; 6]);
        assert_eq!(center_pixel(&mut r), 0x00FF_FFFF);
    }

    #[test]
    fn channel_masks_compose_into_an_anaglyph_pixel() {
        let mut r = raster();
        let n = vec![Vec3::Z; 6];
        r.clear_color_channels(ChannelMask::LEFT_ANAGLYPH);
        r.submit_triangles(&facing_quad(-5.0), &n, &vec![1.0; 6]);
        r.clear_depth();
        r.clear_color_channels(ChannelMask::RIGHT_ANAGLYPH);
        r.submit_triangles(&facing_quad(-5.0), &n, &vec![1.0; 6]);
        // both passes landed: red from the left, green+blue from the right
        assert_eq!(center_pixel(&mut r), 0x00FF_FFFF);
    }

    #[test]
    fn masked_pass_leaves_other_channels_untouched() {
        let mut r = raster();
        let n = vec![Vec3::Z; 6];
        r.clear_color_channels(ChannelMask::RED);
        r.submit_triangles(&facing_quad(-5.0), &n, &vec![1.0; 6]);
        assert_eq!(center_pixel(&mut r), 0x00FF_0000);
    }

    #[test]
    fn behind_camera_geometry_is_dropped() {
        let mut r = raster();
        let n = vec![Vec3::Z; 6];
        r.submit_triangles(&facing_quad(5.0), &n, &vec![1.0; 6]);
        assert_eq!(center_pixel(&mut r), 0);
    }
}
