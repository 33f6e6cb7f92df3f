//! Rasterizer abstraction.
//!
//! *Experiment logic never touches a pixel buffer directly.*  The
//! stereo renderer produces [`crate::stereo::StereoBatch`]es and hands
//! their vertex streams to a type implementing [`Rasterizer`]; any
//! backend honouring this surface can present the stimuli.
//!
//! Two presentation disciplines use the same trait:
//!
//! * **anaglyph** – both eyes into one surface, the left pass masked to
//!   red and the right to green+blue, with a depth clear in between;
//! * **dual-surface** – one rasterizer (and window) per eye with
//!   [`ChannelMask::all`].

use bitflags::bitflags;
use glam::Vec3;

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

bitflags! {
    /// Which color channels a render pass may write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u32 {
        const RED = 0x00FF_0000;
        const GREEN = 0x0000_FF00;
        const BLUE = 0x0000_00FF;
    }
}

impl ChannelMask {
    /// Red-only mask for the left anaglyph pass.
    pub const LEFT_ANAGLYPH: ChannelMask = ChannelMask::RED;
    /// Cyan (green+blue) mask for the right anaglyph pass.
    pub const RIGHT_ANAGLYPH: ChannelMask = ChannelMask::GREEN.union(ChannelMask::BLUE);
}

/// A renderer owning an internal color + depth buffer for one surface.
///
/// Pass structure per frame: `begin_frame`, then per eye
/// `clear_color_channels` / `clear_depth` / `set_view` /
/// `submit_triangles`, finally `present_frame` loans the finished
/// buffer to a closure (the caller forwards it to its window).
pub trait Rasterizer {
    /// (Re)allocate internal buffers for the resolution and clear them.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Perspective projection for subsequent submissions.
    fn set_projection(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32);

    /// Camera for subsequent submissions.
    fn set_view(&mut self, eye_pos: Vec3, look_at: Vec3, up: Vec3);

    /// Restrict which color channels subsequent submissions write.
    fn clear_color_channels(&mut self, mask: ChannelMask);

    /// Reset the depth buffer only; used between anaglyph eye passes so
    /// the second eye is not occluded by the first.
    fn clear_depth(&mut self);

    /// Rasterize a flat-shaded triangle soup.  `positions`, `normals`
    /// and `brightness` run in parallel, three vertices per triangle;
    /// brightness maps to grayscale before the channel mask applies.
    fn submit_triangles(&mut self, positions: &[Vec3], normals: &[Vec3], brightness: &[f32]);

    /// Finish the frame and loan the buffer to `submit` exactly once.
    fn present_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

pub mod software;

pub use software::SoftwareRaster;
