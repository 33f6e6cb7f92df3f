mod disparity;
mod render;
mod viewpoint;

pub use disparity::{
    DEGREES_PER_SCREEN_WIDTH, DisparityModel, MAX_DISTANCE_EFFECT_DEGREES, PIXELS_TO_WORLD,
    disparity_pixels, measured_distance,
};
pub use render::{StereoBatch, render_stereo_pair, submit_trial_pass};
pub use viewpoint::{Eye, Viewpoint, ViewpointError};
