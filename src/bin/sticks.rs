//! Stick-inclination comparison experiment.
//!
//! Two windows side by side, one per eye.  Each trial fuses a pair of
//! near-vertical sticks; the interocular inclination difference between
//! the eye views makes each stick appear slanted in depth, and the
//! participant picks the steeper one with the left / right arrow keys.
//!
//! ```bash
//! cargo run --release --bin sticks -- --participant p01
//! ```

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Parser;
use glam::{Vec3, vec3};
use log::info;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;

use stereolab::renderer::{Rasterizer, SoftwareRaster};
use stereolab::scene::{StickParams, build_stick_pair};
use stereolab::stereo::Eye;
use stereolab::trial::{
    Side, StickCondition, StickRecord, StickResultsWriter, sample_stick_conditions,
    stick_ground_truth,
};

/// Gap between the two eye windows, pixels.
const WINDOW_GAP: isize = 40;

#[derive(Parser, Debug)]
#[command(name = "sticks", about = "Dual-window stick-inclination comparison")]
struct Args {
    /// Participant identifier, used in the default results file name.
    #[arg(short, long, default_value = "anon")]
    participant: String,

    /// Results CSV path (default: stick_results_<participant>_<timestamp>.csv).
    #[arg(long)]
    results: Option<PathBuf>,

    /// Interocular inclination levels, degrees; each trial draws two
    /// distinct ones.
    #[arg(long, value_delimiter = ',',
          default_values_t = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0])]
    theta_levels: Vec<f32>,

    /// Number of trials.
    #[arg(long, default_value_t = 15)]
    trials: usize,

    /// Stimulus presentation time, seconds.
    #[arg(long, default_value_t = 8.0)]
    presentation_time: f32,

    /// Stick length, world units.
    #[arg(long, default_value_t = 1.0)]
    stick_length: f32,

    /// Lateral separation between the two sticks, world units.
    #[arg(long, default_value_t = 1.0)]
    separation: f32,

    /// Per-eye window width.
    #[arg(long, default_value_t = 600)]
    width: usize,

    /// Per-eye window height.
    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Seed for condition sampling.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One eye's window plus its rasterizer.
struct EyeSurface {
    eye: Eye,
    window: Window,
    raster: SoftwareRaster,
}

impl EyeSurface {
    fn new(eye: Eye, args: &Args) -> anyhow::Result<Self> {
        let title = match eye {
            Eye::Left => "Sticks (left eye)",
            Eye::Right => "Sticks (right eye)",
        };
        let mut window = Window::new(title, args.width, args.height, WindowOptions::default())?;
        let x = match eye {
            Eye::Left => WINDOW_GAP,
            Eye::Right => WINDOW_GAP * 2 + args.width as isize,
        };
        window.set_position(x, 120);
        window.set_target_fps(60);

        let mut raster = SoftwareRaster::default();
        raster.set_projection(45.0, args.width as f32 / args.height as f32, 0.1, 100.0);
        Ok(Self { eye, window, raster })
    }

    /// Render this eye's stick pair and present it.
    fn draw_stimulus(&mut self, cond: &StickCondition, params: &StickParams) -> anyhow::Result<()> {
        let (w, h) = self.window.get_size();
        self.raster.begin_frame(w, h);
        // both eyes share one camera; the inclination split between the
        // eye views carries the entire stereo signal
        self.raster
            .set_view(Vec3::ZERO, vec3(0.0, 0.0, -1.0), Vec3::Y);
        let mesh = build_stick_pair(cond.left_theta, cond.right_theta, self.eye, params);
        self.raster
            .submit_triangles(&mesh.positions, &mesh.normals, &mesh.brightness);
        self.present()
    }

    fn draw_blank(&mut self) -> anyhow::Result<()> {
        let (w, h) = self.window.get_size();
        self.raster.begin_frame(w, h);
        self.present()
    }

    fn present(&mut self) -> anyhow::Result<()> {
        let mut res = Ok(());
        let window = &mut self.window;
        self.raster
            .present_frame(|buf, w, h| res = window.update_with_buffer(buf, w, h));
        res?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = StickParams {
        length: args.stick_length,
        separation: args.separation,
        ..StickParams::default()
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let trials = sample_stick_conditions(
        &args.theta_levels,
        args.trials,
        args.presentation_time,
        &mut rng,
    );
    if trials.is_empty() {
        anyhow::bail!("no trials; pass at least two --theta-levels");
    }

    let results_path = args.results.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "stick_results_{}_{}.csv",
            args.participant,
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    let mut writer = StickResultsWriter::create(&results_path)?;

    let mut eyes = [
        EyeSurface::new(Eye::Left, &args)?,
        EyeSurface::new(Eye::Right, &args)?,
    ];

    let total = trials.len();
    let mut aborted = false;
    'run: for cond in &trials {
        let truth = stick_ground_truth(cond);
        info!(
            "trial {}/{}: left {}°, right {}°",
            cond.trial_id, total, cond.left_theta, cond.right_theta
        );

        let onset = Instant::now();
        let mut response = None;

        while onset.elapsed().as_secs_f32() < cond.presentation_time {
            if escape_requested(&eyes) {
                aborted = true;
                break 'run;
            }
            for surface in eyes.iter_mut() {
                surface.draw_stimulus(cond, &params)?;
            }
            // responses are polled on the left window only; the run
            // instructions ask the participant to click it first
            if let Some(side) = poll_side(&eyes[0].window) {
                response = Some((side, onset.elapsed().as_secs_f32()));
                break;
            }
        }

        while response.is_none() {
            if escape_requested(&eyes) {
                aborted = true;
                break 'run;
            }
            for surface in eyes.iter_mut() {
                surface.draw_blank()?;
            }
            if let Some(side) = poll_side(&eyes[0].window) {
                response = Some((side, onset.elapsed().as_secs_f32()));
            }
        }

        if let Some((side, reaction_time)) = response {
            writer.write(&StickRecord {
                trial_id: cond.trial_id,
                left_theta: cond.left_theta,
                right_theta: cond.right_theta,
                response: side.label().to_string(),
                correct_answer: truth.label().to_string(),
                is_correct: side == truth,
                reaction_time,
            })?;
        }
    }

    if aborted {
        info!("aborted after {} of {} trials", writer.rows_written(), total);
    }
    if let Some(acc) = writer.accuracy() {
        info!(
            "done: {} trials, {:.0}% correct",
            writer.rows_written(),
            acc * 100.0
        );
    }
    Ok(())
}

/// Abort when either window closed or Esc is down in either.
fn escape_requested(eyes: &[EyeSurface; 2]) -> bool {
    eyes.iter()
        .any(|s| !s.window.is_open() || s.window.is_key_down(Key::Escape))
}

/// Edge-triggered response poll; `None` while no arrow key is down.
fn poll_side(window: &Window) -> Option<Side> {
    if window.is_key_pressed(Key::Left, KeyRepeat::No) {
        Some(Side::Left)
    } else if window.is_key_pressed(Key::Right, KeyRepeat::No) {
        Some(Side::Right)
    } else {
        None
    }
}
