//! Mirror-stereoscope depth-judgement experiment.
//!
//! Two windows side by side, one per eye, each with its own software
//! rasterizer and full color mask.  Each eye's camera sits at its
//! physical position with a parallel (sideways-shifted) look-at, and
//! the same per-eye vertex shifts as the anaglyph rig add the
//! manipulated disparity on top of the natural camera separation.
//!
//! ```bash
//! cargo run --release --bin stereoscope -- --participant p01
//! ```

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Parser;
use glam::Vec3;
use log::{info, warn};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;

use stereolab::config::{
    DisparityGranularity, ExperimentConfig, FloorVariant, GeometryVariant, ResponseKeySet,
};
use stereolab::renderer::{Rasterizer, SoftwareRaster};
use stereolab::scene::SceneContext;
use stereolab::stereo::{DisparityModel, Eye, Viewpoint, submit_trial_pass};
use stereolab::trial::{
    Judgement, ResultsWriter, TrialCondition, TrialController, TrialOutcome, ground_truth,
    load_or_synthesize,
};

/// Gap between the two eye windows, pixels.
const WINDOW_GAP: isize = 40;

#[derive(Parser, Debug)]
#[command(name = "stereoscope", about = "Dual-window mirror-stereoscope experiment")]
struct Args {
    /// Participant identifier, used in the default results file name.
    #[arg(short, long, default_value = "anon")]
    participant: String,

    /// Conditions CSV; synthesized, shuffled and written here when
    /// missing or malformed.
    #[arg(long, default_value = "experiment_conditions.csv")]
    conditions: PathBuf,

    /// Results CSV path (default: stereoscope_results_<participant>_<timestamp>.csv).
    #[arg(long)]
    results: Option<PathBuf>,

    /// Column geometry flavour.
    #[arg(long, value_enum, default_value_t = GeometryVariant::Uniform)]
    geometry: GeometryVariant,

    /// Ground-plane flavour.
    #[arg(long, value_enum, default_value_t = FloorVariant::Checkerboard)]
    floor: FloorVariant,

    /// Apply the disparity formula per vertex or once per object.
    #[arg(long, value_enum, default_value_t = DisparityGranularity::PerVertex)]
    disparity_model: DisparityGranularity,

    /// Which keys answer the judgement.
    #[arg(long, value_enum, default_value_t = ResponseKeySet::PlaneJudgement)]
    response_keys: ResponseKeySet,

    /// Column distances along the viewing vector, world units.
    #[arg(long, value_delimiter = ',', default_values_t = [3.0, 25.0])]
    distances: Vec<f32>,

    /// Base disparity magnitudes, degrees.
    #[arg(long, value_delimiter = ',', default_values_t = [0.3])]
    disparities: Vec<f32>,

    /// Repetitions of each condition cell.
    #[arg(long, default_value_t = 2)]
    repetitions: usize,

    /// Stimulus presentation time, seconds.
    #[arg(long, default_value_t = 3.0)]
    presentation_time: f32,

    /// Include on-plane catch trials in synthesized conditions.
    #[arg(long)]
    onplane_trials: bool,

    /// Per-eye window width.
    #[arg(long, default_value_t = 800)]
    width: usize,

    /// Per-eye window height.
    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Seed for brick jitter and trial shuffling.
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
    fn new(eye: Eye, args: &Args, fov_degrees: f32) -> anyhow::Result<Self> {
        let title = match eye {
            Eye::Left => "Stereoscope (left eye)",
            Eye::Right => "Stereoscope (right eye)",
        };
        let mut window = Window::new(title, args.width, args.height, WindowOptions::default())?;
        let x = match eye {
            Eye::Left => WINDOW_GAP,
            Eye::Right => WINDOW_GAP * 2 + args.width as isize,
        };
        window.set_position(x, 120);
        window.set_target_fps(60);

        let mut raster = SoftwareRaster::default();
        raster.set_projection(
            fov_degrees,
            args.width as f32 / args.height as f32,
            0.1,
            100.0,
        );
        Ok(Self { eye, window, raster })
    }

    /// Render this eye's view of one trial and present it.
    fn draw_stimulus(
        &mut self,
        scene: &SceneContext,
        cond: &TrialCondition,
        model: DisparityModel,
    ) -> anyhow::Result<()> {
        let (w, h) = self.window.get_size();
        self.raster.begin_frame(w, h);
        let vp = scene.viewpoint();
        self.raster
            .set_view(vp.eye_position(self.eye), vp.eye_look_at(self.eye), Vec3::Y);
        submit_trial_pass(
            &mut self.raster,
            scene,
            cond.distance_along_vector,
            cond.disparity_degrees,
            cond.onplane,
            model,
            self.eye,
            w as f32,
        );
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

    let cfg = ExperimentConfig {
        distances: args.distances.clone(),
        disparities: args.disparities.clone(),
        repetitions: args.repetitions,
        presentation_time: args.presentation_time,
        geometry: args.geometry,
        floor: args.floor,
        disparity_model: args.disparity_model.into(),
        response_keys: args.response_keys,
        seed: args.seed,
        ..ExperimentConfig::default()
    };
    if args.onplane_trials && !cfg.response_keys.supports_onplane() {
        anyhow::bail!(
            "on-plane trials need a key set with an on-plane response; \
             use --response-keys plane-judgement"
        );
    }

    let viewpoint = Viewpoint::new(cfg.camera_pos, cfg.look_at, cfg.eye_separation)?;
    info!(
        "viewpoint: eyes {} apart, converging at {:.2}",
        cfg.eye_separation,
        viewpoint.convergence_distance()
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let scene = SceneContext::new(
        viewpoint,
        cfg.geometry.column_params(),
        cfg.reference_distance,
        &cfg.distances,
        cfg.floor_brightness,
        cfg.floor_extent,
        cfg.floor.floor_style(),
        &mut rng,
    )?;

    let mut eyes = [
        EyeSurface::new(Eye::Left, &args, cfg.fov_degrees)?,
        EyeSurface::new(Eye::Right, &args, cfg.fov_degrees)?,
    ];

    let onplane_levels: &[bool] = if args.onplane_trials {
        &[false, true]
    } else {
        &[false]
    };
    let trials = load_or_synthesize(
        &args.conditions,
        &cfg.disparities,
        &cfg.distances,
        onplane_levels,
        cfg.repetitions,
        cfg.presentation_time,
        &mut rng,
    );

    let results_path = args.results.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "stereoscope_results_{}_{}.csv",
            args.participant,
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    let writer = ResultsWriter::create(&results_path)?;
    let mut ctrl = TrialController::new(trials, writer);

    let mut aborted = false;
    'run: while let Some(cond) = ctrl.next_trial() {
        let anchor = match scene.column_anchor(cond.distance_along_vector) {
            Ok(a) => a,
            Err(err) => {
                warn!("{err}");
                ctrl.record(&cond, Judgement::OnPlane, TrialOutcome::Skipped)?;
                continue;
            }
        };
        let truth = ground_truth(&cond, anchor.y);
        info!(
            "trial {}/{}: distance {}, disparity {}°, onplane {}",
            ctrl.presented(),
            ctrl.total(),
            cond.distance_along_vector,
            cond.disparity_degrees,
            cond.onplane
        );

        let onset = Instant::now();
        let mut response = None;

        while onset.elapsed().as_secs_f32() < cond.presentation_time {
            if escape_requested(&eyes) {
                aborted = true;
                break 'run;
            }
            for surface in eyes.iter_mut() {
                surface.draw_stimulus(&scene, &cond, cfg.disparity_model)?;
            }
            // responses are polled on the left window only; key focus
            // follows whichever window the participant clicked last,
            // so the run instructions ask for the left one
            if let Some(j) = poll_judgement(&eyes[0].window, cfg.response_keys) {
                response = Some((j, onset.elapsed().as_secs_f32()));
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
            if let Some(j) = poll_judgement(&eyes[0].window, cfg.response_keys) {
                response = Some((j, onset.elapsed().as_secs_f32()));
            }
        }

        if let Some((judgement, reaction_time)) = response {
            ctrl.record(
                &cond,
                truth,
                TrialOutcome::Responded(judgement, reaction_time),
            )?;
        }
    }

    ctrl.finish(aborted);
    Ok(())
}

/// Abort when either window closed or Esc is down in either.
fn escape_requested(eyes: &[EyeSurface; 2]) -> bool {
    eyes.iter()
        .any(|s| !s.window.is_open() || s.window.is_key_down(Key::Escape))
}

/// Edge-triggered response poll; `None` while no response key is down.
fn poll_judgement(window: &Window, keys: ResponseKeySet) -> Option<Judgement> {
    match keys {
        ResponseKeySet::PlaneJudgement => {
            if window.is_key_pressed(Key::W, KeyRepeat::No) {
                Some(Judgement::Above)
            } else if window.is_key_pressed(Key::S, KeyRepeat::No) {
                Some(Judgement::Below)
            } else if window.is_key_pressed(Key::Space, KeyRepeat::No) {
                Some(Judgement::OnPlane)
            } else {
                None
            }
        }
        ResponseKeySet::Arrows => {
            if window.is_key_pressed(Key::Up, KeyRepeat::No) {
                Some(Judgement::Above)
            } else if window.is_key_pressed(Key::Down, KeyRepeat::No) {
                Some(Judgement::Below)
            } else {
                None
            }
        }
    }
}
